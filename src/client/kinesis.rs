use super::{
    Client, DescribeStreamOutput, GetIteratorOutput, GetRecordsOutput, GetShardsOutput,
    PutRecordOutput,
};
use crate::stream::Shard;
use crate::types::{Record, Records, StreamStatus};
use crate::{Error, Result};

use async_trait::async_trait;
use aws_sdk_kinesis::{
    config::Builder as ConfigBuilder,
    error::SdkError,
    operation::{
        create_stream::CreateStreamError, delete_stream::DeleteStreamError,
        describe_stream_summary::DescribeStreamSummaryError, get_records::GetRecordsError,
        get_shard_iterator::GetShardIteratorError, list_shards::ListShardsError,
        put_record::PutRecordError,
    },
    primitives::Blob,
    types::{ShardIteratorType, StreamDescriptionSummary, StreamMode, StreamModeDetails},
    Client as SdkClient,
};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct KinesisClient {
    client: SdkClient,
}

#[derive(Debug)]
pub struct KinesisClientBuilder {
    builder: ConfigBuilder,
}

impl KinesisClientBuilder {
    pub async fn new() -> Self {
        let config = aws_config::load_from_env().await;
        let builder = ConfigBuilder::from(&config);

        Self { builder }
    }

    pub fn endpoint_url(self, url: Option<String>) -> Self {
        match url {
            Some(url) => Self {
                builder: self.builder.endpoint_url(url),
            },
            None => self,
        }
    }

    pub fn build(self) -> KinesisClient {
        let client = SdkClient::from_conf(self.builder.build());
        KinesisClient { client }
    }
}

impl KinesisClient {
    pub async fn builder() -> KinesisClientBuilder {
        KinesisClientBuilder::new().await
    }
}

#[async_trait]
impl Client for KinesisClient {
    async fn create_stream(&self, stream_name: &str, shard_count: i32) -> Result<()> {
        let mode = StreamModeDetails::builder()
            .stream_mode(StreamMode::Provisioned)
            .build()
            .map_err(anyhow::Error::from)?;

        self.client
            .create_stream()
            .stream_name(stream_name)
            .shard_count(shard_count)
            .stream_mode_details(mode)
            .send()
            .await
            .map(|_| ())
            .map_err(|err| from_create_stream_err(err, stream_name))
    }

    async fn describe_stream(&self, stream_name: &str) -> Result<DescribeStreamOutput> {
        let output = self
            .client
            .describe_stream_summary()
            .stream_name(stream_name)
            .send()
            .await
            .map_err(|err| from_describe_stream_err(err, stream_name))?;

        let summary: Option<StreamDescriptionSummary> = output.stream_description_summary.into();
        summary
            .map(|summary| DescribeStreamOutput {
                stream_arn: summary.stream_arn().to_string(),
                status: StreamStatus::from(summary.stream_status().clone()),
                open_shard_count: summary.open_shard_count(),
            })
            .ok_or(Error::fatal(
                "`stream_description_summary` is None in `DescribeStreamSummaryOutput`",
            ))
    }

    async fn delete_stream(&self, stream_name: &str, stream_arn: &str) -> Result<()> {
        self.client
            .delete_stream()
            .stream_name(stream_name)
            .stream_arn(stream_arn)
            .send()
            .await
            .map(|_| ())
            .map_err(|err| from_delete_stream_err(err, stream_name))
    }

    async fn put_record(
        &self,
        stream_name: &str,
        stream_arn: &str,
        partition_key: &str,
        data: Vec<u8>,
    ) -> Result<PutRecordOutput> {
        self.client
            .put_record()
            .stream_name(stream_name)
            .stream_arn(stream_arn)
            .partition_key(partition_key)
            .data(Blob::new(data))
            .send()
            .await
            .map(|output| PutRecordOutput {
                shard_id: output.shard_id().to_string(),
                sequence_number: output.sequence_number().to_string(),
            })
            .map_err(from_put_record_err)
    }

    async fn get_shards(
        &self,
        stream_name: &str,
        stream_arn: &str,
        next_token: Option<String>,
    ) -> Result<GetShardsOutput> {
        // ListShards rejects the stream identifiers once a NextToken is given.
        let request = match next_token {
            Some(token) => self.client.list_shards().next_token(token),
            None => self
                .client
                .list_shards()
                .stream_name(stream_name)
                .stream_arn(stream_arn),
        };

        request
            .send()
            .await
            .map(|output| {
                let shards = output
                    .shards()
                    .iter()
                    .map(|s| {
                        Shard::new(s.shard_id(), s.parent_shard_id())
                            .with_adjacent_parent(s.adjacent_parent_shard_id())
                    })
                    .collect::<Vec<Shard>>();

                GetShardsOutput {
                    shards,
                    next_token: output.next_token().map(String::from),
                }
            })
            .map_err(|err| from_list_shards_err(err, stream_name))
    }

    async fn get_iterator(
        &self,
        stream_name: &str,
        stream_arn: &str,
        shard_id: &str,
    ) -> Result<GetIteratorOutput> {
        self.client
            .get_shard_iterator()
            .stream_name(stream_name)
            .stream_arn(stream_arn)
            .shard_id(shard_id)
            .shard_iterator_type(ShardIteratorType::TrimHorizon)
            .send()
            .await
            .map(|output| GetIteratorOutput {
                iterator: output.shard_iterator().map(String::from),
            })
            .map_err(|err| from_get_iterator_err(err, shard_id))
    }

    async fn get_records(
        &self,
        stream_arn: &str,
        shard_id: &str,
        iterator: &str,
    ) -> Result<GetRecordsOutput> {
        self.client
            .get_records()
            .stream_arn(stream_arn)
            .shard_iterator(iterator)
            .send()
            .await
            .map(|output| {
                let records = output
                    .records()
                    .iter()
                    .cloned()
                    .enumerate()
                    .map(|(index, record)| Record::from_sdk(shard_id, index, record))
                    .collect::<Vec<Record>>();

                debug!(
                    "GetRecords on {shard_id} returned {} records, {:?}ms behind latest",
                    records.len(),
                    output.millis_behind_latest()
                );

                GetRecordsOutput {
                    records: Records::from(records),
                    next_iterator: output.next_shard_iterator().map(String::from),
                    millis_behind_latest: output.millis_behind_latest(),
                }
            })
            .map_err(|err| from_get_records_err(err, shard_id))
    }
}

fn from_create_stream_err(err: SdkError<CreateStreamError>, stream_name: &str) -> Error {
    use CreateStreamError::*;

    match err {
        SdkError::ServiceError(e) => {
            let e = e.into_err();
            match e {
                ResourceInUseException(_) => Error::AlreadyExists(stream_name.into()),
                LimitExceededException(_) => Error::Transient(anyhow::Error::from(e)),
                _ => Error::Fatal(anyhow::Error::from(e)),
            }
        }
        _ => from_sdk_err(err),
    }
}

fn from_describe_stream_err(err: SdkError<DescribeStreamSummaryError>, stream_name: &str) -> Error {
    use DescribeStreamSummaryError::*;

    match err {
        SdkError::ServiceError(e) => {
            let e = e.into_err();
            match e {
                ResourceNotFoundException(_) => Error::NotFound(stream_name.into()),
                LimitExceededException(_) => Error::Transient(anyhow::Error::from(e)),
                _ => Error::Fatal(anyhow::Error::from(e)),
            }
        }
        _ => from_sdk_err(err),
    }
}

fn from_delete_stream_err(err: SdkError<DeleteStreamError>, stream_name: &str) -> Error {
    use DeleteStreamError::*;

    match err {
        SdkError::ServiceError(e) => {
            let e = e.into_err();
            match e {
                ResourceNotFoundException(_) => Error::NotFound(stream_name.into()),
                LimitExceededException(_) => Error::Transient(anyhow::Error::from(e)),
                _ => Error::Fatal(anyhow::Error::from(e)),
            }
        }
        _ => from_sdk_err(err),
    }
}

fn from_put_record_err(err: SdkError<PutRecordError>) -> Error {
    use PutRecordError::*;

    match err {
        SdkError::ServiceError(e) => {
            let e = e.into_err();
            match e {
                ProvisionedThroughputExceededException(_) | KmsThrottlingException(_) => {
                    Error::Transient(anyhow::Error::from(e))
                }
                _ => Error::Fatal(anyhow::Error::from(e)),
            }
        }
        _ => from_sdk_err(err),
    }
}

fn from_list_shards_err(err: SdkError<ListShardsError>, stream_name: &str) -> Error {
    use ListShardsError::*;

    match err {
        SdkError::ServiceError(e) => {
            let e = e.into_err();
            match e {
                ResourceNotFoundException(_) => Error::NotFound(stream_name.into()),
                LimitExceededException(_) => Error::Transient(anyhow::Error::from(e)),
                _ => Error::Fatal(anyhow::Error::from(e)),
            }
        }
        _ => from_sdk_err(err),
    }
}

fn from_get_iterator_err(err: SdkError<GetShardIteratorError>, shard_id: &str) -> Error {
    use GetShardIteratorError::*;

    match err {
        SdkError::ServiceError(e) => {
            let e = e.into_err();
            match e {
                ResourceNotFoundException(_) => Error::NotFound(shard_id.into()),
                ProvisionedThroughputExceededException(_) => {
                    Error::Transient(anyhow::Error::from(e))
                }
                _ => Error::Fatal(anyhow::Error::from(e)),
            }
        }
        _ => from_sdk_err(err),
    }
}

fn from_get_records_err(err: SdkError<GetRecordsError>, shard_id: &str) -> Error {
    use GetRecordsError::*;

    match err {
        SdkError::ServiceError(e) => {
            let e = e.into_err();
            match e {
                ExpiredIteratorException(_) => {
                    warn!("Iterator of {shard_id} expired: {e}");
                    Error::Fatal(anyhow::Error::from(e))
                }
                ResourceNotFoundException(_) => Error::NotFound(shard_id.into()),
                ProvisionedThroughputExceededException(_) | KmsThrottlingException(_) => {
                    Error::Transient(anyhow::Error::from(e))
                }
                _ => Error::Fatal(anyhow::Error::from(e)),
            }
        }
        _ => from_sdk_err(err),
    }
}

fn from_sdk_err<E>(err: SdkError<E>) -> Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    match err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => {
            Error::Transient(anyhow::Error::from(err))
        }
        _ => Error::Fatal(anyhow::Error::from(err)),
    }
}
