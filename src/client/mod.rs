mod kinesis;
#[cfg(test)]
mod mock;

use crate::stream::Shard;
use crate::types::{Records, StreamStatus};
use crate::Result;

use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct DescribeStreamOutput {
    pub stream_arn: String,
    pub status: StreamStatus,
    pub open_shard_count: i32,
}

#[derive(Debug, Clone)]
pub struct PutRecordOutput {
    pub shard_id: String,
    pub sequence_number: String,
}

#[derive(Debug)]
pub struct GetShardsOutput {
    pub shards: Vec<Shard>,
    pub next_token: Option<String>,
}

#[derive(Debug)]
pub struct GetIteratorOutput {
    pub iterator: Option<String>,
}

#[derive(Debug)]
pub struct GetRecordsOutput {
    pub records: Records,
    pub next_iterator: Option<String>,
    pub millis_behind_latest: Option<i64>,
}

/// Control-plane and data-plane calls against the stream service.
///
/// Implementations classify service errors into the crate [`Error`](crate::Error)
/// taxonomy: `AlreadyExists` on create, `NotFound` on describe and delete,
/// `Transient` for throttling and dispatch failures, `Fatal` for the rest.
#[async_trait]
pub trait Client: Send + Sync {
    async fn create_stream(&self, stream_name: &str, shard_count: i32) -> Result<()>;
    async fn describe_stream(&self, stream_name: &str) -> Result<DescribeStreamOutput>;
    async fn delete_stream(&self, stream_name: &str, stream_arn: &str) -> Result<()>;
    async fn put_record(
        &self,
        stream_name: &str,
        stream_arn: &str,
        partition_key: &str,
        data: Vec<u8>,
    ) -> Result<PutRecordOutput>;
    async fn get_shards(
        &self,
        stream_name: &str,
        stream_arn: &str,
        next_token: Option<String>,
    ) -> Result<GetShardsOutput>;
    async fn get_iterator(
        &self,
        stream_name: &str,
        stream_arn: &str,
        shard_id: &str,
    ) -> Result<GetIteratorOutput>;
    async fn get_records(
        &self,
        stream_arn: &str,
        shard_id: &str,
        iterator: &str,
    ) -> Result<GetRecordsOutput>;
}

pub use kinesis::{KinesisClient, KinesisClientBuilder};
#[cfg(test)]
pub use mock::MockClient;
