use super::{Lineages, ReadContext, ReadPolicy, Shard};
use crate::client::{Client, GetShardsOutput};
use crate::types::Records;
use crate::Result;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Reads every shard of a stream from its trim horizon to its current tip.
pub struct RecordReader {
    client: Arc<dyn Client>,
    policy: ReadPolicy,
}

impl RecordReader {
    pub fn new(client: Arc<dyn Client>, policy: ReadPolicy) -> Self {
        Self { client, policy }
    }

    pub async fn read_all(
        &self,
        stream_name: &str,
        stream_arn: &str,
        token: &CancellationToken,
    ) -> Result<Records> {
        let shards = get_all_shards(Arc::clone(&self.client), stream_name, stream_arn).await?;
        let lineages = Lineages::from(shards);
        if lineages.is_empty() {
            warn!("Stream {stream_name} lists no shards");
            return Ok(Records::new());
        }
        info!("Reading {stream_name} across {} lineage(s)", lineages.len());

        let context = ReadContext {
            client: Arc::clone(&self.client),
            stream_name: stream_name.into(),
            stream_arn: stream_arn.into(),
            policy: self.policy.clone(),
            token: token.child_token(),
        };

        let records = lineages.drain(context).await?;
        info!("Read {} records from {stream_name}", records.len());
        Ok(records)
    }
}

async fn get_all_shards(
    client: Arc<dyn Client>,
    stream_name: &str,
    stream_arn: &str,
) -> Result<Vec<Shard>> {
    let GetShardsOutput {
        mut shards,
        mut next_token,
    } = client.get_shards(stream_name, stream_arn, None).await?;

    while next_token.is_some() {
        let mut output = client
            .get_shards(stream_name, stream_arn, next_token.take())
            .await?;
        shards.append(&mut output.shards);
        next_token = output.next_token;
    }

    Ok(shards)
}
