use crate::client::Client;
use crate::Result;

use std::sync::Arc;
use tracing::{debug, info};

pub const RECORD_COUNT: usize = 10;

/// Writes records `0` to `9`, the decimal index serving as both partition
/// key and payload. One `PutRecord` call per record.
pub struct RecordWriter {
    client: Arc<dyn Client>,
}

impl RecordWriter {
    pub fn new(client: Arc<dyn Client>) -> Self {
        Self { client }
    }

    pub async fn write_batch(&self, stream_name: &str, stream_arn: &str) -> Result<()> {
        for index in 0..RECORD_COUNT {
            let key = index.to_string();
            let output = self
                .client
                .put_record(stream_name, stream_arn, &key, key.clone().into_bytes())
                .await?;

            debug!(
                "Put record {key} into {} at {}",
                output.shard_id, output.sequence_number
            );
        }

        info!("Wrote {RECORD_COUNT} records to {stream_name}");
        Ok(())
    }
}
