use crate::client::Client;
use crate::poll::PollPolicy;
use crate::{Error, Result};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const SHARD_COUNT: i32 = 1;

/// Creates the stream unless it exists and waits until it is usable.
pub struct StreamProvisioner {
    client: Arc<dyn Client>,
    policy: PollPolicy,
}

impl StreamProvisioner {
    pub fn new(client: Arc<dyn Client>, policy: PollPolicy) -> Self {
        Self { client, policy }
    }

    /// Returns the ARN of the stream once it is neither `CREATING` nor `DELETING`.
    ///
    /// An existing stream with the same name is reused. One left in `DELETING`
    /// by an interrupted run is waited out and created again.
    pub async fn ensure(&self, stream_name: &str, token: &CancellationToken) -> Result<String> {
        self.create(stream_name).await?;

        let what = format!("stream `{stream_name}` to become usable");

        self.policy
            .wait_for(&what, token, move || async move {
                match self.client.describe_stream(stream_name).await {
                    Ok(output) => {
                        debug!(
                            "Stream {stream_name} is {:?} with {} open shard(s)",
                            output.status, output.open_shard_count
                        );
                        Ok(output.status.is_settled().then_some(output.stream_arn))
                    }
                    Err(Error::NotFound(_)) => self.create(stream_name).await.map(|_| None),
                    Err(err) => Err(err),
                }
            })
            .await
    }

    async fn create(&self, stream_name: &str) -> Result<()> {
        match self.client.create_stream(stream_name, SHARD_COUNT).await {
            Ok(()) => info!("Creating stream {stream_name} with {SHARD_COUNT} shard(s)"),
            Err(Error::AlreadyExists(_)) => info!("Stream {stream_name} already exists"),
            Err(err) => return Err(err),
        }
        Ok(())
    }
}
