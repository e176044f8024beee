use crate::client::Client;
use crate::poll::PollPolicy;
use crate::{Error, Result};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Deletes the stream and waits until the service no longer knows it.
pub struct StreamDecommissioner {
    client: Arc<dyn Client>,
    policy: PollPolicy,
}

impl StreamDecommissioner {
    pub fn new(client: Arc<dyn Client>, policy: PollPolicy) -> Self {
        Self { client, policy }
    }

    pub async fn tear_down(
        &self,
        stream_name: &str,
        stream_arn: &str,
        token: &CancellationToken,
    ) -> Result<()> {
        self.client.delete_stream(stream_name, stream_arn).await?;
        info!("Deleting stream {stream_name}");

        let client = &self.client;
        let what = format!("stream `{stream_name}` to be deleted");

        self.policy
            .wait_for(&what, token, move || async move {
                match client.describe_stream(stream_name).await {
                    Ok(output) => {
                        debug!("Stream {stream_name} is still {:?}", output.status);
                        Ok(None)
                    }
                    Err(Error::NotFound(_)) => Ok(Some(())),
                    Err(err) => Err(err),
                }
            })
            .await
    }
}
