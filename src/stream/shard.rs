use crate::client::{Client, GetRecordsOutput};
use crate::types::Records;
use crate::{Error, Result};

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How a single shard is drained.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadPolicy {
    /// Upper bound of `GetRecords` calls per shard. A shard that never reports
    /// zero lag is abandoned once it is reached.
    pub max_batches_per_shard: usize,
    /// Pause before the next `GetRecords` call when a batch came back empty
    /// but the shard has not caught up yet.
    pub idle_interval: Duration,
}

impl Default for ReadPolicy {
    fn default() -> Self {
        Self {
            max_batches_per_shard: 1_000,
            idle_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shard {
    id: String,
    iterator: Option<String>,
    parent: Option<String>,
    adjacent_parent: Option<String>,
}

impl Shard {
    pub fn new<T: Into<String>>(id: &str, parent: Option<T>) -> Self {
        Self {
            id: id.into(),
            iterator: None,
            parent: parent.map(|s| s.into()),
            adjacent_parent: None,
        }
    }

    /// The second parent of a shard created by merging two shards.
    pub fn with_adjacent_parent<T: Into<String>>(self, adjacent_parent: Option<T>) -> Self {
        Self {
            adjacent_parent: adjacent_parent.map(|s| s.into()),
            ..self
        }
    }

    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn adjacent_parent(&self) -> Option<&str> {
        self.adjacent_parent.as_deref()
    }

    pub fn iterator(&self) -> Option<&str> {
        self.iterator.as_deref()
    }

    pub async fn set_iterator(
        &mut self,
        client: Arc<dyn Client>,
        stream_name: &str,
        stream_arn: &str,
    ) -> Result<()> {
        let output = client
            .get_iterator(stream_name, stream_arn, self.id())
            .await?;
        self.iterator = output.iterator;
        Ok(())
    }

    /// Fetch one batch. The returned shard is `None` once there is nothing more
    /// to read right now: either the shard is closed or the reader has caught up.
    pub async fn get_records(
        self,
        client: Arc<dyn Client>,
        stream_arn: &str,
    ) -> Result<(Option<Shard>, Records)> {
        match self.iterator.as_deref() {
            Some(iterator) => {
                let GetRecordsOutput {
                    records,
                    next_iterator,
                    millis_behind_latest,
                } = client.get_records(stream_arn, self.id(), iterator).await?;

                if next_iterator.is_none() {
                    debug!("Shard {} is closed", self.id);
                    return Ok((None, records));
                }

                if millis_behind_latest == Some(0) {
                    debug!("Caught up with the tip of shard {}", self.id);
                    return Ok((None, records));
                }

                let shard = Shard {
                    iterator: next_iterator,
                    ..self
                };
                Ok((Some(shard), records))
            }
            None => Ok((None, Records::new())),
        }
    }

    /// Read batches until [`Shard::get_records`] says stop, the batch cap is
    /// reached or the token is cancelled. Records keep their shard order.
    pub async fn drain(
        self,
        client: Arc<dyn Client>,
        stream_arn: &str,
        policy: &ReadPolicy,
        token: &CancellationToken,
    ) -> Result<Records> {
        let shard_id = self.id.clone();
        let mut records = Records::new();
        let mut current = Some(self);
        let mut batches = 0;

        while let Some(shard) = current.take() {
            if token.is_cancelled() {
                return Err(Error::Cancelled);
            }

            if batches >= policy.max_batches_per_shard {
                warn!(
                    "Stopped reading {shard_id} after {batches} batches without catching up"
                );
                break;
            }

            let (next, mut batch) = shard.get_records(Arc::clone(&client), stream_arn).await?;
            batches += 1;

            let idle = batch.is_empty();
            records.append(&mut batch);

            if next.is_some() && idle {
                tokio::select! {
                    _ = token.cancelled() => return Err(Error::Cancelled),
                    _ = tokio::time::sleep(policy.idle_interval) => {}
                }
            }

            current = next;
        }

        debug!("Read {} records from {shard_id}", records.len());
        Ok(records)
    }
}
