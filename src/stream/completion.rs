use crate::{Error, Result};

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Shards of one read that have not been drained to their end yet.
///
/// A shard created by a merge has two parents. Its lineage runs it after the
/// first one; it waits here for the adjacent one.
#[derive(Debug, Clone)]
pub struct Completion {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    pending: Mutex<HashSet<String>>,
    notify: Notify,
}

impl Completion {
    pub fn new<I, T>(shard_ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let pending = shard_ids.into_iter().map(Into::into).collect();
        Self {
            shared: Arc::new(Shared {
                pending: Mutex::new(pending),
                notify: Notify::new(),
            }),
        }
    }

    pub fn finish(&self, shard_id: &str) {
        self.pending().remove(shard_id);
        self.shared.notify.notify_waiters();
    }

    /// Shards outside this read (trimmed or unlisted) count as finished.
    pub fn is_finished(&self, shard_id: &str) -> bool {
        !self.pending().contains(shard_id)
    }

    pub async fn wait_for(&self, shard_id: &str, token: &CancellationToken) -> Result<()> {
        loop {
            // Register interest before checking to avoid missing a wakeup.
            let notified = self.shared.notify.notified();

            if self.is_finished(shard_id) {
                return Ok(());
            }

            tokio::select! {
                biased;
                _ = token.cancelled() => return Err(Error::Cancelled),
                _ = notified => {}
            }
        }
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        // A poisoned set is still a valid set of ids.
        self.shared
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
