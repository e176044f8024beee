//! Waiting on eventually-consistent state transitions of the remote stream.
//!
//! A wait polls a check with exponential backoff until the check reports the
//! awaited state, the attempts run out, the deadline passes, or the
//! cancellation token fires, whichever comes first.

use crate::{Error, Result};

use backon::{ExponentialBuilder, Retryable};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// Total number of checks, the first one included.
    pub max_attempts: usize,
    pub deadline: Option<Duration>,
    pub jitter: bool,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            max_attempts: 120,
            deadline: Some(Duration::from_secs(300)),
            jitter: true,
        }
    }
}

enum Polled {
    Pending,
    Failed(Error),
}

impl PollPolicy {
    fn backoff(&self) -> ExponentialBuilder {
        let builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_attempts.saturating_sub(1));

        if self.jitter {
            builder.with_jitter()
        } else {
            builder
        }
    }

    /// Poll `check` until it yields `Some`.
    ///
    /// An `Err` from the check ends the wait immediately.
    pub async fn wait_for<T, F, Fut>(
        &self,
        what: &str,
        token: &CancellationToken,
        mut check: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let started = Instant::now();
        let attempts = AtomicUsize::new(0);

        let retry = (|| {
            attempts.fetch_add(1, Ordering::Relaxed);
            let checked = check();
            async move {
                match checked.await {
                    Ok(Some(value)) => Ok(value),
                    Ok(None) => Err(Polled::Pending),
                    Err(err) => Err(Polled::Failed(err)),
                }
            }
        })
        .retry(self.backoff())
        .sleep(tokio::time::sleep)
        .when(|polled| matches!(polled, Polled::Pending))
        .notify(|_, delay| debug!("Still waiting for {what}, next poll in {delay:?}"));

        let polling = async {
            match self.deadline {
                Some(deadline) => tokio::time::timeout(deadline, retry).await.map_err(|_| {
                    Error::DeadlineExceeded {
                        what: what.into(),
                        elapsed: started.elapsed(),
                    }
                }),
                None => Ok(retry.await),
            }
        };

        let polled = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(Error::Cancelled),
            polled = polling => polled?,
        };

        match polled {
            Ok(value) => {
                debug!(
                    "Observed {what} after {} attempts in {:?}",
                    attempts.load(Ordering::Relaxed),
                    started.elapsed()
                );
                Ok(value)
            }
            Err(Polled::Pending) => Err(Error::Exhausted {
                what: what.into(),
                attempts: attempts.load(Ordering::Relaxed),
            }),
            Err(Polled::Failed(err)) => Err(err),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_policy() -> PollPolicy {
    PollPolicy {
        min_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(100),
        max_attempts: 20,
        deadline: Some(Duration::from_secs(60)),
        jitter: false,
    }
}
