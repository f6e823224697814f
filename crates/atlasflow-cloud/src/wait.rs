//! Status polling for remote resources
//!
//! Waits for a remote entity to leave a set of pending statuses. The status
//! machine belongs to the remote service; this loop only observes it on a
//! fixed interval after an initial delay, bounded by an overall timeout.
//! Dropping the returned future stops polling.

use crate::error::{CloudError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Polling configuration
#[derive(Debug, Clone)]
pub struct StateChangeConf {
    /// Statuses that mean "keep waiting"
    pub pending: Vec<String>,

    /// Statuses that end the wait successfully
    pub target: Vec<String>,

    /// Statuses that end the wait with an error
    pub failed: Vec<String>,

    /// Delay before the first refresh
    pub delay: Duration,

    /// Interval between refreshes
    pub poll_interval: Duration,

    /// Overall deadline, measured from the start of the wait
    pub timeout: Duration,
}

impl StateChangeConf {
    pub fn new(pending: &[&str], target: &[&str]) -> Self {
        Self {
            pending: pending.iter().map(|s| s.to_string()).collect(),
            target: target.iter().map(|s| s.to_string()).collect(),
            failed: Vec::new(),
            delay: Duration::ZERO,
            poll_interval: Duration::from_secs(10),
            timeout: Duration::from_secs(600),
        }
    }

    pub fn failed_on(mut self, failed: &[&str]) -> Self {
        self.failed = failed.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_timing(mut self, timing: &PollTiming) -> Self {
        self.delay = timing.delay;
        self.poll_interval = timing.poll_interval;
        self.timeout = timing.timeout;
        self
    }

    /// Poll `refresh` until a target status, a failure, or the deadline
    pub async fn wait<T, F, Fut>(&self, resource: &str, mut refresh: F) -> Result<WaitOutcome<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Refresh<T>>>,
    {
        let deadline = Instant::now() + self.timeout;

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        loop {
            match refresh().await? {
                Refresh::Gone => {
                    tracing::debug!("{} no longer exists, stopping wait", resource);
                    return Ok(WaitOutcome::Deleted);
                }
                Refresh::Status(value, status) => {
                    tracing::debug!("status for {}: {}", resource, status);

                    if self.target.iter().any(|t| *t == status) {
                        return Ok(WaitOutcome::Reached(value, status));
                    }
                    if self.failed.iter().any(|f| *f == status) {
                        return Err(CloudError::ResourceFailed {
                            resource: resource.to_string(),
                            status,
                        });
                    }
                    if !self.pending.iter().any(|p| *p == status) {
                        return Err(CloudError::UnexpectedState {
                            state: status,
                            target: self.target.join(", "),
                        });
                    }
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(CloudError::Timeout(format!(
                    "{} did not reach {} within {:?}",
                    resource,
                    self.target.join(", "),
                    self.timeout
                )));
            }
            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}

/// Timing knobs shared by every wait a provider performs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTiming {
    pub delay: Duration,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl PollTiming {
    pub fn new(delay: Duration, poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            delay,
            poll_interval,
            timeout,
        }
    }
}

/// Result of a single refresh
#[derive(Debug, Clone)]
pub enum Refresh<T> {
    /// The remote entity and its current status
    Status(T, String),
    /// The remote entity returned "not found"
    Gone,
}

/// Result of a completed wait
#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome<T> {
    Reached(T, String),
    Deleted,
}

impl<T> WaitOutcome<T> {
    pub fn is_deleted(&self) -> bool {
        matches!(self, WaitOutcome::Deleted)
    }
}
