//! Wait timings for asynchronously provisioned entities

use atlasflow_cloud::PollTiming;
use std::time::Duration;

/// Cluster statuses that mean "still converging"
pub const CLUSTER_PENDING: &[&str] = &["CREATING", "UPDATING", "REPAIRING", "REPEATING"];
pub const CLUSTER_IDLE: &str = "IDLE";

/// Snapshot statuses
pub const SNAPSHOT_PENDING: &[&str] = &["queued", "inProgress"];
pub const SNAPSHOT_COMPLETED: &str = "completed";
pub const SNAPSHOT_FAILED: &str = "failed";

/// Timings for every wait the provider performs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    pub cluster_create: PollTiming,
    pub cluster_update: PollTiming,
    pub cluster_delete: PollTiming,
    /// Wait for the source cluster before taking a snapshot
    pub snapshot_cluster_idle: PollTiming,
    pub snapshot_complete: PollTiming,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            cluster_create: PollTiming::new(minutes(3), Duration::from_secs(60), hours(3)),
            cluster_update: PollTiming::new(minutes(1), Duration::from_secs(30), hours(3)),
            cluster_delete: PollTiming::new(minutes(1), Duration::from_secs(30), hours(3)),
            snapshot_cluster_idle: PollTiming::new(
                minutes(3),
                Duration::from_secs(10),
                minutes(10),
            ),
            snapshot_complete: PollTiming::new(minutes(1), Duration::from_secs(60), hours(1)),
        }
    }
}

impl PollSettings {
    /// No initial delays and one-second intervals, deadlines unchanged
    pub fn fast() -> Self {
        let shrink = |t: PollTiming| PollTiming::new(Duration::ZERO, Duration::from_secs(1), t.timeout);
        let defaults = Self::default();
        Self {
            cluster_create: shrink(defaults.cluster_create),
            cluster_update: shrink(defaults.cluster_update),
            cluster_delete: shrink(defaults.cluster_delete),
            snapshot_cluster_idle: shrink(defaults.snapshot_cluster_idle),
            snapshot_complete: shrink(defaults.snapshot_complete),
        }
    }
}

fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

fn hours(n: u64) -> Duration {
    Duration::from_secs(n * 3600)
}
