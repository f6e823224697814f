//! Managed resource handlers
//!
//! Each handler decodes its typed record, makes one Atlas call (plus status
//! polling where the entity is provisioned asynchronously), then reconciles
//! the response into the record.

pub mod alert_configuration;
pub mod cloud_backup_snapshot;
pub mod cluster;
pub mod project;

pub use alert_configuration::{AlertConfigurationResource, SENSITIVE_NOTIFICATION_FIELDS};
pub use cloud_backup_snapshot::CloudBackupSnapshotResource;
pub use cluster::ClusterResource;
pub use project::ProjectResource;

use crate::client::AtlasApi;
use crate::error::AtlasError;
use crate::models::Cluster;
use atlasflow_cloud::{CloudError, Refresh, Result};

/// Map a lookup result, turning 404 into `None`
pub(crate) fn found<T>(
    result: std::result::Result<T, AtlasError>,
    operation: &str,
    id: &str,
) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => {
            tracing::warn!("{} ({}) no longer exists remotely", operation, id);
            Ok(None)
        }
        Err(e) => Err(e.during(operation, id)),
    }
}

/// Whether `value` is a 24 character hexadecimal Atlas object id
pub(crate) fn is_object_id(value: &str) -> bool {
    value.len() == 24 && value.chars().all(|c| c.is_ascii_hexdigit())
}

pub(crate) fn require(value: &str, attribute: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CloudError::Validation(format!(
            "'{}' must be set",
            attribute
        )));
    }
    Ok(())
}

/// Refresh step for waits on a cluster's `stateName`
pub(crate) async fn refresh_cluster(
    api: &dyn AtlasApi,
    project_id: &str,
    cluster_name: &str,
) -> Result<Refresh<Cluster>> {
    match api.get_cluster(project_id, cluster_name).await {
        Ok(cluster) => {
            let state = cluster.state_name.clone().unwrap_or_default();
            Ok(Refresh::Status(cluster, state))
        }
        Err(e) if e.is_not_found() => Ok(Refresh::Gone),
        Err(e) => Err(e.during("refreshing cluster", cluster_name)),
    }
}
