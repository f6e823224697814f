//! `mongodbatlas_cloud_backup_snapshot`
//!
//! Every input forces replacement, so there is no real update. Creation
//! waits for the source cluster to settle, requests the snapshot, then
//! waits for it to complete.

use super::{found, refresh_cluster, require};
use crate::client::AtlasApi;
use crate::models::{CloudProviderSnapshot, SnapshotMember};
use crate::poll::{
    CLUSTER_IDLE, CLUSTER_PENDING, PollSettings, SNAPSHOT_COMPLETED, SNAPSHOT_FAILED,
    SNAPSHOT_PENDING,
};
use async_trait::async_trait;
use atlasflow_cloud::{
    CloudError, Refresh, Resource, Result, StateChangeConf, WaitOutcome, decode_state_id,
    encode_state_id,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};

const ID_KEYS: &[&str] = &["cluster_name", "project_id", "snapshot_id"];
const IMPORT_FORMAT: &str = "{project_id}-{cluster_name}-{snapshot_id}";

static IMPORT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^([0-9a-fA-F]{24})-(.*)-([0-9a-fA-F]{24})$").expect("valid snapshot import regex")
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloudBackupSnapshotModel {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub retention_in_days: i64,
    #[serde(default)]
    pub snapshot_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub master_key_uuid: Option<String>,
    #[serde(default)]
    pub mongod_version: Option<String>,
    #[serde(default)]
    pub snapshot_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub storage_size_bytes: Option<i64>,
    #[serde(default, rename = "type")]
    pub snapshot_kind: Option<String>,
    #[serde(default)]
    pub cloud_provider: Option<String>,
    #[serde(default)]
    pub replica_set_name: Option<String>,
    #[serde(default)]
    pub members: Vec<SnapshotMemberModel>,
    #[serde(default)]
    pub snapshot_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMemberModel {
    pub cloud_provider: String,
    pub id: String,
    pub replica_set_name: String,
}

impl From<SnapshotMember> for SnapshotMemberModel {
    fn from(member: SnapshotMember) -> Self {
        Self {
            cloud_provider: member.cloud_provider,
            id: member.id,
            replica_set_name: member.replica_set_name,
        }
    }
}

pub struct CloudBackupSnapshotResource {
    api: Arc<dyn AtlasApi>,
    poll: PollSettings,
}

impl CloudBackupSnapshotResource {
    pub fn new(api: Arc<dyn AtlasApi>, poll: PollSettings) -> Self {
        Self { api, poll }
    }

    async fn refresh_snapshot(
        &self,
        project_id: &str,
        cluster_name: &str,
        snapshot_id: &str,
    ) -> Result<Refresh<CloudProviderSnapshot>> {
        match self
            .api
            .get_snapshot(project_id, cluster_name, snapshot_id)
            .await
        {
            Ok(snapshot) => {
                let status = snapshot.status.clone().unwrap_or_default();
                Ok(Refresh::Status(snapshot, status))
            }
            Err(e) if e.is_not_found() => Ok(Refresh::Gone),
            Err(e) => Err(e.during("refreshing snapshot", snapshot_id)),
        }
    }
}

struct SnapshotPath {
    project_id: String,
    cluster_name: String,
    snapshot_id: String,
}

fn state_path(state: &CloudBackupSnapshotModel) -> Result<SnapshotPath> {
    let raw = state.id.as_deref().unwrap_or_default();
    let id = decode_state_id(raw, ID_KEYS)?;
    Ok(SnapshotPath {
        project_id: id.component("project_id")?.to_string(),
        cluster_name: id.component("cluster_name")?.to_string(),
        snapshot_id: id.component("snapshot_id")?.to_string(),
    })
}

/// Parse `{project_id}-{cluster_name}-{snapshot_id}`
///
/// Both ids are 24 hex characters; the cluster name is everything between
/// them and may itself contain hyphens.
fn split_snapshot_import_id(import_id: &str) -> Result<SnapshotPath> {
    let caps = IMPORT_ID
        .captures(import_id)
        .ok_or_else(|| CloudError::identifier_format(import_id, IMPORT_FORMAT))?;
    Ok(SnapshotPath {
        project_id: caps[1].to_string(),
        cluster_name: caps[2].to_string(),
        snapshot_id: caps[3].to_string(),
    })
}

fn validate(plan: &CloudBackupSnapshotModel) -> Result<()> {
    require(&plan.project_id, "project_id")?;
    require(&plan.cluster_name, "cluster_name")?;
    require(&plan.description, "description")?;
    if plan.retention_in_days < 1 {
        return Err(CloudError::Validation(
            "'retention_in_days' must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn reconcile(
    snapshot: CloudProviderSnapshot,
    current: &CloudBackupSnapshotModel,
) -> CloudBackupSnapshotModel {
    CloudBackupSnapshotModel {
        id: current.id.clone(),
        project_id: current.project_id.clone(),
        cluster_name: current.cluster_name.clone(),
        description: if current.description.is_empty() {
            snapshot.description.unwrap_or_default()
        } else {
            current.description.clone()
        },
        retention_in_days: if current.retention_in_days > 0 {
            current.retention_in_days
        } else {
            snapshot.retention_in_days.unwrap_or_default()
        },
        snapshot_id: snapshot.id,
        created_at: snapshot.created_at,
        expires_at: snapshot.expires_at,
        master_key_uuid: snapshot.master_key_uuid,
        mongod_version: snapshot.mongod_version,
        snapshot_type: snapshot.snapshot_type,
        status: snapshot.status,
        storage_size_bytes: snapshot.storage_size_bytes,
        snapshot_kind: snapshot.snapshot_kind,
        cloud_provider: snapshot.cloud_provider,
        replica_set_name: snapshot.replica_set_name,
        members: snapshot.members.into_iter().map(Into::into).collect(),
        snapshot_ids: snapshot.snapshot_ids,
    }
}

#[async_trait]
impl Resource for CloudBackupSnapshotResource {
    type Model = CloudBackupSnapshotModel;
    const TYPE_NAME: &'static str = "mongodbatlas_cloud_backup_snapshot";

    async fn create(&self, plan: CloudBackupSnapshotModel) -> Result<CloudBackupSnapshotModel> {
        validate(&plan)?;
        let project_id = plan.project_id.as_str();
        let cluster_name = plan.cluster_name.as_str();

        let api = self.api.as_ref();
        let idle = StateChangeConf::new(CLUSTER_PENDING, &[CLUSTER_IDLE])
            .with_timing(&self.poll.snapshot_cluster_idle)
            .wait(&format!("cluster {}", cluster_name), || {
                refresh_cluster(api, project_id, cluster_name)
            })
            .await?;
        if idle.is_deleted() {
            return Err(CloudError::ResourceNotFound(format!(
                "cluster {} in project {}",
                cluster_name, project_id
            )));
        }

        let request = CloudProviderSnapshot {
            description: Some(plan.description.clone()),
            retention_in_days: Some(plan.retention_in_days),
            ..Default::default()
        };
        let created = self
            .api
            .create_snapshot(project_id, cluster_name, &request)
            .await
            .map_err(|e| e.during("taking a snapshot", cluster_name))?;
        let snapshot_id = created.id.clone().ok_or_else(|| {
            CloudError::api("taking a snapshot", cluster_name, "response carried no id")
        })?;
        tracing::info!(
            "Snapshot {} of {} requested, waiting for {}",
            snapshot_id,
            cluster_name,
            SNAPSHOT_COMPLETED
        );

        let snapshot_ref = snapshot_id.as_str();
        let outcome = StateChangeConf::new(SNAPSHOT_PENDING, &[SNAPSHOT_COMPLETED])
            .failed_on(&[SNAPSHOT_FAILED])
            .with_timing(&self.poll.snapshot_complete)
            .wait(&format!("snapshot {}", snapshot_id), || {
                self.refresh_snapshot(project_id, cluster_name, snapshot_ref)
            })
            .await?;
        let snapshot = match outcome {
            WaitOutcome::Reached(snapshot, _) => snapshot,
            WaitOutcome::Deleted => {
                return Err(CloudError::ResourceNotFound(format!(
                    "snapshot {} disappeared before completing",
                    snapshot_id
                )));
            }
        };

        let id = encode_state_id(&[
            ("project_id", project_id),
            ("cluster_name", cluster_name),
            ("snapshot_id", snapshot_id.as_str()),
        ]);
        let mut current = plan.clone();
        current.id = Some(id);
        Ok(reconcile(snapshot, &current))
    }

    async fn read(&self, state: CloudBackupSnapshotModel) -> Result<Option<CloudBackupSnapshotModel>> {
        let path = state_path(&state)?;
        let snapshot = found(
            self.api
                .get_snapshot(&path.project_id, &path.cluster_name, &path.snapshot_id)
                .await,
            "getting snapshot",
            &path.snapshot_id,
        )?;
        Ok(snapshot.map(|s| reconcile(s, &state)))
    }

    async fn update(
        &self,
        state: CloudBackupSnapshotModel,
        plan: CloudBackupSnapshotModel,
    ) -> Result<CloudBackupSnapshotModel> {
        let unchanged = plan.project_id == state.project_id
            && plan.cluster_name == state.cluster_name
            && plan.description == state.description
            && plan.retention_in_days == state.retention_in_days;
        if !unchanged {
            return Err(CloudError::Validation(
                "snapshot attributes cannot change in place; delete and create it instead"
                    .to_string(),
            ));
        }
        Ok(state)
    }

    async fn delete(&self, state: CloudBackupSnapshotModel) -> Result<()> {
        let path = state_path(&state)?;
        self.api
            .delete_snapshot(&path.project_id, &path.cluster_name, &path.snapshot_id)
            .await
            .map_err(|e| e.during("deleting a snapshot", &path.snapshot_id))?;
        tracing::info!("Deleted snapshot {}", path.snapshot_id);
        Ok(())
    }

    async fn import(&self, import_id: &str) -> Result<CloudBackupSnapshotModel> {
        let path = split_snapshot_import_id(import_id)?;
        Ok(CloudBackupSnapshotModel {
            id: Some(encode_state_id(&[
                ("project_id", path.project_id.as_str()),
                ("cluster_name", path.cluster_name.as_str()),
                ("snapshot_id", path.snapshot_id.as_str()),
            ])),
            project_id: path.project_id,
            cluster_name: path.cluster_name,
            ..Default::default()
        })
    }
}
