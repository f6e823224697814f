//! `mongodbatlas_cluster`

use super::{found, refresh_cluster, require};
use crate::client::AtlasApi;
use crate::models::{Cluster, ClusterProviderSettings};
use crate::poll::{CLUSTER_IDLE, CLUSTER_PENDING, PollSettings};
use async_trait::async_trait;
use atlasflow_cloud::reconcile::overwrite_if_set;
use atlasflow_cloud::{
    CloudError, Resource, Result, StateChangeConf, WaitOutcome, decode_state_id, encode_state_id,
    split_import_id,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const ID_KEYS: &[&str] = &["cluster_name", "project_id"];
const IMPORT_FORMAT: &str = "{project_id}-{cluster_name}";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterModel {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub provider_name: String,
    #[serde(default)]
    pub provider_instance_size_name: String,
    #[serde(default)]
    pub provider_region_name: Option<String>,
    #[serde(default)]
    pub disk_size_gb: Option<f64>,
    #[serde(default)]
    pub mongo_db_major_version: Option<String>,
    #[serde(default)]
    pub cloud_backup: Option<bool>,
    #[serde(default)]
    pub cluster_id: Option<String>,
    #[serde(default)]
    pub mongo_db_version: Option<String>,
    #[serde(default)]
    pub state_name: Option<String>,
    #[serde(default)]
    pub connection_string_standard_srv: Option<String>,
}

pub struct ClusterResource {
    api: Arc<dyn AtlasApi>,
    poll: PollSettings,
}

impl ClusterResource {
    pub fn new(api: Arc<dyn AtlasApi>, poll: PollSettings) -> Self {
        Self { api, poll }
    }

    async fn wait_idle(
        &self,
        conf: StateChangeConf,
        project_id: &str,
        cluster_name: &str,
    ) -> Result<Cluster> {
        let api = self.api.as_ref();
        let outcome = conf
            .wait(&format!("cluster {}", cluster_name), || {
                refresh_cluster(api, project_id, cluster_name)
            })
            .await?;
        match outcome {
            WaitOutcome::Reached(cluster, _) => Ok(cluster),
            WaitOutcome::Deleted => Err(CloudError::ResourceNotFound(format!(
                "cluster {} disappeared while waiting for {}",
                cluster_name, CLUSTER_IDLE
            ))),
        }
    }
}

fn state_id(state: &ClusterModel) -> Result<(String, String)> {
    let raw = state.id.as_deref().unwrap_or_default();
    let id = decode_state_id(raw, ID_KEYS)?;
    Ok((
        id.component("project_id")?.to_string(),
        id.component("cluster_name")?.to_string(),
    ))
}

fn validate(plan: &ClusterModel) -> Result<()> {
    require(&plan.project_id, "project_id")?;
    require(&plan.name, "name")?;
    require(&plan.provider_name, "provider_name")?;
    require(&plan.provider_instance_size_name, "provider_instance_size_name")?;
    if let Some(size) = plan.disk_size_gb {
        if size <= 0.0 {
            return Err(CloudError::Validation(
                "'disk_size_gb' must be greater than zero".to_string(),
            ));
        }
    }
    Ok(())
}

fn provider_settings(plan: &ClusterModel) -> ClusterProviderSettings {
    ClusterProviderSettings {
        provider_name: Some(plan.provider_name.clone()),
        instance_size_name: Some(plan.provider_instance_size_name.clone()),
        region_name: plan.provider_region_name.clone(),
    }
}

/// Merge a cluster response into state
fn reconcile(cluster: Cluster, current: &ClusterModel) -> ClusterModel {
    let settings = cluster.provider_settings.unwrap_or_default();
    ClusterModel {
        id: current.id.clone(),
        project_id: current.project_id.clone(),
        name: cluster.name.unwrap_or_else(|| current.name.clone()),
        provider_name: settings.provider_name.unwrap_or_default(),
        provider_instance_size_name: settings.instance_size_name.unwrap_or_default(),
        provider_region_name: if current.id.is_some() && current.provider_name.is_empty() {
            // freshly imported; nothing configured yet to compare against
            settings.region_name
        } else {
            overwrite_if_set(&current.provider_region_name, settings.region_name)
        },
        disk_size_gb: cluster.disk_size_gb,
        mongo_db_major_version: cluster.mongo_db_major_version,
        cloud_backup: cluster.cloud_backup,
        cluster_id: cluster.id,
        mongo_db_version: cluster.mongo_db_version,
        state_name: cluster.state_name,
        connection_string_standard_srv: cluster.connection_strings.and_then(|c| c.standard_srv),
    }
}

#[async_trait]
impl Resource for ClusterResource {
    type Model = ClusterModel;
    const TYPE_NAME: &'static str = "mongodbatlas_cluster";

    async fn create(&self, plan: ClusterModel) -> Result<ClusterModel> {
        validate(&plan)?;

        let request = Cluster {
            name: Some(plan.name.clone()),
            provider_settings: Some(provider_settings(&plan)),
            disk_size_gb: plan.disk_size_gb,
            mongo_db_major_version: plan.mongo_db_major_version.clone(),
            cloud_backup: plan.cloud_backup,
            ..Default::default()
        };
        self.api
            .create_cluster(&plan.project_id, &request)
            .await
            .map_err(|e| e.during("creating cluster", &plan.name))?;
        tracing::info!("Cluster {} requested, waiting for {}", plan.name, CLUSTER_IDLE);

        let conf = StateChangeConf::new(CLUSTER_PENDING, &[CLUSTER_IDLE])
            .with_timing(&self.poll.cluster_create);
        let cluster = self.wait_idle(conf, &plan.project_id, &plan.name).await?;

        let mut current = plan;
        current.id = Some(encode_state_id(&[
            ("project_id", current.project_id.as_str()),
            ("cluster_name", current.name.as_str()),
        ]));
        Ok(reconcile(cluster, &current))
    }

    async fn read(&self, state: ClusterModel) -> Result<Option<ClusterModel>> {
        let (project_id, cluster_name) = state_id(&state)?;
        let cluster = found(
            self.api.get_cluster(&project_id, &cluster_name).await,
            "reading cluster",
            &cluster_name,
        )?;
        Ok(cluster.map(|c| reconcile(c, &state)))
    }

    async fn update(&self, state: ClusterModel, plan: ClusterModel) -> Result<ClusterModel> {
        let (project_id, cluster_name) = state_id(&state)?;
        if plan.project_id != project_id || plan.name != cluster_name {
            return Err(CloudError::Validation(
                "project_id and name cannot change for an existing cluster; delete and create it instead"
                    .to_string(),
            ));
        }
        validate(&plan)?;

        let mut request = Cluster::default();
        if plan.provider_name != state.provider_name
            || plan.provider_instance_size_name != state.provider_instance_size_name
            || plan.provider_region_name != state.provider_region_name
        {
            request.provider_settings = Some(provider_settings(&plan));
        }
        if plan.disk_size_gb.is_some() && plan.disk_size_gb != state.disk_size_gb {
            request.disk_size_gb = plan.disk_size_gb;
        }
        if plan.mongo_db_major_version.is_some()
            && plan.mongo_db_major_version != state.mongo_db_major_version
        {
            request.mongo_db_major_version = plan.mongo_db_major_version.clone();
        }
        if plan.cloud_backup.is_some() && plan.cloud_backup != state.cloud_backup {
            request.cloud_backup = plan.cloud_backup;
        }

        if request == Cluster::default() {
            tracing::debug!("Cluster {} has no changes to send", cluster_name);
        } else {
            self.api
                .update_cluster(&project_id, &cluster_name, &request)
                .await
                .map_err(|e| e.during("updating cluster", &cluster_name))?;
        }

        let conf = StateChangeConf::new(CLUSTER_PENDING, &[CLUSTER_IDLE])
            .with_timing(&self.poll.cluster_update);
        let cluster = self.wait_idle(conf, &project_id, &cluster_name).await?;

        let mut current = plan;
        current.id = state.id.clone();
        Ok(reconcile(cluster, &current))
    }

    async fn delete(&self, state: ClusterModel) -> Result<()> {
        let (project_id, cluster_name) = state_id(&state)?;
        self.api
            .delete_cluster(&project_id, &cluster_name)
            .await
            .map_err(|e| e.during("deleting cluster", &cluster_name))?;

        let conf = StateChangeConf::new(
            &["IDLE", "CREATING", "UPDATING", "REPAIRING", "DELETING"],
            &["DELETED"],
        )
        .with_timing(&self.poll.cluster_delete);
        let api = self.api.as_ref();
        conf.wait(&format!("cluster {}", cluster_name), || {
            refresh_cluster(api, &project_id, &cluster_name)
        })
        .await?;

        tracing::info!("Deleted cluster {}", cluster_name);
        Ok(())
    }

    async fn import(&self, import_id: &str) -> Result<ClusterModel> {
        let parts = split_import_id(import_id, 2, IMPORT_FORMAT)?;
        let (project_id, cluster_name) = (parts[0], parts[1]);
        Ok(ClusterModel {
            id: Some(encode_state_id(&[
                ("project_id", project_id),
                ("cluster_name", cluster_name),
            ])),
            project_id: project_id.to_string(),
            name: cluster_name.to_string(),
            ..Default::default()
        })
    }
}
