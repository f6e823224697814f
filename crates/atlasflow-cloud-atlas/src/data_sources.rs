//! Read-only data sources

use crate::client::AtlasApi;
use crate::models::TenantRestore;
use crate::resources::require;
use async_trait::async_trait;
use atlasflow_cloud::{DataSource, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// `mongodbatlas_cloud_shared_tier_restore_jobs`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedTierRestoreJobsModel {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub results: Vec<RestoreJobModel>,
    #[serde(default)]
    pub total_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestoreJobModel {
    pub job_id: Option<String>,
    pub status: Option<String>,
    pub target_project_id: Option<String>,
    pub target_deployment_item_name: Option<String>,
    pub snapshot_url: Option<String>,
    pub snapshot_id: Option<String>,
    pub snapshot_finished_date: Option<String>,
    pub restore_scheduled_date: Option<String>,
    pub restore_finished_date: Option<String>,
    pub delivery_type: Option<String>,
    pub expiration_date: Option<String>,
}

impl From<TenantRestore> for RestoreJobModel {
    fn from(job: TenantRestore) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            target_project_id: job.target_project_id,
            target_deployment_item_name: job.target_deployment_item_name,
            snapshot_url: job.snapshot_url,
            snapshot_id: job.snapshot_id,
            snapshot_finished_date: job.snapshot_finished_date,
            restore_scheduled_date: job.restore_scheduled_date,
            restore_finished_date: job.restore_finished_date,
            delivery_type: job.delivery_type,
            expiration_date: job.expiration_date,
        }
    }
}

pub struct SharedTierRestoreJobsDataSource {
    api: Arc<dyn AtlasApi>,
}

impl SharedTierRestoreJobsDataSource {
    pub fn new(api: Arc<dyn AtlasApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl DataSource for SharedTierRestoreJobsDataSource {
    type Model = SharedTierRestoreJobsModel;
    const TYPE_NAME: &'static str = "mongodbatlas_cloud_shared_tier_restore_jobs";

    async fn read(&self, config: SharedTierRestoreJobsModel) -> Result<SharedTierRestoreJobsModel> {
        require(&config.project_id, "project_id")?;
        require(&config.cluster_name, "cluster_name")?;

        let jobs = self
            .api
            .list_shared_tier_restore_jobs(&config.project_id, &config.cluster_name)
            .await
            .map_err(|e| e.during("listing restore jobs", &config.cluster_name))?;
        tracing::debug!(
            "{} restore jobs for {}",
            jobs.total_count,
            config.cluster_name
        );

        Ok(SharedTierRestoreJobsModel {
            id: Some(uuid::Uuid::new_v4().to_string()),
            results: jobs.results.into_iter().map(Into::into).collect(),
            total_count: jobs.total_count,
            ..config
        })
    }
}
