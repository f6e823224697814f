//! MongoDB Atlas provider implementation

use crate::client::{AtlasApi, AtlasClient, AtlasConfig};
use crate::data_sources::SharedTierRestoreJobsDataSource;
use crate::poll::PollSettings;
use crate::resources::{
    AlertConfigurationResource, CloudBackupSnapshotResource, ClusterResource, ProjectResource,
};
use async_trait::async_trait;
use atlasflow_cloud::{
    AuthStatus, CloudError, CloudProvider, DataSource, DataSourceHandler, Resource,
    ResourceHandler,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// MongoDB Atlas provider
pub struct AtlasProvider {
    api: Arc<dyn AtlasApi>,
    resources: BTreeMap<&'static str, Box<dyn ResourceHandler>>,
    data_sources: BTreeMap<&'static str, Box<dyn DataSourceHandler>>,
}

impl AtlasProvider {
    pub fn new(api: Arc<dyn AtlasApi>, poll: PollSettings) -> Self {
        let mut resources: BTreeMap<&'static str, Box<dyn ResourceHandler>> = BTreeMap::new();
        resources.insert(
            ProjectResource::TYPE_NAME,
            Box::new(ProjectResource::new(api.clone())),
        );
        resources.insert(
            ClusterResource::TYPE_NAME,
            Box::new(ClusterResource::new(api.clone(), poll.clone())),
        );
        resources.insert(
            AlertConfigurationResource::TYPE_NAME,
            Box::new(AlertConfigurationResource::new(api.clone())),
        );
        resources.insert(
            CloudBackupSnapshotResource::TYPE_NAME,
            Box::new(CloudBackupSnapshotResource::new(api.clone(), poll)),
        );

        let mut data_sources: BTreeMap<&'static str, Box<dyn DataSourceHandler>> =
            BTreeMap::new();
        data_sources.insert(
            SharedTierRestoreJobsDataSource::TYPE_NAME,
            Box::new(SharedTierRestoreJobsDataSource::new(api.clone())),
        );

        Self {
            api,
            resources,
            data_sources,
        }
    }

    /// Build the provider on top of the HTTP client
    pub fn from_config(config: AtlasConfig, poll: PollSettings) -> atlasflow_cloud::Result<Self> {
        let client = AtlasClient::new(config)
            .map_err(|e| CloudError::InvalidConfig(e.to_string()))?;
        Ok(Self::new(Arc::new(client), poll))
    }
}

#[async_trait]
impl CloudProvider for AtlasProvider {
    fn name(&self) -> &str {
        "mongodbatlas"
    }

    fn display_name(&self) -> &str {
        "MongoDB Atlas"
    }

    async fn check_auth(&self) -> atlasflow_cloud::Result<AuthStatus> {
        match self.api.list_projects().await {
            Ok(projects) => Ok(AuthStatus::ok(format!(
                "{} project(s) visible",
                projects.total_count
            ))),
            Err(e) => Ok(AuthStatus::failed(e.to_string())),
        }
    }

    fn resource(&self, type_name: &str) -> Option<&dyn ResourceHandler> {
        self.resources.get(type_name).map(|h| h.as_ref())
    }

    fn data_source(&self, type_name: &str) -> Option<&dyn DataSourceHandler> {
        self.data_sources.get(type_name).map(|h| h.as_ref())
    }

    fn resource_types(&self) -> Vec<&str> {
        self.resources.keys().copied().collect()
    }

    fn data_source_types(&self) -> Vec<&str> {
        self.data_sources.keys().copied().collect()
    }
}
