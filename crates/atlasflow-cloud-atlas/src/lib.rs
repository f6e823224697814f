//! MongoDB Atlas provider for AtlasFlow
//!
//! This crate implements the CloudProvider trait for MongoDB Atlas,
//! managing projects, clusters, alert configurations and cloud backup
//! snapshots through the Atlas Admin API v2.
//!
//! # Features
//!
//! - Project and cluster lifecycle (cluster changes wait for `IDLE`)
//! - Alert configurations with write-only notification secrets preserved
//!   across reads, and sparse updates
//! - On-demand cloud backup snapshots
//! - Shared tier restore jobs as a data source
//!
//! # Requirements
//!
//! - An Atlas API access token (`MONGODB_ATLAS_ACCESS_TOKEN`)
//!
//! # Example
//!
//! ```ignore
//! use atlasflow_cloud::CloudProvider;
//! use atlasflow_cloud_atlas::{AtlasConfig, AtlasProvider, PollSettings};
//!
//! let provider = AtlasProvider::from_config(AtlasConfig::new(token), PollSettings::default())?;
//!
//! // Check authentication
//! let auth = provider.check_auth().await?;
//! if !auth.authenticated {
//!     panic!("Not authenticated: {:?}", auth.error);
//! }
//!
//! // Create a project
//! let project = provider
//!     .require_resource("mongodbatlas_project")?
//!     .create(serde_json::json!({"name": "analytics", "org_id": org_id}))
//!     .await?;
//! ```

pub mod client;
pub mod data_sources;
pub mod error;
pub mod models;
pub mod poll;
pub mod provider;
pub mod resources;

#[cfg(test)]
mod testing;

pub use client::{AtlasApi, AtlasClient, AtlasConfig, DEFAULT_BASE_URL};
pub use data_sources::SharedTierRestoreJobsDataSource;
pub use error::{AtlasError, Result};
pub use poll::PollSettings;
pub use provider::AtlasProvider;
pub use resources::{
    AlertConfigurationResource, CloudBackupSnapshotResource, ClusterResource, ProjectResource,
    SENSITIVE_NOTIFICATION_FIELDS,
};
