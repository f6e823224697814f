//! Cloud provider trait definition

use crate::error::{CloudError, Result};
use crate::resource::{DataSourceHandler, ResourceHandler};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cloud provider abstraction trait
///
/// A provider owns the handlers for every resource and data source type it
/// supports. Callers look a handler up by type name and drive it one
/// operation at a time.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Returns the provider name (e.g., "mongodbatlas")
    fn name(&self) -> &str;

    /// Returns the provider display name for UI
    fn display_name(&self) -> &str;

    /// Check if the provider is properly configured and authenticated
    async fn check_auth(&self) -> Result<AuthStatus>;

    /// Handler for a managed resource type
    fn resource(&self, type_name: &str) -> Option<&dyn ResourceHandler>;

    /// Handler for a data source type
    fn data_source(&self, type_name: &str) -> Option<&dyn DataSourceHandler>;

    /// All managed resource type names
    fn resource_types(&self) -> Vec<&str>;

    /// All data source type names
    fn data_source_types(&self) -> Vec<&str>;

    /// Like [`CloudProvider::resource`], failing for unknown types
    fn require_resource(&self, type_name: &str) -> Result<&dyn ResourceHandler> {
        self.resource(type_name)
            .ok_or_else(|| CloudError::UnknownResourceType(type_name.to_string()))
    }

    /// Like [`CloudProvider::data_source`], failing for unknown types
    fn require_data_source(&self, type_name: &str) -> Result<&dyn DataSourceHandler> {
        self.data_source(type_name)
            .ok_or_else(|| CloudError::UnknownResourceType(type_name.to_string()))
    }
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether authentication is valid
    pub authenticated: bool,

    /// Account/user information if available
    pub account_info: Option<String>,

    /// Error message if not authenticated
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}

/// Set of desired resources, indexed by address
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceSet {
    pub resources: BTreeMap<String, ResourceConfig>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, resource: ResourceConfig) {
        self.resources.insert(resource.address(), resource);
    }

    pub fn get(&self, address: &str) -> Option<&ResourceConfig> {
        self.resources.get(address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceConfig> {
        self.resources.values()
    }

    pub fn by_type(&self, resource_type: &str) -> Vec<&ResourceConfig> {
        self.resources
            .values()
            .filter(|r| r.resource_type == resource_type)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Desired configuration for one resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Resource type (e.g., "mongodbatlas_project")
    pub resource_type: String,

    /// Local name, unique per type
    pub name: String,

    /// Resource attributes as written by the user
    pub config: serde_json::Value,
}

impl ResourceConfig {
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        config: serde_json::Value,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            config,
        }
    }

    /// Get the resource address (type.name)
    pub fn address(&self) -> String {
        address(&self.resource_type, &self.name)
    }

    /// Get a configuration value as a specific type
    pub fn get_config<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.config
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Build a resource address from its parts
pub fn address(resource_type: &str, name: &str) -> String {
    format!("{}.{}", resource_type, name)
}

/// Split an address into `(type, name)`
pub fn parse_address(address: &str) -> Result<(&str, &str)> {
    match address.split_once('.') {
        Some((t, n)) if !t.is_empty() && !n.is_empty() => Ok((t, n)),
        _ => Err(CloudError::InvalidConfig(format!(
            "invalid resource address '{}', expected <type>.<name>",
            address
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_set_by_address() {
        let mut set = ResourceSet::new();
        set.add(ResourceConfig::new(
            "mongodbatlas_project",
            "main",
            serde_json::json!({"name": "main", "org_id": "o1"}),
        ));
        let project = set.get("mongodbatlas_project.main").unwrap();
        assert_eq!(project.get_config::<String>("org_id").as_deref(), Some("o1"));
        assert_eq!(set.by_type("mongodbatlas_project").len(), 1);
        assert!(set.by_type("mongodbatlas_cluster").is_empty());
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(
            parse_address("mongodbatlas_cluster.prod").unwrap(),
            ("mongodbatlas_cluster", "prod")
        );
        assert!(parse_address("noname").is_err());
        assert!(parse_address(".x").is_err());
    }
}
