//! リソース定義ドキュメント (`atlas.yaml`)
//!
//! ```yaml
//! resources:
//!   - type: mongodbatlas_project
//!     name: main
//!     config:
//!       name: analytics
//!       org_id: 5f1c0c1b2a3b4c5d6e7f8000
//! ```

use crate::error::{ConfigError, Result};
use atlasflow_cloud::{ResourceConfig, ResourceSet, address};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceDocument {
    #[serde(default)]
    pub resources: Vec<ResourceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceEntry {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    #[serde(default = "empty_config")]
    pub config: serde_json::Value,
}

fn empty_config() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

impl ResourceDocument {
    pub fn parse(content: &str, origin: &str) -> Result<Self> {
        let document: Self =
            serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
                path: origin.to_string(),
                source,
            })?;
        document.validate()?;
        Ok(document)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let document = Self::parse(&content, &path.display().to_string())?;
        tracing::debug!(
            "Loaded {} resource(s) from {}",
            document.resources.len(),
            path.display()
        );
        Ok(document)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = std::collections::BTreeSet::new();
        for entry in &self.resources {
            let addr = address(&entry.resource_type, &entry.name);
            if entry.resource_type.is_empty() || entry.name.is_empty() || entry.name.contains('.')
            {
                return Err(ConfigError::InvalidResource {
                    address: addr,
                    message: "type and name must be non-empty and the name may not contain '.'"
                        .to_string(),
                });
            }
            if !entry.config.is_object() {
                return Err(ConfigError::InvalidResource {
                    address: addr,
                    message: "config must be a mapping".to_string(),
                });
            }
            if !seen.insert(addr.clone()) {
                return Err(ConfigError::DuplicateResource(addr));
            }
        }
        Ok(())
    }

    /// アドレスをキーにしたリソース一覧に変換
    pub fn to_resource_set(&self) -> ResourceSet {
        let mut set = ResourceSet::new();
        for entry in &self.resources {
            set.add(ResourceConfig::new(
                entry.resource_type.clone(),
                entry.name.clone(),
                entry.config.clone(),
            ));
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = r#"
resources:
  - type: mongodbatlas_project
    name: main
    config:
      name: analytics
      org_id: 5f1c0c1b2a3b4c5d6e7f8000
  - type: mongodbatlas_alert_configuration
    name: cpu
    config:
      project_id: 5f1c0c1b2a3b4c5d6e7f8091
      event_type: OUTSIDE_METRIC_THRESHOLD
      enabled: true
      notification:
        - type_name: EMAIL
          email_address: ops@example.com
          interval_min: 5
"#;

    #[test]
    fn test_parse_document() {
        let document = ResourceDocument::parse(SAMPLE, "atlas.yaml").unwrap();
        let set = document.to_resource_set();
        assert_eq!(set.len(), 2);

        let alert = set.get("mongodbatlas_alert_configuration.cpu").unwrap();
        assert_eq!(alert.config["enabled"], json!(true));
        assert_eq!(alert.config["notification"][0]["interval_min"], json!(5));
    }

    #[test]
    fn test_missing_config_is_empty_mapping() {
        let document =
            ResourceDocument::parse("resources:\n  - type: t\n    name: n\n", "atlas.yaml").unwrap();
        assert_eq!(document.resources[0].config, json!({}));
    }

    #[test]
    fn test_duplicate_address_rejected() {
        let content = "resources:\n  - {type: t, name: n}\n  - {type: t, name: n}\n";
        assert!(matches!(
            ResourceDocument::parse(content, "atlas.yaml"),
            Err(ConfigError::DuplicateResource(addr)) if addr == "t.n"
        ));
    }

    #[test]
    fn test_invalid_entries_rejected() {
        for content in [
            "resources:\n  - {type: t, name: a.b}\n",
            "resources:\n  - {type: t, name: n, config: [1, 2]}\n",
        ] {
            assert!(matches!(
                ResourceDocument::parse(content, "atlas.yaml"),
                Err(ConfigError::InvalidResource { .. })
            ));
        }
    }

    #[test]
    fn test_parse_error_names_origin() {
        let err = ResourceDocument::parse("resources: {", "broken.yaml").unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atlas.yaml");
        std::fs::write(&path, SAMPLE).unwrap();
        assert_eq!(ResourceDocument::load(&path).unwrap().resources.len(), 2);
    }
}
