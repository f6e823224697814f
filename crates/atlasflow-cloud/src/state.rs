//! State management for managed resources
//!
//! Manages the `.atlasflow/state.json` file, which holds the durable record
//! of every resource between runs: its composite identifier plus all the
//! attributes the last operation reconciled.

use crate::error::{CloudError, Result};
use crate::resource::record_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

const STATE_VERSION: u32 = 1;
const STATE_DIR: &str = ".atlasflow";
const STATE_FILE: &str = "state.json";
const STATE_BACKUP: &str = "state.json.backup";
const LOCK_FILE: &str = "lock.json";

/// State for every managed resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalState {
    /// State file version
    pub version: u32,

    /// Last modified timestamp
    pub updated_at: DateTime<Utc>,

    /// Resources indexed by address (type.name)
    pub resources: BTreeMap<String, ResourceState>,
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

impl GlobalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resources of one type
    pub fn resources_of_type(&self, resource_type: &str) -> Vec<(&String, &ResourceState)> {
        self.resources
            .iter()
            .filter(|(_, r)| r.resource_type == resource_type)
            .collect()
    }

    /// Add or update a resource
    pub fn set_resource(&mut self, address: String, state: ResourceState) {
        self.resources.insert(address, state);
        self.updated_at = Utc::now();
    }

    /// Remove a resource
    pub fn remove_resource(&mut self, address: &str) -> Option<ResourceState> {
        let result = self.resources.remove(address);
        if result.is_some() {
            self.updated_at = Utc::now();
        }
        result
    }

    pub fn get_resource(&self, address: &str) -> Option<&ResourceState> {
        self.resources.get(address)
    }
}

/// State of a single resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceState {
    /// Composite identifier
    pub id: String,

    /// Resource type
    pub resource_type: String,

    /// Operation that produced this record
    pub last_operation: Operation,

    /// Reconciled attributes
    pub attributes: serde_json::Map<String, serde_json::Value>,

    /// When the resource was first recorded
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl ResourceState {
    /// Build state from a handler's reconciled record
    pub fn from_record(
        resource_type: impl Into<String>,
        operation: Operation,
        record: serde_json::Value,
    ) -> Result<Self> {
        let resource_type = resource_type.into();
        let id = record_id(&record)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                CloudError::StateError(format!("{} record has no id", resource_type))
            })?
            .to_string();
        let attributes = match record {
            serde_json::Value::Object(map) => map,
            _ => {
                return Err(CloudError::StateError(format!(
                    "{} record is not an object",
                    resource_type
                )));
            }
        };
        let now = Utc::now();
        Ok(Self {
            id,
            resource_type,
            last_operation: operation,
            attributes,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace the attributes with a newer record, keeping `created_at`
    pub fn refresh(&mut self, operation: Operation, record: serde_json::Value) -> Result<()> {
        let next = Self::from_record(self.resource_type.clone(), operation, record)?;
        self.id = next.id;
        self.attributes = next.attributes;
        self.last_operation = operation;
        self.updated_at = next.updated_at;
        Ok(())
    }

    /// Attributes as a record for the handler
    pub fn record(&self) -> serde_json::Value {
        serde_json::Value::Object(self.attributes.clone())
    }

    pub fn get_attribute<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Last operation applied to a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Read,
    Update,
    Import,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Import => write!(f, "import"),
        }
    }
}

/// State manager for reading/writing state files
pub struct StateManager {
    /// Project root directory
    project_root: PathBuf,
}

impl StateManager {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    fn state_dir(&self) -> PathBuf {
        self.project_root.join(STATE_DIR)
    }

    pub fn state_path(&self) -> PathBuf {
        self.state_dir().join(STATE_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.state_dir().join(STATE_BACKUP)
    }

    fn lock_path(&self) -> PathBuf {
        self.state_dir().join(LOCK_FILE)
    }

    async fn ensure_state_dir(&self) -> Result<()> {
        let dir = self.state_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created state directory: {}", dir.display());
        }
        Ok(())
    }

    /// Load the current state
    pub async fn load(&self) -> Result<GlobalState> {
        let path = self.state_path();
        if !path.exists() {
            tracing::debug!("State file not found, returning empty state");
            return Ok(GlobalState::new());
        }

        let content = fs::read_to_string(&path).await?;
        let state: GlobalState = serde_json::from_str(&content)?;

        if state.version > STATE_VERSION {
            return Err(CloudError::StateError(format!(
                "State file version {} is newer than supported version {}",
                state.version, STATE_VERSION
            )));
        }

        tracing::debug!("Loaded state with {} resources", state.resources.len());
        Ok(state)
    }

    /// Save the state, keeping the previous file as a backup
    pub async fn save(&self, state: &GlobalState) -> Result<()> {
        self.ensure_state_dir().await?;

        let path = self.state_path();
        let backup = self.backup_path();

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
            tracing::debug!("Created state backup");
        }

        let content = serde_json::to_string_pretty(state)?;
        fs::write(&path, content).await?;

        tracing::debug!("Saved state with {} resources", state.resources.len());
        Ok(())
    }

    /// Acquire a lock for exclusive access
    pub async fn acquire_lock(&self) -> Result<StateLock> {
        self.ensure_state_dir().await?;

        let lock_path = self.lock_path();

        if lock_path.exists() {
            let content = fs::read_to_string(&lock_path).await?;
            let lock_info: LockInfo = serde_json::from_str(&content)?;

            // Locks older than an hour are considered abandoned
            let age = Utc::now().signed_duration_since(lock_info.acquired_at);
            if age.num_hours() < 1 {
                return Err(CloudError::LockError(format!(
                    "State is locked by {} since {}",
                    lock_info.holder, lock_info.acquired_at
                )));
            }

            tracing::warn!("Removing stale lock from {}", lock_info.holder);
        }

        let lock_info = LockInfo {
            holder: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            acquired_at: Utc::now(),
        };

        let content = serde_json::to_string_pretty(&lock_info)?;
        fs::write(&lock_path, content).await?;

        tracing::debug!("Acquired state lock");
        Ok(StateLock {
            lock_path,
            released: false,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    acquired_at: DateTime<Utc>,
}

/// RAII guard for state lock
pub struct StateLock {
    lock_path: PathBuf,
    released: bool,
}

impl StateLock {
    /// Release the lock
    pub async fn release(mut self) -> Result<()> {
        if !self.released {
            if self.lock_path.exists() {
                fs::remove_file(&self.lock_path).await?;
                tracing::debug!("Released state lock");
            }
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if !self.released && self.lock_path.exists() {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn alert_record() -> serde_json::Value {
        json!({
            "id": "id:YTE=-project_id:cDE=",
            "project_id": "p1",
            "event_type": "OUTSIDE_METRIC_THRESHOLD",
        })
    }

    #[test]
    fn test_resources_of_type() {
        let mut state = GlobalState::new();
        state.set_resource(
            "mongodbatlas_alert_configuration.cpu".to_string(),
            ResourceState::from_record(
                "mongodbatlas_alert_configuration",
                Operation::Create,
                alert_record(),
            )
            .unwrap(),
        );
        state.set_resource(
            "mongodbatlas_project.main".to_string(),
            ResourceState::from_record(
                "mongodbatlas_project",
                Operation::Import,
                json!({"id": "5f1c0a2b3c4d5e6f7a8b9c0d", "name": "main"}),
            )
            .unwrap(),
        );

        let projects = state.resources_of_type("mongodbatlas_project");
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].0, "mongodbatlas_project.main");
        assert!(state.resources_of_type("mongodbatlas_cluster").is_empty());
    }

    #[tokio::test]
    async fn test_state_save_load() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let mut state = GlobalState::new();
        state.set_resource(
            "mongodbatlas_alert_configuration.cpu".to_string(),
            ResourceState::from_record(
                "mongodbatlas_alert_configuration",
                Operation::Create,
                alert_record(),
            )
            .unwrap(),
        );

        manager.save(&state).await.unwrap();

        let loaded = manager.load().await.unwrap();
        assert_eq!(loaded.resources.len(), 1);
        let alert = loaded
            .get_resource("mongodbatlas_alert_configuration.cpu")
            .unwrap();
        assert_eq!(alert.id, "id:YTE=-project_id:cDE=");
        assert_eq!(alert.get_attribute::<String>("project_id").as_deref(), Some("p1"));
        assert_eq!(alert.record(), alert_record());
    }

    #[tokio::test]
    async fn test_save_keeps_backup() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        manager.save(&GlobalState::new()).await.unwrap();
        manager.save(&GlobalState::new()).await.unwrap();

        assert!(temp_dir.path().join(".atlasflow/state.json.backup").exists());
    }

    #[tokio::test]
    async fn test_empty_state() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let state = manager.load().await.unwrap();
        assert!(state.resources.is_empty());
    }

    #[tokio::test]
    async fn test_newer_state_version_is_rejected() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let mut state = GlobalState::new();
        state.version = STATE_VERSION + 1;
        manager.save(&state).await.unwrap();

        assert!(matches!(
            manager.load().await.unwrap_err(),
            CloudError::StateError(_)
        ));
    }

    #[tokio::test]
    async fn test_lock_is_exclusive_until_released() {
        let temp_dir = tempdir().unwrap();
        let manager = StateManager::new(temp_dir.path());

        let lock = manager.acquire_lock().await.unwrap();
        assert!(matches!(
            manager.acquire_lock().await,
            Err(CloudError::LockError(_))
        ));

        lock.release().await.unwrap();
        let again = manager.acquire_lock().await.unwrap();
        drop(again);
        assert!(!temp_dir.path().join(".atlasflow/lock.json").exists());
    }

    #[test]
    fn test_record_without_id_is_rejected() {
        let err = ResourceState::from_record(
            "mongodbatlas_project",
            Operation::Create,
            json!({"name": "x"}),
        )
        .unwrap_err();
        assert!(matches!(err, CloudError::StateError(_)));
    }

    #[test]
    fn test_refresh_keeps_created_at() {
        let mut state = ResourceState::from_record(
            "mongodbatlas_alert_configuration",
            Operation::Import,
            alert_record(),
        )
        .unwrap();
        let created = state.created_at;

        let mut next = alert_record();
        next["event_type"] = json!("HOST_DOWN");
        state.refresh(Operation::Read, next).unwrap();

        assert_eq!(state.created_at, created);
        assert_eq!(state.last_operation, Operation::Read);
        assert_eq!(
            state.get_attribute::<String>("event_type").as_deref(),
            Some("HOST_DOWN")
        );
    }
}
