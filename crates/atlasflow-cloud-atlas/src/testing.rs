//! In-memory Atlas for handler tests

use crate::client::AtlasApi;
use crate::error::{AtlasError, Result};
use crate::models::{
    AlertConfiguration, Cluster, CloudProviderSnapshot, Group, Notification, Paginated,
    TenantRestore,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

pub const PROJECT_ID: &str = "5f1c0c1b2a3b4c5d6e7f8091";

/// Fake Atlas that behaves like the real API where handlers care
///
/// Secrets come back obfuscated, notifications get server ids and defaults,
/// and status sequences for clusters and snapshots can be scripted. A
/// scripted status of `"404"` makes that lookup answer not found.
#[derive(Default)]
pub struct FakeAtlas {
    pub projects: Mutex<BTreeMap<String, Group>>,
    pub clusters: Mutex<BTreeMap<(String, String), Cluster>>,
    pub alerts: Mutex<BTreeMap<(String, String), AlertConfiguration>>,
    pub snapshots: Mutex<BTreeMap<String, CloudProviderSnapshot>>,
    pub restore_jobs: Mutex<Vec<TenantRestore>>,
    pub cluster_statuses: Mutex<VecDeque<String>>,
    pub snapshot_statuses: Mutex<VecDeque<String>>,
    /// Names of the calls made, in order
    pub calls: Mutex<Vec<String>>,
    /// Body of the last full alert update
    pub last_alert_update: Mutex<Option<AlertConfiguration>>,
    next_id: AtomicU64,
}

impl FakeAtlas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_cluster(&self, statuses: &[&str]) {
        let mut queue = self.cluster_statuses.lock().unwrap();
        queue.extend(statuses.iter().map(|s| s.to_string()));
    }

    pub fn script_snapshot(&self, statuses: &[&str]) {
        let mut queue = self.snapshot_statuses.lock().unwrap();
        queue.extend(statuses.iter().map(|s| s.to_string()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Insert an alert as if it had been created elsewhere
    pub fn seed_alert(&self, project_id: &str, mut alert: AlertConfiguration) -> String {
        let id = self.object_id();
        alert.id = Some(id.clone());
        alert.group_id = Some(project_id.to_string());
        alert.created.get_or_insert_with(|| "2024-01-01T00:00:00Z".to_string());
        alert.updated.get_or_insert_with(|| "2024-01-01T00:00:00Z".to_string());
        if let Some(notifications) = alert.notifications.as_mut() {
            for n in notifications.iter_mut() {
                self.assign_notifier(n);
            }
        }
        self.alerts
            .lock()
            .unwrap()
            .insert((project_id.to_string(), id.clone()), alert);
        id
    }

    pub fn alert(&self, project_id: &str, alert_id: &str) -> Option<AlertConfiguration> {
        self.alerts
            .lock()
            .unwrap()
            .get(&(project_id.to_string(), alert_id.to_string()))
            .cloned()
    }

    pub fn seed_cluster(&self, project_id: &str, name: &str, state: &str) {
        let cluster = Cluster {
            id: Some(self.object_id()),
            name: Some(name.to_string()),
            group_id: Some(project_id.to_string()),
            state_name: Some(state.to_string()),
            ..Default::default()
        };
        self.clusters
            .lock()
            .unwrap()
            .insert((project_id.to_string(), name.to_string()), cluster);
    }

    pub fn object_id(&self) -> String {
        format!("{:024x}", 0xa7_0000 + self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn assign_notifier(&self, n: &mut Notification) {
        if n.notifier_id.is_empty() {
            n.notifier_id = self.object_id();
        }
        n.delay_min.get_or_insert(0);
        n.interval_min.get_or_insert(60);
        n.email_enabled.get_or_insert(false);
        n.sms_enabled.get_or_insert(false);
    }

    fn echo_alert(alert: &AlertConfiguration) -> AlertConfiguration {
        let mut echoed = alert.clone();
        if let Some(notifications) = echoed.notifications.as_mut() {
            for n in notifications.iter_mut() {
                obfuscate(n);
            }
        }
        echoed
    }

    fn next_status(queue: &Mutex<VecDeque<String>>) -> Option<String> {
        let mut queue = queue.lock().unwrap();
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

fn obfuscate(n: &mut Notification) {
    for secret in [
        &mut n.api_token,
        &mut n.datadog_api_key,
        &mut n.ops_genie_api_key,
        &mut n.service_key,
        &mut n.victor_ops_api_key,
        &mut n.victor_ops_routing_key,
        &mut n.webhook_url,
        &mut n.webhook_secret,
        &mut n.microsoft_teams_webhook_url,
    ] {
        if !secret.is_empty() {
            *secret = "****".to_string();
        }
    }
}

fn not_found(what: &str) -> AtlasError {
    AtlasError::Api {
        status: 404,
        error_code: "RESOURCE_NOT_FOUND".to_string(),
        detail: format!("{} not found", what),
    }
}

#[async_trait]
impl AtlasApi for FakeAtlas {
    async fn list_projects(&self) -> Result<Paginated<Group>> {
        self.record("list_projects");
        let results: Vec<Group> = self.projects.lock().unwrap().values().cloned().collect();
        Ok(Paginated {
            total_count: results.len() as i64,
            results,
        })
    }

    async fn get_project(&self, project_id: &str) -> Result<Group> {
        self.record("get_project");
        self.projects
            .lock()
            .unwrap()
            .get(project_id)
            .cloned()
            .ok_or_else(|| not_found(project_id))
    }

    async fn create_project(&self, project: &Group) -> Result<Group> {
        self.record("create_project");
        let mut created = project.clone();
        let id = self.object_id();
        created.id = Some(id.clone());
        created.cluster_count = Some(0);
        created.created = Some("2024-01-01T00:00:00Z".to_string());
        self.projects.lock().unwrap().insert(id, created.clone());
        Ok(created)
    }

    async fn update_project(&self, project_id: &str, project: &Group) -> Result<Group> {
        self.record("update_project");
        let mut projects = self.projects.lock().unwrap();
        let existing = projects
            .get_mut(project_id)
            .ok_or_else(|| not_found(project_id))?;
        if project.name.is_some() {
            existing.name = project.name.clone();
        }
        Ok(existing.clone())
    }

    async fn delete_project(&self, project_id: &str) -> Result<()> {
        self.record("delete_project");
        self.projects
            .lock()
            .unwrap()
            .remove(project_id)
            .map(|_| ())
            .ok_or_else(|| not_found(project_id))
    }

    async fn get_cluster(&self, project_id: &str, cluster_name: &str) -> Result<Cluster> {
        self.record("get_cluster");
        let key = (project_id.to_string(), cluster_name.to_string());
        let status = Self::next_status(&self.cluster_statuses);
        if status.as_deref() == Some("404") {
            self.clusters.lock().unwrap().remove(&key);
            return Err(not_found(cluster_name));
        }
        let mut clusters = self.clusters.lock().unwrap();
        let cluster = clusters.get_mut(&key).ok_or_else(|| not_found(cluster_name))?;
        if let Some(status) = status {
            cluster.state_name = Some(status);
        }
        Ok(cluster.clone())
    }

    async fn create_cluster(&self, project_id: &str, cluster: &Cluster) -> Result<Cluster> {
        self.record("create_cluster");
        let name = cluster.name.clone().unwrap_or_default();
        let mut created = cluster.clone();
        created.id = Some(self.object_id());
        created.group_id = Some(project_id.to_string());
        created.state_name = Some("CREATING".to_string());
        created.disk_size_gb.get_or_insert(10.0);
        created
            .mongo_db_major_version
            .get_or_insert_with(|| "7.0".to_string());
        created.mongo_db_version = Some("7.0.12".to_string());
        created.cloud_backup.get_or_insert(false);
        created.connection_strings = Some(crate::models::ConnectionStrings {
            standard_srv: Some(format!("mongodb+srv://{}.example.mongodb.net", name.to_lowercase())),
        });
        self.clusters
            .lock()
            .unwrap()
            .insert((project_id.to_string(), name), created.clone());
        Ok(created)
    }

    async fn update_cluster(
        &self,
        project_id: &str,
        cluster_name: &str,
        cluster: &Cluster,
    ) -> Result<Cluster> {
        self.record("update_cluster");
        let mut clusters = self.clusters.lock().unwrap();
        let existing = clusters
            .get_mut(&(project_id.to_string(), cluster_name.to_string()))
            .ok_or_else(|| not_found(cluster_name))?;
        if let Some(settings) = &cluster.provider_settings {
            existing.provider_settings = Some(settings.clone());
        }
        if cluster.disk_size_gb.is_some() {
            existing.disk_size_gb = cluster.disk_size_gb;
        }
        if cluster.mongo_db_major_version.is_some() {
            existing.mongo_db_major_version = cluster.mongo_db_major_version.clone();
        }
        if cluster.cloud_backup.is_some() {
            existing.cloud_backup = cluster.cloud_backup;
        }
        existing.state_name = Some("UPDATING".to_string());
        Ok(existing.clone())
    }

    async fn delete_cluster(&self, project_id: &str, cluster_name: &str) -> Result<()> {
        self.record("delete_cluster");
        let mut clusters = self.clusters.lock().unwrap();
        let existing = clusters
            .get_mut(&(project_id.to_string(), cluster_name.to_string()))
            .ok_or_else(|| not_found(cluster_name))?;
        existing.state_name = Some("DELETING".to_string());
        Ok(())
    }

    async fn get_alert_configuration(
        &self,
        project_id: &str,
        alert_id: &str,
    ) -> Result<AlertConfiguration> {
        self.record("get_alert_configuration");
        self.alert(project_id, alert_id)
            .map(|a| Self::echo_alert(&a))
            .ok_or_else(|| not_found(alert_id))
    }

    async fn create_alert_configuration(
        &self,
        project_id: &str,
        alert: &AlertConfiguration,
    ) -> Result<AlertConfiguration> {
        self.record("create_alert_configuration");
        let id = self.seed_alert(project_id, alert.clone());
        let stored = self.alert(project_id, &id).ok_or_else(|| not_found(&id))?;
        Ok(Self::echo_alert(&stored))
    }

    async fn update_alert_configuration(
        &self,
        project_id: &str,
        alert_id: &str,
        alert: &AlertConfiguration,
    ) -> Result<AlertConfiguration> {
        self.record("update_alert_configuration");
        *self.last_alert_update.lock().unwrap() = Some(alert.clone());
        let mut alerts = self.alerts.lock().unwrap();
        let existing = alerts
            .get_mut(&(project_id.to_string(), alert_id.to_string()))
            .ok_or_else(|| not_found(alert_id))?;
        let mut updated = alert.clone();
        updated.id = existing.id.clone();
        updated.group_id = existing.group_id.clone();
        updated.created = existing.created.clone();
        updated.updated = Some("2024-02-01T00:00:00Z".to_string());
        if let Some(notifications) = updated.notifications.as_mut() {
            for n in notifications.iter_mut() {
                self.assign_notifier(n);
            }
        }
        *existing = updated.clone();
        Ok(Self::echo_alert(&updated))
    }

    async fn enable_alert_configuration(
        &self,
        project_id: &str,
        alert_id: &str,
        enabled: bool,
    ) -> Result<AlertConfiguration> {
        self.record("enable_alert_configuration");
        let mut alerts = self.alerts.lock().unwrap();
        let existing = alerts
            .get_mut(&(project_id.to_string(), alert_id.to_string()))
            .ok_or_else(|| not_found(alert_id))?;
        existing.enabled = Some(enabled);
        Ok(Self::echo_alert(existing))
    }

    async fn delete_alert_configuration(&self, project_id: &str, alert_id: &str) -> Result<()> {
        self.record("delete_alert_configuration");
        self.alerts
            .lock()
            .unwrap()
            .remove(&(project_id.to_string(), alert_id.to_string()))
            .map(|_| ())
            .ok_or_else(|| not_found(alert_id))
    }

    async fn get_snapshot(
        &self,
        _project_id: &str,
        _cluster_name: &str,
        snapshot_id: &str,
    ) -> Result<CloudProviderSnapshot> {
        self.record("get_snapshot");
        let status = Self::next_status(&self.snapshot_statuses);
        if status.as_deref() == Some("404") {
            self.snapshots.lock().unwrap().remove(snapshot_id);
            return Err(not_found(snapshot_id));
        }
        let mut snapshots = self.snapshots.lock().unwrap();
        let snapshot = snapshots
            .get_mut(snapshot_id)
            .ok_or_else(|| not_found(snapshot_id))?;
        if let Some(status) = status {
            snapshot.status = Some(status);
        }
        Ok(snapshot.clone())
    }

    async fn create_snapshot(
        &self,
        _project_id: &str,
        cluster_name: &str,
        snapshot: &CloudProviderSnapshot,
    ) -> Result<CloudProviderSnapshot> {
        self.record("create_snapshot");
        let id = self.object_id();
        let created = CloudProviderSnapshot {
            id: Some(id.clone()),
            created_at: Some("2024-01-01T00:00:00Z".to_string()),
            expires_at: Some("2024-01-04T00:00:00Z".to_string()),
            mongod_version: Some("7.0.12".to_string()),
            snapshot_type: Some("onDemand".to_string()),
            status: Some("queued".to_string()),
            storage_size_bytes: Some(1024),
            snapshot_kind: Some("replicaSet".to_string()),
            cloud_provider: Some("AWS".to_string()),
            replica_set_name: Some(format!("{}-shard-0", cluster_name)),
            ..snapshot.clone()
        };
        self.snapshots.lock().unwrap().insert(id, created.clone());
        Ok(created)
    }

    async fn delete_snapshot(
        &self,
        _project_id: &str,
        _cluster_name: &str,
        snapshot_id: &str,
    ) -> Result<()> {
        self.record("delete_snapshot");
        self.snapshots
            .lock()
            .unwrap()
            .remove(snapshot_id)
            .map(|_| ())
            .ok_or_else(|| not_found(snapshot_id))
    }

    async fn list_shared_tier_restore_jobs(
        &self,
        _project_id: &str,
        cluster_name: &str,
    ) -> Result<Paginated<TenantRestore>> {
        self.record("list_shared_tier_restore_jobs");
        if !self
            .clusters
            .lock()
            .unwrap()
            .keys()
            .any(|(_, name)| name == cluster_name)
        {
            return Err(not_found(cluster_name));
        }
        let results = self.restore_jobs.lock().unwrap().clone();
        Ok(Paginated {
            total_count: results.len() as i64,
            results,
        })
    }
}
