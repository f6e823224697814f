//! Atlas Admin API representations
//!
//! These mirror the JSON the API sends and accepts. Every field is optional
//! so the same type serves as a sparse request body and as a response.

use serde::{Deserialize, Serialize};

/// Paginated list envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub total_count: i64,
}

/// Error body returned with non-2xx responses
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

// ============ Projects ============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

// ============ Clusters ============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_settings: Option<ClusterProviderSettings>,
    #[serde(
        rename = "diskSizeGB",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub disk_size_gb: Option<f64>,
    #[serde(
        rename = "mongoDBMajorVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub mongo_db_major_version: Option<String>,
    #[serde(
        rename = "mongoDBVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub mongo_db_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_backup: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_strings: Option<ConnectionStrings>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterProviderSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_size_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStrings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_srv: Option<String>,
}

// ============ Alert configurations ============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matchers: Option<Vec<Matcher>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_threshold: Option<MetricThreshold>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<Threshold>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<Vec<Notification>>,
}

/// Body of the enable/disable endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnableAlertConfiguration {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matcher {
    #[serde(default)]
    pub field_name: String,
    #[serde(default)]
    pub operator: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricThreshold {
    #[serde(default)]
    pub metric_name: String,
    #[serde(default)]
    pub operator: String,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub mode: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Threshold {
    #[serde(default)]
    pub operator: String,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub units: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub channel_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub datadog_api_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub datadog_region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_min: Option<i64>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_min: Option<i64>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mobile_number: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ops_genie_api_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ops_genie_region: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub team_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub team_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notifier_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub victor_ops_api_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub victor_ops_routing_key: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub microsoft_teams_webhook_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub webhook_secret: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub webhook_url: String,
}

// ============ Cloud backup snapshots ============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudProviderSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(
        rename = "masterKeyUUID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub master_key_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mongod_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_in_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_size_bytes: Option<i64>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub snapshot_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replica_set_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<SnapshotMember>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub snapshot_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMember {
    #[serde(default)]
    pub cloud_provider: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub replica_set_name: String,
}

// ============ Shared tier restore jobs ============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantRestore {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub target_project_id: Option<String>,
    #[serde(default)]
    pub target_deployment_item_name: Option<String>,
    #[serde(default)]
    pub snapshot_url: Option<String>,
    #[serde(default)]
    pub snapshot_id: Option<String>,
    #[serde(default)]
    pub delivery_type: Option<String>,
    #[serde(default)]
    pub snapshot_finished_date: Option<String>,
    #[serde(default)]
    pub restore_scheduled_date: Option<String>,
    #[serde(default)]
    pub restore_finished_date: Option<String>,
    #[serde(default)]
    pub expiration_date: Option<String>,
}
