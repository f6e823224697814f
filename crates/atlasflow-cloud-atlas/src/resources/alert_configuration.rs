//! `mongodbatlas_alert_configuration`
//!
//! Notification secrets (tokens, keys, webhook URLs) are write-only: Atlas
//! obfuscates them on every read. State therefore carries the caller's own
//! values forward, and every update resends the full notification list from
//! the plan.

use super::{found, require};
use crate::client::AtlasApi;
use crate::models::{AlertConfiguration, Matcher, MetricThreshold, Notification, Threshold};
use async_trait::async_trait;
use atlasflow_cloud::reconcile::{
    ServerKeyed, keep_sensitive, null_if_empty, overwrite_if_set, reconcile_keyed_list,
    reconcile_list, reconcile_single,
};
use atlasflow_cloud::{
    CloudError, Resource, Result, decode_state_id, encode_state_id, split_import_id,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const ID_KEYS: &[&str] = &["id", "project_id"];
const IMPORT_FORMAT: &str = "{project_id}-{alert_configuration_id}";

const NOTIFICATION_TYPES: &[&str] = &[
    "EMAIL",
    "SMS",
    "PAGER_DUTY",
    "SLACK",
    "DATADOG",
    "OPS_GENIE",
    "VICTOR_OPS",
    "WEBHOOK",
    "USER",
    "TEAM",
    "GROUP",
    "ORG",
    "MICROSOFT_TEAMS",
];

/// Notification attributes Atlas never returns in clear text
pub const SENSITIVE_NOTIFICATION_FIELDS: &[&str] = &[
    "api_token",
    "datadog_api_key",
    "ops_genie_api_key",
    "service_key",
    "victor_ops_api_key",
    "victor_ops_routing_key",
    "webhook_url",
    "webhook_secret",
    "microsoft_teams_webhook_url",
];

/// Types whose interval is fixed by the integration
const FIXED_INTERVAL_TYPES: &[&str] = &["PAGER_DUTY", "OPS_GENIE", "VICTOR_OPS"];

const THRESHOLD_UNITS: &[&str] = &[
    "RAW",
    "BITS",
    "BYTES",
    "KILOBITS",
    "KILOBYTES",
    "MEGABITS",
    "MEGABYTES",
    "GIGABITS",
    "GIGABYTES",
    "TERABYTES",
    "PETABYTES",
    "MILLISECONDS",
    "SECONDS",
    "MINUTES",
    "HOURS",
    "DAYS",
];

const METRIC_OPERATORS: &[&str] = &["GREATER_THAN", "LESS_THAN"];
const REGIONS: &[&str] = &["US", "EU"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertConfigurationModel {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub alert_configuration_id: Option<String>,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub matcher: Vec<MatcherModel>,
    #[serde(default)]
    pub metric_threshold_config: Vec<MetricThresholdConfigModel>,
    #[serde(default)]
    pub threshold_config: Vec<ThresholdConfigModel>,
    #[serde(default)]
    pub notification: Vec<NotificationModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatcherModel {
    #[serde(default)]
    pub field_name: Option<String>,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricThresholdConfigModel {
    #[serde(default)]
    pub metric_name: Option<String>,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfigModel {
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub units: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationModel {
    #[serde(default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub channel_name: Option<String>,
    #[serde(default)]
    pub datadog_region: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub mobile_number: Option<String>,
    #[serde(default)]
    pub ops_genie_region: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub delay_min: Option<i64>,
    #[serde(default)]
    pub interval_min: Option<i64>,
    #[serde(default)]
    pub email_enabled: Option<bool>,
    #[serde(default)]
    pub sms_enabled: Option<bool>,
    #[serde(default)]
    pub notifier_id: Option<String>,
    #[serde(default)]
    pub team_name: Option<String>,

    // write-only
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    pub datadog_api_key: Option<String>,
    #[serde(default)]
    pub ops_genie_api_key: Option<String>,
    #[serde(default)]
    pub service_key: Option<String>,
    #[serde(default)]
    pub victor_ops_api_key: Option<String>,
    #[serde(default)]
    pub victor_ops_routing_key: Option<String>,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub webhook_secret: Option<String>,
    #[serde(default)]
    pub microsoft_teams_webhook_url: Option<String>,
}

impl ServerKeyed for NotificationModel {
    fn server_key(&self) -> Option<&str> {
        self.notifier_id.as_deref().filter(|id| !id.is_empty())
    }
}

impl ServerKeyed for Notification {
    fn server_key(&self) -> Option<&str> {
        Some(self.notifier_id.as_str()).filter(|id| !id.is_empty())
    }
}

impl NotificationModel {
    /// Whether `current` already satisfies every value this item configures
    fn satisfied_by(&self, current: &NotificationModel) -> bool {
        fn same<T: PartialEq>(wanted: &Option<T>, actual: &Option<T>) -> bool {
            wanted.is_none() || wanted == actual
        }

        same(&self.type_name, &current.type_name)
            && same(&self.channel_name, &current.channel_name)
            && same(&self.datadog_region, &current.datadog_region)
            && same(&self.email_address, &current.email_address)
            && same(&self.mobile_number, &current.mobile_number)
            && same(&self.ops_genie_region, &current.ops_genie_region)
            && same(&self.team_id, &current.team_id)
            && same(&self.username, &current.username)
            && same(&self.delay_min, &current.delay_min)
            && same(&self.interval_min, &current.interval_min)
            && same(&self.email_enabled, &current.email_enabled)
            && same(&self.sms_enabled, &current.sms_enabled)
            && (self.roles.is_empty() || self.roles == current.roles)
            && self.api_token == current.api_token
            && self.datadog_api_key == current.datadog_api_key
            && self.ops_genie_api_key == current.ops_genie_api_key
            && self.service_key == current.service_key
            && self.victor_ops_api_key == current.victor_ops_api_key
            && self.victor_ops_routing_key == current.victor_ops_routing_key
            && self.webhook_url == current.webhook_url
            && self.webhook_secret == current.webhook_secret
            && self.microsoft_teams_webhook_url == current.microsoft_teams_webhook_url
    }
}

pub struct AlertConfigurationResource {
    api: Arc<dyn AtlasApi>,
}

impl AlertConfigurationResource {
    pub fn new(api: Arc<dyn AtlasApi>) -> Self {
        Self { api }
    }
}

fn state_id(state: &AlertConfigurationModel) -> Result<(String, String)> {
    let raw = state.id.as_deref().unwrap_or_default();
    let id = decode_state_id(raw, ID_KEYS)?;
    Ok((
        id.component("project_id")?.to_string(),
        id.component("id")?.to_string(),
    ))
}

fn one_of(value: &Option<String>, allowed: &[&str], attribute: &str) -> Result<()> {
    match value {
        Some(v) if !allowed.contains(&v.as_str()) => Err(CloudError::Validation(format!(
            "'{}' must be one of {}, got '{}'",
            attribute,
            allowed.join(", "),
            v
        ))),
        _ => Ok(()),
    }
}

fn validate(plan: &AlertConfigurationModel) -> Result<()> {
    require(&plan.project_id, "project_id")?;
    require(&plan.event_type, "event_type")?;

    if plan.notification.is_empty() {
        return Err(CloudError::Validation(
            "at least one 'notification' block is required".to_string(),
        ));
    }
    if plan.metric_threshold_config.len() > 1 {
        return Err(CloudError::Validation(
            "at most one 'metric_threshold_config' block is allowed".to_string(),
        ));
    }
    if plan.threshold_config.len() > 1 {
        return Err(CloudError::Validation(
            "at most one 'threshold_config' block is allowed".to_string(),
        ));
    }

    for metric in &plan.metric_threshold_config {
        one_of(&metric.operator, METRIC_OPERATORS, "metric_threshold_config.operator")?;
    }
    for threshold in &plan.threshold_config {
        one_of(&threshold.units, THRESHOLD_UNITS, "threshold_config.units")?;
    }
    for notification in &plan.notification {
        let type_name = notification.type_name.as_deref().unwrap_or_default();
        if !NOTIFICATION_TYPES
            .iter()
            .any(|t| t.eq_ignore_ascii_case(type_name))
        {
            return Err(CloudError::Validation(format!(
                "'notification.type_name' must be one of {}, got '{}'",
                NOTIFICATION_TYPES.join(", "),
                type_name
            )));
        }
        one_of(&notification.datadog_region, REGIONS, "notification.datadog_region")?;
        one_of(&notification.ops_genie_region, REGIONS, "notification.ops_genie_region")?;
    }
    Ok(())
}

// ============ Plan -> request ============

fn new_notification_list(plan: &[NotificationModel]) -> Result<Vec<Notification>> {
    plan.iter()
        .map(|n| {
            let type_name = n.type_name.clone().unwrap_or_default();
            if n.interval_min.unwrap_or_default() > 0
                && FIXED_INTERVAL_TYPES
                    .iter()
                    .any(|t| t.eq_ignore_ascii_case(&type_name))
            {
                return Err(CloudError::Validation(
                    "'interval_min' doesn't need to be set if type_name is 'PAGER_DUTY', 'OPS_GENIE' or 'VICTOR_OPS'"
                        .to_string(),
                ));
            }

            let text = |v: &Option<String>| v.clone().unwrap_or_default();
            Ok(Notification {
                api_token: text(&n.api_token),
                channel_name: text(&n.channel_name),
                datadog_api_key: text(&n.datadog_api_key),
                datadog_region: text(&n.datadog_region),
                delay_min: Some(n.delay_min.unwrap_or_default()),
                email_address: text(&n.email_address),
                email_enabled: n.email_enabled,
                interval_min: n.interval_min.filter(|i| *i > 0),
                mobile_number: text(&n.mobile_number),
                ops_genie_api_key: text(&n.ops_genie_api_key),
                ops_genie_region: text(&n.ops_genie_region),
                service_key: text(&n.service_key),
                sms_enabled: n.sms_enabled,
                team_id: text(&n.team_id),
                team_name: String::new(),
                notifier_id: text(&n.notifier_id),
                type_name,
                username: text(&n.username),
                victor_ops_api_key: text(&n.victor_ops_api_key),
                victor_ops_routing_key: text(&n.victor_ops_routing_key),
                roles: n.roles.clone(),
                microsoft_teams_webhook_url: text(&n.microsoft_teams_webhook_url),
                webhook_secret: text(&n.webhook_secret),
                webhook_url: text(&n.webhook_url),
            })
        })
        .collect()
}

fn new_threshold(plan: &[ThresholdConfigModel]) -> Option<Threshold> {
    plan.first().map(|t| Threshold {
        operator: t.operator.clone().unwrap_or_default(),
        threshold: t.threshold.unwrap_or_default(),
        units: t.units.clone().unwrap_or_default(),
    })
}

fn new_metric_threshold(plan: &[MetricThresholdConfigModel]) -> Option<MetricThreshold> {
    plan.first().map(|m| MetricThreshold {
        metric_name: m.metric_name.clone().unwrap_or_default(),
        operator: m.operator.clone().unwrap_or_default(),
        threshold: m.threshold.unwrap_or_default(),
        units: m.units.clone().unwrap_or_default(),
        mode: m.mode.clone().unwrap_or_default(),
    })
}

fn new_matcher_list(plan: &[MatcherModel]) -> Vec<Matcher> {
    plan.iter()
        .map(|m| Matcher {
            field_name: m.field_name.clone().unwrap_or_default(),
            operator: m.operator.clone().unwrap_or_default(),
            value: m.value.clone().unwrap_or_default(),
        })
        .collect()
}

// ============ Response -> state ============

fn reconcile(api: AlertConfiguration, current: &AlertConfigurationModel) -> AlertConfigurationModel {
    let notifications = api.notifications.unwrap_or_default();
    let (notification, pairing) = reconcile_keyed_list(
        &notifications,
        &current.notification,
        rebuild_notification,
        merge_notification,
    );
    tracing::debug!("Reconciled notifications: {:?}", pairing);

    AlertConfigurationModel {
        id: current.id.clone(),
        project_id: current.project_id.clone(),
        alert_configuration_id: api.id,
        event_type: api.event_type_name.unwrap_or_default(),
        created: api.created,
        updated: api.updated,
        enabled: api.enabled,
        matcher: reconcile_list(
            &api.matchers.unwrap_or_default(),
            &current.matcher,
            |m| MatcherModel {
                field_name: null_if_empty(&m.field_name),
                operator: null_if_empty(&m.operator),
                value: null_if_empty(&m.value),
            },
            |m, s| MatcherModel {
                field_name: overwrite_if_set(&s.field_name, null_if_empty(&m.field_name)),
                operator: overwrite_if_set(&s.operator, null_if_empty(&m.operator)),
                value: overwrite_if_set(&s.value, null_if_empty(&m.value)),
            },
        ),
        metric_threshold_config: reconcile_single(
            api.metric_threshold.as_ref(),
            &current.metric_threshold_config,
            |m| MetricThresholdConfigModel {
                metric_name: null_if_empty(&m.metric_name),
                operator: null_if_empty(&m.operator),
                threshold: Some(m.threshold),
                units: null_if_empty(&m.units),
                mode: null_if_empty(&m.mode),
            },
            |m, s| MetricThresholdConfigModel {
                metric_name: overwrite_if_set(&s.metric_name, null_if_empty(&m.metric_name)),
                operator: overwrite_if_set(&s.operator, null_if_empty(&m.operator)),
                threshold: Some(m.threshold),
                units: overwrite_if_set(&s.units, null_if_empty(&m.units)),
                mode: overwrite_if_set(&s.mode, null_if_empty(&m.mode)),
            },
        ),
        threshold_config: reconcile_single(
            api.threshold.as_ref(),
            &current.threshold_config,
            |t| ThresholdConfigModel {
                operator: null_if_empty(&t.operator),
                threshold: Some(t.threshold),
                units: null_if_empty(&t.units),
            },
            |t, s| ThresholdConfigModel {
                operator: overwrite_if_set(&s.operator, null_if_empty(&t.operator)),
                threshold: Some(t.threshold),
                units: overwrite_if_set(&s.units, null_if_empty(&t.units)),
            },
        ),
        notification,
    }
}

fn rebuild_notification(n: &Notification) -> NotificationModel {
    NotificationModel {
        type_name: null_if_empty(&n.type_name),
        channel_name: null_if_empty(&n.channel_name),
        datadog_region: null_if_empty(&n.datadog_region),
        email_address: null_if_empty(&n.email_address),
        mobile_number: null_if_empty(&n.mobile_number),
        ops_genie_region: null_if_empty(&n.ops_genie_region),
        team_id: null_if_empty(&n.team_id),
        username: null_if_empty(&n.username),
        ..computed_notification_fields(n)
    }
}

fn merge_notification(n: &Notification, s: &NotificationModel) -> NotificationModel {
    NotificationModel {
        type_name: overwrite_if_set(&s.type_name, null_if_empty(&n.type_name)),
        channel_name: overwrite_if_set(&s.channel_name, null_if_empty(&n.channel_name)),
        datadog_region: overwrite_if_set(&s.datadog_region, null_if_empty(&n.datadog_region)),
        email_address: overwrite_if_set(&s.email_address, null_if_empty(&n.email_address)),
        mobile_number: overwrite_if_set(&s.mobile_number, null_if_empty(&n.mobile_number)),
        ops_genie_region: overwrite_if_set(
            &s.ops_genie_region,
            null_if_empty(&n.ops_genie_region),
        ),
        team_id: overwrite_if_set(&s.team_id, null_if_empty(&n.team_id)),
        username: overwrite_if_set(&s.username, null_if_empty(&n.username)),

        api_token: keep_sensitive(&s.api_token),
        datadog_api_key: keep_sensitive(&s.datadog_api_key),
        ops_genie_api_key: keep_sensitive(&s.ops_genie_api_key),
        service_key: keep_sensitive(&s.service_key),
        victor_ops_api_key: keep_sensitive(&s.victor_ops_api_key),
        victor_ops_routing_key: keep_sensitive(&s.victor_ops_routing_key),
        webhook_url: keep_sensitive(&s.webhook_url),
        webhook_secret: keep_sensitive(&s.webhook_secret),
        microsoft_teams_webhook_url: keep_sensitive(&s.microsoft_teams_webhook_url),

        ..computed_notification_fields(n)
    }
}

/// Fields the server always owns; secrets are left absent
fn computed_notification_fields(n: &Notification) -> NotificationModel {
    NotificationModel {
        roles: n.roles.clone(),
        delay_min: Some(n.delay_min.unwrap_or_default()),
        interval_min: Some(n.interval_min.unwrap_or_default()),
        email_enabled: Some(n.email_enabled == Some(true)),
        sms_enabled: Some(n.sms_enabled == Some(true)),
        notifier_id: null_if_empty(&n.notifier_id),
        team_name: null_if_empty(&n.team_name),
        ..Default::default()
    }
}

/// Which top-level attributes of the plan differ from state
#[derive(Debug, Default)]
struct Changes {
    enabled: bool,
    event_type: bool,
    metric_threshold: bool,
    threshold: bool,
    matchers: bool,
    notifications: bool,
}

impl Changes {
    fn between(state: &AlertConfigurationModel, plan: &AlertConfigurationModel) -> Self {
        Self {
            enabled: plan.enabled.is_some() && plan.enabled != state.enabled,
            event_type: plan.event_type != state.event_type,
            metric_threshold: plan.metric_threshold_config != state.metric_threshold_config,
            threshold: plan.threshold_config != state.threshold_config,
            matchers: plan.matcher != state.matcher,
            notifications: plan.notification.len() != state.notification.len()
                || plan
                    .notification
                    .iter()
                    .zip(&state.notification)
                    .any(|(p, s)| !p.satisfied_by(s)),
        }
    }

    fn only_enabled(&self) -> bool {
        self.enabled
            && !(self.event_type
                || self.metric_threshold
                || self.threshold
                || self.matchers
                || self.notifications)
    }
}

#[async_trait]
impl Resource for AlertConfigurationResource {
    type Model = AlertConfigurationModel;
    const TYPE_NAME: &'static str = "mongodbatlas_alert_configuration";

    async fn create(&self, plan: AlertConfigurationModel) -> Result<AlertConfigurationModel> {
        validate(&plan)?;

        let request = AlertConfiguration {
            event_type_name: Some(plan.event_type.clone()),
            enabled: plan.enabled,
            matchers: Some(new_matcher_list(&plan.matcher)),
            metric_threshold: new_metric_threshold(&plan.metric_threshold_config),
            threshold: new_threshold(&plan.threshold_config),
            notifications: Some(new_notification_list(&plan.notification)?),
            ..Default::default()
        };

        let created = self
            .api
            .create_alert_configuration(&plan.project_id, &request)
            .await
            .map_err(|e| e.during("creating alert configuration", &plan.project_id))?;
        let alert_id = created.id.clone().ok_or_else(|| {
            CloudError::api(
                "creating alert configuration",
                &plan.project_id,
                "response carried no id",
            )
        })?;
        tracing::info!("Created alert configuration {} ({})", alert_id, plan.event_type);

        let mut current = plan;
        current.id = Some(encode_state_id(&[
            ("id", alert_id.as_str()),
            ("project_id", current.project_id.as_str()),
        ]));
        Ok(reconcile(created, &current))
    }

    async fn read(&self, state: AlertConfigurationModel) -> Result<Option<AlertConfigurationModel>> {
        let (project_id, alert_id) = state_id(&state)?;
        let alert = found(
            self.api.get_alert_configuration(&project_id, &alert_id).await,
            "reading alert configuration",
            &alert_id,
        )?;
        Ok(alert.map(|a| reconcile(a, &state)))
    }

    async fn update(
        &self,
        state: AlertConfigurationModel,
        plan: AlertConfigurationModel,
    ) -> Result<AlertConfigurationModel> {
        let (project_id, alert_id) = state_id(&state)?;
        if plan.project_id != project_id {
            return Err(CloudError::Validation(
                "project_id cannot change for an existing alert configuration; delete and create it instead"
                    .to_string(),
            ));
        }
        validate(&plan)?;

        let changes = Changes::between(&state, &plan);
        let updated = if changes.only_enabled() {
            let enabled = plan.enabled.unwrap_or_default();
            tracing::info!(
                "Switching alert configuration {} enabled={}",
                alert_id,
                enabled
            );
            self.api
                .enable_alert_configuration(&project_id, &alert_id, enabled)
                .await
                .map_err(|e| e.during("updating alert configuration", &alert_id))?
        } else {
            // Atlas rejects partial bodies, so the current record is resent
            // with only the changed blocks replaced
            let mut request = self
                .api
                .get_alert_configuration(&project_id, &alert_id)
                .await
                .map_err(|e| e.during("reading alert configuration", &alert_id))?;
            request.id = None;
            request.group_id = None;
            request.created = None;
            request.updated = None;

            if changes.enabled {
                request.enabled = plan.enabled;
            }
            if changes.event_type {
                request.event_type_name = Some(plan.event_type.clone());
            }
            if changes.metric_threshold {
                request.metric_threshold = new_metric_threshold(&plan.metric_threshold_config);
            }
            if changes.threshold {
                request.threshold = new_threshold(&plan.threshold_config);
            }
            if changes.matchers {
                request.matchers = Some(new_matcher_list(&plan.matcher));
            }
            request.notifications = Some(new_notification_list(&plan.notification)?);

            self.api
                .update_alert_configuration(&project_id, &alert_id, &request)
                .await
                .map_err(|e| e.during("updating alert configuration", &alert_id))?
        };

        let mut current = plan;
        current.id = state.id.clone();
        Ok(reconcile(updated, &current))
    }

    async fn delete(&self, state: AlertConfigurationModel) -> Result<()> {
        let (project_id, alert_id) = state_id(&state)?;
        match self
            .api
            .delete_alert_configuration(&project_id, &alert_id)
            .await
        {
            Ok(()) => {
                tracing::info!("Deleted alert configuration {}", alert_id);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!("Alert configuration {} was already gone", alert_id);
                Ok(())
            }
            Err(e) => Err(e.during("deleting alert configuration", &alert_id)),
        }
    }

    async fn import(&self, import_id: &str) -> Result<AlertConfigurationModel> {
        let parts = split_import_id(import_id, 2, IMPORT_FORMAT)?;
        let (project_id, alert_id) = (parts[0], parts[1]);
        Ok(AlertConfigurationModel {
            id: Some(encode_state_id(&[("id", alert_id), ("project_id", project_id)])),
            project_id: project_id.to_string(),
            ..Default::default()
        })
    }
}
