//! Atlas Admin API client
//!
//! [`AtlasApi`] is the outbound seam every resource handler talks to.
//! [`AtlasClient`] implements it over HTTPS with a bearer token.

use crate::error::{AtlasError, Result};
use crate::models::{
    AlertConfiguration, ApiErrorBody, Cluster, CloudProviderSnapshot, EnableAlertConfiguration,
    Group, Paginated, TenantRestore,
};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;

pub const DEFAULT_BASE_URL: &str = "https://cloud.mongodb.com/";
const API_PREFIX: &str = "api/atlas/v2";
const ATLAS_MEDIA_TYPE: &str = "application/vnd.atlas.2023-01-01+json";

/// Per-resource operations of the Atlas Admin API
#[async_trait]
pub trait AtlasApi: Send + Sync {
    async fn list_projects(&self) -> Result<Paginated<Group>>;
    async fn get_project(&self, project_id: &str) -> Result<Group>;
    async fn create_project(&self, project: &Group) -> Result<Group>;
    async fn update_project(&self, project_id: &str, project: &Group) -> Result<Group>;
    async fn delete_project(&self, project_id: &str) -> Result<()>;

    async fn get_cluster(&self, project_id: &str, cluster_name: &str) -> Result<Cluster>;
    async fn create_cluster(&self, project_id: &str, cluster: &Cluster) -> Result<Cluster>;
    async fn update_cluster(
        &self,
        project_id: &str,
        cluster_name: &str,
        cluster: &Cluster,
    ) -> Result<Cluster>;
    async fn delete_cluster(&self, project_id: &str, cluster_name: &str) -> Result<()>;

    async fn get_alert_configuration(
        &self,
        project_id: &str,
        alert_id: &str,
    ) -> Result<AlertConfiguration>;
    async fn create_alert_configuration(
        &self,
        project_id: &str,
        alert: &AlertConfiguration,
    ) -> Result<AlertConfiguration>;
    async fn update_alert_configuration(
        &self,
        project_id: &str,
        alert_id: &str,
        alert: &AlertConfiguration,
    ) -> Result<AlertConfiguration>;
    async fn enable_alert_configuration(
        &self,
        project_id: &str,
        alert_id: &str,
        enabled: bool,
    ) -> Result<AlertConfiguration>;
    async fn delete_alert_configuration(&self, project_id: &str, alert_id: &str) -> Result<()>;

    async fn get_snapshot(
        &self,
        project_id: &str,
        cluster_name: &str,
        snapshot_id: &str,
    ) -> Result<CloudProviderSnapshot>;
    async fn create_snapshot(
        &self,
        project_id: &str,
        cluster_name: &str,
        snapshot: &CloudProviderSnapshot,
    ) -> Result<CloudProviderSnapshot>;
    async fn delete_snapshot(
        &self,
        project_id: &str,
        cluster_name: &str,
        snapshot_id: &str,
    ) -> Result<()>;

    async fn list_shared_tier_restore_jobs(
        &self,
        project_id: &str,
        cluster_name: &str,
    ) -> Result<Paginated<TenantRestore>>;
}

/// Connection settings for [`AtlasClient`]
#[derive(Debug, Clone)]
pub struct AtlasConfig {
    pub access_token: String,
    pub base_url: String,
}

impl AtlasConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// HTTPS client for the Atlas Admin API
pub struct AtlasClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl AtlasClient {
    pub fn new(config: AtlasConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(AtlasError::InvalidBaseUrl(config.base_url));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            access_token: config.access_token,
            base_url,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_PREFIX, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        tracing::debug!("{} {}", method, url);
        self.client
            .request(method, url)
            .bearer_auth(&self.access_token)
            .header(ACCEPT, ATLAS_MEDIA_TYPE)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = check_status(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        check_status(request.send().await?).await?;
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let parsed: ApiErrorBody = serde_json::from_str(&body).unwrap_or_default();
    let detail = parsed
        .detail
        .or(parsed.reason)
        .unwrap_or_else(|| body.trim().to_string());

    Err(AtlasError::Api {
        status: status.as_u16(),
        error_code: parsed.error_code.unwrap_or_else(|| "UNKNOWN".to_string()),
        detail,
    })
}

#[async_trait]
impl AtlasApi for AtlasClient {
    async fn list_projects(&self) -> Result<Paginated<Group>> {
        self.send(self.request(Method::GET, "groups")).await
    }

    async fn get_project(&self, project_id: &str) -> Result<Group> {
        self.send(self.request(Method::GET, &format!("groups/{}", project_id)))
            .await
    }

    async fn create_project(&self, project: &Group) -> Result<Group> {
        self.send(self.request(Method::POST, "groups").json(project))
            .await
    }

    async fn update_project(&self, project_id: &str, project: &Group) -> Result<Group> {
        self.send(
            self.request(Method::PATCH, &format!("groups/{}", project_id))
                .json(project),
        )
        .await
    }

    async fn delete_project(&self, project_id: &str) -> Result<()> {
        self.send_empty(self.request(Method::DELETE, &format!("groups/{}", project_id)))
            .await
    }

    async fn get_cluster(&self, project_id: &str, cluster_name: &str) -> Result<Cluster> {
        self.send(self.request(
            Method::GET,
            &format!("groups/{}/clusters/{}", project_id, cluster_name),
        ))
        .await
    }

    async fn create_cluster(&self, project_id: &str, cluster: &Cluster) -> Result<Cluster> {
        self.send(
            self.request(Method::POST, &format!("groups/{}/clusters", project_id))
                .json(cluster),
        )
        .await
    }

    async fn update_cluster(
        &self,
        project_id: &str,
        cluster_name: &str,
        cluster: &Cluster,
    ) -> Result<Cluster> {
        self.send(
            self.request(
                Method::PATCH,
                &format!("groups/{}/clusters/{}", project_id, cluster_name),
            )
            .json(cluster),
        )
        .await
    }

    async fn delete_cluster(&self, project_id: &str, cluster_name: &str) -> Result<()> {
        self.send_empty(self.request(
            Method::DELETE,
            &format!("groups/{}/clusters/{}", project_id, cluster_name),
        ))
        .await
    }

    async fn get_alert_configuration(
        &self,
        project_id: &str,
        alert_id: &str,
    ) -> Result<AlertConfiguration> {
        self.send(self.request(
            Method::GET,
            &format!("groups/{}/alertConfigs/{}", project_id, alert_id),
        ))
        .await
    }

    async fn create_alert_configuration(
        &self,
        project_id: &str,
        alert: &AlertConfiguration,
    ) -> Result<AlertConfiguration> {
        self.send(
            self.request(Method::POST, &format!("groups/{}/alertConfigs", project_id))
                .json(alert),
        )
        .await
    }

    async fn update_alert_configuration(
        &self,
        project_id: &str,
        alert_id: &str,
        alert: &AlertConfiguration,
    ) -> Result<AlertConfiguration> {
        self.send(
            self.request(
                Method::PUT,
                &format!("groups/{}/alertConfigs/{}", project_id, alert_id),
            )
            .json(alert),
        )
        .await
    }

    async fn enable_alert_configuration(
        &self,
        project_id: &str,
        alert_id: &str,
        enabled: bool,
    ) -> Result<AlertConfiguration> {
        self.send(
            self.request(
                Method::PATCH,
                &format!("groups/{}/alertConfigs/{}", project_id, alert_id),
            )
            .json(&EnableAlertConfiguration { enabled }),
        )
        .await
    }

    async fn delete_alert_configuration(&self, project_id: &str, alert_id: &str) -> Result<()> {
        self.send_empty(self.request(
            Method::DELETE,
            &format!("groups/{}/alertConfigs/{}", project_id, alert_id),
        ))
        .await
    }

    async fn get_snapshot(
        &self,
        project_id: &str,
        cluster_name: &str,
        snapshot_id: &str,
    ) -> Result<CloudProviderSnapshot> {
        self.send(self.request(
            Method::GET,
            &format!(
                "groups/{}/clusters/{}/backup/snapshots/{}",
                project_id, cluster_name, snapshot_id
            ),
        ))
        .await
    }

    async fn create_snapshot(
        &self,
        project_id: &str,
        cluster_name: &str,
        snapshot: &CloudProviderSnapshot,
    ) -> Result<CloudProviderSnapshot> {
        self.send(
            self.request(
                Method::POST,
                &format!(
                    "groups/{}/clusters/{}/backup/snapshots",
                    project_id, cluster_name
                ),
            )
            .json(snapshot),
        )
        .await
    }

    async fn delete_snapshot(
        &self,
        project_id: &str,
        cluster_name: &str,
        snapshot_id: &str,
    ) -> Result<()> {
        self.send_empty(self.request(
            Method::DELETE,
            &format!(
                "groups/{}/clusters/{}/backup/snapshots/{}",
                project_id, cluster_name, snapshot_id
            ),
        ))
        .await
    }

    async fn list_shared_tier_restore_jobs(
        &self,
        project_id: &str,
        cluster_name: &str,
    ) -> Result<Paginated<TenantRestore>> {
        self.send(self.request(
            Method::GET,
            &format!(
                "groups/{}/clusters/{}/backup/tenant/restores",
                project_id, cluster_name
            ),
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AtlasClient {
        AtlasClient::new(AtlasConfig::new("test-token").with_base_url(server.uri())).unwrap()
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = AtlasClient::new(AtlasConfig::new("t").with_base_url("cloud.mongodb.com"));
        assert!(matches!(result, Err(AtlasError::InvalidBaseUrl(_))));
    }

    #[test]
    fn test_url_joins_prefix_once() {
        let client =
            AtlasClient::new(AtlasConfig::new("t").with_base_url("https://cloud.mongodb.com/"))
                .unwrap();
        assert_eq!(
            client.url("groups/p1"),
            "https://cloud.mongodb.com/api/atlas/v2/groups/p1"
        );
    }

    #[tokio::test]
    async fn test_get_project_sends_token_and_media_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/atlas/v2/groups/p1"))
            .and(header("Authorization", "Bearer test-token"))
            .and(header("Accept", ATLAS_MEDIA_TYPE))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "p1",
                "name": "analytics",
                "orgId": "o1",
                "clusterCount": 2
            })))
            .mount(&server)
            .await;

        let project = client_for(&server).get_project("p1").await.unwrap();
        assert_eq!(project.name.as_deref(), Some("analytics"));
        assert_eq!(project.cluster_count, Some(2));
    }

    #[tokio::test]
    async fn test_not_found_carries_status_and_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/atlas/v2/groups/p1/alertConfigs/a1"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": 404,
                "errorCode": "ALERT_CONFIG_NOT_FOUND",
                "detail": "No alert configuration with ID a1 exists in group p1."
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get_alert_configuration("p1", "a1")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        match err {
            AtlasError::Api { error_code, .. } => assert_eq!(error_code, "ALERT_CONFIG_NOT_FOUND"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_error_body_becomes_detail() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/atlas/v2/groups/p1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let err = client_for(&server).delete_project("p1").await.unwrap_err();
        match err {
            AtlasError::Api {
                status,
                error_code,
                detail,
            } => {
                assert_eq!(status, 500);
                assert_eq!(error_code, "UNKNOWN");
                assert_eq!(detail, "upstream exploded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_enable_sends_only_enabled_flag() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/atlas/v2/groups/p1/alertConfigs/a1"))
            .and(body_json(json!({"enabled": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "a1",
                "enabled": false,
                "eventTypeName": "HOST_DOWN"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let alert = client_for(&server)
            .enable_alert_configuration("p1", "a1", false)
            .await
            .unwrap();
        assert_eq!(alert.enabled, Some(false));
    }

    #[tokio::test]
    async fn test_create_snapshot_posts_description_and_retention() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/atlas/v2/groups/p1/clusters/Cluster0/backup/snapshots"))
            .and(body_json(json!({"description": "nightly", "retentionInDays": 3})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "5f1c0c1b2a3b4c5d6e7f8091",
                "status": "queued"
            })))
            .mount(&server)
            .await;

        let request = CloudProviderSnapshot {
            description: Some("nightly".to_string()),
            retention_in_days: Some(3),
            ..Default::default()
        };
        let snapshot = client_for(&server)
            .create_snapshot("p1", "Cluster0", &request)
            .await
            .unwrap();
        assert_eq!(snapshot.status.as_deref(), Some("queued"));
    }

    #[tokio::test]
    async fn test_delete_accepts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/atlas/v2/groups/p1/alertConfigs/a1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        client_for(&server)
            .delete_alert_configuration("p1", "a1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_restore_jobs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/api/atlas/v2/groups/p1/clusters/Cluster0/backup/tenant/restores",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"id": "j1", "status": "COMPLETED", "deliveryType": "RESTORE"}],
                "totalCount": 1
            })))
            .mount(&server)
            .await;

        let jobs = client_for(&server)
            .list_shared_tier_restore_jobs("p1", "Cluster0")
            .await
            .unwrap();
        assert_eq!(jobs.total_count, 1);
        assert_eq!(jobs.results[0].status.as_deref(), Some("COMPLETED"));
    }
}
