//! `mongodbatlas_project`

use super::{found, is_object_id, require};
use crate::client::AtlasApi;
use crate::models::Group;
use async_trait::async_trait;
use atlasflow_cloud::{CloudError, Resource, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectModel {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub org_id: String,
    #[serde(default)]
    pub cluster_count: Option<i64>,
    #[serde(default)]
    pub created: Option<String>,
}

pub struct ProjectResource {
    api: Arc<dyn AtlasApi>,
}

impl ProjectResource {
    pub fn new(api: Arc<dyn AtlasApi>) -> Self {
        Self { api }
    }
}

fn project_id(state: &ProjectModel) -> Result<&str> {
    state
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| CloudError::StateError("project state has no id".to_string()))
}

fn from_group(group: Group) -> ProjectModel {
    ProjectModel {
        id: group.id,
        name: group.name.unwrap_or_default(),
        org_id: group.org_id.unwrap_or_default(),
        cluster_count: group.cluster_count,
        created: group.created,
    }
}

/// Lookups by id may omit it from the response body
fn with_known_id(mut model: ProjectModel, id: &str) -> ProjectModel {
    if model.id.as_deref().is_none_or(str::is_empty) {
        model.id = Some(id.to_string());
    }
    model
}

#[async_trait]
impl Resource for ProjectResource {
    type Model = ProjectModel;
    const TYPE_NAME: &'static str = "mongodbatlas_project";

    async fn create(&self, plan: ProjectModel) -> Result<ProjectModel> {
        require(&plan.name, "name")?;
        require(&plan.org_id, "org_id")?;

        let request = Group {
            name: Some(plan.name.clone()),
            org_id: Some(plan.org_id.clone()),
            ..Default::default()
        };
        let group = self
            .api
            .create_project(&request)
            .await
            .map_err(|e| e.during("creating project", &plan.name))?;

        if group.id.as_deref().is_none_or(str::is_empty) {
            return Err(CloudError::api(
                "creating project",
                &plan.name,
                "response carried no id",
            ));
        }
        tracing::info!("Created project {}", plan.name);
        Ok(from_group(group))
    }

    async fn read(&self, state: ProjectModel) -> Result<Option<ProjectModel>> {
        let id = project_id(&state)?;
        Ok(found(self.api.get_project(id).await, "reading project", id)?
            .map(|group| with_known_id(from_group(group), id)))
    }

    async fn update(&self, state: ProjectModel, plan: ProjectModel) -> Result<ProjectModel> {
        let id = project_id(&state)?;
        if !plan.org_id.is_empty() && plan.org_id != state.org_id {
            return Err(CloudError::Validation(
                "org_id cannot change for an existing project; delete and create it instead"
                    .to_string(),
            ));
        }
        require(&plan.name, "name")?;

        let request = Group {
            name: Some(plan.name.clone()),
            ..Default::default()
        };
        let group = self
            .api
            .update_project(id, &request)
            .await
            .map_err(|e| e.during("updating project", id))?;
        Ok(with_known_id(from_group(group), id))
    }

    async fn delete(&self, state: ProjectModel) -> Result<()> {
        let id = project_id(&state)?;
        self.api
            .delete_project(id)
            .await
            .map_err(|e| e.during("deleting project", id))?;
        tracing::info!("Deleted project {}", id);
        Ok(())
    }

    async fn import(&self, import_id: &str) -> Result<ProjectModel> {
        if !is_object_id(import_id) {
            return Err(CloudError::identifier_format(import_id, "{project_id}"));
        }
        Ok(ProjectModel {
            id: Some(import_id.to_string()),
            ..Default::default()
        })
    }
}
