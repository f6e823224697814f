//! Resource and data source handler traits
//!
//! Handlers are written against typed records ([`Resource`], [`DataSource`]).
//! The blanket impls turn them into the JSON-in/JSON-out handlers
//! ([`ResourceHandler`], [`DataSourceHandler`]) that a provider registers:
//! decode the plan/state attribute map, run the typed operation, encode the
//! reconciled record back.

use crate::error::{CloudError, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A managed resource type, expressed over its typed record
#[async_trait]
pub trait Resource: Send + Sync {
    /// Desired/state record
    type Model: Serialize + DeserializeOwned + Send + Sync;

    /// External type name (e.g. `mongodbatlas_alert_configuration`)
    const TYPE_NAME: &'static str;

    /// Create the remote entity and return the populated state record
    async fn create(&self, plan: Self::Model) -> Result<Self::Model>;

    /// Refresh state; `None` means the remote entity is gone
    async fn read(&self, state: Self::Model) -> Result<Option<Self::Model>>;

    /// Apply the plan to an existing entity
    async fn update(&self, state: Self::Model, plan: Self::Model) -> Result<Self::Model>;

    async fn delete(&self, state: Self::Model) -> Result<()>;

    /// Build the minimal record for a human-typed import id
    ///
    /// The result is passed through [`Resource::read`] before it is stored.
    async fn import(&self, import_id: &str) -> Result<Self::Model>;
}

/// A read-only data source, expressed over its typed record
#[async_trait]
pub trait DataSource: Send + Sync {
    type Model: Serialize + DeserializeOwned + Send + Sync;

    const TYPE_NAME: &'static str;

    async fn read(&self, config: Self::Model) -> Result<Self::Model>;
}

/// Object-safe resource handler working on attribute maps
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    fn type_name(&self) -> &str;

    async fn create(&self, plan: Value) -> Result<Value>;

    async fn read(&self, state: Value) -> Result<Option<Value>>;

    async fn update(&self, state: Value, plan: Value) -> Result<Value>;

    async fn delete(&self, state: Value) -> Result<()>;

    async fn import(&self, import_id: &str) -> Result<Value>;
}

/// Object-safe data source handler working on attribute maps
#[async_trait]
pub trait DataSourceHandler: Send + Sync {
    fn type_name(&self) -> &str;

    async fn read(&self, config: Value) -> Result<Value>;
}

/// Decode an attribute map into a typed record
pub fn decode_record<M: DeserializeOwned>(resource_type: &str, value: Value) -> Result<M> {
    serde_json::from_value(value).map_err(|source| CloudError::Decode {
        resource_type: resource_type.to_string(),
        source,
    })
}

/// Encode a typed record into an attribute map
pub fn encode_record<M: Serialize>(record: &M) -> Result<Value> {
    Ok(serde_json::to_value(record)?)
}

/// The composite identifier stored in a record's `id` attribute
pub fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

#[async_trait]
impl<R: Resource> ResourceHandler for R {
    fn type_name(&self) -> &str {
        R::TYPE_NAME
    }

    async fn create(&self, plan: Value) -> Result<Value> {
        let plan: R::Model = decode_record(R::TYPE_NAME, plan)?;
        let state = Resource::create(self, plan).await?;
        encode_record(&state)
    }

    async fn read(&self, state: Value) -> Result<Option<Value>> {
        let state: R::Model = decode_record(R::TYPE_NAME, state)?;
        match Resource::read(self, state).await? {
            Some(state) => Ok(Some(encode_record(&state)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, state: Value, plan: Value) -> Result<Value> {
        let state: R::Model = decode_record(R::TYPE_NAME, state)?;
        let plan: R::Model = decode_record(R::TYPE_NAME, plan)?;
        let state = Resource::update(self, state, plan).await?;
        encode_record(&state)
    }

    async fn delete(&self, state: Value) -> Result<()> {
        let state: R::Model = decode_record(R::TYPE_NAME, state)?;
        Resource::delete(self, state).await
    }

    async fn import(&self, import_id: &str) -> Result<Value> {
        let partial = Resource::import(self, import_id).await?;
        match Resource::read(self, partial).await? {
            Some(state) => encode_record(&state),
            None => Err(CloudError::ResourceNotFound(format!(
                "{} {}",
                R::TYPE_NAME,
                import_id
            ))),
        }
    }
}

#[async_trait]
impl<D: DataSource> DataSourceHandler for D {
    fn type_name(&self) -> &str {
        D::TYPE_NAME
    }

    async fn read(&self, config: Value) -> Result<Value> {
        let config: D::Model = decode_record(D::TYPE_NAME, config)?;
        let result = DataSource::read(self, config).await?;
        encode_record(&result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct Widget {
        #[serde(default)]
        id: Option<String>,
        name: String,
        #[serde(default)]
        size: Option<u32>,
    }

    #[derive(Default)]
    struct WidgetResource {
        remote: Mutex<Option<Widget>>,
    }

    #[async_trait]
    impl Resource for WidgetResource {
        type Model = Widget;
        const TYPE_NAME: &'static str = "widget";

        async fn create(&self, mut plan: Widget) -> Result<Widget> {
            plan.id = Some("w-1".to_string());
            plan.size.get_or_insert(3);
            *self.remote.lock().unwrap() = Some(plan.clone());
            Ok(plan)
        }

        async fn read(&self, _state: Widget) -> Result<Option<Widget>> {
            Ok(self.remote.lock().unwrap().clone())
        }

        async fn update(&self, _state: Widget, plan: Widget) -> Result<Widget> {
            *self.remote.lock().unwrap() = Some(plan.clone());
            Ok(plan)
        }

        async fn delete(&self, _state: Widget) -> Result<()> {
            self.remote.lock().unwrap().take();
            Ok(())
        }

        async fn import(&self, import_id: &str) -> Result<Widget> {
            Ok(Widget {
                id: Some(import_id.to_string()),
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn test_handler_round_trips_attribute_maps() {
        let handler: &dyn ResourceHandler = &WidgetResource::default();
        let state = handler.create(json!({"name": "gear"})).await.unwrap();
        assert_eq!(record_id(&state), Some("w-1"));
        assert_eq!(state["size"], json!(3));

        let read = handler.read(state.clone()).await.unwrap();
        assert_eq!(read, Some(state.clone()));

        handler.delete(state.clone()).await.unwrap();
        assert_eq!(handler.read(state).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_decode_failure_is_reported() {
        let handler: &dyn ResourceHandler = &WidgetResource::default();
        let err = handler.create(json!({"name": 42})).await.unwrap_err();
        match err {
            CloudError::Decode { resource_type, .. } => assert_eq!(resource_type, "widget"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_import_of_missing_entity_is_not_found() {
        let handler: &dyn ResourceHandler = &WidgetResource::default();
        let err = handler.import("w-9").await.unwrap_err();
        assert!(matches!(err, CloudError::ResourceNotFound(_)));
    }
}
