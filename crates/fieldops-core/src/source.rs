// ── Data source seam ──
//
// The list controller and pipeline talk to the backend only through
// `DataSource`. Production uses `RestSource`; tests inject fakes.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use fieldops_api::{Page, RestClient};

use crate::error::CoreError;
use crate::model::{Entity, ListQuery, PageSpec};

/// CRUD access to one entity collection.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// One page of the collection for `query`.
    async fn list(&self, query: &ListQuery) -> Result<Page<Entity>, CoreError>;

    async fn get(&self, id: &str) -> Result<Entity, CoreError>;

    async fn create(&self, body: &Value) -> Result<Entity, CoreError>;

    async fn update(&self, id: &str, body: &Value) -> Result<Entity, CoreError>;

    async fn delete(&self, id: &str) -> Result<(), CoreError>;
}

/// `DataSource` backed by the REST API.
#[derive(Debug, Clone)]
pub struct RestSource {
    client: Arc<RestClient>,
    spec: &'static PageSpec,
}

impl RestSource {
    pub fn new(client: Arc<RestClient>, spec: &'static PageSpec) -> Self {
        Self { client, spec }
    }

    pub fn spec(&self) -> &'static PageSpec {
        self.spec
    }

    fn map_err(&self, id: &str, err: fieldops_api::Error) -> CoreError {
        if err.is_not_found() {
            CoreError::NotFound {
                entity_type: self.spec.noun.to_owned(),
                identifier: id.to_owned(),
            }
        } else {
            err.into()
        }
    }
}

#[async_trait]
impl DataSource for RestSource {
    async fn list(&self, query: &ListQuery) -> Result<Page<Entity>, CoreError> {
        let params = query.to_params();
        debug!(collection = self.spec.collection, page = params.page, "listing");
        Ok(self.client.list(self.spec.collection, &params).await?)
    }

    async fn get(&self, id: &str) -> Result<Entity, CoreError> {
        self.client
            .get(self.spec.collection, id)
            .await
            .map_err(|e| self.map_err(id, e))
    }

    async fn create(&self, body: &Value) -> Result<Entity, CoreError> {
        Ok(self.client.create(self.spec.collection, body).await?)
    }

    async fn update(&self, id: &str, body: &Value) -> Result<Entity, CoreError> {
        self.client
            .update(self.spec.collection, id, body, self.spec.update_method)
            .await
            .map_err(|e| self.map_err(id, e))
    }

    async fn delete(&self, id: &str) -> Result<(), CoreError> {
        self.client
            .delete(self.spec.collection, id)
            .await
            .map_err(|e| self.map_err(id, e))
    }
}

