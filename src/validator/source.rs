use crate::schema::SchemaSettings;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// Error retrieving a schema document
#[derive(Error, Debug)]
pub enum SchemaFetchError {
    #[error("Could not read schema from HTTP, response status is {0}")]
    Status(reqwest::StatusCode),
    #[error("Could not read schema from HTTP: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Could not read schema file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Schema is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where JSON schemas for Kubernetes kinds come from
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Describe where the schema for `kind` is read from, for error messages
    fn location(&self, settings: &SchemaSettings, kind: &str) -> String;

    async fn fetch(
        &self,
        settings: &SchemaSettings,
        kind: &str,
    ) -> Result<Arc<Value>, SchemaFetchError>;
}

/// Fetches schemas over HTTP from the settings' schema location
pub struct HttpSchemaSource {
    client: reqwest::Client,
    cache: Mutex<HashMap<String, Arc<Value>>>,
}

impl HttpSchemaSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for HttpSchemaSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SchemaSource for HttpSchemaSource {
    fn location(&self, settings: &SchemaSettings, kind: &str) -> String {
        format!("the network at {}", settings.schema_url(kind))
    }

    async fn fetch(
        &self,
        settings: &SchemaSettings,
        kind: &str,
    ) -> Result<Arc<Value>, SchemaFetchError> {
        let url = settings.schema_url(kind);
        if let Some(schema) = self.cache.lock().await.get(&url) {
            trace!("Schema cache hit: {}", url);
            return Ok(schema.clone());
        }

        debug!("Fetching schema {}", url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SchemaFetchError::Status(response.status()));
        }
        let body = response.text().await?;
        let schema = Arc::new(serde_json::from_str::<Value>(&body)?);

        self.cache.lock().await.insert(url, schema.clone());
        Ok(schema)
    }
}

/// Reads schemas from a local mirror laid out like the schema repositories
pub struct DirSchemaSource {
    root: PathBuf,
}

impl DirSchemaSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, settings: &SchemaSettings, kind: &str) -> PathBuf {
        self.root.join(settings.schema_path(kind))
    }
}

#[async_trait]
impl SchemaSource for DirSchemaSource {
    fn location(&self, settings: &SchemaSettings, kind: &str) -> String {
        self.path(settings, kind).display().to_string()
    }

    async fn fetch(
        &self,
        settings: &SchemaSettings,
        kind: &str,
    ) -> Result<Arc<Value>, SchemaFetchError> {
        let path = self.path(settings, kind);
        debug!("Reading schema {}", path.display());
        let content = tokio::fs::read_to_string(&path).await?;
        Ok(Arc::new(serde_json::from_str(&content)?))
    }
}
