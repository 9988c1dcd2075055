//! Shared fixtures for validator and candidate tests

use super::source::{SchemaFetchError, SchemaSource};
use crate::schema::{SchemaConfig, SchemaSettings};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

pub const VALID_DEPLOYMENT: &str = "\
apiVersion: apps/v1
kind: Deployment
metadata:
  name: nginx-deployment
spec:
  replicas: 3
  template:
    metadata:
      labels:
        app: nginx
    spec:
      containers:
      - name: nginx
        image: nginx
";

/// `replicas` has the wrong type and `template` is missing
pub const INVALID_DEPLOYMENT: &str = "\
apiVersion: apps/v1
kind: Deployment
metadata:
  name: nginx-deployment
spec:
  replicas: abc
";

/// Wrong type plus undeclared properties at two depths
pub const MULTIPLE_FAILURES: &str = "\
apiVersion: apps/v1
kind: Deployment
metadata:
  name: nginx-deployment
spec:
  replicas: abc
  extra: true
  template:
    spec:
      containers:
      - name: nginx
        image: nginx
        extra-container: true
";

/// Schemas held in memory, keyed by schema path
pub struct MemorySchemaSource {
    schemas: HashMap<String, Arc<Value>>,
}

impl MemorySchemaSource {
    /// Deployment schemas for the implicit default config, strict and not
    pub fn with_deployment_schemas() -> Self {
        let loose = SchemaConfig::default().settings();
        let strict = SchemaConfig {
            strict: true,
            ..Default::default()
        }
        .settings();

        let mut schemas = HashMap::new();
        schemas.insert(
            loose.schema_path("Deployment"),
            Arc::new(deployment_schema(false)),
        );
        schemas.insert(
            strict.schema_path("Deployment"),
            Arc::new(deployment_schema(true)),
        );
        Self { schemas }
    }
}

#[async_trait]
impl SchemaSource for MemorySchemaSource {
    fn location(&self, settings: &SchemaSettings, kind: &str) -> String {
        format!("memory:{}", settings.schema_path(kind))
    }

    async fn fetch(
        &self,
        settings: &SchemaSettings,
        kind: &str,
    ) -> Result<Arc<Value>, SchemaFetchError> {
        self.schemas
            .get(&settings.schema_path(kind))
            .cloned()
            .ok_or(SchemaFetchError::Status(reqwest::StatusCode::NOT_FOUND))
    }
}

/// A trimmed apps/v1 Deployment schema; `strict` closes every object
pub fn deployment_schema(strict: bool) -> Value {
    let mut schema = json!({
        "type": "object",
        "properties": {
            "apiVersion": {"type": "string"},
            "kind": {"type": "string"},
            "metadata": {"type": "object"},
            "spec": {
                "type": "object",
                "required": ["template"],
                "properties": {
                    "replicas": {"type": "integer"},
                    "template": {
                        "type": "object",
                        "properties": {
                            "metadata": {"type": "object"},
                            "spec": {
                                "type": "object",
                                "properties": {
                                    "containers": {
                                        "type": "array",
                                        "items": {
                                            "type": "object",
                                            "required": ["name"],
                                            "properties": {
                                                "name": {"type": "string"},
                                                "image": {"type": "string"}
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    });
    if strict {
        close_objects(&mut schema);
    }
    schema
}

fn close_objects(schema: &mut Value) {
    let Some(object) = schema.as_object_mut() else {
        return;
    };
    if let Some(properties) = object.get_mut("properties").and_then(Value::as_object_mut) {
        for property in properties.values_mut() {
            close_objects(property);
        }
    }
    if let Some(items) = object.get_mut("items") {
        close_objects(items);
    }
    if object.contains_key("properties") {
        object.insert("additionalProperties".to_string(), Value::Bool(false));
    }
}
