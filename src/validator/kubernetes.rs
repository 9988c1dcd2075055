use super::source::SchemaSource;
use super::{SchemaValidator, ValidatorError};
use crate::schema::SchemaSettings;
use crate::types::{ValidationError, ValidationResult};
use async_trait::async_trait;
use heck::ToSnakeCase;
use jsonschema::error::ValidationErrorKind;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, trace};

const ROOT_CONTEXT: &str = "(root)";

/// kubeval-style validator: one JSON schema per document kind, fetched from a
/// [`SchemaSource`]
pub struct KubeValidator<S> {
    source: S,
}

impl<S: SchemaSource> KubeValidator<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    async fn validate_document(
        &self,
        index: usize,
        document: &Value,
        filename: &str,
        settings: &SchemaSettings,
    ) -> Result<ValidationResult, ValidatorError> {
        let kind = document
            .get("kind")
            .and_then(Value::as_str)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ValidatorError::MissingKind {
                filename: filename.to_string(),
            })?;

        let schema = self.source.fetch(settings, kind).await.map_err(|e| {
            ValidatorError::SchemaUnavailable {
                kind: kind.to_string(),
                location: self.source.location(settings, kind),
                reason: e.to_string(),
            }
        })?;

        let errors = check(document, &schema).map_err(|reason| ValidatorError::SchemaCompile {
            kind: kind.to_string(),
            reason,
        })?;
        debug!("{}: {} has {} errors", filename, kind, errors.len());

        Ok(ValidationResult {
            document: index,
            kind: kind.to_string(),
            errors,
        })
    }
}

#[async_trait]
impl<S: SchemaSource> SchemaValidator for KubeValidator<S> {
    async fn validate(
        &self,
        bytes: &[u8],
        filename: &str,
        settings: &SchemaSettings,
    ) -> Result<Vec<ValidationResult>, ValidatorError> {
        let documents = decode_documents(bytes, filename)?;
        trace!("{}: decoded {} documents", filename, documents.len());

        let mut results = Vec::new();
        for (index, document) in documents.iter().enumerate() {
            if document.is_null() {
                continue;
            }
            results.push(
                self.validate_document(index, document, filename, settings)
                    .await?,
            );
        }
        Ok(results)
    }
}

fn decode_documents(bytes: &[u8], filename: &str) -> Result<Vec<Value>, ValidatorError> {
    serde_yaml_ng::Deserializer::from_slice(bytes)
        .map(|document| {
            Value::deserialize(document).map_err(|e| ValidatorError::Parse {
                filename: filename.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Validate one document. Kubernetes schemas are written against draft 4.
fn check(document: &Value, schema: &Value) -> Result<Vec<ValidationError>, String> {
    let validator = jsonschema::options()
        .with_draft(jsonschema::Draft::Draft4)
        .build(schema)
        .map_err(|e| e.to_string())?;

    Ok(validator
        .iter_errors(document)
        .flat_map(|error| convert(&error, schema))
        .collect())
}

/// Translate a jsonschema error into violations shaped like kubeval's: a
/// rooted dotted context, a `field`, and a message prefixed with that field.
fn convert(error: &jsonschema::ValidationError<'_>, schema: &Value) -> Vec<ValidationError> {
    let context = rooted_context(&error.instance_path.to_string());

    match &error.kind {
        ValidationErrorKind::Required { property } => {
            let property = property
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| property.to_string());
            let message = format!("{} is required", property);
            vec![property_error("required", &context, &property, message)]
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => unexpected
            .iter()
            .map(|property| {
                let message = format!("Additional property {} is not allowed", property);
                property_error("additional_property_not_allowed", &context, property, message)
            })
            .collect(),
        ValidationErrorKind::Type { .. } => {
            let field = field_name(&context);
            let expected = expected_type(schema, &error.schema_path.to_string());
            let given = json_type(&error.instance);
            vec![ValidationError {
                error_type: "invalid_type".to_string(),
                message: format!(
                    "{}: Invalid type. Expected: {}, given: {}",
                    field, expected, given
                ),
                details: BTreeMap::from([
                    ("context".to_string(), context.clone()),
                    ("expected".to_string(), expected),
                    ("field".to_string(), field.clone()),
                    ("given".to_string(), given.to_string()),
                ]),
                field_path: context,
            }]
        }
        _ => {
            let field = field_name(&context);
            let schema_path = error.schema_path.to_string();
            let keyword = schema_path.rsplit('/').next().unwrap_or_default();
            vec![ValidationError {
                error_type: keyword.to_snake_case(),
                message: format!("{}: {}", field, error),
                details: BTreeMap::from([
                    ("context".to_string(), context.clone()),
                    ("field".to_string(), field),
                ]),
                field_path: context,
            }]
        }
    }
}

fn property_error(error_type: &str, context: &str, property: &str, description: String) -> ValidationError {
    ValidationError {
        error_type: error_type.to_string(),
        field_path: context.to_string(),
        message: format!("{}: {}", property, description),
        details: BTreeMap::from([
            ("context".to_string(), context.to_string()),
            ("field".to_string(), property.to_string()),
            ("property".to_string(), property.to_string()),
        ]),
    }
}

/// `/spec/replicas` -> `(root).spec.replicas`
fn rooted_context(pointer: &str) -> String {
    let mut context = ROOT_CONTEXT.to_string();
    for segment in pointer.split('/').skip(1) {
        context.push('.');
        context.push_str(&segment.replace("~1", "/").replace("~0", "~"));
    }
    context
}

/// `(root).spec.replicas` -> `spec.replicas`
fn field_name(context: &str) -> String {
    context
        .strip_prefix(ROOT_CONTEXT)
        .map(|rest| rest.strip_prefix('.').unwrap_or(rest))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(context)
        .to_string()
}

/// Type names declared at the `type` keyword the error points at
fn expected_type(schema: &Value, schema_path: &str) -> String {
    match schema.pointer(schema_path) {
        Some(Value::String(name)) => name.clone(),
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("/"),
        _ => "unknown".to_string(),
    }
}

/// JSON type name of a value; integral numbers count as integers
fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(n) if n.as_f64().is_some_and(|f| f.fract() == 0.0) => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
