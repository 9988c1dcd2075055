use crate::attribute::LineAttributor;
use crate::schema::SchemaConfig;
use crate::types::{Annotation, AnnotationLevel, FileDescriptor, ValidationResult, sort_annotations};
use crate::validator::SchemaValidator;
use anyhow::Context;
use async_trait::async_trait;
use futures::future::join_all;
use std::path::PathBuf;
use tracing::{debug, trace, warn};

/// Title fallback when the validator failed before learning the document kind
const UNKNOWN_KIND: &str = "unknown";

/// Fetches file contents by repository-relative filename
#[async_trait]
pub trait FileLoader: Send + Sync {
    async fn load(&self, filename: &str) -> anyhow::Result<Vec<u8>>;
}

/// Loads files from a local checkout
pub struct LocalFileLoader {
    root: PathBuf,
}

impl LocalFileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl FileLoader for LocalFileLoader {
    async fn load(&self, filename: &str) -> anyhow::Result<Vec<u8>> {
        let path = self.root.join(filename.trim_start_matches('/'));
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Couldn't load {}", path.display()))
    }
}

fn validation_title(kind: &str, schema_name: &str) -> String {
    format!("Error validating {} against {} schema", kind, schema_name)
}

/// A file plus the schema configs it must be validated against
#[derive(Debug, Clone)]
pub struct Candidate {
    file: FileDescriptor,
    schemas: Vec<SchemaConfig>,
    bytes: Option<Vec<u8>>,
}

impl Candidate {
    /// Create a candidate without contents. An empty schema list means the
    /// implicit default schema.
    pub fn new(file: FileDescriptor, schemas: Vec<SchemaConfig>) -> Self {
        let schemas = if schemas.is_empty() {
            vec![SchemaConfig::implicit_default()]
        } else {
            schemas
        };
        Self {
            file,
            schemas,
            bytes: None,
        }
    }

    pub fn file(&self) -> &FileDescriptor {
        &self.file
    }

    #[cfg(test)]
    pub fn schemas(&self) -> &[SchemaConfig] {
        &self.schemas
    }

    #[cfg(test)]
    pub fn with_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.bytes = Some(bytes.into());
        self
    }

    /// Load contents through `loader`. On failure the contents stay unset and
    /// an annotation describing the error is returned.
    pub async fn load_bytes(&mut self, loader: &dyn FileLoader) -> Option<Annotation> {
        match loader.load(&self.file.filename).await {
            Ok(bytes) => {
                trace!("Loaded {} ({} bytes)", self.file.filename, bytes.len());
                self.bytes = Some(bytes);
                None
            }
            Err(e) => {
                warn!("Failed to load {}: {:#}", self.file.filename, e);
                Some(Annotation::failure(
                    &self.file,
                    format!("Error loading {}", self.file.filename),
                    format!("{:#}", e),
                ))
            }
        }
    }

    /// Markdown list entry linking to the file
    pub fn markdown_list_item(&self) -> String {
        format!(
            "* [`./{}`]({})",
            self.file.filename.trim_start_matches('/'),
            self.file.blob_url.as_deref().unwrap_or_default()
        )
    }

    /// Validate the contents against every schema config and return the
    /// resulting annotations, sorted.
    pub async fn validate(
        &self,
        validator: &dyn SchemaValidator,
        attributor: &LineAttributor,
    ) -> Vec<Annotation> {
        let Some(bytes) = self.bytes.as_deref() else {
            warn!("Validating {} without loaded contents", self.file.filename);
            return vec![Annotation::failure(
                &self.file,
                format!("Error validating {}", self.file.filename),
                format!("Contents of {} were not loaded", self.file.filename),
            )];
        };

        let per_schema = join_all(
            self.schemas
                .iter()
                .map(|schema| self.validate_schema(bytes, schema, validator, attributor)),
        )
        .await;

        let mut annotations: Vec<Annotation> = per_schema.into_iter().flatten().collect();
        sort_annotations(&mut annotations);
        debug!(
            "{}: {} annotations from {} schemas",
            self.file.filename,
            annotations.len(),
            self.schemas.len()
        );
        annotations
    }

    async fn validate_schema(
        &self,
        bytes: &[u8],
        schema: &SchemaConfig,
        validator: &dyn SchemaValidator,
        attributor: &LineAttributor,
    ) -> Vec<Annotation> {
        let schema_name = schema.display_name();
        let settings = schema.settings();

        match validator.validate(bytes, &self.file.filename, &settings).await {
            Ok(results) => results
                .iter()
                .flat_map(|result| self.annotate(bytes, result, schema, attributor))
                .collect(),
            Err(e) => {
                warn!(
                    "Failed to validate {} against {} schema: {}",
                    self.file.filename, schema_name, e
                );
                vec![Annotation::failure(
                    &self.file,
                    validation_title(e.kind().unwrap_or(UNKNOWN_KIND), schema_name),
                    e.to_string(),
                )]
            }
        }
    }

    fn annotate(
        &self,
        bytes: &[u8],
        result: &ValidationResult,
        schema: &SchemaConfig,
        attributor: &LineAttributor,
    ) -> Vec<Annotation> {
        let title = validation_title(&result.kind, schema.display_name());
        result
            .errors
            .iter()
            .map(|error| {
                let range = attributor.attribute(bytes, result.document, error, schema.line_numbers);
                Annotation {
                    file_name: self.file.filename.clone(),
                    blob_href: self.file.blob_url.clone(),
                    start_line: range.start,
                    end_line: range.end,
                    level: AnnotationLevel::Failure,
                    title: title.clone(),
                    message: error.message.clone(),
                    raw_details: error.details_string(),
                }
            })
            .collect()
    }
}
