pub mod kubernetes;
pub mod source;
#[cfg(test)]
pub mod testing;

use crate::schema::SchemaSettings;
use crate::types::ValidationResult;
use async_trait::async_trait;
use thiserror::Error;

pub use kubernetes::KubeValidator;

/// Failure to validate a file against a schema as a whole
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidatorError {
    /// The schema for a kind could not be retrieved
    #[error("Problem loading schema from {location}: {reason}")]
    SchemaUnavailable {
        kind: String,
        location: String,
        reason: String,
    },
    /// The schema was retrieved but is not a usable JSON schema
    #[error("Problem compiling schema for {kind}: {reason}")]
    SchemaCompile { kind: String, reason: String },
    #[error("Failed to decode YAML from {filename}: {reason}")]
    Parse { filename: String, reason: String },
    #[error("Missing a kind key in {filename}")]
    MissingKind { filename: String },
}

impl ValidatorError {
    /// Kind of the document being validated, when known
    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::SchemaUnavailable { kind, .. } | Self::SchemaCompile { kind, .. } => Some(kind),
            Self::Parse { .. } | Self::MissingKind { .. } => None,
        }
    }
}

/// Runs schema validation over raw manifest bytes
#[async_trait]
pub trait SchemaValidator: Send + Sync {
    /// Validate every document in `bytes`, returning one result per document
    async fn validate(
        &self,
        bytes: &[u8],
        filename: &str,
        settings: &SchemaSettings,
    ) -> Result<Vec<ValidationResult>, ValidatorError>;
}
