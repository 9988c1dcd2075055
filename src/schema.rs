use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Host serving the Kubernetes JSON schema forks
pub const SCHEMA_HOST: &str = "https://raw.githubusercontent.com";
/// Fork used when a schema config names none
pub const DEFAULT_SCHEMA_FORK: &str = "garethr";
/// Schema version used when a schema config names none
pub const DEFAULT_VERSION: &str = "master";
/// Display name used when a schema config has neither a name nor a version
pub const DEFAULT_SCHEMA_NAME: &str = "default";

// GitHub usernames are at most 39 characters
static FORK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z-]{0,38}$").unwrap());

/// Which family of object schemas to validate against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigType {
    #[default]
    Kubernetes,
    /// Selects the OpenShift schema variant
    Openstack,
}

/// One schema variant a file must be validated against
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaConfig {
    /// Display name (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Kubernetes version, e.g. 1.10.0 (optional, defaults to master)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// GitHub user hosting the kubernetes-json-schema fork (optional, defaults to garethr)
    #[serde(default, alias = "baseURL", skip_serializing_if = "Option::is_none")]
    pub schema_fork: Option<String>,
    #[serde(default, rename = "type")]
    pub config_type: ConfigType,
    /// Reject properties the schema does not declare
    #[serde(default)]
    pub strict: bool,
    /// Attribute violations to source lines instead of line 1
    #[serde(default)]
    pub line_numbers: bool,
}

impl SchemaConfig {
    /// The config used when a file is matched without any schema list
    pub fn implicit_default() -> Self {
        Self {
            version: Some(DEFAULT_VERSION.to_string()),
            schema_fork: Some(DEFAULT_SCHEMA_FORK.to_string()),
            ..Self::default()
        }
    }

    /// Name shown in annotation titles: name, then version, then "default"
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or_else(|| self.version.as_deref().filter(|v| !v.is_empty()))
            .unwrap_or(DEFAULT_SCHEMA_NAME)
    }

    /// Resolve into the immutable settings handed to the validator
    pub fn settings(&self) -> SchemaSettings {
        let fork = self
            .schema_fork
            .as_deref()
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_SCHEMA_FORK);
        let version = self
            .version
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_VERSION);

        SchemaSettings {
            location: format!("{}/{}", SCHEMA_HOST, fork),
            version: version.to_string(),
            strict: self.strict,
            openshift: self.config_type == ConfigType::Openstack,
        }
    }
}

/// Check a schema fork name against `^[a-z][a-z-]{0,38}$`
pub fn is_valid_fork(fork: &str) -> bool {
    FORK_RE.is_match(fork)
}

/// Resolved, immutable validator settings for one schema config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSettings {
    /// Base URL the schema paths are resolved against
    pub location: String,
    pub version: String,
    pub strict: bool,
    pub openshift: bool,
}

impl SchemaSettings {
    /// Relative path of the standalone schema for `kind`, e.g.
    /// `kubernetes-json-schema/master/v1.10.0-standalone-strict/deployment.json`
    pub fn schema_path(&self, kind: &str) -> String {
        let family = if self.openshift {
            "openshift-json-schema"
        } else {
            "kubernetes-json-schema"
        };
        let version = if self.version == DEFAULT_VERSION || self.version.starts_with('v') {
            self.version.clone()
        } else {
            format!("v{}", self.version)
        };
        let strict = if self.strict { "-strict" } else { "" };

        format!(
            "{}/master/{}-standalone{}/{}.json",
            family,
            version,
            strict,
            kind.to_lowercase()
        )
    }

    /// Full URL of the schema for `kind`
    pub fn schema_url(&self, kind: &str) -> String {
        format!(
            "{}/{}",
            self.location.trim_end_matches('/'),
            self.schema_path(kind)
        )
    }
}
