use crate::candidate::Candidate;
use crate::candidates::Candidates;
use crate::schema::{SchemaConfig, is_valid_fork};
use crate::types::{Annotation, FileDescriptor};
use anyhow::{Context, bail};
use globset::{GlobBuilder, GlobMatcher};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, trace, warn};

/// Where the mapping of manifest globs to schemas lives in a repository
pub const DEFAULT_CONFIG_PATH: &str = ".github/kubevalidator.yaml";

/// Written by `kubevalidator init`
pub const STARTER_CONFIG: &str = "\
apiVersion: v1beta1
kind: KubeValidatorConfig
spec:
  manifests:
  # Validate every YAML file under config/ against the master schema
  - glob: config/*.yaml
    schemas:
    - name: master
      lineNumbers: true
  # Validate production manifests strictly against a pinned release
  - glob: config/production/*.yaml
    schemas:
    - name: production
      version: 1.10.0
      schemaFork: garethr
      type: kubernetes
      strict: true
      lineNumbers: true
";

/// Maps globs of Kubernetes manifests to the schemas that validate them
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KubeValidatorConfig {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub spec: Option<ConfigSpec>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ConfigSpec {
    #[serde(default)]
    pub manifests: Vec<Manifest>,
}

/// A glob and the schemas every matching file is validated against
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Manifest {
    pub glob: String,
    /// Empty means the implicit default schema
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schemas: Vec<SchemaConfig>,
}

impl KubeValidatorConfig {
    /// Load the mapping file. A missing file is an empty config.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            debug!("No config at {}, nothing will match", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Couldn't read {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml_ng::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    pub fn manifests(&self) -> &[Manifest] {
        self.spec.as_ref().map(|s| s.manifests.as_slice()).unwrap_or_default()
    }

    fn check(&self) -> anyhow::Result<()> {
        for manifest in self.manifests() {
            for schema in &manifest.schemas {
                if let Some(fork) = schema.schema_fork.as_deref() {
                    if !is_valid_fork(fork) {
                        bail!(
                            "Invalid schemaFork '{}' for glob '{}': must match ^[a-z][a-z-]{{0,38}}$",
                            fork,
                            manifest.glob
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// Pair each file with the schemas of the last manifest whose glob
    /// matches it. Files matching no manifest are dropped.
    pub fn matching_candidates(&self, files: &[FileDescriptor]) -> Candidates {
        let matchers: Vec<(GlobMatcher, &Manifest)> = self
            .manifests()
            .iter()
            .filter_map(|manifest| match build_matcher(&manifest.glob) {
                Ok(matcher) => Some((matcher, manifest)),
                Err(e) => {
                    warn!("Invalid manifest glob '{}': {}", manifest.glob, e);
                    None
                }
            })
            .collect();

        files
            .iter()
            .filter_map(|file| {
                let manifest = matchers
                    .iter()
                    .rev()
                    .find(|(matcher, _)| matcher.is_match(&file.filename))
                    .map(|(_, manifest)| *manifest);
                match manifest {
                    Some(manifest) => {
                        trace!("{} matched glob '{}'", file.filename, manifest.glob);
                        Some(Candidate::new(file.clone(), manifest.schemas.clone()))
                    }
                    None => {
                        trace!("{} matched no manifest glob", file.filename);
                        None
                    }
                }
            })
            .collect()
    }
}

fn build_matcher(pattern: &str) -> Result<GlobMatcher, globset::Error> {
    Ok(GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()?
        .compile_matcher())
}

/// Failure annotation raised against an unreadable or invalid mapping file
pub fn load_failure(config_path: &str, err: &anyhow::Error) -> Annotation {
    Annotation::failure(
        &FileDescriptor::new(config_path),
        format!("Couldn't unmarshal {}", config_path),
        format!("{:#}", err),
    )
}
