use super::render::{self, CheckRunSummary};
use crate::attribute::LineAttributor;
use crate::candidate::{FileLoader, LocalFileLoader};
use crate::config::{self, KubeValidatorConfig, STARTER_CONFIG};
use crate::types::{Annotation, FileDescriptor, sort_annotations};
use crate::util;
use crate::validator::source::{DirSchemaSource, HttpSchemaSource};
use crate::validator::{KubeValidator, SchemaValidator};
use chrono::Utc;
use std::path::Path;
use tracing::{debug, error, info, trace};

const EXIT_FAILURE: i32 = 1;

/// Everything a validation run produced
pub struct Outcome {
    pub summary: CheckRunSummary,
    /// Filenames of the candidates that were checked
    pub files: Vec<String>,
    /// Markdown list item per checked file
    pub file_items: Vec<String>,
    pub annotations: Vec<Annotation>,
}

/// Run the whole pipeline over already discovered files
///
/// A config that failed to load is reported as an annotation against
/// `config_path` and validation continues with an empty config.
pub async fn validate_files(
    config_path: &str,
    config: anyhow::Result<KubeValidatorConfig>,
    files: &[FileDescriptor],
    loader: &dyn FileLoader,
    validator: &dyn SchemaValidator,
    attributor: &LineAttributor,
) -> Outcome {
    let started_at = Utc::now();
    let mut annotations = Vec::new();

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config {}: {:#}", config_path, e);
            annotations.push(config::load_failure(config_path, &e));
            KubeValidatorConfig::default()
        }
    };

    let mut candidates = config.matching_candidates(files);
    if candidates.is_empty() {
        info!("No files matched a manifest glob in {}", config_path);
    } else {
        info!(
            "{} of {} files matched a manifest glob",
            candidates.len(),
            files.len()
        );
    }

    debug!("Loading {} candidates", candidates.len());
    annotations.extend(candidates.load_bytes(loader).await);

    debug!("Validating {} candidates", candidates.len());
    annotations.extend(candidates.validate(validator, attributor).await);
    sort_annotations(&mut annotations);

    let summary = CheckRunSummary::conclude(started_at, candidates.len(), &annotations);
    Outcome {
        summary,
        files: candidates
            .iter()
            .map(|c| c.file().filename.clone())
            .collect(),
        file_items: candidates.iter().map(|c| c.markdown_list_item()).collect(),
        annotations,
    }
}

/// Discover, validate and report, exiting non-zero when validation fails
pub async fn run_validate(
    files: &[String],
    diff_base: &str,
    config_path: &str,
    root: &str,
    schema_dir: Option<&str>,
    output: Option<&str>,
) {
    let filenames = if files.is_empty() {
        let base = util::Base::parse(diff_base);
        debug!("Resolved base: {:?}", base);
        match util::get_changed_files(&base) {
            Ok(changed) => changed,
            Err(e) => {
                error!("Failed to list changed files: {:#}", e);
                std::process::exit(EXIT_FAILURE);
            }
        }
    } else {
        files.to_vec()
    };
    info!("Found {} files", filenames.len());
    trace!("Files: {:?}", filenames);

    let descriptors: Vec<FileDescriptor> = filenames.into_iter().map(FileDescriptor::new).collect();
    let config = KubeValidatorConfig::load(Path::new(config_path));
    let loader = LocalFileLoader::new(root);
    let attributor = LineAttributor::default();

    let outcome = match schema_dir {
        Some(dir) => {
            info!("Reading schemas from {}", dir);
            let validator = KubeValidator::new(DirSchemaSource::new(dir));
            validate_files(config_path, config, &descriptors, &loader, &validator, &attributor).await
        }
        None => {
            let validator = KubeValidator::new(HttpSchemaSource::new());
            validate_files(config_path, config, &descriptors, &loader, &validator, &attributor).await
        }
    };

    if let Some(output_path) = output {
        write_output(output_path, &outcome);
    } else {
        print_outcome(&outcome);
    }

    info!("Validation complete: {}", outcome.summary.text);
    if outcome.summary.is_failure() {
        std::process::exit(EXIT_FAILURE);
    }
}

fn print_outcome(outcome: &Outcome) {
    for line in render::format_annotations(&outcome.annotations).lines() {
        info!("{}", line);
    }
}

fn write_output(path: &str, outcome: &Outcome) {
    let content = if path.ends_with(".json") {
        match render::format_json(&outcome.summary, &outcome.files, &outcome.annotations) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize report: {}", e);
                std::process::exit(EXIT_FAILURE);
            }
        }
    } else if path.ends_with(".md") {
        render::format_markdown(&outcome.summary, &outcome.file_items, &outcome.annotations)
    } else {
        error!("Output file must end with .md or .json");
        std::process::exit(EXIT_FAILURE);
    };

    if let Err(e) = std::fs::write(path, content) {
        error!("Failed to write output file: {}", e);
        std::process::exit(EXIT_FAILURE);
    }

    info!("Results written to {}", path);
}

/// Write the starter mapping file, refusing to clobber an existing one
pub fn run_init(config_path: &str, overwrite: bool) {
    if let Err(e) = write_starter_config(Path::new(config_path), overwrite) {
        error!("{:#}", e);
        std::process::exit(EXIT_FAILURE);
    }
    info!("Created {}", config_path);
}

fn write_starter_config(path: &Path, overwrite: bool) -> anyhow::Result<()> {
    use anyhow::Context;

    if path.exists() && !overwrite {
        anyhow::bail!(
            "{} already exists, use --override to replace it",
            path.display()
        );
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, STARTER_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))
}
