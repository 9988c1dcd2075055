use crate::types::Annotation;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

pub const CHECK_RUN_TITLE: &str = "kubevalidator";
pub const CHECK_RUN_SUMMARY: &str = "Validating Kubernetes YAML";

/// Overall outcome of a validation run
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Conclusion {
    /// No file matched a manifest glob
    Neutral,
    Success,
    Failure,
}

/// Final state of a validation run, shaped like a completed check run
#[derive(Serialize, Debug, Clone)]
pub struct CheckRunSummary {
    pub title: String,
    pub summary: String,
    pub conclusion: Conclusion,
    pub text: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl CheckRunSummary {
    pub fn conclude(
        started_at: DateTime<Utc>,
        files_checked: usize,
        annotations: &[Annotation],
    ) -> Self {
        let (conclusion, text) = if files_checked == 0 && annotations.is_empty() {
            (Conclusion::Neutral, "no files matched".to_string())
        } else {
            let conclusion = if annotations.is_empty() {
                Conclusion::Success
            } else {
                Conclusion::Failure
            };
            (
                conclusion,
                format!(
                    "{} files checked, {} errors",
                    files_checked,
                    annotations.len()
                ),
            )
        };

        Self {
            title: CHECK_RUN_TITLE.to_string(),
            summary: CHECK_RUN_SUMMARY.to_string(),
            conclusion,
            text,
            started_at,
            completed_at: Utc::now(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.conclusion == Conclusion::Failure
    }
}

/// JSON shape of a written report
#[derive(Serialize)]
pub struct Report<'a> {
    pub summary: &'a CheckRunSummary,
    pub files: &'a [String],
    pub annotations: &'a [Annotation],
}

pub fn format_json(
    summary: &CheckRunSummary,
    files: &[String],
    annotations: &[Annotation],
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&Report {
        summary,
        files,
        annotations,
    })
}

/// Render the run as Markdown: summary, checked files, then annotations
/// grouped by file in sorted order.
///
/// `files` holds one Markdown list item per checked file.
pub fn format_markdown(
    summary: &CheckRunSummary,
    files: &[String],
    annotations: &[Annotation],
) -> String {
    let mut output = format!("# {}\n\n{}\n", summary.title, summary.text);

    if !files.is_empty() {
        output.push_str("\n## Files\n\n");
        for item in files {
            output.push_str(item);
            output.push('\n');
        }
    }

    output.push('\n');
    output.push_str(&format_annotations(annotations));
    output.trim_end().to_string()
}

pub fn format_annotations(annotations: &[Annotation]) -> String {
    if annotations.is_empty() {
        return "No errors found".to_string();
    }

    let mut by_file: BTreeMap<&str, Vec<&Annotation>> = BTreeMap::new();
    for annotation in annotations {
        by_file
            .entry(annotation.file_name.as_str())
            .or_default()
            .push(annotation);
    }

    let mut output = String::new();
    for (file, annotations) in by_file {
        output.push_str(&format!("## Errors in {}\n\n", file));
        for annotation in annotations {
            output.push_str(&format!(
                "- Lines {}-{}: {}\n",
                annotation.start_line, annotation.end_line, annotation.title
            ));
            output.push_str(&format!("  {}\n", annotation.message));
            for line in annotation.raw_details.lines() {
                output.push_str(&format!("  {}\n", line));
            }
        }
        output.push('\n');
    }
    output.trim_end().to_string()
}
