use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A file to validate, as reported by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Repository-relative file path
    pub filename: String,
    /// Link to the file at the reviewed revision (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_url: Option<String>,
}

impl FileDescriptor {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            blob_url: None,
        }
    }

    #[cfg(test)]
    pub fn with_blob_url(mut self, blob_url: impl Into<String>) -> Self {
        self.blob_url = Some(blob_url.into());
        self
    }
}

/// Violations found in one document of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    /// Position of the document in the file's YAML stream, counting empty documents
    pub document: usize,
    /// Kubernetes kind of the document (e.g. Deployment)
    pub kind: String,
    pub errors: Vec<ValidationError>,
}

/// A single schema violation with its structural location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Rule kind, e.g. `required`, `additional_property_not_allowed`, `invalid_type`
    pub error_type: String,
    /// Rooted dotted path, e.g. `(root).spec.replicas`
    pub field_path: String,
    /// One-line human readable description
    pub message: String,
    pub details: BTreeMap<String, String>,
}

impl ValidationError {
    /// Render details as a sorted Markdown list, one `* key: value` line per entry
    pub fn details_string(&self) -> String {
        // BTreeMap iterates in lexicographic key order
        self.details
            .iter()
            .map(|(key, value)| format!("* {}: {}\n", key, value))
            .collect()
    }
}

/// Severity of an annotation. Only failures are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationLevel {
    Failure,
}

/// A violation attributed to a file and line range, ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// File path
    pub file_name: String,
    /// Link to the file blob (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_href: Option<String>,
    /// Start line (1-indexed)
    pub start_line: u32,
    /// End line (1-indexed)
    pub end_line: u32,
    pub level: AnnotationLevel,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub raw_details: String,
}

impl Annotation {
    /// Build a failure annotation pinned to the first line of a file
    pub fn failure(file: &FileDescriptor, title: String, message: String) -> Self {
        Self {
            file_name: file.filename.clone(),
            blob_href: file.blob_url.clone(),
            start_line: 1,
            end_line: 1,
            level: AnnotationLevel::Failure,
            title,
            message,
            raw_details: String::new(),
        }
    }

    /// Key used by the total order: `(start_line, message)` first, remaining
    /// fields only break ties so equal-looking annotations from different files
    /// still sort the same way regardless of input order.
    fn sort_key(&self) -> (u32, &str, &str, u32, &str, &str, Option<&str>) {
        (
            self.start_line,
            self.message.as_str(),
            self.file_name.as_str(),
            self.end_line,
            self.title.as_str(),
            self.raw_details.as_str(),
            self.blob_href.as_deref(),
        )
    }
}

impl Ord for Annotation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for Annotation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort annotations ascending by start line, then message
pub fn sort_annotations(annotations: &mut [Annotation]) {
    annotations.sort();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation(file: &str, start_line: u32, message: &str) -> Annotation {
        let mut a = Annotation::failure(
            &FileDescriptor::new(file),
            "Error validating Deployment against master schema".into(),
            message.into(),
        );
        a.start_line = start_line;
        a.end_line = start_line + 1;
        a
    }

    #[test]
    fn test_details_string_sorted_by_key() {
        let error = ValidationError {
            error_type: "invalid_type".into(),
            field_path: "(root).spec.replicas".into(),
            message: "spec.replicas: Invalid type. Expected: integer, given: string".into(),
            details: BTreeMap::from([
                ("given".to_string(), "string".to_string()),
                ("context".to_string(), "(root).spec.replicas".to_string()),
                ("field".to_string(), "spec.replicas".to_string()),
                ("expected".to_string(), "integer".to_string()),
            ]),
        };
        assert_eq!(
            error.details_string(),
            "* context: (root).spec.replicas\n* expected: integer\n* field: spec.replicas\n* given: string\n"
        );
    }

    #[test]
    fn test_details_string_empty() {
        let error = ValidationError {
            error_type: "required".into(),
            field_path: "(root)".into(),
            message: "kind: kind is required".into(),
            details: BTreeMap::new(),
        };
        assert_eq!(error.details_string(), "");
    }

    #[test]
    fn test_sort_by_start_line_then_message() {
        let mut annotations = vec![
            annotation("a.yaml", 7, "b"),
            annotation("a.yaml", 1, "z"),
            annotation("a.yaml", 7, "a"),
            annotation("a.yaml", 1, "m"),
        ];
        sort_annotations(&mut annotations);
        let keys: Vec<_> = annotations
            .iter()
            .map(|a| (a.start_line, a.message.as_str()))
            .collect();
        assert_eq!(keys, vec![(1, "m"), (1, "z"), (7, "a"), (7, "b")]);
    }

    #[test]
    fn test_sort_is_independent_of_input_order() {
        let a = annotation("a.yaml", 1, "template: template is required");
        let b = annotation("b.yaml", 1, "template: template is required");

        let mut forward = vec![a.clone(), b.clone()];
        let mut backward = vec![b, a];
        sort_annotations(&mut forward);
        sort_annotations(&mut backward);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_failure_annotation_defaults() {
        let file = FileDescriptor::new("deployment.yaml").with_blob_url("https://example.com/blob");
        let a = Annotation::failure(&file, "Error loading deployment.yaml".into(), "boom".into());
        assert_eq!(a.start_line, 1);
        assert_eq!(a.end_line, 1);
        assert_eq!(a.level, AnnotationLevel::Failure);
        assert_eq!(a.blob_href.as_deref(), Some("https://example.com/blob"));
        assert!(a.raw_details.is_empty());
    }

    #[test]
    fn test_annotation_serializes_level_lowercase() {
        let a = annotation("a.yaml", 3, "x");
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["level"], "failure");
        assert_eq!(json["start_line"], 3);
        assert!(json.get("raw_details").is_none());
        assert!(json.get("blob_href").is_none());
    }
}
