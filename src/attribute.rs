//! Map structural field paths reported by the validator back to source lines.
//!
//! Validators work on the parsed document and report violations as paths like
//! `(root).spec.replicas`. To find where that path lives in the original text,
//! the node at the path is replaced with a sentinel string, the document is
//! re-serialized, and the hunk of a zero-context diff that carries the sentinel
//! gives the line range. The result is approximate: re-serialization can widen
//! the hunk around the node, and paths that do not exist fall back to line 1.

pub mod patch;

use crate::types::ValidationError;
use crate::util::diff::{self, DiffParseError};
use patch::PatchError;
use std::collections::HashMap;
use thiserror::Error;
use tracing::trace;

/// Value substituted at the violating path. Must never occur in real manifests.
pub const SENTINEL: &str = "ZZZ___KUBEVALIDATOR___SENTINEL___ZZZ";

const ROOT_MARKER: &str = "(root)";

/// Inclusive-start line range of an annotation (1-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl LineRange {
    /// Used whenever a path cannot be attributed
    pub const FIRST_LINE: Self = Self { start: 1, end: 1 };
}

/// Why a path could not be mapped to lines
#[derive(Error, Debug)]
enum AttributionMiss {
    #[error("source is not valid UTF-8")]
    NotUtf8,
    #[error("path {0:?} addresses the document root")]
    RootPath(String),
    #[error(transparent)]
    Patch(#[from] PatchError),
    #[error(transparent)]
    Diff(#[from] DiffParseError),
    #[error("no hunk contains the sentinel")]
    SentinelNotFound,
}

/// Approximate the lines occupied by `field_path` within the `document`-th
/// document of `source`.
///
/// Returns line 1 when `enabled` is false or the path cannot be attributed.
pub fn attribute_line(source: &[u8], document: usize, field_path: &str, enabled: bool) -> LineRange {
    if !enabled {
        return LineRange::FIRST_LINE;
    }

    match locate(source, document, field_path) {
        Ok(range) => range,
        Err(miss) => {
            trace!("Could not attribute {} in document {}: {}", field_path, document, miss);
            LineRange::FIRST_LINE
        }
    }
}

fn locate(source: &[u8], document: usize, field_path: &str) -> Result<LineRange, AttributionMiss> {
    let text = std::str::from_utf8(source).map_err(|_| AttributionMiss::NotUtf8)?;
    let path = structural_path(field_path)
        .ok_or_else(|| AttributionMiss::RootPath(field_path.to_string()))?;

    let patched = patch::replace(text, document, &path, SENTINEL)?;
    let hunks = diff::parse_hunks(&diff::unified_diff(text, &patched))?;

    hunks
        .iter()
        .find(|hunk| hunk.body.iter().any(|line| line.contains(SENTINEL)))
        .map(|hunk| LineRange {
            start: hunk.new_start,
            end: hunk.new_start + hunk.new_lines,
        })
        .ok_or(AttributionMiss::SentinelNotFound)
}

/// `(root).spec.containers.0` -> `["spec", "containers", "0"]`
fn structural_path(field_path: &str) -> Option<Vec<&str>> {
    let relative = match field_path.strip_prefix(ROOT_MARKER) {
        Some(rest) => rest.strip_prefix('.').unwrap_or(rest),
        None => field_path,
    };
    if relative.is_empty() {
        return None;
    }
    Some(relative.split('.').collect())
}

/// How one kind of violation is mapped to source lines
pub trait AttributionStrategy: Send + Sync {
    /// `document` is the violating document's position in the YAML stream
    fn attribute(&self, source: &[u8], document: usize, error: &ValidationError) -> LineRange;
}

/// Sentinel replace at the error's field path, then diff
pub struct ReplaceAtPath;

impl AttributionStrategy for ReplaceAtPath {
    fn attribute(&self, source: &[u8], document: usize, error: &ValidationError) -> LineRange {
        attribute_line(source, document, &error.field_path, true)
    }
}

/// Dispatches violations to an attribution strategy by error type
pub struct LineAttributor {
    strategies: HashMap<String, Box<dyn AttributionStrategy>>,
    fallback: Box<dyn AttributionStrategy>,
}

impl Default for LineAttributor {
    fn default() -> Self {
        Self {
            strategies: HashMap::new(),
            fallback: Box::new(ReplaceAtPath),
        }
        .with_strategy("required", ReplaceAtPath)
        .with_strategy("additional_property_not_allowed", ReplaceAtPath)
        .with_strategy("invalid_type", ReplaceAtPath)
    }
}

impl LineAttributor {
    /// Register or override the strategy for one error type
    pub fn with_strategy(
        mut self,
        error_type: &str,
        strategy: impl AttributionStrategy + 'static,
    ) -> Self {
        self.strategies
            .insert(error_type.to_string(), Box::new(strategy));
        self
    }

    pub fn attribute(
        &self,
        source: &[u8],
        document: usize,
        error: &ValidationError,
        enabled: bool,
    ) -> LineRange {
        if !enabled {
            return LineRange::FIRST_LINE;
        }
        self.strategies
            .get(&error.error_type)
            .unwrap_or(&self.fallback)
            .attribute(source, document, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const SOURCE: &str = "a: 1\nb:\n  c: 2\n  d: 3\n";

    fn error(error_type: &str, field_path: &str) -> ValidationError {
        ValidationError {
            error_type: error_type.into(),
            field_path: field_path.into(),
            message: String::new(),
            details: BTreeMap::new(),
        }
    }

    #[test]
    fn test_disabled_returns_first_line() {
        let range = attribute_line(SOURCE.as_bytes(), 0, "(root).b.d", false);
        assert_eq!(range, LineRange::FIRST_LINE);
    }

    #[test]
    fn test_scalar_line() {
        let range = attribute_line(SOURCE.as_bytes(), 0, "(root).b.d", true);
        assert_eq!(range, LineRange { start: 4, end: 5 });
    }

    #[test]
    fn test_top_level_scalar() {
        let range = attribute_line(SOURCE.as_bytes(), 0, "(root).a", true);
        assert_eq!(range, LineRange { start: 1, end: 2 });
    }

    #[test]
    fn test_block_collapses_to_its_key_line() {
        let range = attribute_line(SOURCE.as_bytes(), 0, "(root).b", true);
        assert_eq!(range, LineRange { start: 2, end: 3 });
    }

    #[test]
    fn test_missing_path_falls_back() {
        let range = attribute_line(SOURCE.as_bytes(), 0, "(root).spec.template", true);
        assert_eq!(range, LineRange::FIRST_LINE);
    }

    #[test]
    fn test_root_path_falls_back() {
        assert_eq!(attribute_line(SOURCE.as_bytes(), 0, "(root)", true), LineRange::FIRST_LINE);
        assert_eq!(attribute_line(SOURCE.as_bytes(), 0, "", true), LineRange::FIRST_LINE);
    }

    #[test]
    fn test_invalid_source_falls_back() {
        assert_eq!(attribute_line(b"a: [1\n", 0, "(root).a", true), LineRange::FIRST_LINE);
        assert_eq!(attribute_line(&[0xff, 0xfe], 0, "(root).a", true), LineRange::FIRST_LINE);
    }

    #[test]
    fn test_sequence_index() {
        let value: serde_yaml_ng::Value = serde_yaml_ng::from_str(
            "spec:\n  containers:\n  - name: nginx\n    image: nginx\n  - name: sidecar\n    image: envoy\n",
        )
        .unwrap();
        // Start from the serializer's own layout so only the patched line differs
        let source = serde_yaml_ng::to_string(&value).unwrap();
        let expected = source
            .lines()
            .position(|l| l.contains("image: envoy"))
            .unwrap() as u32
            + 1;

        let range = attribute_line(source.as_bytes(), 0, "(root).spec.containers.1.image", true);
        assert_eq!(range, LineRange { start: expected, end: expected + 1 });
    }

    #[test]
    fn test_reformatted_source_still_covers_the_field() {
        // Indented sequences are re-serialized differently, widening the hunk
        let source = "spec:\n  containers:\n    - name: nginx\n      image: nginx\n    - name: sidecar\n      image: envoy\n";
        let range = attribute_line(source.as_bytes(), 0, "(root).spec.containers.1.image", true);
        assert!(range.start <= 6 && 6 <= range.end, "got {:?}", range);
        assert!(range.start >= 3);
    }

    #[test]
    fn test_only_the_given_document_is_attributed() {
        let source = "spec:\n  replicas: 1\n---\nspec:\n  replicas: 2\n";
        assert_eq!(
            attribute_line(source.as_bytes(), 1, "(root).spec.replicas", true),
            LineRange { start: 5, end: 6 }
        );
        assert_eq!(
            attribute_line(source.as_bytes(), 0, "(root).spec.replicas", true),
            LineRange { start: 2, end: 3 }
        );
        assert_eq!(
            attribute_line(source.as_bytes(), 2, "(root).spec.replicas", true),
            LineRange::FIRST_LINE
        );
    }

    #[test]
    fn test_path_absent_from_document_falls_back() {
        let source = "spec:\n  replicas: 1\n---\nkind: Service\n";
        assert_eq!(
            attribute_line(source.as_bytes(), 1, "(root).spec.replicas", true),
            LineRange::FIRST_LINE
        );
    }

    #[test]
    fn test_unquoted_numeric_key() {
        let source = "data:\n  80: http\n  443: https\n";
        assert_eq!(
            attribute_line(source.as_bytes(), 0, "(root).data.443", true),
            LineRange { start: 3, end: 4 }
        );
    }

    #[test]
    fn test_attribution_is_idempotent() {
        let first = attribute_line(SOURCE.as_bytes(), 0, "(root).b.c", true);
        let second = attribute_line(SOURCE.as_bytes(), 0, "(root).b.c", true);
        assert_eq!(first, second);
        assert_eq!(first, LineRange { start: 3, end: 4 });
    }

    #[test]
    fn test_structural_path() {
        assert_eq!(
            structural_path("(root).spec.containers.0"),
            Some(vec!["spec", "containers", "0"])
        );
        assert_eq!(structural_path("spec.replicas"), Some(vec!["spec", "replicas"]));
        assert_eq!(structural_path("(root)"), None);
    }

    struct Fixed(LineRange);

    impl AttributionStrategy for Fixed {
        fn attribute(&self, _source: &[u8], _document: usize, _error: &ValidationError) -> LineRange {
            self.0
        }
    }

    #[test]
    fn test_attributor_dispatches_by_type() {
        let attributor = LineAttributor::default()
            .with_strategy("enum", Fixed(LineRange { start: 9, end: 9 }));

        let custom = attributor.attribute(SOURCE.as_bytes(), 0, &error("enum", "(root).a"), true);
        assert_eq!(custom, LineRange { start: 9, end: 9 });

        let default = attributor.attribute(SOURCE.as_bytes(), 0, &error("invalid_type", "(root).b.d"), true);
        assert_eq!(default, LineRange { start: 4, end: 5 });

        let fallback = attributor.attribute(SOURCE.as_bytes(), 0, &error("pattern", "(root).a"), true);
        assert_eq!(fallback, LineRange { start: 1, end: 2 });
    }

    #[test]
    fn test_attributor_respects_disabled_flag() {
        let attributor = LineAttributor::default()
            .with_strategy("enum", Fixed(LineRange { start: 9, end: 9 }));
        let range = attributor.attribute(SOURCE.as_bytes(), 0, &error("enum", "(root).a"), false);
        assert_eq!(range, LineRange::FIRST_LINE);
    }
}
