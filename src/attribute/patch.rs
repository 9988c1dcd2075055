use serde::Deserialize;
use serde_yaml_ng::Value;
use thiserror::Error;

const DOCUMENT_SEPARATOR: &str = "---\n";

/// Error applying a structural replace to a YAML stream
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("cannot replace the document root")]
    EmptyPath,
    #[error("stream has no document {0}")]
    DocumentNotFound(usize),
    #[error("path /{0} does not exist in the document")]
    PathNotFound(String),
    #[error("failed to decode document: {0}")]
    Decode(#[source] serde_yaml_ng::Error),
    #[error("failed to encode patched document: {0}")]
    Encode(#[source] serde_yaml_ng::Error),
}

/// Replace the node at `path` in the `document`-th document of the stream
/// with the string `value` and re-serialize the whole stream.
///
/// Numeric segments index into sequences. In mappings they match a string
/// key first and an integer key otherwise.
pub fn replace(
    source: &str,
    document: usize,
    path: &[&str],
    value: &str,
) -> Result<String, PatchError> {
    if path.is_empty() {
        return Err(PatchError::EmptyPath);
    }

    let mut documents = Vec::new();
    for document in serde_yaml_ng::Deserializer::from_str(source) {
        documents.push(Value::deserialize(document).map_err(PatchError::Decode)?);
    }

    let root = documents
        .get_mut(document)
        .ok_or(PatchError::DocumentNotFound(document))?;
    let target =
        lookup_mut(root, path).ok_or_else(|| PatchError::PathNotFound(path.join("/")))?;
    *target = Value::String(value.to_string());

    let mut out = String::new();
    for (i, document) in documents.iter().enumerate() {
        if i > 0 {
            out.push_str(DOCUMENT_SEPARATOR);
        }
        out.push_str(&serde_yaml_ng::to_string(document).map_err(PatchError::Encode)?);
    }
    Ok(out)
}

fn lookup_mut<'a>(mut node: &'a mut Value, path: &[&str]) -> Option<&'a mut Value> {
    for segment in path {
        node = match node {
            Value::Sequence(items) => {
                let index: usize = segment.parse().ok()?;
                items.get_mut(index)?
            }
            Value::Mapping(mapping) => {
                if mapping.contains_key(*segment) {
                    mapping.get_mut(*segment)?
                } else {
                    let key: i64 = segment.parse().ok()?;
                    mapping.get_mut(Value::Number(key.into()))?
                }
            }
            _ => return None,
        };
    }
    Some(node)
}
