//! Path-based access into decoded instance documents.

use serde_json::Value;

use crate::extractors::ExtractorError;
use crate::resource::types::InstanceKey;

/// A decoded instance of the watched resource type.
///
/// The tree is kept untyped; schema-specific fields are only interpreted
/// by the matching extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceDocument {
    root: Value,
}

impl InstanceDocument {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Reads `metadata.namespace` and `metadata.name`.
    ///
    /// A missing namespace is valid for cluster-scoped types. The name must
    /// be a non-empty string.
    pub fn key(&self) -> Result<InstanceKey, String> {
        let metadata = match self.root.get("metadata") {
            Some(Value::Object(metadata)) => metadata,
            Some(_) => return Err("metadata is not an object".to_string()),
            None => return Err("metadata missing".to_string()),
        };

        let name = match metadata.get("name") {
            Some(Value::String(name)) if !name.is_empty() => name.clone(),
            Some(Value::String(_)) => return Err("metadata.name is empty".to_string()),
            Some(_) => return Err("metadata.name is not a string".to_string()),
            None => return Err("metadata.name missing".to_string()),
        };

        let namespace = match metadata.get("namespace") {
            Some(Value::String(namespace)) => namespace.clone(),
            Some(Value::Null) | None => String::new(),
            Some(_) => return Err("metadata.namespace is not a string".to_string()),
        };

        Ok(InstanceKey { namespace, name })
    }

    /// Walks `path` through nested objects.
    ///
    /// Returns `Ok(None)` when any segment is absent and an error when an
    /// intermediate segment is not an object.
    pub fn nested(&self, path: &[&str]) -> Result<Option<&Value>, ExtractorError> {
        let mut current = &self.root;
        for (depth, segment) in path.iter().enumerate() {
            match current {
                Value::Object(map) => match map.get(*segment) {
                    Some(next) => current = next,
                    None => return Ok(None),
                },
                Value::Null => return Ok(None),
                _ => {
                    return Err(ExtractorError::UnexpectedType {
                        path: join_path(&path[..depth]),
                        expected: "object",
                    })
                }
            }
        }
        Ok(Some(current))
    }

    /// Reads a string at `path`.
    pub fn nested_str(&self, path: &[&str]) -> Result<Option<&str>, ExtractorError> {
        match self.nested(path)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.as_str())),
            Some(_) => Err(ExtractorError::UnexpectedType {
                path: join_path(path),
                expected: "string",
            }),
        }
    }

    /// Reads an array at `path`.
    pub fn nested_slice(&self, path: &[&str]) -> Result<Option<&[Value]>, ExtractorError> {
        match self.nested(path)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(values)) => Ok(Some(values.as_slice())),
            Some(_) => Err(ExtractorError::UnexpectedType {
                path: join_path(path),
                expected: "array",
            }),
        }
    }

    /// Reads a string at `path`, failing with `FieldNotFound` when absent.
    pub fn required_str(&self, path: &[&str]) -> Result<&str, ExtractorError> {
        self.nested_str(path)?
            .ok_or_else(|| ExtractorError::FieldNotFound(join_path(path)))
    }
}

impl From<Value> for InstanceDocument {
    fn from(root: Value) -> Self {
        Self::new(root)
    }
}

pub(crate) fn join_path(path: &[&str]) -> String {
    path.join(".")
}
