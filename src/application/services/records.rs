//! Record source service
//!
//! Loads JSON source records through the filesystem boundary and turns them
//! into a reconciled [`CheckTree`].

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::application::{ApplicationError, ApplicationResult, CheckTree, IoResultExt};
use crate::config::Settings;
use crate::infrastructure::traits::FileSystem;

/// How records in a source document link children to parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordLayout {
    /// Children nested under the children field
    #[default]
    Nested,
    /// One flat list, each record naming its parent id
    Flat,
}

impl fmt::Display for RecordLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nested => f.write_str("nested"),
            Self::Flat => f.write_str("flat"),
        }
    }
}

impl FromStr for RecordLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nested" => Ok(Self::Nested),
            "flat" => Ok(Self::Flat),
            other => Err(format!("unknown record layout '{other}' (expected nested or flat)")),
        }
    }
}

/// Service for loading record files into checkbox trees.
pub struct RecordService {
    fs: Arc<dyn FileSystem>,
}

impl RecordService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Read a JSON document holding an array of records or a single record.
    pub fn load(&self, path: &Path) -> ApplicationResult<Vec<Value>> {
        debug!("load: path={}", path.display());
        if !self.fs.is_file(path) {
            return Err(ApplicationError::SourceNotFound(path.to_path_buf()));
        }

        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read records", path)?;

        let records = parse_records(&content).map_err(|message| ApplicationError::InvalidSource {
            path: path.to_path_buf(),
            message,
        })?;
        debug!("load: found {} top-level records", records.len());
        Ok(records)
    }

    /// Load a record file and build a reconciled tree from it.
    pub fn build(
        &self,
        path: &Path,
        layout: RecordLayout,
        settings: &Settings,
    ) -> ApplicationResult<CheckTree> {
        let records = self.load(path)?;
        let tree = match layout {
            RecordLayout::Nested => CheckTree::from_records(&records, settings)?,
            RecordLayout::Flat => CheckTree::from_flat_records(&records, settings)?,
        };
        info!(
            nodes = tree.len(),
            depth = tree.tree().depth(),
            leaves = tree.tree().leaf_nodes().len(),
            "built {} tree from {}",
            layout,
            path.display()
        );
        Ok(tree)
    }
}

fn parse_records(content: &str) -> Result<Vec<Value>, String> {
    let document: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    match document {
        Value::Array(records) => Ok(records),
        Value::Object(_) => Ok(vec![document]),
        other => Err(format!(
            "expected an array of records or a single record object, found {}",
            json_kind(&other)
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_array_document_when_parsing_then_returns_each_record() {
        let records = parse_records(r#"[{"id": 1}, {"id": 2}]"#).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn given_object_document_when_parsing_then_wraps_single_root() {
        let records = parse_records(r#"{"id": "root", "children": []}"#).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn given_scalar_document_when_parsing_then_errors() {
        let err = parse_records("42").unwrap_err();
        assert!(err.contains("a number"), "unexpected message: {err}");
    }

    #[test]
    fn given_malformed_json_when_parsing_then_errors() {
        assert!(parse_records("[{").is_err());
    }
}
