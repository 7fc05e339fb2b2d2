//! Records exported to JSON files, one file per collection

use super::{to_record, RecordSource, SourceError, SourceResult};
use crate::aggregate::Table;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads `<root>/<database>/<collection>.json` (an array of documents) or,
/// failing that, `<root>/<database>/<collection>.jsonl` (one document per line).
///
/// Files hold documents as the aggregation pipeline returns them, e.g. from
/// `mongoexport`; no pipeline is applied here.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    root: PathBuf,
}

impl JsonFileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_array(&self, path: &Path, collection: &str) -> SourceResult<Table> {
        let content = fs::read_to_string(path)?;
        match serde_json::from_str::<Value>(&content)? {
            Value::Array(documents) => {
                let rows = documents
                    .into_iter()
                    .map(|doc| to_record(collection, doc))
                    .collect::<SourceResult<Vec<_>>>()?;
                Ok(Table::new(rows))
            }
            _ => Err(SourceError::InvalidDocument {
                collection: collection.to_string(),
                reason: "expected a JSON array of documents".to_string(),
            }),
        }
    }

    fn read_lines(&self, path: &Path, collection: &str) -> SourceResult<Table> {
        let content = fs::read_to_string(path)?;
        let mut rows = Vec::new();
        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let document: Value = serde_json::from_str(line)?;
            rows.push(to_record(collection, document)?);
        }
        Ok(Table::new(rows))
    }
}

impl RecordSource for JsonFileSource {
    fn fetch(&self, database: &str, collection: &str) -> SourceResult<Table> {
        let dir = self.root.join(database);
        let array_path = dir.join(format!("{}.json", collection));
        let lines_path = dir.join(format!("{}.jsonl", collection));

        let table = if array_path.is_file() {
            self.read_array(&array_path, collection)?
        } else if lines_path.is_file() {
            self.read_lines(&lines_path, collection)?
        } else {
            return Err(SourceError::CollectionNotFound {
                database: database.to_string(),
                collection: collection.to_string(),
            });
        };

        debug!(path = %dir.display(), collection, rows = table.len(), "read collection file");
        Ok(table)
    }
}
