//! Where card records come from
//!
//! Sources hand back flattened tables. `load_cards` combines the configured
//! collections and normalizes the fields the dashboard reads.

mod file;
#[cfg(feature = "mongo")]
mod mongo;
pub mod queries;

pub use file::JsonFileSource;
#[cfg(feature = "mongo")]
pub use mongo::MongoSource;

use crate::aggregate::{Record, Table};
use crate::config::SourceSpec;
use crate::normalize::{normalize_colors, parse_timestamp};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

/// Errors that can occur while fetching records
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Collection not found: {database}/{collection}")]
    CollectionNotFound { database: String, collection: String },

    #[error("Invalid document in {collection}: {reason}")]
    InvalidDocument { collection: String, reason: String },

    #[error("Database error: {0}")]
    Database(String),
}

/// Result type for source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Anything that can return the records of a named collection
pub trait RecordSource {
    /// Fetch every record of `database`/`collection` as a flattened table
    fn fetch(&self, database: &str, collection: &str) -> SourceResult<Table>;
}

/// Columns rewritten as RFC 3339 strings by `load_cards`
const TIMESTAMP_COLUMNS: [&str; 2] = ["createdAt", "updatedAt"];

/// Load and normalize cards from every configured collection.
///
/// A source that fails is logged and contributes no rows.
pub fn load_cards(source: &dyn RecordSource, specs: &[SourceSpec]) -> Table {
    let tables = specs.iter().map(|spec| {
        match source.fetch(&spec.database, &spec.collection) {
            Ok(table) => {
                info!(
                    database = %spec.database,
                    collection = %spec.collection,
                    rows = table.len(),
                    "fetched records"
                );
                table
            }
            Err(e) => {
                warn!(
                    database = %spec.database,
                    collection = %spec.collection,
                    "fetch failed, skipping: {}",
                    e
                );
                Table::default()
            }
        }
    });
    let mut cards = Table::concat(tables.collect::<Vec<_>>());

    cards.map_column("colors", |v| match normalize_colors(v) {
        Some(codes) => Value::from(codes),
        None => Value::Null,
    });
    for column in TIMESTAMP_COLUMNS {
        cards.map_column(column, |v| match parse_timestamp(v) {
            Some(ts) => Value::String(ts.to_rfc3339()),
            None => Value::Null,
        });
    }

    info!(rows = cards.len(), "cards loaded");
    cards
}

/// Replace extended-JSON wrappers (`$oid`, `$date`, `$numberLong`, ...) with
/// plain values, recursively.
pub fn unwrap_extended_json(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(unwrap_extended_json).collect()),
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some((key, inner)) = map.iter().next() {
                    if let Some(plain) = unwrap_wrapper(key, inner) {
                        return plain;
                    }
                }
            }
            Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, unwrap_extended_json(v)))
                    .collect(),
            )
        }
        other => other,
    }
}

fn unwrap_wrapper(key: &str, inner: &Value) -> Option<Value> {
    match key {
        "$oid" | "$symbol" | "$numberDecimal" => inner.as_str().map(Value::from),
        "$numberLong" | "$numberInt" => {
            let text = inner.as_str()?;
            text.parse::<i64>().ok().map(Value::from)
        }
        "$numberDouble" => {
            let text = inner.as_str()?;
            let parsed = text.parse::<f64>().ok()?;
            Some(serde_json::Number::from_f64(parsed).map_or(Value::Null, Value::Number))
        }
        // Relaxed form holds an ISO string; canonical form wraps epoch millis
        "$date" => match inner {
            Value::String(_) | Value::Number(_) => Some(inner.clone()),
            Value::Object(_) => Some(unwrap_extended_json(inner.clone())),
            _ => None,
        },
        _ => None,
    }
}

/// Flatten nested objects into dot-joined keys (`{"a":{"b":1}}` → `{"a.b":1}`).
///
/// Arrays are kept as values. Empty objects stay under their own key.
pub fn flatten_document(document: Map<String, Value>) -> Record {
    let mut out = Record::new();
    flatten_into(&mut out, None, document);
    out
}

fn flatten_into(out: &mut Record, prefix: Option<&str>, document: Map<String, Value>) {
    for (key, value) in document {
        let name = match prefix {
            Some(p) => format!("{}.{}", p, key),
            None => key,
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(out, Some(&name), inner),
            other => {
                out.insert(name, other);
            }
        }
    }
}

/// Unwrap and flatten one raw document
pub(crate) fn to_record(collection: &str, document: Value) -> SourceResult<Record> {
    match unwrap_extended_json(document) {
        Value::Object(map) => Ok(flatten_document(map)),
        other => Err(SourceError::InvalidDocument {
            collection: collection.to_string(),
            reason: format!("expected an object, got {}", kind(&other)),
        }),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
