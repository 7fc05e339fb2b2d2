//! Tabular card records and the counts charts are drawn from
//!
//! A `Table` is a list of flattened JSON records. Columns are whatever keys
//! the records carry; a missing key reads as null.

mod chart;

pub use chart::{bar_data, line_data, pie_data, ChartData, ChartError, ChartResult, LinePoint};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// One flattened document
pub type Record = Map<String, Value>;

/// Number of names shown in the top-concepts bar
pub const TOP_CONCEPTS: usize = 20;

/// Rows of flattened records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    pub rows: Vec<Record>,
}

impl Table {
    pub fn new(rows: Vec<Record>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names in the order they are first seen
    pub fn columns(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        for row in &self.rows {
            for key in row.keys() {
                if seen.insert(key.as_str()) {
                    columns.push(key.clone());
                }
            }
        }
        columns
    }

    /// Whether any row carries the column
    pub fn has_column(&self, name: &str) -> bool {
        self.rows.iter().any(|row| row.contains_key(name))
    }

    /// The column's cells, one per row, null where a row lacks the key
    pub fn column(&self, name: &str) -> Vec<&Value> {
        self.rows
            .iter()
            .map(|row| row.get(name).unwrap_or(&Value::Null))
            .collect()
    }

    /// Append the rows of several tables
    pub fn concat(tables: impl IntoIterator<Item = Table>) -> Self {
        Self {
            rows: tables.into_iter().flat_map(|t| t.rows).collect(),
        }
    }

    /// Rewrite a column in place, on rows that carry it
    pub fn map_column<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&Value) -> Value,
    {
        for row in &mut self.rows {
            if let Some(cell) = row.get_mut(name) {
                *cell = f(cell);
            }
        }
    }
}

impl From<Vec<Record>> for Table {
    fn from(rows: Vec<Record>) -> Self {
        Self::new(rows)
    }
}

/// A label with how often it occurred
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRow {
    pub label: String,
    pub count: u64,
}

impl CountRow {
    pub fn new(label: impl Into<String>, count: u64) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// Tallies labels, remembering the order each was first seen
#[derive(Default)]
struct Tally {
    order: Vec<String>,
    counts: HashMap<String, u64>,
}

impl Tally {
    fn add(&mut self, label: String) {
        match self.counts.get_mut(&label) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(label.clone(), 1);
                self.order.push(label);
            }
        }
    }

    /// Count descending; ties keep first-appearance order
    fn into_rows(mut self) -> Vec<CountRow> {
        let mut rows: Vec<CountRow> = self
            .order
            .into_iter()
            .map(|label| {
                let count = self.counts.remove(&label).unwrap_or_default();
                CountRow { label, count }
            })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count));
        rows
    }
}

/// Text of a scalar cell; `None` for null
pub(crate) fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Concatenate list items in sorted order, the label a list cell counts
/// under (`["U", "R"]` → `"RU"`)
pub(crate) fn sorted_join(items: &[Value]) -> String {
    let mut parts: Vec<String> = items.iter().filter_map(cell_text).collect();
    parts.sort();
    parts.concat()
}

/// Occurrences of each value in a column, most frequent first.
///
/// Nulls are skipped and list cells count under their sorted, concatenated items.
pub fn value_counts(table: &Table, column: &str) -> Vec<CountRow> {
    let mut tally = Tally::default();
    for cell in table.column(column) {
        match cell {
            Value::Null => {}
            Value::Array(items) => tally.add(sorted_join(items)),
            other => {
                if let Some(text) = cell_text(other) {
                    tally.add(text);
                }
            }
        }
    }
    tally.into_rows()
}

/// Occurrences of each individual colour code.
///
/// List cells count every item; string cells count every character, so a
/// `"WU"` cell adds one to `W` and one to `U`.
pub fn count_primary_colors(table: &Table, column: &str) -> Vec<CountRow> {
    let mut tally = Tally::default();
    for cell in table.column(column) {
        match cell {
            Value::Array(items) => {
                for item in items.iter().filter_map(cell_text) {
                    tally.add(item);
                }
            }
            Value::String(s) => {
                for c in s.chars() {
                    tally.add(c.to_string());
                }
            }
            _ => {}
        }
    }
    tally.into_rows()
}

/// Occurrences of each card name; a list of names counts as one key
pub fn count_card_names(table: &Table, column: &str) -> Vec<CountRow> {
    let mut tally = Tally::default();
    for cell in table.column(column) {
        match cell {
            Value::Null => {}
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().filter_map(cell_text).collect();
                tally.add(parts.join(", "));
            }
            other => {
                if let Some(text) = cell_text(other) {
                    tally.add(text);
                }
            }
        }
    }
    tally.into_rows()
}

/// Headline numbers for a card table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    /// Rows with a non-null `_id`
    pub total_cards: usize,
    /// Sum of `retrievalCount`
    pub total_retrievals: f64,
    /// Distinct non-null `name` values
    pub unique_concepts: usize,
}

impl Kpis {
    pub fn from_table(table: &Table) -> Self {
        let total_cards = table.column("_id").iter().filter(|v| !v.is_null()).count();
        let total_retrievals = table
            .column("retrievalCount")
            .iter()
            .filter_map(|v| v.as_f64())
            .sum();
        let unique_concepts = table
            .column("name")
            .iter()
            .filter_map(|v| cell_text(v))
            .collect::<HashSet<_>>()
            .len();
        Self {
            total_cards,
            total_retrievals,
            unique_concepts,
        }
    }
}

/// The most frequent concept names
pub fn top_concepts(table: &Table, limit: usize) -> Vec<CountRow> {
    let mut rows = value_counts(table, "name");
    rows.truncate(limit);
    rows
}
