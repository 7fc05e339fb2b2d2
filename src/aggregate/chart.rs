//! Chart inputs: validation plus the bar, pie and line series

use super::{cell_text, sorted_join, value_counts, CountRow, Table};
use crate::normalize::parse_timestamp;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Pie labels longer than this are cut
const PIE_LABEL_MAX: usize = 15;

/// Why chart data was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChartError {
    #[error("Data cannot be None.")]
    DataNone,

    #[error("Data must be a table or a dictionary.")]
    WrongType,

    #[error("column argument is not in the table data.")]
    MissingColumn,
}

pub type ChartResult<T> = Result<T, ChartError>;

/// What a chart can be drawn from
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    /// Records, counted by a column
    Table(Table),
    /// Precomputed counts per key, in input order
    Counts(Vec<(String, u64)>),
    /// Anything else
    Unsupported(Value),
}

impl From<Table> for ChartData {
    fn from(table: Table) -> Self {
        ChartData::Table(table)
    }
}

impl From<Value> for ChartData {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) if items.iter().all(Value::is_object) => {
                let rows = items
                    .into_iter()
                    .filter_map(|v| match v {
                        Value::Object(map) => Some(map),
                        _ => None,
                    })
                    .collect();
                ChartData::Table(Table::new(rows))
            }
            Value::Object(map) if map.values().all(|v| v.as_u64().is_some()) => ChartData::Counts(
                map.into_iter()
                    .map(|(k, v)| (k, v.as_u64().unwrap_or_default()))
                    .collect(),
            ),
            other => ChartData::Unsupported(other),
        }
    }
}

/// Check chart input, reporting the first failure
pub fn validate(data: Option<&ChartData>, column: Option<&str>) -> ChartResult<()> {
    match data {
        None => Err(ChartError::DataNone),
        Some(ChartData::Unsupported(_)) => Err(ChartError::WrongType),
        Some(ChartData::Table(table)) => match column {
            Some(name) if table.has_column(name) => Ok(()),
            _ => Err(ChartError::MissingColumn),
        },
        Some(ChartData::Counts(_)) => Ok(()),
    }
}

/// Bar series: a table column's value counts, or a dictionary sorted by count
pub fn bar_data(data: Option<&ChartData>, column: Option<&str>) -> ChartResult<Vec<CountRow>> {
    validate(data, column)?;
    match (data, column) {
        (Some(ChartData::Table(table)), Some(column)) => Ok(value_counts(table, column)),
        (Some(ChartData::Counts(counts)), _) => {
            let mut rows: Vec<CountRow> = counts
                .iter()
                .map(|(label, count)| CountRow::new(label.clone(), *count))
                .collect();
            rows.sort_by(|a, b| b.count.cmp(&a.count));
            Ok(rows)
        }
        _ => Err(ChartError::WrongType),
    }
}

/// Pie series: value counts with list cells concatenated and labels cut to 15 characters
pub fn pie_data(data: Option<&ChartData>, column: Option<&str>) -> ChartResult<Vec<CountRow>> {
    let mut rows = bar_data(data, column)?;
    for row in &mut rows {
        if row.label.chars().count() > PIE_LABEL_MAX {
            row.label = row.label.chars().take(PIE_LABEL_MAX).collect();
        }
    }
    Ok(rows)
}

/// One day of a line series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePoint {
    pub date: NaiveDate,
    pub count: u64,
}

/// Line series: non-null `x` values per calendar day of the `y` timestamp.
///
/// Rows whose timestamp cannot be read are dropped. Days are ascending.
pub fn line_data(table: &Table, x: &str, y: &str) -> ChartResult<Vec<LinePoint>> {
    if !table.has_column(x) || !table.has_column(y) {
        return Err(ChartError::MissingColumn);
    }

    let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for (x_cell, y_cell) in table.column(x).into_iter().zip(table.column(y)) {
        let Some(timestamp) = parse_timestamp(y_cell) else {
            continue;
        };
        let counter = per_day.entry(timestamp.date_naive()).or_default();
        let present = match x_cell {
            Value::Array(items) => !sorted_join(items).is_empty(),
            other => cell_text(other).is_some(),
        };
        if present {
            *counter += 1;
        }
    }

    Ok(per_day
        .into_iter()
        .map(|(date, count)| LinePoint { date, count })
        .collect())
}
