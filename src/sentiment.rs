//! Sentiment labels and their trend over time
//!
//! The classifier itself is external; this module batches texts through it
//! and turns its five-level labels into a daily mean score.

use crate::aggregate::Table;
use crate::graph::{ProgressObserver, ProgressUpdate, Stage};
use crate::normalize::parse_timestamp;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Default number of texts per classifier call
pub const DEFAULT_BATCH_SIZE: usize = 32;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SentimentError {
    #[error("classifier error: {0}")]
    Model(String),

    #[error("classifier returned {actual} labels for {expected} texts")]
    CountMismatch { expected: usize, actual: usize },

    #[error("table has {rows} rows but {labels} labels were given")]
    LengthMismatch { rows: usize, labels: usize },
}

/// A classifier's verdict for one text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLabel {
    pub label: String,
    /// Classifier confidence
    pub score: f32,
}

impl TextLabel {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Text classification model (sentiment, emotion, ...)
pub trait TextClassifier {
    fn classify_batch(&self, texts: &[&str]) -> Result<Vec<TextLabel>, SentimentError>;
}

/// Numeric value of a sentiment label, from -2 (very negative) to 2 (very positive).
/// Unknown labels count as neutral.
pub fn sentiment_score(label: &str) -> i8 {
    match label.trim().to_lowercase().as_str() {
        "very negative" => -2,
        "negative" => -1,
        "neutral" => 0,
        "positive" => 1,
        "very positive" => 2,
        _ => 0,
    }
}

/// Classify every text in batches, reporting after each batch
pub fn classify_all(
    classifier: &dyn TextClassifier,
    texts: &[&str],
    batch_size: usize,
    progress: &dyn ProgressObserver,
) -> Result<Vec<TextLabel>, SentimentError> {
    let batch_size = batch_size.max(1);
    let mut labels = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size) {
        let classified = classifier.classify_batch(batch)?;
        if classified.len() != batch.len() {
            return Err(SentimentError::CountMismatch {
                expected: batch.len(),
                actual: classified.len(),
            });
        }
        labels.extend(classified);
        progress.on_progress(&ProgressUpdate::new(
            Stage::Classifying,
            labels.len() as f32 / texts.len() as f32,
        ));
    }
    debug!(count = labels.len(), "classified texts");
    Ok(labels)
}

/// Mean sentiment score for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySentiment {
    pub date: NaiveDate,
    pub mean_score: f64,
    pub count: usize,
}

/// Daily mean sentiment over `createdAt`, with `labels[i]` belonging to row `i`.
///
/// `None` when the table has no `createdAt` column. Rows whose timestamp
/// cannot be read are skipped.
pub fn sentiment_over_time(
    table: &Table,
    labels: &[TextLabel],
) -> Result<Option<Vec<DailySentiment>>, SentimentError> {
    if !table.has_column("createdAt") {
        return Ok(None);
    }
    if table.len() != labels.len() {
        return Err(SentimentError::LengthMismatch {
            rows: table.len(),
            labels: labels.len(),
        });
    }

    let mut per_day: BTreeMap<NaiveDate, (i64, usize)> = BTreeMap::new();
    for (cell, label) in table.column("createdAt").into_iter().zip(labels) {
        if let Some(ts) = parse_timestamp(cell) {
            let entry = per_day.entry(ts.date_naive()).or_default();
            entry.0 += sentiment_score(&label.label) as i64;
            entry.1 += 1;
        }
    }

    Ok(Some(
        per_day
            .into_iter()
            .map(|(date, (sum, count))| DailySentiment {
                date,
                mean_score: sum as f64 / count as f64,
                count,
            })
            .collect(),
    ))
}
