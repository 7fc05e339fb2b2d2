//! Progress reporting for long-running passes
//!
//! The builders report at fixed checkpoints (row or batch boundaries). The
//! observer decides what to do with the updates; `NoProgress` drops them.

use serde::Serialize;

/// Which pass a progress update belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Embedding,
    ComputingSimilarity,
    AddingEdges,
    Clustering,
    Projecting,
    Classifying,
    Done,
}

/// A single progress checkpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressUpdate {
    pub stage: Stage,
    /// Completion in `[0.0, 1.0]` across the whole pass
    pub fraction: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProgressUpdate {
    pub fn new(stage: Stage, fraction: f32) -> Self {
        Self {
            stage,
            fraction: fraction.clamp(0.0, 1.0),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Receives progress checkpoints
pub trait ProgressObserver {
    fn on_progress(&self, update: &ProgressUpdate);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressUpdate),
{
    fn on_progress(&self, update: &ProgressUpdate) {
        self(update)
    }
}

/// Observer that ignores every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _update: &ProgressUpdate) {}
}

/// Interval between checkpoints so that roughly 50 are emitted over `total` steps
pub(crate) fn checkpoint_interval(total: usize) -> usize {
    (total / 50).max(1)
}
