//! Error types for move detection and effective-diff reduction.

use thiserror::Error;

pub type MoveResult<T> = Result<T, MoveError>;

#[derive(Debug, Error)]
pub enum MoveError {
    #[error(transparent)]
    Diff(#[from] pr_radar_diff::DiffError),

    /// The re-diff oracle errored or timed out for a move candidate. Per
    /// §4.3, this is recorded as a diagnostic and the candidate is skipped
    /// (its source+target hunks survive unchanged); it is never fatal.
    #[error("re-diff oracle failed for {source_label} -> {target_label}: {reason}")]
    RediffFailed {
        source_label: String,
        target_label: String,
        reason: String,
    },

    #[error("missing file content for {0:?} required by move detection")]
    MissingFileContent(String),
}
