//! Error types for focus-area generation.

use thiserror::Error;

pub type FocusResult<T> = Result<T, FocusError>;

#[derive(Debug, Error)]
pub enum FocusError {
    #[error(transparent)]
    Diff(#[from] pr_radar_diff::DiffError),

    /// Two focus areas produced the same `focus_id`. Per §4.4 this is an
    /// invariant violation and fails the whole phase.
    #[error("duplicate focus_id {0:?} within phase output")]
    DuplicateFocusId(String),
}
