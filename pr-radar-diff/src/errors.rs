//! Error types for unified diff parsing.

use thiserror::Error;

pub type DiffResult<T> = Result<T, DiffError>;

/// Diff parsing / projection failures.
///
/// Every variant names the offending file (when known) so the phase
/// sequencer can surface a precise `PhaseResult.error_message`.
#[derive(Debug, Error)]
pub enum DiffError {
    #[error("malformed hunk header in {file} near line offset {line_offset}: {reason}")]
    MalformedHunkHeader {
        file: String,
        line_offset: usize,
        reason: String,
    },

    #[error("invalid integer in hunk header of {file}: {value:?}")]
    InvalidInteger { file: String, value: String },

    #[error("line-number projection collision in {file} at new_line={new_line}")]
    ProjectionCollision { file: String, new_line: u32 },

    #[error("line number {line} not covered by hunk in {file}")]
    LineNotCovered { file: String, line: u32 },
}
