//! Error types for rule evaluation.

use thiserror::Error;

pub type EvalResult<T> = Result<T, EvalError>;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("failed to create output directory {path:?}: {source}")]
    CreateDir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write result file {path:?}: {source}")]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize result for task {task_id:?}: {source}")]
    Serialize {
        task_id: String,
        #[source]
        source: serde_json::Error,
    },

    /// Not itself fatal to the phase (§4.7's failure isolation) — surfaced
    /// so the sequencer can record cancellation as `PhaseResult::failed`.
    #[error("evaluation cancelled")]
    Cancelled,
}
