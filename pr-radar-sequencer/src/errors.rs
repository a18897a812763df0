//! Crate-wide error hierarchy for the phase sequencer, aggregating every
//! component crate's error type, mirroring `mr-reviewer::errors::Error`'s
//! `Provider`/`Cache`/`Parse`/`Config` aggregation (§7).

use std::path::PathBuf;

use thiserror::Error;

pub type SequencerResult<T> = Result<T, SequencerError>;

#[derive(Debug, Error)]
pub enum SequencerError {
    #[error(transparent)]
    Diff(#[from] pr_radar_diff::DiffError),

    #[error(transparent)]
    Moves(#[from] pr_radar_moves::MoveError),

    #[error(transparent)]
    Focus(#[from] pr_radar_focus::FocusError),

    #[error(transparent)]
    Rule(#[from] pr_radar_rules::RuleError),

    #[error(transparent)]
    Task(#[from] pr_radar_tasks::TaskError),

    #[error(transparent)]
    Eval(#[from] pr_radar_eval::EvalError),

    #[error(transparent)]
    Report(#[from] pr_radar_report::ReportError),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("json error at {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Attempt to run a phase whose predecessor has not completed
    /// successfully (§4.9 dependency gates). Names both phases, no side
    /// effects.
    #[error("phase '{phase}' requires phase '{required}' to have completed successfully first")]
    DependencyUnmet { phase: String, required: String },

    /// Invariant violation surfaced from a component (duplicate focus_id,
    /// hunk length mismatch, …) that the sequencer treats as fatal (§7).
    #[error("invariant violation in phase '{phase}': {reason}")]
    InvariantViolation { phase: String, reason: String },

    /// Another process holds the advisory lock on this PR's output
    /// directory (§5 shared resources).
    #[error("run already in progress: lock held at {path}")]
    Locked { path: PathBuf },

    #[error("cancelled")]
    Cancelled,
}
