//! The phase DAG and the `phase_result.json` marker format (§4.9, §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the six pipeline phases, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    PullRequest,
    FocusAreas,
    Rules,
    Tasks,
    Evaluations,
    Report,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::PullRequest,
        Phase::FocusAreas,
        Phase::Rules,
        Phase::Tasks,
        Phase::Evaluations,
        Phase::Report,
    ];

    /// Directory name under `<output_root>/<repo_slug>/<pr_number>/`.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Phase::PullRequest => "phase-1-pull-request",
            Phase::FocusAreas => "phase-2-focus-areas",
            Phase::Rules => "phase-3-rules",
            Phase::Tasks => "phase-4-tasks",
            Phase::Evaluations => "phase-5-evaluations",
            Phase::Report => "phase-6-report",
        }
    }

    /// Human-readable name, used in CLI output and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::PullRequest => "pull-request",
            Phase::FocusAreas => "focus-areas",
            Phase::Rules => "rules",
            Phase::Tasks => "tasks",
            Phase::Evaluations => "evaluations",
            Phase::Report => "report",
        }
    }

    /// The phase that must have completed with `status=success` before this
    /// one may run (linear gate, §4.9). `None` for the first phase.
    pub fn predecessor(&self) -> Option<Phase> {
        match self {
            Phase::PullRequest => None,
            Phase::FocusAreas => Some(Phase::PullRequest),
            Phase::Rules => Some(Phase::FocusAreas),
            Phase::Tasks => Some(Phase::Rules),
            Phase::Evaluations => Some(Phase::Tasks),
            Phase::Report => Some(Phase::Evaluations),
        }
    }
}

/// The outcome recorded in a phase's completion marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseRunStatus {
    Success,
    Failed,
}

/// Free-form counters attached to a `PhaseResult`. `metadata` carries
/// per-task/per-candidate diagnostics for isolated oracle failures (§7) that
/// didn't abort the phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts_produced: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Written by every phase as its last action (§3). The atomic-rename
/// pattern (write `<name>.tmp`, fsync, rename) applies to this file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseResult {
    pub phase: Phase,
    pub status: PhaseRunStatus,
    pub completed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub stats: PhaseStats,
}

/// The *computed* status of a phase, derived from its marker when present
/// and from legacy filesystem heuristics otherwise (§4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStatus {
    NotStarted,
    Partial,
    Complete,
    Failed,
}

impl PhaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseStatus::NotStarted => "not_started",
            PhaseStatus::Partial => "partial",
            PhaseStatus::Complete => "complete",
            PhaseStatus::Failed => "failed",
        }
    }
}
