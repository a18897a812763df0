//! Phase sequencer (C9): directory layout, dependency gates, phase markers,
//! resume/status computation, and the advisory run lock, per §4.9.

pub mod errors;
pub mod layout;
pub mod lock;
pub mod phase;
pub mod render;
pub mod run;
pub mod status;

pub use errors::{SequencerError, SequencerResult};
pub use lock::RunLock;
pub use phase::{Phase, PhaseResult, PhaseRunStatus, PhaseStats, PhaseStatus};
pub use run::{
    run_phase1_pull_request, run_phase2_focus_areas, run_phase3_rules, run_phase4_tasks,
    run_phase5_evaluations, run_phase6_report,
};
