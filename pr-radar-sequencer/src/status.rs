//! Phase status computation: marker-first, legacy-heuristic fallback (§4.9).

use std::path::Path;

use crate::layout::{json_artifact_paths, read_phase_result};
use crate::phase::{Phase, PhaseRunStatus, PhaseStatus};

/// Computes the status of `phase` whose artifacts live in `dir`.
///
/// When `phase_result.json` is present, it is authoritative. Otherwise a
/// per-phase legacy heuristic inspects the artifact set, for backward
/// compatibility with directories produced before a marker-writing bug fix
/// or an interrupted run.
pub fn compute_status(dir: &Path, phase: Phase) -> PhaseStatus {
    if let Ok(Some(result)) = read_phase_result(dir) {
        return match result.status {
            PhaseRunStatus::Success => PhaseStatus::Complete,
            PhaseRunStatus::Failed => PhaseStatus::Failed,
        };
    }
    legacy_status(dir, phase)
}

fn legacy_status(dir: &Path, phase: Phase) -> PhaseStatus {
    if !dir.exists() {
        return PhaseStatus::NotStarted;
    }

    match phase {
        Phase::PullRequest => {
            // The gh-*.json triad is produced upstream (out of scope, §1) and
            // is not required for this heuristic.
            required_filenames_present(
                dir,
                &[
                    "diff-raw.diff",
                    "diff-parsed.json",
                    "diff-parsed.md",
                    "effective-diff-parsed.json",
                    "effective-diff-parsed.md",
                    "effective-diff-moves.json",
                ],
            )
        }
        Phase::Report => required_filenames_present(dir, &["summary.json", "summary.md"]),
        Phase::FocusAreas | Phase::Tasks => {
            if json_artifact_paths(dir, &["phase_result.json"]).is_empty() {
                PhaseStatus::NotStarted
            } else {
                PhaseStatus::Partial
            }
        }
        Phase::Rules => {
            if dir.join("all-rules.json").exists() {
                PhaseStatus::Partial
            } else {
                PhaseStatus::NotStarted
            }
        }
        Phase::Evaluations => {
            if json_artifact_paths(dir, &["phase_result.json", "summary.json"]).is_empty() {
                PhaseStatus::NotStarted
            } else {
                PhaseStatus::Partial
            }
        }
    }
}

fn required_filenames_present(dir: &Path, required: &[&str]) -> PhaseStatus {
    let present = required.iter().filter(|f| dir.join(f).exists()).count();
    if present == 0 {
        PhaseStatus::NotStarted
    } else {
        // A full set without a marker still reads as partial: the marker is
        // the only thing that promotes a phase to `complete`.
        PhaseStatus::Partial
    }
}

/// Phase-5's more precise legacy heuristic (§4.9): reconcile task_ids under
/// phase-4 against result files under phase-5. Used by the `status` command,
/// which has both directories in hand.
pub fn reconcile_evaluations_status(tasks_dir: &Path, evaluations_dir: &Path) -> PhaseStatus {
    if let Ok(Some(result)) = read_phase_result(evaluations_dir) {
        return match result.status {
            PhaseRunStatus::Success => PhaseStatus::Complete,
            PhaseRunStatus::Failed => PhaseStatus::Failed,
        };
    }

    let task_ids = pr_radar_tasks::scan_existing_task_ids(tasks_dir);
    if task_ids.is_empty() {
        return PhaseStatus::NotStarted;
    }
    let done_ids = pr_radar_tasks::scan_existing_task_ids(evaluations_dir);
    if done_ids.is_empty() {
        return PhaseStatus::NotStarted;
    }
    PhaseStatus::Partial
}
