//! Phase drivers (C9): one function per pipeline phase, each gating on its
//! predecessor's `phase_result.json`, producing the phase's artifacts, and
//! writing its own marker as the last action (§4.9).
//!
//! Component failures that the spec classifies as "input malformed" or
//! "invariant violation" are caught here and turned into a `status=failed`
//! `PhaseResult` rather than propagated as `Err` — the sequencer is the
//! sole writer of `PhaseResult` (§7 propagation policy). I/O failures that
//! prevent even writing the marker remain `Err`.

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use pr_radar_diff::parse_git_diff;
use pr_radar_eval::{
    run_evaluation, EvalError, EvaluatorConfig, LlmOracle, ProgressFn, RuleEvaluationResult,
};
use pr_radar_focus::{generate_focus_areas, FocusArea, FocusType, SubdivideOracle};
use pr_radar_moves::{build_effective_diff, detect_moves, EffectiveDiffConfig, RediffOracle};
use pr_radar_report::{build_summary, write_report};
use pr_radar_rules::{load_rules, Rule};
use pr_radar_tasks::{generate_tasks, write_all, EvaluationTask};

use crate::errors::{SequencerError, SequencerResult};
use crate::layout;
use crate::phase::{Phase, PhaseResult, PhaseRunStatus, PhaseStats};
use crate::render::render_diff_markdown;

fn failed(phase: Phase, message: impl Into<String>) -> PhaseResult {
    PhaseResult {
        phase,
        status: PhaseRunStatus::Failed,
        completed_at: Utc::now(),
        error_message: Some(message.into()),
        stats: PhaseStats::default(),
    }
}

fn succeeded(phase: Phase, started: Instant, artifacts: usize, cost_usd: Option<f64>) -> PhaseResult {
    PhaseResult {
        phase,
        status: PhaseRunStatus::Success,
        completed_at: Utc::now(),
        error_message: None,
        stats: PhaseStats {
            artifacts_produced: Some(artifacts),
            duration_ms: Some(started.elapsed().as_millis() as u64),
            cost_usd,
            metadata: None,
        },
    }
}

/// §4.9 dependency gate: a phase may run only once its predecessor's
/// `phase_result.json` records `status=success`. Pure marker check — never
/// consults the legacy heuristics in `crate::status`, which exist only for
/// read-side status reporting.
fn require_predecessor(
    output_root: &Path,
    repo_slug: &str,
    pr_number: u64,
    phase: Phase,
) -> SequencerResult<()> {
    let Some(predecessor) = phase.predecessor() else {
        return Ok(());
    };
    let dir = layout::phase_dir(output_root, repo_slug, pr_number, predecessor);
    match layout::read_phase_result(&dir)? {
        Some(result) if matches!(result.status, PhaseRunStatus::Success) => Ok(()),
        _ => Err(SequencerError::DependencyUnmet {
            phase: phase.label().to_string(),
            required: predecessor.label().to_string(),
        }),
    }
}

/// Runs phase 1 (C1 + C2 + C3): parses `raw_diff`, detects moves, and
/// reduces to an effective diff. `old_contents`/`new_contents` are the
/// `{path: text}` maps C3 needs for re-diffing move neighborhoods; an empty
/// map is valid and simply causes every candidate to be skipped (§4.3
/// failure policy), leaving the effective diff equal to the parsed diff.
pub async fn run_phase1_pull_request<O: RediffOracle>(
    output_root: &Path,
    repo_slug: &str,
    pr_number: u64,
    raw_diff: &str,
    commit_hash: &str,
    old_contents: &HashMap<String, String>,
    new_contents: &HashMap<String, String>,
    rediff_oracle: &O,
) -> SequencerResult<PhaseResult> {
    let dir = layout::phase_dir(output_root, repo_slug, pr_number, Phase::PullRequest);
    let started = Instant::now();

    layout::write_text(&dir.join("diff-raw.diff"), raw_diff)?;

    let diff = match parse_git_diff(raw_diff, commit_hash) {
        Ok(diff) => diff,
        Err(err) => {
            let result = failed(Phase::PullRequest, format!("diff-raw.diff: {err}"));
            layout::write_phase_result(&dir, &result)?;
            return Ok(result);
        }
    };

    layout::write_json(&dir.join("diff-parsed.json"), &diff)?;
    layout::write_text(&dir.join("diff-parsed.md"), &render_diff_markdown(&diff))?;

    let candidates = detect_moves(&diff, Default::default());
    let (effective, move_report) = build_effective_diff(
        &diff,
        candidates,
        old_contents,
        new_contents,
        rediff_oracle,
        EffectiveDiffConfig::default(),
    )
    .await;

    layout::write_json(&dir.join("effective-diff-parsed.json"), &effective)?;
    layout::write_text(
        &dir.join("effective-diff-parsed.md"),
        &render_diff_markdown(&effective),
    )?;
    layout::write_json(&dir.join("effective-diff-moves.json"), &move_report)?;

    let result = succeeded(Phase::PullRequest, started, diff.hunks.len(), None);
    layout::write_phase_result(&dir, &result)?;
    info!(pr_number, moves = move_report.moves_detected, "phase 1 complete");
    Ok(result)
}

/// Runs phase 2 (C4): subdivides the effective diff (or the full diff, if
/// phase 1 produced no effective form) into file/method `FocusArea`s.
pub async fn run_phase2_focus_areas<O: SubdivideOracle>(
    output_root: &Path,
    repo_slug: &str,
    pr_number: u64,
    subdivide_oracle: &O,
) -> SequencerResult<PhaseResult> {
    require_predecessor(output_root, repo_slug, pr_number, Phase::FocusAreas)?;
    let dir = layout::phase_dir(output_root, repo_slug, pr_number, Phase::FocusAreas);
    let started = Instant::now();

    let pr_dir = layout::phase_dir(output_root, repo_slug, pr_number, Phase::PullRequest);
    let effective_path = pr_dir.join("effective-diff-parsed.json");
    let source_path = if effective_path.exists() {
        effective_path
    } else {
        pr_dir.join("diff-parsed.json")
    };
    let diff = layout::read_json(&source_path)?;

    let areas = match generate_focus_areas(&diff, subdivide_oracle).await {
        Ok(areas) => areas,
        Err(err) => {
            let result = failed(Phase::FocusAreas, err.to_string());
            layout::write_phase_result(&dir, &result)?;
            return Ok(result);
        }
    };

    let (file_areas, method_areas): (Vec<FocusArea>, Vec<FocusArea>) = areas
        .into_iter()
        .partition(|area| area.focus_type == FocusType::File);

    layout::write_json(&dir.join("file.json"), &file_areas)?;
    layout::write_json(&dir.join("method.json"), &method_areas)?;

    let result = succeeded(
        Phase::FocusAreas,
        started,
        file_areas.len() + method_areas.len(),
        None,
    );
    layout::write_phase_result(&dir, &result)?;
    Ok(result)
}

/// Runs phase 3 (C5): loads and compiles rules from `rules_dir`.
pub fn run_phase3_rules(
    output_root: &Path,
    repo_slug: &str,
    pr_number: u64,
    rules_dir: &Path,
) -> SequencerResult<PhaseResult> {
    require_predecessor(output_root, repo_slug, pr_number, Phase::Rules)?;
    let dir = layout::phase_dir(output_root, repo_slug, pr_number, Phase::Rules);
    let started = Instant::now();

    let rules = match load_rules(rules_dir) {
        Ok(rules) => rules,
        Err(err) => {
            let result = failed(Phase::Rules, err.to_string());
            layout::write_phase_result(&dir, &result)?;
            return Ok(result);
        }
    };

    layout::write_json(&dir.join("all-rules.json"), &rules)?;

    let result = succeeded(Phase::Rules, started, rules.len(), None);
    layout::write_phase_result(&dir, &result)?;
    Ok(result)
}

/// Rules round-tripped through JSON lose their `#[serde(skip)]` compiled
/// matchers; recompile before use (§4.5, §9's "cache, don't reparse"
/// design note applies within one load, not across a JSON round trip).
fn load_compiled_rules(path: &Path) -> SequencerResult<Vec<Rule>> {
    let rules: Vec<Rule> = layout::read_json(path)?;
    rules
        .into_iter()
        .map(|r| r.compile())
        .collect::<Result<Vec<_>, _>>()
        .map_err(SequencerError::from)
}

/// Runs phase 4 (C6): the rule x focus-area cartesian product.
pub fn run_phase4_tasks(
    output_root: &Path,
    repo_slug: &str,
    pr_number: u64,
) -> SequencerResult<PhaseResult> {
    require_predecessor(output_root, repo_slug, pr_number, Phase::Tasks)?;
    let dir = layout::phase_dir(output_root, repo_slug, pr_number, Phase::Tasks);
    let started = Instant::now();

    let rules_dir = layout::phase_dir(output_root, repo_slug, pr_number, Phase::Rules);
    let focus_dir = layout::phase_dir(output_root, repo_slug, pr_number, Phase::FocusAreas);

    let rules = load_compiled_rules(&rules_dir.join("all-rules.json"))?;
    let mut areas: Vec<FocusArea> = layout::read_json(&focus_dir.join("file.json"))?;
    let mut methods: Vec<FocusArea> = layout::read_json(&focus_dir.join("method.json"))?;
    areas.append(&mut methods);

    let tasks = generate_tasks(&rules, &areas);
    write_all(&dir, &tasks)?;

    let result = succeeded(Phase::Tasks, started, tasks.len(), None);
    layout::write_phase_result(&dir, &result)?;
    Ok(result)
}

/// Runs phase 5 (C7): bounded-concurrency dispatch of every phase-4 task to
/// `oracle`, resuming from whatever `phase-5-evaluations/*.json` already
/// exists.
pub async fn run_phase5_evaluations<O>(
    output_root: &Path,
    repo_slug: &str,
    pr_number: u64,
    oracle: O,
    workers: usize,
    cancel: CancellationToken,
    on_progress: Option<ProgressFn>,
) -> SequencerResult<PhaseResult>
where
    O: LlmOracle + Clone + Send + Sync + 'static,
{
    require_predecessor(output_root, repo_slug, pr_number, Phase::Evaluations)?;
    let tasks_dir = layout::phase_dir(output_root, repo_slug, pr_number, Phase::Tasks);
    let dir = layout::phase_dir(output_root, repo_slug, pr_number, Phase::Evaluations);
    let started = Instant::now();

    let task_paths = layout::json_artifact_paths(&tasks_dir, &["phase_result.json"]);
    let mut tasks = Vec::with_capacity(task_paths.len());
    for path in &task_paths {
        tasks.push(layout::read_json::<EvaluationTask>(path)?);
    }

    let cfg = EvaluatorConfig {
        workers: workers.max(1),
        output_dir: dir.clone(),
    };

    let results = match run_evaluation(tasks, oracle, cfg, cancel, on_progress).await {
        Ok(results) => results,
        Err(EvalError::Cancelled) => {
            let result = PhaseResult {
                phase: Phase::Evaluations,
                status: PhaseRunStatus::Failed,
                completed_at: Utc::now(),
                error_message: Some("cancelled".to_string()),
                stats: PhaseStats::default(),
            };
            layout::write_phase_result(&dir, &result)?;
            return Ok(result);
        }
        Err(err) => {
            let result = failed(Phase::Evaluations, err.to_string());
            layout::write_phase_result(&dir, &result)?;
            return Ok(result);
        }
    };

    let success_count = results
        .iter()
        .filter(|r| matches!(r, RuleEvaluationResult::Success { .. }))
        .count();
    let failure_count = results.len() - success_count;
    let cost_usd: Option<f64> = {
        let total: f64 = results
            .iter()
            .filter_map(|r| match r {
                RuleEvaluationResult::Success { cost_usd, .. } => *cost_usd,
                RuleEvaluationResult::Failure { .. } => None,
            })
            .sum();
        (total > 0.0).then_some(total)
    };

    layout::write_json(
        &dir.join("summary.json"),
        &serde_json::json!({
            "total_tasks": results.len(),
            "success": success_count,
            "failure": failure_count,
        }),
    )?;

    let mut result = succeeded(Phase::Evaluations, started, results.len(), cost_usd);
    if failure_count > 0 {
        result.stats.metadata = Some(serde_json::json!({ "failed_tasks": failure_count }));
    }
    layout::write_phase_result(&dir, &result)?;
    Ok(result)
}

/// Runs phase 6 (C8): aggregates every evaluation result into a scored,
/// sorted summary and emits JSON + markdown.
pub fn run_phase6_report(
    output_root: &Path,
    repo_slug: &str,
    pr_number: u64,
    min_score: u8,
) -> SequencerResult<PhaseResult> {
    require_predecessor(output_root, repo_slug, pr_number, Phase::Report)?;
    let eval_dir = layout::phase_dir(output_root, repo_slug, pr_number, Phase::Evaluations);
    let tasks_dir = layout::phase_dir(output_root, repo_slug, pr_number, Phase::Tasks);
    let focus_dir = layout::phase_dir(output_root, repo_slug, pr_number, Phase::FocusAreas);
    let dir = layout::phase_dir(output_root, repo_slug, pr_number, Phase::Report);
    let started = Instant::now();

    let result_paths =
        layout::json_artifact_paths(&eval_dir, &["phase_result.json", "summary.json"]);
    let mut results = Vec::with_capacity(result_paths.len());
    for path in &result_paths {
        results.push(layout::read_json::<RuleEvaluationResult>(path)?);
    }

    let task_paths = layout::json_artifact_paths(&tasks_dir, &["phase_result.json"]);
    let mut tasks = Vec::with_capacity(task_paths.len());
    for path in &task_paths {
        tasks.push(layout::read_json::<EvaluationTask>(path)?);
    }

    // §4.8 cost rule: fold in focus-area generation cost from phase 2, when
    // the sequencer recorded one.
    let extra_cost = layout::read_phase_result(&focus_dir)
        .ok()
        .flatten()
        .and_then(|r| r.stats.cost_usd);

    let summary = build_summary(&results, &tasks, min_score, extra_cost);
    write_report(&dir, &summary)?;

    let result = succeeded(
        Phase::Report,
        started,
        summary.total_violations,
        summary.total_cost_usd,
    );
    layout::write_phase_result(&dir, &result)?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pr_radar_eval::{ModelMessage, ModelRequest};
    use pr_radar_focus::NoSubdivideOracle;
    use pr_radar_moves::LocalProcessRediffOracle;

    const SIMPLE_DIFF: &str = concat!(
        "diff --git a/foo.rs b/foo.rs\n",
        "--- a/foo.rs\n",
        "+++ b/foo.rs\n",
        "@@ -1,2 +1,3 @@\n",
        " fn main() {\n",
        "+    println!(\"hi\");\n",
        " }\n",
    );

    #[derive(Clone)]
    struct AlwaysViolatesOracle;
    impl LlmOracle for AlwaysViolatesOracle {
        async fn evaluate(
            &self,
            _request: &ModelRequest,
        ) -> pr_radar_eval::EvalResult<Vec<ModelMessage>> {
            Ok(vec![ModelMessage::Result {
                output: serde_json::json!({
                    "violates_rule": true,
                    "score": 9,
                    "comment": "uses println! in production code",
                    "file_path": "foo.rs",
                    "line_number": 2,
                }),
                cost_usd: Some(0.02),
                duration_ms: 3,
            }])
        }
    }

    fn write_rule(dir: &Path) {
        std::fs::write(
            dir.join("no-println.md"),
            concat!(
                "---\n",
                "category: style\n",
                "description: disallow println in production code\n",
                "focus_type: file\n",
                "applies_to:\n",
                "  file_patterns:\n",
                "    - \"**/*.rs\"\n",
                "---\n",
                "Flag any use of println! in non-test code.\n",
            ),
        )
        .unwrap();
    }

    /// Runs the whole six-phase pipeline against a minimal diff + one rule,
    /// exercising the dependency gates and the directory layout end to end.
    #[tokio::test]
    async fn full_pipeline_runs_phase_by_phase() {
        let output_root = tempfile::tempdir().unwrap();
        let rules_root = tempfile::tempdir().unwrap();
        write_rule(rules_root.path());

        let repo_slug = "acme_widgets";
        let pr_number = 42;

        let p1 = run_phase1_pull_request(
            output_root.path(),
            repo_slug,
            pr_number,
            SIMPLE_DIFF,
            "deadbeef",
            &HashMap::new(),
            &HashMap::new(),
            &LocalProcessRediffOracle,
        )
        .await
        .unwrap();
        assert!(matches!(p1.status, PhaseRunStatus::Success));

        let p2 =
            run_phase2_focus_areas(output_root.path(), repo_slug, pr_number, &NoSubdivideOracle)
                .await
                .unwrap();
        assert!(matches!(p2.status, PhaseRunStatus::Success));
        assert_eq!(p2.stats.artifacts_produced, Some(1));

        let p3 =
            run_phase3_rules(output_root.path(), repo_slug, pr_number, rules_root.path()).unwrap();
        assert!(matches!(p3.status, PhaseRunStatus::Success));
        assert_eq!(p3.stats.artifacts_produced, Some(1));

        let p4 = run_phase4_tasks(output_root.path(), repo_slug, pr_number).unwrap();
        assert!(matches!(p4.status, PhaseRunStatus::Success));
        assert_eq!(p4.stats.artifacts_produced, Some(1));

        let p5 = run_phase5_evaluations(
            output_root.path(),
            repo_slug,
            pr_number,
            AlwaysViolatesOracle,
            1,
            CancellationToken::new(),
            None,
        )
        .await
        .unwrap();
        assert!(matches!(p5.status, PhaseRunStatus::Success));

        let p6 = run_phase6_report(output_root.path(), repo_slug, pr_number, 5).unwrap();
        assert!(matches!(p6.status, PhaseRunStatus::Success));
        assert_eq!(p6.stats.artifacts_produced, Some(1));

        let report_dir = layout::phase_dir(output_root.path(), repo_slug, pr_number, Phase::Report);
        assert!(report_dir.join("summary.json").exists());
        assert!(report_dir.join("summary.md").exists());
    }

    /// §4.9: running phase 2 before phase 1 has a successful marker fails
    /// with a dependency-unmet error naming both phases, no side effects.
    #[tokio::test]
    async fn dependency_gate_blocks_out_of_order_phase() {
        let output_root = tempfile::tempdir().unwrap();
        let err =
            run_phase2_focus_areas(output_root.path(), "acme", 1, &NoSubdivideOracle)
                .await
                .unwrap_err();
        assert!(matches!(
            err,
            SequencerError::DependencyUnmet { ref phase, ref required }
                if phase == "focus-areas" && required == "pull-request"
        ));
    }
}
