//! Bounded-concurrency evaluator (C7), per §4.7/§5.
//!
//! A `tokio::sync::Semaphore`-gated `JoinSet`, serial by default
//! (`workers=1`). Cancellation is cooperative: in-flight tasks run to
//! completion but no new ones are dequeued once the token is cancelled.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use pr_radar_tasks::EvaluationTask;

use crate::errors::{EvalError, EvalResult};
use crate::model::{ModelMessage, ModelRequest, RuleEvaluation, RuleEvaluationResult};
use crate::oracle::LlmOracle;

/// Tunables for the evaluator; defaults match §9 (`workers=1`).
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    pub workers: usize,
    pub output_dir: PathBuf,
}

impl EvaluatorConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            workers: 1,
            output_dir: output_dir.into(),
        }
    }
}

/// `(completed_index, total, result)` fired once per finished task, for
/// progress reporting. Completion order need not match enqueue order.
pub type ProgressFn = Arc<dyn Fn(usize, usize, &RuleEvaluationResult) + Send + Sync>;

/// Runs §4.7 end to end for `tasks`: resumes by skipping already-persisted
/// valid results, then evaluates the rest through `oracle` with at most
/// `cfg.workers` in flight at once.
pub async fn run_evaluation<O>(
    tasks: Vec<EvaluationTask>,
    oracle: O,
    cfg: EvaluatorConfig,
    cancel: CancellationToken,
    on_progress: Option<ProgressFn>,
) -> EvalResult<Vec<RuleEvaluationResult>>
where
    O: LlmOracle + Clone + Send + Sync + 'static,
{
    std::fs::create_dir_all(&cfg.output_dir).map_err(|source| EvalError::CreateDir {
        path: cfg.output_dir.clone(),
        source,
    })?;

    let mut resumed = Vec::new();
    let mut pending = Vec::new();
    for task in tasks {
        match load_existing_result(&cfg.output_dir, &task.task_id) {
            Some(result) => resumed.push(result),
            None => pending.push(task),
        }
    }

    debug!(
        resumed = resumed.len(),
        pending = pending.len(),
        workers = cfg.workers,
        "starting evaluation phase"
    );

    let total = resumed.len() + pending.len();
    let mut completed = resumed.len();
    let mut results = resumed;

    if let Some(cb) = &on_progress {
        for r in &results {
            cb(completed, total, r);
        }
    }

    let semaphore = Arc::new(Semaphore::new(cfg.workers.max(1)));
    let oracle = Arc::new(oracle);
    let mut join_set: JoinSet<RuleEvaluationResult> = JoinSet::new();

    let mut remaining = pending.into_iter();
    let mut cancelled = false;

    loop {
        // Keep the pool topped up to `workers` in-flight permits, unless
        // cancellation has been requested.
        while !cancelled && join_set.len() < cfg.workers.max(1) {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let Some(task) = remaining.next() else {
                break;
            };
            let permit = Arc::clone(&semaphore);
            let oracle = Arc::clone(&oracle);
            let output_dir = cfg.output_dir.clone();
            join_set.spawn(async move {
                let _permit = permit.acquire_owned().await.expect("semaphore not closed");
                evaluate_one(task, oracle.as_ref(), &output_dir).await
            });
        }

        if join_set.is_empty() {
            break;
        }

        if let Some(joined) = join_set.join_next().await {
            let result = joined.expect("evaluation task panicked");
            completed += 1;
            if let Some(cb) = &on_progress {
                cb(completed, total, &result);
            }
            results.push(result);
        }
    }

    if cancelled && !join_set.is_empty() {
        // Drain any tasks already running before surfacing cancellation.
        while let Some(joined) = join_set.join_next().await {
            let result = joined.expect("evaluation task panicked");
            completed += 1;
            if let Some(cb) = &on_progress {
                cb(completed, total, &result);
            }
            results.push(result);
        }
    }

    if cancelled {
        warn!("evaluation phase cancelled; {} of {} tasks run", completed, total);
        return Err(EvalError::Cancelled);
    }

    info!(completed, total, "evaluation phase complete");
    Ok(results)
}

async fn evaluate_one<O: LlmOracle>(
    task: EvaluationTask,
    oracle: &O,
    output_dir: &Path,
) -> RuleEvaluationResult {
    let started = Instant::now();
    let model = task.rule.model.clone().unwrap_or_else(|| "default".to_string());

    let request = ModelRequest {
        prompt: build_prompt(&task),
        model: model.clone(),
        tools: None,
        cwd: None,
        output_schema: Some(evaluation_schema()),
    };

    let result = match oracle.evaluate(&request).await {
        Ok(messages) => interpret_messages(&task, &model, started, messages),
        Err(err) => RuleEvaluationResult::Failure {
            task_id: task.task_id.clone(),
            rule_name: task.rule.name.clone(),
            file_path: task.focus_area.file_path.clone(),
            error_message: err.to_string(),
            model_used: model,
        },
    };

    if let Err(err) = write_result(output_dir, &result) {
        warn!(task_id = %task.task_id, error = %err, "failed to persist evaluation result");
    }

    result
}

fn build_prompt(task: &EvaluationTask) -> String {
    format!(
        "{}\n\nFile: {} (lines {}-{})\n\n{}",
        task.rule.content,
        task.focus_area.file_path,
        task.focus_area.start_line,
        task.focus_area.end_line,
        task.focus_area.hunk_content,
    )
}

fn evaluation_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "required": ["violates_rule", "score", "comment", "file_path"],
        "properties": {
            "violates_rule": {"type": "boolean"},
            "score": {"type": "integer", "minimum": 1, "maximum": 10},
            "comment": {"type": "string"},
            "file_path": {"type": "string"},
            "line_number": {"type": ["integer", "null"]},
        }
    })
}

fn interpret_messages(
    task: &EvaluationTask,
    model: &str,
    started: Instant,
    messages: Vec<ModelMessage>,
) -> RuleEvaluationResult {
    let Some((output, cost_usd, duration_ms)) =
        messages.iter().find_map(|m| m.as_result())
    else {
        return RuleEvaluationResult::Failure {
            task_id: task.task_id.clone(),
            rule_name: task.rule.name.clone(),
            file_path: task.focus_area.file_path.clone(),
            error_message: "model oracle stream ended without a Result message".to_string(),
            model_used: model.to_string(),
        };
    };

    match serde_json::from_value::<RuleEvaluation>(output.clone()) {
        Ok(evaluation) => RuleEvaluationResult::Success {
            task_id: task.task_id.clone(),
            rule_name: task.rule.name.clone(),
            file_path: task.focus_area.file_path.clone(),
            evaluation,
            model_used: model.to_string(),
            duration_ms: if duration_ms > 0 {
                duration_ms
            } else {
                started.elapsed().as_millis() as u64
            },
            cost_usd,
        },
        Err(err) => RuleEvaluationResult::Failure {
            task_id: task.task_id.clone(),
            rule_name: task.rule.name.clone(),
            file_path: task.focus_area.file_path.clone(),
            error_message: format!("malformed evaluation output: {err}"),
            model_used: model.to_string(),
        },
    }
}

fn load_existing_result(dir: &Path, task_id: &str) -> Option<RuleEvaluationResult> {
    let path = dir.join(format!("{task_id}.json"));
    let raw = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}

/// Serializes `value` with canonicalized (sorted) object keys: round-tripping
/// through `serde_json::Value` sorts every nested object, since `Value`'s map
/// type is a `BTreeMap` with the `preserve_order` feature off (not enabled in
/// this workspace) — `to_string_pretty` alone preserves struct declaration
/// order, which does not satisfy §6's "keys sorted" on-disk format rule.
fn to_sorted_pretty_json<T: serde::Serialize>(value: &T) -> serde_json::Result<String> {
    let canonical: serde_json::Value = serde_json::to_value(value)?;
    serde_json::to_string_pretty(&canonical)
}

fn write_result(dir: &Path, result: &RuleEvaluationResult) -> EvalResult<()> {
    let body = to_sorted_pretty_json(result).map_err(|source| EvalError::Serialize {
        task_id: result.task_id().to_string(),
        source,
    })?;
    let path = dir.join(format!("{}.json", result.task_id()));
    std::fs::write(&path, body).map_err(|source| EvalError::Write { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelMessage;
    use pr_radar_focus::{FocusArea, FocusType};
    use pr_radar_rules::TaskRule;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone)]
    struct FixedOracle {
        violates: bool,
    }

    impl LlmOracle for FixedOracle {
        async fn evaluate(&self, _request: &ModelRequest) -> EvalResult<Vec<ModelMessage>> {
            Ok(vec![ModelMessage::Result {
                output: serde_json::json!({
                    "violates_rule": self.violates,
                    "score": 7,
                    "comment": "looks risky",
                    "file_path": "x.rs",
                    "line_number": 3,
                }),
                cost_usd: Some(0.01),
                duration_ms: 5,
            }])
        }
    }

    fn sample_task(name: &str) -> EvaluationTask {
        let rule = TaskRule {
            name: name.to_string(),
            category: "c".to_string(),
            description: "d".to_string(),
            content: "check this".to_string(),
            model: Some("gpt-test".to_string()),
            documentation_link: None,
            rule_url: None,
            skill: None,
        };
        let focus = FocusArea {
            focus_id: format!("{name}-focus"),
            file_path: "x.rs".to_string(),
            start_line: 1,
            end_line: 3,
            description: "d".to_string(),
            hunk_index: 0,
            hunk_content: "1: fn x() {}".to_string(),
            focus_type: FocusType::File,
        };
        EvaluationTask::new(&rule, focus)
    }

    #[tokio::test]
    async fn evaluates_and_persists_all_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let tasks = vec![sample_task("r1"), sample_task("r2")];
        let cfg = EvaluatorConfig::new(dir.path());

        let results = run_evaluation(
            tasks,
            FixedOracle { violates: true },
            cfg,
            CancellationToken::new(),
            None,
        )
        .await
        .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .all(|r| matches!(r, RuleEvaluationResult::Success { .. })));
        for r in &results {
            assert!(dir.path().join(format!("{}.json", r.task_id())).exists());
        }
    }

    #[tokio::test]
    async fn resumes_by_skipping_already_persisted_results() {
        let dir = tempfile::tempdir().unwrap();
        let task = sample_task("resumable");
        let cfg = EvaluatorConfig::new(dir.path());

        run_evaluation(
            vec![task.clone()],
            FixedOracle { violates: false },
            cfg.clone(),
            CancellationToken::new(),
            None,
        )
        .await
        .unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        #[derive(Clone)]
        struct CountingOracle {
            calls: Arc<AtomicUsize>,
        }
        impl LlmOracle for CountingOracle {
            async fn evaluate(&self, _request: &ModelRequest) -> EvalResult<Vec<ModelMessage>> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![ModelMessage::Result {
                    output: serde_json::json!({
                        "violates_rule": false,
                        "score": 1,
                        "comment": "x",
                        "file_path": "x.rs",
                    }),
                    cost_usd: None,
                    duration_ms: 1,
                }])
            }
        }

        let results = run_evaluation(
            vec![task],
            CountingOracle {
                calls: calls.clone(),
            },
            cfg,
            CancellationToken::new(),
            None,
        )
        .await
        .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
