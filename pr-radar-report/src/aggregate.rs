//! Report aggregation (C8), per §4.8.

use std::collections::{BTreeMap, HashMap};

use pr_radar_eval::RuleEvaluationResult;
use pr_radar_tasks::EvaluationTask;

use crate::model::{AnalysisSummary, Severity, Violation};

/// Builds an `AnalysisSummary` from every evaluation result, filtered to
/// `Success` variants where `violates_rule` and `score >= min_score`.
/// `tasks` is consulted to recover each violation's enclosing method
/// description for `by_method` (optional — callers may pass `&[]` to skip
/// it). `extra_cost_usd` folds in focus-area generation cost loaded from
/// phase-2 artifacts, per §4.8's cost rule.
pub fn build_summary(
    results: &[RuleEvaluationResult],
    tasks: &[EvaluationTask],
    min_score: u8,
    extra_cost_usd: Option<f64>,
) -> AnalysisSummary {
    let rule_by_task: HashMap<&str, &EvaluationTask> =
        tasks.iter().map(|t| (t.task_id.as_str(), t)).collect();

    let mut violations: Vec<Violation> = results
        .iter()
        .filter_map(|r| match r {
            RuleEvaluationResult::Success {
                task_id,
                rule_name,
                file_path,
                evaluation,
                model_used,
                cost_usd,
                ..
            } if evaluation.violates_rule && evaluation.score >= min_score => {
                let task = rule_by_task.get(task_id.as_str());
                let method = task
                    .filter(|t| t.focus_area.focus_type == pr_radar_focus::FocusType::Method)
                    .map(|t| t.focus_area.description.clone());
                Some(Violation {
                    task_id: task_id.clone(),
                    rule_name: rule_name.clone(),
                    rule_url: task.and_then(|t| t.rule.rule_url.clone()),
                    documentation_link: task.and_then(|t| t.rule.documentation_link.clone()),
                    skill: task.and_then(|t| t.rule.skill.clone()),
                    file_path: file_path.clone(),
                    line_number: evaluation.line_number,
                    score: evaluation.score,
                    comment: evaluation.comment.clone(),
                    method,
                    severity: Severity::from_score(evaluation.score),
                    model_used: model_used.clone(),
                    cost_usd: *cost_usd,
                })
            }
            _ => None,
        })
        .collect();

    violations.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.file_path.cmp(&b.file_path))
            .then(a.line_number.unwrap_or(0).cmp(&b.line_number.unwrap_or(0)))
            .then(a.rule_name.cmp(&b.rule_name))
    });

    let mut by_severity = BTreeMap::new();
    let mut by_file = BTreeMap::new();
    let mut by_rule = BTreeMap::new();
    let mut by_method: BTreeMap<String, usize> = BTreeMap::new();
    let mut has_methods = false;

    for v in &violations {
        *by_severity.entry(v.severity.as_str().to_string()).or_insert(0) += 1;
        *by_file.entry(v.file_path.clone()).or_insert(0) += 1;
        *by_rule.entry(v.rule_name.clone()).or_insert(0) += 1;
        if let Some(method) = &v.method {
            has_methods = true;
            *by_method.entry(format!("{}::{}", v.file_path, method)).or_insert(0) += 1;
        }
    }

    let success_cost: f64 = results
        .iter()
        .filter_map(|r| match r {
            RuleEvaluationResult::Success { cost_usd, .. } => *cost_usd,
            RuleEvaluationResult::Failure { .. } => None,
        })
        .sum();
    let total_cost_usd = match (success_cost > 0.0, extra_cost_usd) {
        (false, None) => None,
        (has_success, extra) => Some(if has_success { success_cost } else { 0.0 } + extra.unwrap_or(0.0)),
    };

    AnalysisSummary {
        total_violations: violations.len(),
        by_severity,
        by_file,
        by_rule,
        by_method: if has_methods { Some(by_method) } else { None },
        total_cost_usd,
        violations,
    }
}
