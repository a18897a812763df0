//! Report aggregation (C8): thresholded, sorted violations plus JSON and
//! markdown rendering.

pub mod aggregate;
pub mod comment;
pub mod errors;
pub mod markdown;
pub mod model;
pub mod persist;

pub use aggregate::build_summary;
pub use comment::{build_comment_body, build_comment_payload, CommentPayload};
pub use errors::{ReportError, ReportResult};
pub use markdown::render_markdown;
pub use model::{AnalysisSummary, Severity, Violation};
pub use persist::write_report;

#[cfg(test)]
mod tests {
    use super::*;
    use pr_radar_eval::{RuleEvaluation, RuleEvaluationResult};
    use pr_radar_focus::{FocusArea, FocusType};
    use pr_radar_rules::TaskRule;
    use pr_radar_tasks::EvaluationTask;

    fn success(score: u8, file: &str, rule: &str) -> RuleEvaluationResult {
        RuleEvaluationResult::Success {
            task_id: format!("{rule}_{file}"),
            rule_name: rule.to_string(),
            file_path: file.to_string(),
            evaluation: RuleEvaluation {
                violates_rule: true,
                score,
                comment: "x".to_string(),
                file_path: file.to_string(),
                line_number: Some(1),
            },
            model_used: "m".to_string(),
            duration_ms: 10,
            cost_usd: Some(0.01),
        }
    }

    /// S5: 5 evaluation results with scores [2, 5, 7, 8, 9], all
    /// violates_rule=true, min_score=5. Expected: 4 violations, ordered by
    /// score desc = [9, 8, 7, 5]; by_severity = {Severe: 2, Moderate: 2}.
    #[test]
    fn filters_and_orders_by_threshold() {
        let results = vec![
            success(2, "a.rs", "r1"),
            success(5, "b.rs", "r2"),
            success(7, "c.rs", "r3"),
            success(8, "d.rs", "r4"),
            success(9, "e.rs", "r5"),
        ];
        let summary = build_summary(&results, &[], 5, None);
        assert_eq!(summary.total_violations, 4);
        let scores: Vec<u8> = summary.violations.iter().map(|v| v.score).collect();
        assert_eq!(scores, vec![9, 8, 7, 5]);
        assert_eq!(summary.by_severity.get("Severe"), Some(&2));
        assert_eq!(summary.by_severity.get("Moderate"), Some(&2));
    }

    #[test]
    fn recovers_method_from_task_record() {
        let rule = TaskRule {
            name: "r1".to_string(),
            category: "c".to_string(),
            description: "d".to_string(),
            content: "body".to_string(),
            model: None,
            documentation_link: None,
            rule_url: None,
            skill: None,
        };
        let focus = FocusArea {
            focus_id: "f1".to_string(),
            file_path: "a.rs".to_string(),
            start_line: 1,
            end_line: 2,
            description: "parseInput".to_string(),
            hunk_index: 0,
            hunk_content: String::new(),
            focus_type: FocusType::Method,
        };
        let task = EvaluationTask::new(&rule, focus);
        let mut result = success(9, "a.rs", "r1");
        if let RuleEvaluationResult::Success { task_id, .. } = &mut result {
            *task_id = task.task_id.clone();
        }

        let summary = build_summary(&[result], &[task], 5, None);
        assert_eq!(summary.violations[0].method.as_deref(), Some("parseInput"));
        assert!(summary.by_method.is_some());
    }
}
