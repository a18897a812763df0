//! Task generator (C6), per §4.6: the `rule x focus_area` cartesian
//! product, filtered by focus_type match, file applicability, and content
//! grep.

use pr_radar_focus::FocusArea;
use pr_radar_rules::Rule;

use crate::model::EvaluationTask;

/// Produces one `EvaluationTask` for every `(rule, focus_area)` pair where:
/// 1. `rule.focus_type == focus_area.focus_type`;
/// 2. `rule.applies_to_file(focus_area.file_path)`;
/// 3. `rule.matches_diff_content(focus_area.hunk_content)`.
pub fn generate_tasks(rules: &[Rule], focus_areas: &[FocusArea]) -> Vec<EvaluationTask> {
    let mut tasks = Vec::new();
    for rule in rules {
        for focus_area in focus_areas {
            if rule.focus_type != focus_area.focus_type {
                continue;
            }
            if !rule.applies_to_file(&focus_area.file_path) {
                continue;
            }
            if !rule.matches_diff_content(&focus_area.hunk_content) {
                continue;
            }
            tasks.push(EvaluationTask::new(&rule.as_task_rule(), focus_area.clone()));
        }
    }
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use pr_radar_focus::FocusType;
    use pr_radar_rules::{AppliesTo, Grep};

    fn focus_area(file_path: &str, hunk_content: &str, focus_type: FocusType) -> FocusArea {
        FocusArea {
            focus_id: "deadbeefdeadbeef".to_string(),
            file_path: file_path.to_string(),
            start_line: 1,
            end_line: 5,
            description: "x".to_string(),
            hunk_index: 0,
            hunk_content: hunk_content.to_string(),
            focus_type,
        }
    }

    fn swift_rule() -> Rule {
        Rule::new(
            "no-main-actor-misuse",
            "concurrency",
            "x",
            "check for misuse",
            FocusType::Method,
            None,
            None,
            None,
            None,
            Some(AppliesTo {
                file_patterns: vec!["**/*.swift".to_string()],
                exclude_patterns: vec![],
            }),
            Some(Grep {
                all: vec![],
                any: vec!["@MainActor".to_string()],
            }),
        )
        .compile()
        .unwrap()
    }

    #[test]
    fn generates_task_when_all_filters_pass() {
        let rule = swift_rule();
        let focus = focus_area(
            "Views/X.swift",
            "1: @MainActor func foo() {}",
            FocusType::Method,
        );
        let tasks = generate_tasks(&[rule], &[focus]);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].task_id, "no-main-actor-misuse_deadbeefdeadbeef");
    }

    #[test]
    fn skips_when_focus_type_mismatches() {
        let rule = swift_rule();
        let focus = focus_area("Views/X.swift", "1: @MainActor func foo() {}", FocusType::File);
        assert!(generate_tasks(&[rule], &[focus]).is_empty());
    }

    #[test]
    fn skips_when_file_pattern_mismatches() {
        let rule = swift_rule();
        let focus = focus_area("Views/X.kt", "1: @MainActor fun foo() {}", FocusType::Method);
        assert!(generate_tasks(&[rule], &[focus]).is_empty());
    }
}
