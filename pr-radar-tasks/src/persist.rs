//! Per-task JSON persistence, in the teacher's create-dir-then-write idiom
//! (`mr-reviewer::review::mod::write_report`).

use std::path::Path;

use crate::errors::{TaskError, TaskResult};
use crate::model::EvaluationTask;

/// Serializes `value` with canonicalized (sorted) object keys: round-tripping
/// through `serde_json::Value` sorts every nested object, since `Value`'s map
/// type is a `BTreeMap` with the `preserve_order` feature off (not enabled in
/// this workspace) — `to_string_pretty` alone preserves struct declaration
/// order, which does not satisfy §6's "keys sorted" on-disk format rule.
fn to_sorted_pretty_json<T: serde::Serialize>(value: &T) -> serde_json::Result<String> {
    let canonical: serde_json::Value = serde_json::to_value(value)?;
    serde_json::to_string_pretty(&canonical)
}

/// Writes `task` to `<dir>/<task_id>.json`, creating `dir` if needed.
pub fn write_task(dir: &Path, task: &EvaluationTask) -> TaskResult<()> {
    std::fs::create_dir_all(dir).map_err(|source| TaskError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let body = to_sorted_pretty_json(task).map_err(|source| TaskError::Serialize {
        task_id: task.task_id.clone(),
        source,
    })?;

    let path = dir.join(format!("{}.json", task.task_id));
    std::fs::write(&path, body).map_err(|source| TaskError::Write { path, source })
}

/// Writes every task in `tasks` to `dir`, one file each.
pub fn write_all(dir: &Path, tasks: &[EvaluationTask]) -> TaskResult<()> {
    for task in tasks {
        write_task(dir, task)?;
    }
    Ok(())
}

/// Scans `dir` for already-persisted, validly-deserializable `<task_id>.json`
/// files. Used by the evaluator (C7) to resume: tasks whose id appears here
/// are not re-run.
pub fn scan_existing_task_ids(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    entries
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let path = e.path();
            if path.extension().and_then(|x| x.to_str()) != Some("json") {
                return None;
            }
            path.file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pr_radar_focus::{FocusArea, FocusType};
    use pr_radar_rules::TaskRule;

    fn sample_task(name: &str) -> EvaluationTask {
        let rule = TaskRule {
            name: name.to_string(),
            category: "c".to_string(),
            description: "d".to_string(),
            content: "body".to_string(),
            model: None,
            documentation_link: None,
            rule_url: None,
            skill: None,
        };
        let focus = FocusArea {
            focus_id: "abc123abc123abc1".to_string(),
            file_path: "x.rs".to_string(),
            start_line: 1,
            end_line: 1,
            description: "d".to_string(),
            hunk_index: 0,
            hunk_content: String::new(),
            focus_type: FocusType::File,
        };
        EvaluationTask::new(&rule, focus)
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let task = sample_task("my-rule");
        write_task(dir.path(), &task).unwrap();

        let ids = scan_existing_task_ids(dir.path());
        assert_eq!(ids, vec![task.task_id.clone()]);
    }
}
