//! `EvaluationTask` data model.

use serde::{Deserialize, Serialize};

use pr_radar_focus::FocusArea;
use pr_radar_rules::TaskRule;

/// One `rule x focus_area` pairing an evaluation oracle will score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationTask {
    pub task_id: String,
    pub rule: TaskRule,
    pub focus_area: FocusArea,
}

impl EvaluationTask {
    pub fn new(rule: &TaskRule, focus_area: FocusArea) -> Self {
        let task_id = format!("{}_{}", rule.name, focus_area.focus_id);
        Self {
            task_id,
            rule: rule.clone(),
            focus_area,
        }
    }
}
