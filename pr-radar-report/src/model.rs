//! Aggregated report data model: `Violation`, `Severity`, `AnalysisSummary`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Severity bucket per §4.8: `Minor` 1-4, `Moderate` 5-7, `Severe` 8-10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Minor,
    Moderate,
    Severe,
}

impl Severity {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=4 => Severity::Minor,
            5..=7 => Severity::Moderate,
            _ => Severity::Severe,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minor => "Minor",
            Severity::Moderate => "Moderate",
            Severity::Severe => "Severe",
        }
    }
}

/// One surfaced, score-thresholded rule violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub task_id: String,
    pub rule_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    pub score: u8,
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub severity: Severity,
    pub model_used: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
}

/// Report produced by C8: totals plus the ordered violation list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_violations: usize,
    pub by_severity: BTreeMap<String, usize>,
    pub by_file: BTreeMap<String, usize>,
    pub by_rule: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_method: Option<BTreeMap<String, usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost_usd: Option<f64>,
    pub violations: Vec<Violation>,
}
