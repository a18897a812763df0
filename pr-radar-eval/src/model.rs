//! Model-oracle request/response types and `RuleEvaluationResult`, per §6.

use serde::{Deserialize, Serialize};

/// `{prompt, model, tools?, cwd?, output_schema?}` handed to the model
/// oracle for one `EvaluationTask`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRequest {
    pub prompt: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<serde_json::Value>,
}

/// One message of the model oracle's response stream. The evaluator
/// requires the stream's final `Result` message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelMessage {
    Text { content: String },
    ToolUse { name: String },
    Result {
        output: serde_json::Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cost_usd: Option<f64>,
        duration_ms: u64,
    },
}

impl ModelMessage {
    /// The stream's terminal `Result` message, if present.
    pub fn as_result(&self) -> Option<(&serde_json::Value, Option<f64>, u64)> {
        match self {
            ModelMessage::Result {
                output,
                cost_usd,
                duration_ms,
            } => Some((output, *cost_usd, *duration_ms)),
            _ => None,
        }
    }
}

/// The structured judgment a rule evaluation produces: `{violates_rule,
/// score, comment, file_path, line_number?}`, per §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleEvaluation {
    pub violates_rule: bool,
    /// 1-10 inclusive.
    pub score: u8,
    pub comment: String,
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
}

/// Tagged-union outcome of one task's evaluation, persisted as
/// `<task_id>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RuleEvaluationResult {
    Success {
        task_id: String,
        rule_name: String,
        file_path: String,
        evaluation: RuleEvaluation,
        model_used: String,
        duration_ms: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cost_usd: Option<f64>,
    },
    Failure {
        task_id: String,
        rule_name: String,
        file_path: String,
        error_message: String,
        model_used: String,
    },
}

impl RuleEvaluationResult {
    pub fn task_id(&self) -> &str {
        match self {
            RuleEvaluationResult::Success { task_id, .. } => task_id,
            RuleEvaluationResult::Failure { task_id, .. } => task_id,
        }
    }
}
