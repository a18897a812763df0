//! The model oracle: an external collaborator we specify only the
//! interface of (§1/§6). Generalizes `ai-llm-service::LlmServiceProfiles`'s
//! provider-agnostic dispatch (`generate_fast`/`generate_slow`) to the
//! spec's request/response-stream shape.

use crate::errors::EvalResult;
use crate::model::{ModelMessage, ModelRequest};

/// `(request) -> response stream`. RPITIT rather than a boxed `async fn` in
/// trait, matching the teacher's no-`async-trait`, no-`dyn` discipline — but
/// with an explicit `Send` bound on the returned future, since `run_evaluation`
/// hands it to a `JoinSet` (which requires `F: Future + Send + 'static`) and a
/// bare `async fn` in a trait infers no such guarantee for a generic `O`.
pub trait LlmOracle {
    fn evaluate(
        &self,
        request: &ModelRequest,
    ) -> impl std::future::Future<Output = EvalResult<Vec<ModelMessage>>> + Send;
}

/// A fixed-response oracle useful for tests and for running the pipeline
/// without a configured model backend. Always reports no violation.
#[derive(Debug, Clone, Default)]
pub struct NoopLlmOracle;

impl LlmOracle for NoopLlmOracle {
    async fn evaluate(&self, request: &ModelRequest) -> EvalResult<Vec<ModelMessage>> {
        let output = serde_json::json!({
            "violates_rule": false,
            "score": 1,
            "comment": "no model oracle configured",
            "file_path": "",
            "line_number": serde_json::Value::Null,
        });
        let _ = &request.prompt;
        Ok(vec![ModelMessage::Result {
            output,
            cost_usd: None,
            duration_ms: 0,
        }])
    }
}
