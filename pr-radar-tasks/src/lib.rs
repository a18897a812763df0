//! Evaluation-task generation (C6): the rule x focus-area cartesian
//! product, plus per-task persistence.

pub mod errors;
pub mod generate;
pub mod model;
pub mod persist;

pub use errors::{TaskError, TaskResult};
pub use generate::generate_tasks;
pub use model::EvaluationTask;
pub use persist::{scan_existing_task_ids, write_all, write_task};
