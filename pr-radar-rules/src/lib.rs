//! Rule loading and glob/regex filtering (C5), per §4.5.

pub mod errors;
pub mod glob;
pub mod loader;
pub mod model;
mod yaml;

pub use errors::{RuleError, RuleResult};
pub use glob::GlobMatcher;
pub use loader::load_rules;
pub use model::{AppliesTo, Grep, Rule, TaskRule};
