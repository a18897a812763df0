//! Error types for rule loading and matching.

use thiserror::Error;

pub type RuleResult<T> = Result<T, RuleError>;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("failed to read rule directory {path:?}: {source}")]
    ReadDir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read rule file {path:?}: {source}")]
    ReadFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed rule file {path:?}: {reason}")]
    Malformed {
        path: std::path::PathBuf,
        reason: String,
    },

    #[error("invalid JSON rule file {path:?}: {source}")]
    Json {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid regex {pattern:?} in rule {rule_name:?}: {source}")]
    InvalidRegex {
        rule_name: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
