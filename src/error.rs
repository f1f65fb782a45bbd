//! Error types for the criteria engine.
//!
//! Only input that cannot be understood at all surfaces as an error. Missing
//! fields, type mismatches and malformed query nodes are resolved to "no
//! match" during evaluation instead.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CriteriaError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CriteriaError {
    #[error("JSON parsing error: {0}")]
    Json(String),
    #[error("Invalid criteria definition: {0}")]
    InvalidDefinition(String),
    #[error("Invalid event log: {0}")]
    InvalidEventLog(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for CriteriaError {
    fn from(err: serde_json::Error) -> Self {
        CriteriaError::Json(err.to_string())
    }
}

impl From<serde_yaml::Error> for CriteriaError {
    fn from(err: serde_yaml::Error) -> Self {
        CriteriaError::Config(err.to_string())
    }
}

impl From<std::io::Error> for CriteriaError {
    fn from(err: std::io::Error) -> Self {
        CriteriaError::Io(err.to_string())
    }
}
