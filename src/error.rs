use std::time::Duration;

use thiserror::Error;

use crate::workflow::Command;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    #[error("Classifier error: {0}")]
    Classifier(String),
}

impl From<octocrab::Error> for AppError {
    fn from(e: octocrab::Error) -> Self {
        AppError::GitHubApi(e.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Failure of the classify transition. No side effect is ever issued after one of these.
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("classifier request failed: {0}")]
    Request(String),

    #[error("classifier timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed classifier response: {0}")]
    MalformedResponse(String),

    #[error("classifier returned unknown category `{0}`")]
    InvalidCategory(String),

    #[error("classifier returned confidence {0} outside [0, 1]")]
    ConfidenceOutOfRange(f64),
}

/// A label or comment call that failed while executing the routed commands.
#[derive(Debug, Error)]
#[error("{command} failed: {source}")]
pub struct SinkError {
    pub command: Command,
    #[source]
    pub source: AppError,
}
