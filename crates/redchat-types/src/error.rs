use thiserror::Error;

use crate::llm::LlmError;

/// Errors from repository operations (used by trait definitions in redchat-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("corrupt document: {0}")]
    Corrupt(String),
}

/// Errors surfaced by chat orchestration.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The request was malformed or missing a required field.
    #[error("{0}")]
    Invalid(String),

    /// No completion provider is configured (missing API key).
    #[error("completion provider is not configured")]
    NotConfigured,

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
