//! error.rs — typed failure kinds for the analysis pipeline.
//!
//! Three kinds cover the whole core: the reference cannot be resolved to a
//! channel (`NotFound`), the upstream provider failed or timed out
//! (`Upstream`), or the caller handed us malformed input (`Validation`).
//! Retry policy is a caller concern; nothing here retries.

use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    /// No channel could be determined for the given query.
    #[error("no channel found for '{query}'")]
    NotFound { query: String },

    /// The metrics provider (or another remote collaborator) failed.
    #[error("upstream error while {context}: {message}")]
    Upstream { context: &'static str, message: String },

    /// Malformed numeric input; raised before any network call.
    #[error("invalid input: {0}")]
    Validation(String),
}

impl AnalyzeError {
    pub fn not_found(query: impl Into<String>) -> Self {
        Self::NotFound {
            query: query.into(),
        }
    }

    pub fn upstream(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Upstream {
            context,
            message: err.to_string(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// HTTP status the API layer maps this error to.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyzeError>;
