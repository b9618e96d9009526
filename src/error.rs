//! Error types for storage and the session engine, plus their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

/// Errors surfaced by document and bank stores.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors returned by `QuizEngine` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    pub fn not_found(what: impl Into<String>) -> Self {
        EngineError::NotFound(what.into())
    }

    pub fn invalid(what: impl Into<String>) -> Self {
        EngineError::InvalidRequest(what.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            EngineError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let EngineError::Store(e) = &self {
            error!(target: "quizdesk_backend", error = %e, "Storage failure");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_taxonomy_to_status_codes() {
        assert_eq!(EngineError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(EngineError::invalid("x").status(), StatusCode::BAD_REQUEST);
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(
            EngineError::from(StoreError::from(io)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
