use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum KanbanError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl KanbanError {
    /// Store and network failures are transient; the caller may simply retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            KanbanError::PersistenceFailure(_) | KanbanError::Database(_) | KanbanError::Http(_)
        )
    }
}

impl IntoResponse for KanbanError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            KanbanError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            KanbanError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            KanbanError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            KanbanError::PersistenceFailure(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            KanbanError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            KanbanError::Database(err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
            KanbanError::Http(err) => {
                tracing::error!("Upstream error: {:?}", err);
                (StatusCode::BAD_GATEWAY, "Upstream request failed".into())
            }
            KanbanError::Serialization(err) => {
                tracing::error!("Serialization error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                )
            }
        };

        let body = json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
