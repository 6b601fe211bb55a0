use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

// Failure kinds surfaced by the store, identity and push adapters
#[derive(Debug, Error)]
pub enum AppError {
    #[error("task store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("authentication failed: {0}")]
    AuthFailure(String),

    /// The provider refused to end a session that is still active.
    #[error("sign-out failed: {0}")]
    SignOutFailure(String),

    #[error("messaging failed: {0}")]
    MessagingFailure(String),

    #[error("invalid task record: {0}")]
    InvalidRecord(String),

    #[error("{0} not found")]
    NotFound(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::AuthFailure(_) => StatusCode::UNAUTHORIZED,
            AppError::SignOutFailure(_) | AppError::MessagingFailure(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidRecord(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::StoreUnavailable(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::MessagingFailure(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        // Missing resources are the client's fault, everything else is ours
        let kind = if status == StatusCode::NOT_FOUND {
            "fail"
        } else {
            "error"
        };
        let body = json!({
            "status": kind,
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
