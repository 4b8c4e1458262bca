use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Wrong file type or size. Rejected before any provider call.
    #[error("File validation error: {0}")]
    FileValidation(String),

    #[error("Failed to read file: {0}")]
    FileRead(String),

    #[error("Action already running: {0}")]
    ActionBusy(String),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Uppercase status code shared with the `/api/v1/status` error slot.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::FileValidation(_) => "FILE_VALIDATION_ERROR",
            AppError::FileRead(_) => "FILE_READ_ERROR",
            AppError::ActionBusy(_) => "ACTION_BUSY",
            AppError::Llm(e) => e.code(),
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::FileValidation(_) | AppError::FileRead(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::ActionBusy(_) => StatusCode::CONFLICT,
            AppError::Llm(e) => match e {
                LlmError::Auth => StatusCode::UNAUTHORIZED,
                LlmError::ModelNotFound { .. } => StatusCode::NOT_FOUND,
                LlmError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                LlmError::QuotaExceeded => StatusCode::PAYMENT_REQUIRED,
                LlmError::LocalEngineUnreachable => StatusCode::SERVICE_UNAVAILABLE,
                LlmError::Unparseable => StatusCode::UNPROCESSABLE_ENTITY,
                LlmError::Provider { .. } | LlmError::MalformedResponse(_) | LlmError::Http(_) => {
                    StatusCode::BAD_GATEWAY
                }
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the user.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Internal(_) => "An internal server error occurred".to_string(),
            AppError::Llm(LlmError::Http(_)) => {
                "Could not reach the AI provider. Check the base URL in Settings.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Internal(e) => tracing::error!("Internal error: {e:?}"),
            AppError::Llm(e) => tracing::error!("LLM error [{}]: {e}", e.code()),
            _ => {}
        }

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.user_message()
            }
        }));

        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_errors_keep_their_category_code() {
        let err = AppError::from(LlmError::QuotaExceeded);
        assert_eq!(err.code(), "QUOTA_EXCEEDED");
        assert_eq!(err.status(), StatusCode::PAYMENT_REQUIRED);

        let err = AppError::from(LlmError::Unparseable);
        assert_eq!(err.code(), "UNPARSEABLE_OUTPUT");
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_file_validation_is_a_client_error() {
        let err = AppError::FileValidation("too large".to_string());
        assert_eq!(err.code(), "FILE_VALIDATION_ERROR");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = AppError::Internal(anyhow::anyhow!("disk on fire"));
        assert!(!err.user_message().contains("disk"));
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = AppError::ActionBusy("analyze".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "ACTION_BUSY");
        assert_eq!(body["error"]["message"], "Action already running: analyze");
    }
}
