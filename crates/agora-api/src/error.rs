use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use agora_core::PostError;

/// Error returned by every handler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Post(#[from] PostError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Post(e) => match e {
                PostError::Unauthenticated | PostError::InvalidCredential => {
                    StatusCode::UNAUTHORIZED
                }
                PostError::Validation(_) => StatusCode::BAD_REQUEST,
                PostError::NotFound(_) => StatusCode::NOT_FOUND,
                PostError::Forbidden => StatusCode::FORBIDDEN,
                PostError::DuplicateReaction => StatusCode::CONFLICT,
                PostError::DataIntegrity(_) | PostError::Store(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text sent to the client. Server-side details stay in the log.
    pub fn public_message(&self) -> String {
        match self {
            Self::Post(PostError::DataIntegrity(_) | PostError::Store(_)) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::Post(e) => e.to_string(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Post(e) => e.code(),
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.public_message(),
            }
        }));

        (status, body).into_response()
    }
}
