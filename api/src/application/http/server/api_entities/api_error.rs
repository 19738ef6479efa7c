use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use foodlens_core::domain::common::entities::app_errors::CoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    pub error: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("chat classify failed: {0}")]
    ChatClassifyFailed(String),

    #[error("local model not available: {0}")]
    LocalModelUnavailable(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ChatClassifyFailed(_) | ApiError::LocalModelUnavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> ApiErrorResponse {
        let (error, detail) = match self {
            ApiError::BadRequest(detail) => ("invalid request", detail),
            ApiError::ChatClassifyFailed(detail) => ("chat classify failed", detail),
            ApiError::LocalModelUnavailable(detail) => ("local model not available", detail),
        };
        ApiErrorResponse {
            error: error.to_string(),
            detail: detail.clone(),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Invalid(detail) => ApiError::BadRequest(detail),
            CoreError::LocalModelUnavailable(detail) => ApiError::LocalModelUnavailable(detail),
            other => ApiError::ChatClassifyFailed(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
