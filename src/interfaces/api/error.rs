use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

use crate::application::optimization::EngineError;
use crate::domain::errors::{DataError, OptimizationError, ValidationError};

/// Error returned by every handler, rendered as `{"error": <message>}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, err.to_string())
    }
}

impl From<DataError> for ApiError {
    fn from(err: DataError) -> Self {
        ApiError::new(StatusCode::NOT_FOUND, err.to_string())
    }
}

impl From<OptimizationError> for ApiError {
    fn from(err: OptimizationError) -> Self {
        match err {
            OptimizationError::NoCandidateFound => {
                ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            OptimizationError::Validation(e) => e.into(),
            OptimizationError::InvalidConfig { .. } => {
                error!("API: Optimizer misconfigured: {}", err);
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(e) => e.into(),
            EngineError::Data(e) => e.into(),
            EngineError::Optimization(e) => e.into(),
            EngineError::Internal(e) => {
                error!("API: Internal error: {:#}", e);
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::Internal(err).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("API: Rejected request body: {}", rejection.body_text());
        ApiError::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}
