use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use tracing::error;

use crate::sync::SyncError;
use crate::telemetry;

/// JSON body for every failed request; `error` is the toast text.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ApiErrorBody {
    pub error: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")] BadRequest(String),
    #[error("That memory could not be found.")] NotFound,
    #[error("That file is too large.")] PayloadTooLarge,
    #[error("That file type is not supported.")] UnsupportedMediaType,
    #[error("Too many requests. Please wait a moment and try again.")] TooManyRequests,
    #[error("{0}")] Internal(String),
}

impl From<SyncError> for ApiError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::Invalid(msg) => ApiError::BadRequest(msg.to_string()),
            SyncError::NotFound => ApiError::NotFound,
            SyncError::Store { during, .. } | SyncError::Blob { during, .. } => {
                error!(error = %e, "request failed");
                telemetry::record_failure(during);
                ApiError::Internal(e.user_message())
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ApiErrorBody { error: self.to_string() })
    }
}
