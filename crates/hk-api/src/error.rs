//! HTTP rendering of `AppError`.

use actix_web::http::StatusCode;
use actix_web::{error, web, HttpRequest, HttpResponse, ResponseError};
use hk_core::AppError;
use serde_json::json;

/// Wraps the core error so it can implement actix-web's `ResponseError`.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub AppError);

impl ApiError {
    /// Client-facing message. Storage and internal failures are logged, not echoed.
    fn public_message(&self) -> String {
        match &self.0 {
            AppError::StorageUnavailable(_) => "storage unavailable".to_string(),
            AppError::Internal(_) => "internal server error".to_string(),
            AppError::NotFound(entity, _) => format!("{entity} not found"),
            AppError::ValidationError(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::Conflict(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::InvalidAmount(_)
            | AppError::UnknownSource(_)
            | AppError::InvalidThreshold { .. }
            | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self.0);
        }
        HttpResponse::build(status).json(json!({ "error": self.public_message() }))
    }
}

fn bad_request(message: String) -> error::Error {
    error::InternalError::from_response(
        message.clone(),
        HttpResponse::BadRequest().json(json!({ "error": message })),
    )
    .into()
}

pub(crate) fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req: &HttpRequest| bad_request(format!("invalid request body: {err}")))
}

pub(crate) fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req: &HttpRequest| bad_request(format!("invalid query string: {err}")))
}

pub(crate) fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req: &HttpRequest| bad_request(format!("invalid path: {err}")))
}
