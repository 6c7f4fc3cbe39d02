//! # hk-api Handlers
//!
//! Each handler extracts the caller, calls one `Services` operation and renders JSON.
//! Failures travel as [`ApiError`](crate::ApiError).

pub mod admin;
pub mod auth;
pub mod clubs;
pub mod dashboard;
pub mod hook;
pub mod nook;
pub mod quotes;
pub mod rewards;

use actix_web::HttpResponse;
use serde_json::json;

use crate::error::ApiError;

pub type ApiResult = Result<HttpResponse, ApiError>;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}
