//! Middleware and request guards.

use actix_cors::Cors;
use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::middleware::Logger;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use hk_core::{AppError, Services, User};
use uuid::Uuid;

use crate::error::ApiError;

/// Access log: remote-ip "request-line" status-code response-size "referrer" "user-agent" time
pub fn standard_middleware() -> Logger {
    Logger::default()
}

pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PUT"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600)
}

fn services(req: &HttpRequest) -> Result<web::Data<Services>, ApiError> {
    req.app_data::<web::Data<Services>>()
        .cloned()
        .ok_or_else(|| AppError::Internal("services are not registered".into()).into())
}

/// `Authorization: Bearer <token>`
pub(crate) fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn authenticate(req: &HttpRequest) -> Result<Uuid, ApiError> {
    let token = bearer_token(req)
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))?;
    Ok(services(req)?.authenticate(token)?)
}

/// The caller's user id, taken from a valid access token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).map(AuthUser))
    }
}

/// An authenticated caller whose account carries the admin flag.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequest for AdminUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let caller = authenticate(req);
        let services = services(req);
        Box::pin(async move {
            let user = services?.require_admin(caller?).await?;
            Ok(AdminUser(user))
        })
    }
}
