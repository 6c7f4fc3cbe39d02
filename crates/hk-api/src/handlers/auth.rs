use actix_web::{web, HttpRequest, HttpResponse};
use hk_core::services::accounts::{PreferencesUpdate, ProfileUpdate, Registration};
use hk_core::{AppError, Services};
use serde_json::json;

use super::ApiResult;
use crate::dto::{ChangePasswordRequest, LoginRequest, RefreshRequest};
use crate::middleware::{bearer_token, AuthUser};

pub async fn register(services: web::Data<Services>, body: web::Json<Registration>) -> ApiResult {
    let session = services.register(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(session))
}

pub async fn login(services: web::Data<Services>, body: web::Json<LoginRequest>) -> ApiResult {
    let session = services.login(&body.identifier, &body.password).await?;
    Ok(HttpResponse::Ok().json(session))
}

/// Takes the refresh token from the body, falling back to the bearer header.
pub async fn refresh(
    services: web::Data<Services>,
    req: HttpRequest,
    body: Option<web::Json<RefreshRequest>>,
) -> ApiResult {
    let token = body
        .and_then(|b| b.into_inner().refresh_token)
        .or_else(|| bearer_token(&req).map(str::to_string))
        .ok_or_else(|| AppError::Unauthorized("missing refresh token".into()))?;

    let access_token = services.refresh(&token).await?;
    Ok(HttpResponse::Ok().json(json!({ "access_token": access_token })))
}

pub async fn profile(services: web::Data<Services>, user: AuthUser) -> ApiResult {
    Ok(HttpResponse::Ok().json(services.profile(user.0).await?))
}

pub async fn update_profile(
    services: web::Data<Services>,
    user: AuthUser,
    body: web::Json<ProfileUpdate>,
) -> ApiResult {
    let updated = services.update_profile(user.0, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(updated))
}

pub async fn update_preferences(
    services: web::Data<Services>,
    user: AuthUser,
    body: web::Json<PreferencesUpdate>,
) -> ApiResult {
    let updated = services.update_preferences(user.0, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "preferences updated",
        "user": updated,
    })))
}

pub async fn change_password(
    services: web::Data<Services>,
    user: AuthUser,
    body: web::Json<ChangePasswordRequest>,
) -> ApiResult {
    services
        .change_password(user.0, &body.current_password, &body.new_password)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "password changed" })))
}
