use actix_web::{web, HttpResponse};
use hk_core::services::hook::{PresetDraft, TimerCompletion, TimerStart};
use hk_core::Services;
use serde_json::json;

use super::ApiResult;
use crate::dto::TaskQuery;
use crate::middleware::AuthUser;

pub async fn active_timer(services: web::Data<Services>, user: AuthUser) -> ApiResult {
    let timer = services.active_timer(user.0).await?;
    Ok(HttpResponse::Ok().json(json!({ "timer": timer })))
}

pub async fn start_timer(
    services: web::Data<Services>,
    user: AuthUser,
    body: web::Json<TimerStart>,
) -> ApiResult {
    let timer = services.start_timer(user.0, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(timer))
}

pub async fn toggle_pause(services: web::Data<Services>, user: AuthUser) -> ApiResult {
    Ok(HttpResponse::Ok().json(services.toggle_pause(user.0).await?))
}

/// The body is optional; completing without one records no mood and no notes.
pub async fn complete_timer(
    services: web::Data<Services>,
    user: AuthUser,
    body: Option<web::Json<TimerCompletion>>,
) -> ApiResult {
    let completion = body.map(web::Json::into_inner).unwrap_or_default();
    let completed = services.complete_timer(user.0, completion).await?;
    Ok(HttpResponse::Ok().json(completed))
}

pub async fn cancel_timer(services: web::Data<Services>, user: AuthUser) -> ApiResult {
    services.cancel_timer(user.0).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "timer cancelled" })))
}

pub async fn list_tasks(
    services: web::Data<Services>,
    user: AuthUser,
    query: web::Query<TaskQuery>,
) -> ApiResult {
    let tasks = services
        .list_tasks(user.0, query.category(), query.days(), query.page()?)
        .await?;
    Ok(HttpResponse::Ok().json(tasks))
}

pub async fn presets(services: web::Data<Services>, user: AuthUser) -> ApiResult {
    Ok(HttpResponse::Ok().json(services.presets(user.0).await?))
}

pub async fn save_preset(
    services: web::Data<Services>,
    user: AuthUser,
    body: web::Json<PresetDraft>,
) -> ApiResult {
    let preset = services.save_preset(user.0, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({
        "message": "preset saved",
        "preset": preset,
    })))
}
