use actix_web::{web, HttpResponse};
use hk_core::Services;

use super::ApiResult;
use crate::middleware::AuthUser;

pub async fn summary(services: web::Data<Services>, user: AuthUser) -> ApiResult {
    Ok(HttpResponse::Ok().json(services.dashboard_summary(user.0).await?))
}
