use actix_web::{web, HttpResponse};
use hk_core::services::clubs::NewClub;
use hk_core::Services;
use uuid::Uuid;

use super::ApiResult;
use crate::middleware::AuthUser;

pub async fn list_clubs(services: web::Data<Services>, user: AuthUser) -> ApiResult {
    Ok(HttpResponse::Ok().json(services.list_clubs(user.0).await?))
}

pub async fn create_club(
    services: web::Data<Services>,
    user: AuthUser,
    body: web::Json<NewClub>,
) -> ApiResult {
    let club = services.create_club(user.0, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(club))
}

pub async fn join_club(
    services: web::Data<Services>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> ApiResult {
    Ok(HttpResponse::Ok().json(services.join_club(user.0, path.into_inner()).await?))
}
