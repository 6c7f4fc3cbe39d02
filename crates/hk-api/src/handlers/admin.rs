//! Moderation endpoints. [`AdminUser`] rejects non-admin callers with 403 before
//! the handler runs.

use actix_web::{web, HttpResponse};
use hk_core::Services;
use serde_json::json;
use uuid::Uuid;

use super::ApiResult;
use crate::dto::{UserSearchQuery, VerifyRequest};
use crate::middleware::AdminUser;

pub async fn pending_quotes(services: web::Data<Services>, admin: AdminUser) -> ApiResult {
    let quotes = services.pending_submissions(admin.0.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "quotes": quotes })))
}

pub async fn verify_quote(
    services: web::Data<Services>,
    admin: AdminUser,
    path: web::Path<Uuid>,
    body: web::Json<VerifyRequest>,
) -> ApiResult {
    let submission_id = path.into_inner();
    let verified = services
        .verify_submission(admin.0.id, submission_id, body.action, &body.reason)
        .await?;
    log::info!(
        "quote {submission_id} {:?} by {}",
        body.action,
        admin.0.username
    );
    Ok(HttpResponse::Ok().json(verified))
}

pub async fn dashboard(services: web::Data<Services>, admin: AdminUser) -> ApiResult {
    Ok(HttpResponse::Ok().json(services.admin_dashboard(admin.0.id).await?))
}

pub async fn users(
    services: web::Data<Services>,
    admin: AdminUser,
    query: web::Query<UserSearchQuery>,
) -> ApiResult {
    let query = query.into_inner();
    let page = query.page()?;
    let listed = services.list_users(admin.0.id, query.search, page).await?;
    Ok(HttpResponse::Ok().json(json!({
        "users": listed.items,
        "pagination": {
            "page": listed.page,
            "limit": listed.limit,
            "total": listed.total,
            "pages": listed.pages(),
        }
    })))
}
