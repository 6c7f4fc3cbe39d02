use actix_web::{web, HttpResponse};
use hk_core::services::quotes::QuoteDraft;
use hk_core::Services;

use super::ApiResult;
use crate::dto::SubmissionQuery;
use crate::middleware::AuthUser;

pub async fn submit(
    services: web::Data<Services>,
    user: AuthUser,
    body: web::Json<QuoteDraft>,
) -> ApiResult {
    let submission = services.submit_quote(user.0, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(submission))
}

pub async fn my_submissions(
    services: web::Data<Services>,
    user: AuthUser,
    query: web::Query<SubmissionQuery>,
) -> ApiResult {
    let mine = services
        .my_submissions(user.0, query.status()?, query.page()?)
        .await?;
    Ok(HttpResponse::Ok().json(mine))
}
