use actix_web::{web, HttpResponse};
use hk_core::services::nook::{BookUpdate, NewBook, ProgressLog};
use hk_core::Services;
use uuid::Uuid;

use super::ApiResult;
use crate::dto::{BookListQuery, BookQuoteRequest, TakeawayRequest};
use crate::middleware::AuthUser;

pub async fn list_books(
    services: web::Data<Services>,
    user: AuthUser,
    query: web::Query<BookListQuery>,
) -> ApiResult {
    let shelf = services
        .list_books(user.0, query.status()?, query.page()?)
        .await?;
    Ok(HttpResponse::Ok().json(shelf))
}

pub async fn add_book(
    services: web::Data<Services>,
    user: AuthUser,
    body: web::Json<NewBook>,
) -> ApiResult {
    let added = services.add_book(user.0, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(added))
}

pub async fn get_book(
    services: web::Data<Services>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> ApiResult {
    Ok(HttpResponse::Ok().json(services.get_book(user.0, path.into_inner()).await?))
}

pub async fn update_book(
    services: web::Data<Services>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<BookUpdate>,
) -> ApiResult {
    let updated = services
        .update_book(user.0, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(updated))
}

pub async fn log_progress(
    services: web::Data<Services>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<ProgressLog>,
) -> ApiResult {
    let progress = services
        .log_progress(user.0, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(progress))
}

pub async fn add_quote(
    services: web::Data<Services>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<BookQuoteRequest>,
) -> ApiResult {
    let quote = services
        .add_quote(user.0, path.into_inner(), &body.text, &body.page, &body.context)
        .await?;
    Ok(HttpResponse::Created().json(quote))
}

pub async fn add_takeaway(
    services: web::Data<Services>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<TakeawayRequest>,
) -> ApiResult {
    let takeaway = services
        .add_takeaway(user.0, path.into_inner(), &body.takeaway, &body.page_reference)
        .await?;
    Ok(HttpResponse::Created().json(takeaway))
}
