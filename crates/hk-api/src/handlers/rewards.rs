use actix_web::{web, HttpResponse};
use hk_core::Services;

use super::ApiResult;
use crate::dto::{HistoryQuery, LeaderboardQuery};
use crate::middleware::AuthUser;

pub async fn history(
    services: web::Data<Services>,
    user: AuthUser,
    query: web::Query<HistoryQuery>,
) -> ApiResult {
    let history = services
        .reward_history(user.0, query.source()?, query.days(), query.page()?)
        .await?;
    Ok(HttpResponse::Ok().json(history))
}

pub async fn achievements(services: web::Data<Services>, user: AuthUser) -> ApiResult {
    Ok(HttpResponse::Ok().json(services.achievements(user.0).await?))
}

pub async fn leaderboard(
    services: web::Data<Services>,
    _user: AuthUser,
    query: web::Query<LeaderboardQuery>,
) -> ApiResult {
    let board = services.leaderboard(query.category()?, query.limit()).await?;
    Ok(HttpResponse::Ok().json(board))
}

/// Cached counter vs. ledger sum for the caller.
pub async fn balance(services: web::Data<Services>, user: AuthUser) -> ApiResult {
    Ok(HttpResponse::Ok().json(services.ledger_balance(user.0).await?))
}
