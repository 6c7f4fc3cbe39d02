//! # hk-api
//!
//! The web routing and orchestration layer for Hooks. Handlers translate HTTP into
//! calls on `hk_core::Services` (shared as `web::Data<Services>`).

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use actix_web::web;

pub use error::ApiError;

/// Mounts every route under `/api`, together with JSON and query error handlers
/// that answer in the `{"error": ...}` shape.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(error::json_config())
        .app_data(error::query_config())
        .app_data(error::path_config())
        .service(
            web::scope("/api")
                .route("/health", web::get().to(handlers::health))
                .service(
                    web::scope("/auth")
                        .route("/register", web::post().to(handlers::auth::register))
                        .route("/login", web::post().to(handlers::auth::login))
                        .route("/refresh", web::post().to(handlers::auth::refresh))
                        .route("/profile", web::get().to(handlers::auth::profile))
                        .route("/profile", web::put().to(handlers::auth::update_profile))
                        .route("/preferences", web::put().to(handlers::auth::update_preferences))
                        .route("/change-password", web::post().to(handlers::auth::change_password)),
                )
                .service(
                    web::scope("/nook")
                        .route("/books", web::get().to(handlers::nook::list_books))
                        .route("/books", web::post().to(handlers::nook::add_book))
                        .route("/books/{id}", web::get().to(handlers::nook::get_book))
                        .route("/books/{id}", web::put().to(handlers::nook::update_book))
                        .route("/books/{id}/progress", web::post().to(handlers::nook::log_progress))
                        .route("/books/{id}/quotes", web::post().to(handlers::nook::add_quote))
                        .route("/books/{id}/takeaways", web::post().to(handlers::nook::add_takeaway)),
                )
                .service(
                    web::scope("/hook")
                        .route("/timers/active", web::get().to(handlers::hook::active_timer))
                        .route("/timers/start", web::post().to(handlers::hook::start_timer))
                        .route("/timers/pause", web::post().to(handlers::hook::toggle_pause))
                        .route("/timers/complete", web::post().to(handlers::hook::complete_timer))
                        .route("/timers/cancel", web::post().to(handlers::hook::cancel_timer))
                        .route("/tasks", web::get().to(handlers::hook::list_tasks))
                        .route("/presets", web::get().to(handlers::hook::presets))
                        .route("/presets", web::post().to(handlers::hook::save_preset)),
                )
                .service(
                    web::scope("/clubs")
                        .route("", web::get().to(handlers::clubs::list_clubs))
                        .route("", web::post().to(handlers::clubs::create_club))
                        .route("/{id}/join", web::post().to(handlers::clubs::join_club)),
                )
                .service(
                    web::scope("/rewards")
                        .route("/history", web::get().to(handlers::rewards::history))
                        .route("/achievements", web::get().to(handlers::rewards::achievements))
                        .route("/leaderboard", web::get().to(handlers::rewards::leaderboard))
                        .route("/balance", web::get().to(handlers::rewards::balance)),
                )
                .route("/dashboard/summary", web::get().to(handlers::dashboard::summary))
                .service(
                    web::scope("/quotes")
                        .route("/submit", web::post().to(handlers::quotes::submit))
                        .route("/my-submissions", web::get().to(handlers::quotes::my_submissions)),
                )
                .service(
                    web::scope("/admin")
                        .route("/dashboard", web::get().to(handlers::admin::dashboard))
                        .route("/users", web::get().to(handlers::admin::users))
                        .route("/quotes/pending", web::get().to(handlers::admin::pending_quotes))
                        .route("/quotes/{id}/verify", web::post().to(handlers::admin::verify_quote)),
                ),
        );
}

#[cfg(test)]
mod tests;
