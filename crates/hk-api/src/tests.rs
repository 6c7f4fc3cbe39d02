use std::sync::Arc;

use actix_web::{http::StatusCode, test, web, App};
use hk_auth_simple::SimpleAuthProvider;
use hk_core::services::accounts::Registration;
use hk_core::traits::UserRepo;
use hk_core::{Repos, Services};
use hk_db_memory::MemoryStore;
use secrecy::SecretString;
use serde_json::{json, Value};

use super::configure_routes;

fn services() -> Services {
    services_over(Arc::new(MemoryStore::new()))
}

fn services_over(store: Arc<MemoryStore>) -> Services {
    let auth = SimpleAuthProvider::new(SecretString::from("api-test-secret"), 24, 30);
    Services::new(Repos::from_store(store), Arc::new(auth))
}

async fn signed_up(services: &Services, name: &str) -> String {
    services
        .register(Registration {
            username: name.into(),
            email: format!("{name}@example.com"),
            password: "secret-pass".into(),
        })
        .await
        .unwrap()
        .access_token
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

#[actix_web::test]
async fn test_health() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(services()))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn test_register_grants_welcome_bonus() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(services()))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "username": "ada", "email": "Ada@Example.com", "password": "secret-pass" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["points"], 10);
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["access_token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[actix_web::test]
async fn test_duplicate_registration_conflicts() {
    let services = services();
    signed_up(&services, "ada").await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(services))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "username": "ada2", "email": "ada@example.com", "password": "secret-pass" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "email already registered");
}

#[actix_web::test]
async fn test_missing_token_is_unauthorized() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(services()))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/nook/books").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "missing bearer token");
}

#[actix_web::test]
async fn test_refresh_token_cannot_authorize_requests() {
    let services = services();
    let session = services
        .register(Registration {
            username: "ada".into(),
            email: "ada@example.com".into(),
            password: "secret-pass".into(),
        })
        .await
        .unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(services))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/auth/profile")
        .insert_header(bearer(&session.refresh_token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/auth/refresh")
        .set_json(json!({ "refresh_token": session.refresh_token }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["access_token"].is_string());
}

#[actix_web::test]
async fn test_add_book_shows_up_in_history() {
    let services = services();
    let token = signed_up(&services, "ada").await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(services))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/nook/books")
        .insert_header(bearer(&token))
        .set_json(json!({ "title": "The Dispossessed", "authors": ["Ursula K. Le Guin"], "page_count": 387 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let book: Value = test::read_body_json(resp).await;
    assert_eq!(book["points_earned"], 5);
    assert_eq!(book["status"], "to_read");

    let req = test::TestRequest::get()
        .uri("/api/rewards/history?source=nook")
        .insert_header(bearer(&token))
        .to_request();
    let history: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(history["total_points"], 5);
    assert_eq!(history["rewards"]["total"], 1);

    let req = test::TestRequest::get()
        .uri("/api/rewards/balance")
        .insert_header(bearer(&token))
        .to_request();
    let balance: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(balance["cached_points"], 15);
    assert_eq!(balance["drift"], 0);
}

#[actix_web::test]
async fn test_unknown_book_is_not_found() {
    let services = services();
    let token = signed_up(&services, "ada").await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(services))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/nook/books/{}", uuid::Uuid::now_v7()))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri("/api/nook/books/not-a-uuid")
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_second_timer_conflicts() {
    let services = services();
    let token = signed_up(&services, "ada").await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(services))
            .configure(configure_routes),
    )
    .await;

    let start = || {
        test::TestRequest::post()
            .uri("/api/hook/timers/start")
            .insert_header(bearer(&token))
            .set_json(json!({ "task_name": "Write chapter", "duration": 25 }))
            .to_request()
    };
    assert_eq!(test::call_service(&app, start()).await.status(), StatusCode::CREATED);
    assert_eq!(test::call_service(&app, start()).await.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::get()
        .uri("/api/hook/timers/active")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["timer"]["category"], "general");
}

#[actix_web::test]
async fn test_bad_leaderboard_category() {
    let services = services();
    let token = signed_up(&services, "ada").await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(services))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/rewards/leaderboard?category=karma")
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/rewards/leaderboard")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["category"], "points");
    assert_eq!(body["leaderboard"][0]["score"], 10);
}

#[actix_web::test]
async fn test_admin_routes_require_admin() {
    let services = services();
    let token = signed_up(&services, "ada").await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(services))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/admin/quotes/pending")
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_malformed_body_uses_error_shape() {
    let services = services();
    let token = signed_up(&services, "ada").await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(services))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/clubs")
        .insert_header(bearer(&token))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().starts_with("invalid request body"));
}

#[actix_web::test]
async fn test_preferences_update() {
    let services = services();
    let token = signed_up(&services, "ada").await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(services))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::put()
        .uri("/api/auth/preferences")
        .insert_header(bearer(&token))
        .set_json(json!({ "compact_mode": true, "theme": "dark" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["user"]["preferences"]["compact_mode"], true);
    assert_eq!(body["user"]["preferences"]["default_timer_duration"], 25);

    let req = test::TestRequest::put()
        .uri("/api/auth/preferences")
        .insert_header(bearer(&token))
        .set_json(json!({ "theme": "dark" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "no valid fields to update");
}

#[actix_web::test]
async fn test_custom_presets_round_trip() {
    let services = services();
    let token = signed_up(&services, "ada").await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(services))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/hook/presets")
        .insert_header(bearer(&token))
        .set_json(json!({ "name": "Chapter", "duration": 40, "type": "work", "category": "reading" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["preset"]["color"], "blue");
    assert_eq!(body["preset"]["type"], "work");

    let req = test::TestRequest::get()
        .uri("/api/hook/presets")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["default_presets"].as_array().unwrap().len(), 5);
    assert_eq!(body["custom_presets"][0]["name"], "Chapter");
}

#[actix_web::test]
async fn test_admin_dashboard_and_user_directory() {
    let store = Arc::new(MemoryStore::new());
    let services = services_over(store.clone());
    let session = services
        .register(Registration {
            username: "root".into(),
            email: "root@example.com".into(),
            password: "secret-pass".into(),
        })
        .await
        .unwrap();
    let mut admin = session.user;
    admin.is_admin = true;
    store.update_user(admin).await.unwrap();
    for name in ["ada", "bob", "Adele"] {
        signed_up(&services, name).await;
    }
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(services))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/admin/dashboard")
        .insert_header(bearer(&session.access_token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["stats"]["total_users"], 4);
    assert_eq!(body["stats"]["pending_quotes"], 0);
    assert_eq!(body["top_users"].as_array().unwrap().len(), 4);

    let req = test::TestRequest::get()
        .uri("/api/admin/users?search=AD&limit=1")
        .insert_header(bearer(&session.access_token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["pagination"]["total"], 2);
    assert_eq!(body["pagination"]["pages"], 2);
    assert_eq!(body["users"].as_array().unwrap().len(), 1);
    assert!(body["users"][0].get("password_hash").is_none());
}
