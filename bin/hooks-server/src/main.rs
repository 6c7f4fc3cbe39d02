//! # Hooks Server
//!
//! The entry point that assembles the application based on compile-time features.

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use configs::{Settings, DEV_TOKEN_SECRET};
use hk_core::{AchievementTable, Repos, ServiceOptions, Services, SystemClock};
use secrecy::ExposeSecret;

// Feature-gated imports: each plugin is compiled in only when selected
#[cfg(feature = "db-sqlite")]
use hk_db_sqlite::SqliteStore;

#[cfg(all(feature = "db-memory", not(feature = "db-sqlite")))]
use hk_db_memory::MemoryStore;

#[cfg(feature = "auth-simple")]
use hk_auth_simple::SimpleAuthProvider;

#[cfg(not(any(feature = "db-sqlite", feature = "db-memory")))]
compile_error!("enable a storage plugin: `db-sqlite` or `db-memory`");

#[cfg(not(feature = "auth-simple"))]
compile_error!("enable an auth plugin: `auth-simple`");

fn service_options(settings: &Settings) -> anyhow::Result<ServiceOptions> {
    let achievements = match &settings.progress.achievements_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading achievement table {}", path.display()))?;
            let table = AchievementTable::from_json(&raw)?;
            log::info!("loaded {} achievements from {}", table.len(), path.display());
            table
        }
        None => AchievementTable::standard(),
    };

    Ok(ServiceOptions {
        max_streak_lookback_days: settings.progress.max_streak_lookback_days,
        achievements,
    })
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let settings = Settings::load()?;

    // 1. Initialize Database Implementation
    #[cfg(feature = "db-sqlite")]
    let store = Arc::new(
        SqliteStore::new(&settings.database.url)
            .await
            .with_context(|| format!("opening {}", settings.database.url))?,
    );

    #[cfg(all(feature = "db-memory", not(feature = "db-sqlite")))]
    let store = {
        log::warn!("using the in-memory store; data is lost on shutdown");
        Arc::new(MemoryStore::new())
    };

    // 2. Initialize Auth Implementation
    if settings.auth.token_secret.expose_secret() == DEV_TOKEN_SECRET {
        log::warn!("HOOKS__AUTH__TOKEN_SECRET is unset; tokens are signed with the development secret");
    }
    let auth = SimpleAuthProvider::new(
        settings.auth.token_secret.clone(),
        settings.auth.access_ttl_hours,
        settings.auth.refresh_ttl_days,
    );

    // 3. Assemble services
    let services = web::Data::new(Services::with_options(
        Repos::from_store(store),
        Arc::new(auth),
        Arc::new(SystemClock),
        service_options(&settings)?,
    ));

    let (host, port) = settings.server.bind_address();
    log::info!("Hooks starting on http://{host}:{port}");

    HttpServer::new(move || {
        App::new()
            .app_data(services.clone())
            .wrap(hk_api::middleware::cors_policy())
            .wrap(hk_api::middleware::standard_middleware())
            .configure(hk_api::configure_routes)
    })
    .bind((host, port))?
    .run()
    .await?;

    Ok(())
}
