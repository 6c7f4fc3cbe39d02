//! Shared fixtures: a fixed clock plus real plugins wired into `Services`.
#![allow(dead_code)]

use std::sync::Arc;

use hk_auth_simple::SimpleAuthProvider;
use hk_core::services::accounts::Registration;
use hk_core::testing::{fixed_now, FixedClock};
use hk_core::{Repos, ServiceOptions, Services, User, UserRepo};
use hk_db_memory::MemoryStore;
use hk_db_sqlite::SqliteStore;
use secrecy::SecretString;

pub struct Harness<S> {
    pub store: Arc<S>,
    pub clock: Arc<FixedClock>,
    pub services: Services,
}

fn auth() -> Arc<SimpleAuthProvider> {
    Arc::new(SimpleAuthProvider::new(
        SecretString::from("integration-test-secret"),
        24,
        30,
    ))
}

pub fn memory() -> Harness<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(fixed_now()));
    let services = Services::with_options(
        Repos::from_store(store.clone()),
        auth(),
        clock.clone(),
        ServiceOptions::default(),
    );
    Harness { store, clock, services }
}

pub async fn sqlite() -> Harness<SqliteStore> {
    let store = Arc::new(SqliteStore::new("sqlite::memory:").await.unwrap());
    let clock = Arc::new(FixedClock::new(fixed_now()));
    let services = Services::with_options(
        Repos::from_store(store.clone()),
        auth(),
        clock.clone(),
        ServiceOptions::default(),
    );
    Harness { store, clock, services }
}

/// A store on a fresh database file, so several pooled connections write at once.
pub async fn sqlite_file() -> Harness<SqliteStore> {
    let path = std::env::temp_dir().join(format!("hooks-{}.db", uuid::Uuid::now_v7()));
    let url = format!("sqlite://{}", path.display());
    let store = Arc::new(SqliteStore::new(&url).await.unwrap());
    let clock = Arc::new(FixedClock::new(fixed_now()));
    let services = Services::with_options(
        Repos::from_store(store.clone()),
        auth(),
        clock.clone(),
        ServiceOptions::default(),
    );
    Harness { store, clock, services }
}

impl<S: UserRepo> Harness<S> {
    pub async fn register(&self, name: &str) -> User {
        self.services
            .register(Registration {
                username: name.into(),
                email: format!("{name}@example.com"),
                password: "secret-pass".into(),
            })
            .await
            .unwrap()
            .user
    }

    pub async fn register_admin(&self, name: &str) -> User {
        let mut user = self.register(name).await;
        user.is_admin = true;
        self.store.update_user(user.clone()).await.unwrap();
        user
    }

    pub async fn points(&self, user: &User) -> i64 {
        self.store.get_user(user.id).await.unwrap().unwrap().points
    }
}
