use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use hk_core::models::{
    Book, BookStatus, LedgerEntry, LedgerQuery, PageRequest, PointSource, Preferences, Profile,
    QuoteStatus, QuoteSubmission, User,
};
use hk_core::traits::{ActivityRepo, BookRepo, LedgerRepo, QuoteRepo, UserRepo};
use hk_core::{ActivityKind, Ledger, NewLedgerEntry, SystemClock};
use uuid::Uuid;

use super::*;

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap()
}

fn user(name: &str) -> User {
    User {
        id: Uuid::now_v7(),
        username: name.into(),
        email: format!("{name}@example.com"),
        password_hash: String::new(),
        is_admin: false,
        is_active: true,
        points: 0,
        level: 1,
        profile: Profile::for_username(name),
        preferences: Preferences::default(),
        created_at: at(1),
        last_login: None,
    }
}

fn entry(user_id: Uuid, points: i64, earned_at: DateTime<Utc>) -> LedgerEntry {
    LedgerEntry {
        id: Uuid::now_v7(),
        user_id,
        points,
        source: PointSource::Hook,
        description: String::new(),
        earned_at,
        metadata: serde_json::json!({}),
    }
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let store = MemoryStore::new();
    store.create_user(user("ada")).await.unwrap();
    let mut clone = user("ada2");
    clone.email = "ada@example.com".into();
    assert!(store.create_user(clone).await.is_err());
}

#[tokio::test]
async fn test_ledger_ties_break_by_insertion() {
    let store = MemoryStore::new();
    let ada = user("ada");
    store.create_user(ada.clone()).await.unwrap();

    let a = entry(ada.id, 1, at(5));
    let b = entry(ada.id, 2, at(5));
    let c = entry(ada.id, 3, at(6));
    for e in [&a, &b, &c] {
        store.insert_entry(e.clone()).await.unwrap();
    }

    let (items, total) = store
        .query_entries(LedgerQuery {
            user_id: ada.id,
            source: None,
            since: None,
            page: PageRequest::new(1, 2).unwrap(),
        })
        .await
        .unwrap();
    assert_eq!(total, 3);
    assert_eq!(items.iter().map(|e| e.id).collect::<Vec<_>>(), vec![c.id, b.id]);
}

#[tokio::test]
async fn test_update_user_keeps_cached_points() {
    let store = MemoryStore::new();
    let mut ada = user("ada");
    store.create_user(ada.clone()).await.unwrap();
    store.increment_points(ada.id, 25).await.unwrap();

    ada.points = 0;
    ada.level = 3;
    store.update_user(ada.clone()).await.unwrap();

    let stored = store.get_user(ada.id).await.unwrap().unwrap();
    assert_eq!((stored.points, stored.level), (25, 3));
}

#[tokio::test]
async fn test_failed_increment_leaves_drift() {
    let store = Arc::new(MemoryStore::new());
    let ada = user("ada");
    store.create_user(ada.clone()).await.unwrap();
    let ledger = Ledger::new(store.clone(), Arc::new(SystemClock));

    store.fail_point_increments(true);
    let result = ledger
        .append(NewLedgerEntry::new(ada.id, 5, PointSource::Nook, "Added a book"))
        .await;
    assert!(result.is_err());

    let balance = ledger.balance(ada.id, 0).await.unwrap();
    assert_eq!(balance.ledger_points, 5);
    assert_eq!(balance.drift, -5);
}

#[tokio::test]
async fn test_failed_insert_writes_nothing() {
    let store = Arc::new(MemoryStore::new());
    let ada = user("ada");
    store.create_user(ada.clone()).await.unwrap();
    let ledger = Ledger::new(store.clone(), Arc::new(SystemClock));

    store.fail_ledger_inserts(true);
    assert!(ledger
        .append(NewLedgerEntry::new(ada.id, 5, PointSource::Nook, "Added a book"))
        .await
        .is_err());

    assert_eq!(store.sum_points(ada.id).await.unwrap(), 0);
    assert_eq!(store.get_user(ada.id).await.unwrap().unwrap().points, 0);
}

#[tokio::test]
async fn test_activity_fault_switch() {
    let store = MemoryStore::new();
    let id = Uuid::now_v7();
    assert_eq!(
        store
            .count_activity(id, ActivityKind::Reading, at(1), at(2))
            .await
            .unwrap(),
        0
    );

    store.fail_activity_reads(true);
    assert!(store
        .count_activity(id, ActivityKind::Reading, at(1), at(2))
        .await
        .is_err());
}

fn reading(user_id: Uuid) -> Book {
    Book {
        id: Uuid::now_v7(),
        user_id,
        title: "Dune".into(),
        authors: vec![],
        description: String::new(),
        page_count: 400,
        current_page: 10,
        status: BookStatus::Reading,
        rating: 0,
        cover_image: String::new(),
        genre: String::new(),
        isbn: String::new(),
        added_at: at(2),
        finished_at: None,
        quotes: vec![],
        takeaways: vec![],
    }
}

#[tokio::test]
async fn test_mark_finished_only_once() {
    let store = MemoryStore::new();
    let ada = user("ada");
    let dune = reading(ada.id);
    store.create_book(dune.clone()).await.unwrap();

    assert!(store.mark_finished(ada.id, dune.id, at(5)).await.unwrap());
    assert!(!store.mark_finished(ada.id, dune.id, at(6)).await.unwrap());

    let stored = store.get_book(ada.id, dune.id).await.unwrap().unwrap();
    assert_eq!(stored.finished_at, Some(at(5)));
    assert_eq!(store.count_all_books(Some(at(3))).await.unwrap(), 0);
    assert_eq!(store.count_all_books(None).await.unwrap(), 1);
}

#[tokio::test]
async fn test_resolve_submission_only_while_pending() {
    let store = MemoryStore::new();
    let mut submission = QuoteSubmission {
        id: Uuid::now_v7(),
        user_id: Uuid::now_v7(),
        book_id: Uuid::now_v7(),
        text: "Fear is the mind-killer.".into(),
        page: "8".into(),
        context: String::new(),
        status: QuoteStatus::Pending,
        reward_amount: 0,
        submitted_at: at(3),
        verified_at: None,
        verified_by: None,
        verification_reason: String::new(),
    };
    store.insert_submission(submission.clone()).await.unwrap();
    assert_eq!(store.count_pending().await.unwrap(), 1);

    submission.status = QuoteStatus::Verified;
    assert!(store.resolve_submission(submission.clone()).await.unwrap());
    submission.status = QuoteStatus::Rejected;
    assert!(!store.resolve_submission(submission.clone()).await.unwrap());

    let stored = store.get_submission(submission.id).await.unwrap().unwrap();
    assert_eq!(stored.status, QuoteStatus::Verified);
    assert_eq!(store.count_pending().await.unwrap(), 0);
}

#[tokio::test]
async fn test_search_users_is_case_insensitive() {
    let store = MemoryStore::new();
    let ada = user("ada");
    let mut bob = user("Bob_Reads");
    bob.created_at = at(9);
    bob.is_active = false;
    store.create_user(ada.clone()).await.unwrap();
    store.create_user(bob.clone()).await.unwrap();

    let (found, total) = store
        .search_users(Some("bob".into()), PageRequest::default())
        .await
        .unwrap();
    assert_eq!((total, found[0].id), (1, bob.id));

    let (everyone, _) = store.search_users(None, PageRequest::default()).await.unwrap();
    assert_eq!(everyone.iter().map(|u| u.id).collect::<Vec<_>>(), vec![bob.id, ada.id]);

    assert_eq!(store.count_users(true, None).await.unwrap(), 1);
    assert_eq!(store.count_users(false, Some(at(5))).await.unwrap(), 1);
}
