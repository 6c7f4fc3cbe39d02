mod common;

use hk_core::services::nook::NewBook;
use hk_core::{AppError, NewLedgerEntry, PointSource};

#[tokio::test]
async fn every_award_moves_ledger_and_counter_together() {
    let h = common::memory();
    let ada = h.register("ada").await;

    h.services
        .add_book(ada.id, NewBook { title: "Kindred".into(), ..Default::default() })
        .await
        .unwrap();

    let balance = h.services.ledger_balance(ada.id).await.unwrap();
    assert_eq!(balance.cached_points, 15);
    assert_eq!(balance.ledger_points, 15);
    assert_eq!(balance.drift, 0);
}

#[tokio::test]
async fn failed_counter_increment_is_reported_as_drift() {
    let h = common::memory();
    let ada = h.register("ada").await;

    h.store.fail_point_increments(true);
    let err = h
        .services
        .add_book(ada.id, NewBook { title: "Kindred".into(), ..Default::default() })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StorageUnavailable(_)));
    h.store.fail_point_increments(false);

    // the entry survived; only the cached counter lags behind
    let balance = h.services.ledger_balance(ada.id).await.unwrap();
    assert_eq!(balance.ledger_points, 15);
    assert_eq!(balance.cached_points, 10);
    assert_eq!(balance.drift, -5);

    // reading the balance never repairs it
    assert_eq!(h.points(&ada).await, 10);
}

#[tokio::test]
async fn failed_ledger_insert_leaves_no_trace() {
    let h = common::memory();
    let ada = h.register("ada").await;

    h.store.fail_ledger_inserts(true);
    let err = h
        .services
        .ledger()
        .append(NewLedgerEntry::new(ada.id, 7, PointSource::Quiz, "Quiz"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StorageUnavailable(_)));

    assert_eq!(h.points(&ada).await, 10);
    assert_eq!(h.services.ledger_balance(ada.id).await.unwrap().drift, 0);
}

#[tokio::test]
async fn negative_amounts_never_reach_storage() {
    let h = common::memory();
    let ada = h.register("ada").await;

    let err = h
        .services
        .ledger()
        .append(NewLedgerEntry::new(ada.id, -5, PointSource::System, "Penalty"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidAmount(-5)));
    assert_eq!(h.points(&ada).await, 10);
}

#[tokio::test]
async fn unknown_source_names_are_rejected() {
    let h = common::memory();
    let ada = h.register("ada").await;

    let err = h
        .services
        .ledger()
        .append_named(ada.id, 5, "lottery", "Jackpot", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UnknownSource(_)));
}

#[tokio::test]
async fn streaks_fail_soft_when_activity_storage_is_down() {
    let h = common::memory();
    let ada = h.register("ada").await;

    h.store.fail_activity_reads(true);
    let summary = h.services.dashboard_summary(ada.id).await.unwrap();
    assert_eq!(summary.streaks.reading_streak, 0);
    assert_eq!(summary.streaks.productivity_streak, 0);
    assert_eq!(summary.user.points, 10);
}
