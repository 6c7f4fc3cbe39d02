mod common;

use hk_core::services::nook::{BookUpdate, NewBook, ProgressLog};
use hk_core::{BookStatus, PageRequest, PointSource};

#[tokio::test]
async fn reading_a_book_end_to_end() {
    let h = common::memory();
    let ada = h.register("ada").await;

    let added = h
        .services
        .add_book(
            ada.id,
            NewBook {
                title: "The Left Hand of Darkness".into(),
                authors: vec!["Ursula K. Le Guin".into()],
                page_count: 300,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(added.points_earned, 5);
    let book_id = added.value.id;

    let progress = h
        .services
        .log_progress(
            ada.id,
            book_id,
            ProgressLog { current_page: Some(35), duration_minutes: 40, notes: String::new() },
        )
        .await
        .unwrap();
    assert_eq!(progress.points_earned, 20);
    assert_eq!(progress.value.book.status, BookStatus::Reading);

    let finished = h
        .services
        .update_book(
            ada.id,
            book_id,
            BookUpdate { status: Some(BookStatus::Finished), ..Default::default() },
        )
        .await
        .unwrap();
    assert_eq!(finished.points_earned, 50);
    assert!(finished.value.finished_at.is_some());

    // already finished: no second bonus
    let again = h
        .services
        .update_book(
            ada.id,
            book_id,
            BookUpdate { status: Some(BookStatus::Finished), rating: Some(5), ..Default::default() },
        )
        .await
        .unwrap();
    assert_eq!(again.points_earned, 0);

    assert_eq!(h.points(&ada).await, 10 + 5 + 20 + 50);

    let history = h
        .services
        .reward_history(ada.id, Some(PointSource::Nook), 0, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(history.rewards.total, 3);
    assert_eq!(history.total_points, 75);
}

#[tokio::test]
async fn first_book_achievements_unlock() {
    let h = common::memory();
    let ada = h.register("ada").await;

    let book = h
        .services
        .add_book(ada.id, NewBook { title: "Parable of the Sower".into(), ..Default::default() })
        .await
        .unwrap()
        .value;
    h.services
        .update_book(
            ada.id,
            book.id,
            BookUpdate { status: Some(BookStatus::Finished), ..Default::default() },
        )
        .await
        .unwrap();

    let report = h.services.achievements(ada.id).await.unwrap();
    assert_eq!(report.stats.books_added, 1);
    assert_eq!(report.stats.books_finished, 1);
    // First Book, First Finish
    assert_eq!(report.completed_count, 2);
    assert_eq!(report.total_count, 25);
}

#[tokio::test]
async fn progress_logs_feed_the_reading_streak() {
    let h = common::memory();
    let ada = h.register("ada").await;
    let book = h
        .services
        .add_book(ada.id, NewBook { title: "Dawn".into(), page_count: 500, ..Default::default() })
        .await
        .unwrap()
        .value;

    for (day, page) in [(0, 10), (1, 20), (2, 30)] {
        if day > 0 {
            h.clock.advance(chrono::Duration::days(1));
        }
        h.services
            .log_progress(
                ada.id,
                book.id,
                ProgressLog { current_page: Some(page), duration_minutes: 15, notes: String::new() },
            )
            .await
            .unwrap();
    }

    let summary = h.services.dashboard_summary(ada.id).await.unwrap();
    assert_eq!(summary.streaks.reading_streak, 3);
    assert_eq!(summary.reading_stats.pages_read_today, 10);
}
