mod common;

use chrono::Duration;
use hk_core::services::hook::{TimerCompletion, TimerStart};
use hk_core::{AppError, PageRequest, TimerStatus};

fn start(name: &str, minutes: i32) -> TimerStart {
    TimerStart {
        task_name: name.into(),
        duration: minutes,
        ..Default::default()
    }
}

#[tokio::test]
async fn focused_session_with_good_mood_earns_bonus() {
    let h = common::memory();
    let ada = h.register("ada").await;

    h.services.start_timer(ada.id, start("Draft essay", 25)).await.unwrap();
    h.clock.advance(Duration::minutes(30));

    let done = h
        .services
        .complete_timer(ada.id, TimerCompletion { mood_rating: Some(5), notes: "flow".into() })
        .await
        .unwrap();
    assert_eq!(done.value.actual_duration, 30);
    assert_eq!(done.points_earned, 6 + 2);
    assert_eq!(h.points(&ada).await, 18);
    assert!(h.services.active_timer(ada.id).await.unwrap().is_none());
}

#[tokio::test]
async fn paused_time_does_not_count() {
    let h = common::memory();
    let ada = h.register("ada").await;

    h.services.start_timer(ada.id, start("Review notes", 25)).await.unwrap();
    h.clock.advance(Duration::minutes(10));
    let paused = h.services.toggle_pause(ada.id).await.unwrap();
    assert_eq!(paused.status, TimerStatus::Paused);

    h.clock.advance(Duration::minutes(20));
    let resumed = h.services.toggle_pause(ada.id).await.unwrap();
    assert_eq!(resumed.status, TimerStatus::Active);
    assert_eq!(resumed.total_paused_secs, 1200.0);

    h.clock.advance(Duration::minutes(5));
    let done = h
        .services
        .complete_timer(ada.id, TimerCompletion::default())
        .await
        .unwrap();
    assert_eq!(done.value.actual_duration, 15);
    assert_eq!(done.points_earned, 3);
}

#[tokio::test]
async fn one_timer_at_a_time_and_cancel_pays_nothing() {
    let h = common::memory();
    let ada = h.register("ada").await;

    h.services.start_timer(ada.id, start("Inbox", 10)).await.unwrap();
    let err = h.services.start_timer(ada.id, start("Inbox again", 10)).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    h.services.cancel_timer(ada.id).await.unwrap();
    assert_eq!(h.points(&ada).await, 10);

    let err = h.services.cancel_timer(ada.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(..)));
}

#[tokio::test]
async fn completed_sessions_feed_tasks_and_streak() {
    let h = common::memory();
    let ada = h.register("ada").await;

    for day in 0..2 {
        if day > 0 {
            h.clock.advance(Duration::days(1));
        }
        h.services.start_timer(ada.id, start("Practice", 25)).await.unwrap();
        h.clock.advance(Duration::minutes(25));
        h.services.complete_timer(ada.id, TimerCompletion::default()).await.unwrap();
    }

    let tasks = h
        .services
        .list_tasks(ada.id, None, 30, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(tasks.total, 2);

    let stats = h.services.user_stats(ada.id).await.unwrap();
    assert_eq!(stats.tasks_completed, 2);
    assert_eq!(stats.productivity_streak, 2);
}
