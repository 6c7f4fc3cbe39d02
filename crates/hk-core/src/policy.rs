//! # Point-earning policy
//!
//! Business constants for every action that appends to the ledger.

pub const REGISTRATION_POINTS: i64 = 10;
pub const ADD_BOOK_POINTS: i64 = 5;
pub const FINISH_BOOK_POINTS: i64 = 50;
pub const ADD_QUOTE_POINTS: i64 = 3;
pub const ADD_TAKEAWAY_POINTS: i64 = 2;

/// Cap on points from a single reading-progress log (one point per page).
pub const MAX_READING_POINTS_PER_SESSION: i64 = 20;

/// One focus point per this many minutes.
pub const MINUTES_PER_FOCUS_POINT: i64 = 5;
pub const MOOD_BONUS_POINTS: i64 = 2;
pub const MOOD_BONUS_MIN_RATING: i32 = 4;

/// Reward stored on a fresh quote submission.
pub const DEFAULT_QUOTE_REWARD: i64 = 10;

/// Points for a reading-progress log. Zero means no ledger entry is written.
pub fn reading_points(pages_read: i64) -> i64 {
    pages_read.clamp(0, MAX_READING_POINTS_PER_SESSION)
}

/// Points for a completed focus session.
pub fn focus_points(actual_minutes: i64, mood_rating: Option<i32>) -> i64 {
    let base = (actual_minutes / MINUTES_PER_FOCUS_POINT).max(1);
    match mood_rating {
        Some(rating) if rating >= MOOD_BONUS_MIN_RATING => base + MOOD_BONUS_POINTS,
        _ => base,
    }
}
