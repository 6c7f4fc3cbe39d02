//! hooks/crates/hk-core/src/lib.rs
//!
//! Domain logic and port definitions for the Hooks productivity backend:
//! the points ledger, streaks, achievements and the services built on them.

pub mod achievements;
pub mod error;
pub mod ledger;
pub mod models;
pub mod policy;
pub mod progress;
pub mod services;
pub mod traits;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-exporting for easier access in other crates
pub use achievements::{Achievement, AchievementCategory, AchievementProgress, AchievementTable, GroupedProgress};
pub use error::AppError;
pub use ledger::{Ledger, LedgerBalance};
pub use models::*;
pub use progress::{day_bounds, Metric, StreakScanner, UserStats};
pub use services::{Repos, ServiceOptions, Services};
pub use traits::*;

#[cfg(test)]
mod tests {
    use super::models::*;
    use uuid::Uuid;

    #[test]
    fn test_ledger_entry_metadata_defaults_to_empty_object() {
        let entry = NewLedgerEntry::new(Uuid::now_v7(), 5, PointSource::Nook, "Added book: Dune");
        assert_eq!(entry.metadata, serde_json::json!({}));

        let entry = entry.with_metadata(serde_json::json!({ "book_id": "b1" }));
        assert_eq!(entry.metadata["book_id"], "b1");
    }

    #[test]
    fn test_point_source_round_trips_through_str() {
        for source in PointSource::ALL {
            assert_eq!(source.as_str().parse::<PointSource>().unwrap(), source);
        }
        assert!("casino".parse::<PointSource>().is_err());
    }

    #[test]
    fn test_page_request_bounds() {
        assert!(PageRequest::new(0, 10).is_err());
        assert!(PageRequest::new(1, 0).is_err());
        assert!(PageRequest::new(1, MAX_PAGE_LIMIT + 1).is_err());
        assert_eq!(PageRequest::new(3, 10).unwrap().offset(), 20);
    }
}
