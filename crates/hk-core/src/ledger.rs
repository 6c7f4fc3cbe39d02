//! # Activity Ledger
//!
//! Append-only log of point-earning events. Every append writes the entry and then
//! bumps the user's cached point counter. The two writes are independent: if the
//! second fails the entry stays and the counter lags the ledger sum until someone
//! reconciles it. [`Ledger::balance`] reports that drift without repairing it.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{LedgerEntry, LedgerQuery, NewLedgerEntry, Paginated, PointSource};
use crate::traits::{Clock, LedgerRepo};

/// Cached counter vs. ledger sum for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerBalance {
    pub user_id: Uuid,
    pub cached_points: i64,
    pub ledger_points: i64,
    /// `cached_points - ledger_points`; zero when consistent.
    pub drift: i64,
}

#[derive(Clone)]
pub struct Ledger {
    repo: Arc<dyn LedgerRepo>,
    clock: Arc<dyn Clock>,
}

impl Ledger {
    pub fn new(repo: Arc<dyn LedgerRepo>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Validates and persists one entry, then increments the cached counter.
    pub async fn append(&self, entry: NewLedgerEntry) -> Result<LedgerEntry> {
        if entry.points < 0 {
            return Err(AppError::InvalidAmount(entry.points));
        }

        let created = LedgerEntry {
            id: Uuid::now_v7(),
            user_id: entry.user_id,
            points: entry.points,
            source: entry.source,
            description: entry.description,
            earned_at: self.clock.now(),
            metadata: entry.metadata,
        };

        self.repo.insert_entry(created.clone()).await?;

        if let Err(err) = self.repo.increment_points(created.user_id, created.points).await {
            // No compensating delete: the entry is immutable once written.
            log::error!(
                "ledger entry {} stored but cached total for user {} was not incremented by {}: {err:#}",
                created.id,
                created.user_id,
                created.points
            );
            return Err(err.into());
        }

        log::debug!(
            "ledger: +{} ({}) for user {}",
            created.points,
            created.source,
            created.user_id
        );
        Ok(created)
    }

    /// Same as [`Ledger::append`] for callers holding an unparsed source name.
    pub async fn append_named(
        &self,
        user_id: Uuid,
        points: i64,
        source: &str,
        description: &str,
        metadata: Option<serde_json::Value>,
    ) -> Result<LedgerEntry> {
        let source: PointSource = source.parse()?;
        let mut entry = NewLedgerEntry::new(user_id, points, source, description);
        if let Some(metadata) = metadata {
            entry = entry.with_metadata(metadata);
        }
        self.append(entry).await
    }

    /// Page of entries, newest first.
    pub async fn query(&self, query: LedgerQuery) -> Result<Paginated<LedgerEntry>> {
        let page = query.page;
        let (entries, total) = self.repo.query_entries(query).await?;
        Ok(Paginated::new(entries, page, total))
    }

    pub async fn balance(&self, user_id: Uuid, cached_points: i64) -> Result<LedgerBalance> {
        let ledger_points = self.repo.sum_points(user_id).await?;
        Ok(LedgerBalance {
            user_id,
            cached_points,
            ledger_points,
            drift: cached_points - ledger_points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageRequest;
    use crate::testing::FixedClock;
    use crate::traits::MockLedgerRepo;
    use chrono::TimeZone;
    use mockall::predicate::eq;

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock::new(
            chrono::Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap(),
        ))
    }

    #[tokio::test]
    async fn append_writes_entry_then_counter() {
        let user = Uuid::now_v7();
        let mut repo = MockLedgerRepo::new();
        let mut seq = mockall::Sequence::new();
        repo.expect_insert_entry()
            .withf(move |e| e.user_id == user && e.points == 5 && e.source == PointSource::Nook)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        repo.expect_increment_points()
            .with(eq(user), eq(5))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let ledger = Ledger::new(Arc::new(repo), clock());
        let entry = ledger
            .append(NewLedgerEntry::new(user, 5, PointSource::Nook, "Added book: Dune"))
            .await
            .unwrap();

        assert_eq!(entry.points, 5);
        assert_eq!(entry.earned_at, clock().now());
    }

    #[tokio::test]
    async fn negative_amount_is_rejected_before_any_write() {
        let repo = MockLedgerRepo::new();
        let ledger = Ledger::new(Arc::new(repo), clock());

        let err = ledger
            .append(NewLedgerEntry::new(Uuid::now_v7(), -1, PointSource::System, "oops"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidAmount(-1)));
    }

    #[tokio::test]
    async fn unknown_source_is_rejected_before_any_write() {
        let repo = MockLedgerRepo::new();
        let ledger = Ledger::new(Arc::new(repo), clock());

        let err = ledger
            .append_named(Uuid::now_v7(), 5, "casino", "nope", None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UnknownSource(s) if s == "casino"));
    }

    #[tokio::test]
    async fn failed_insert_skips_counter() {
        let mut repo = MockLedgerRepo::new();
        repo.expect_insert_entry()
            .returning(|_| Err(anyhow::anyhow!("disk full")));
        repo.expect_increment_points().never();

        let ledger = Ledger::new(Arc::new(repo), clock());
        let err = ledger
            .append(NewLedgerEntry::new(Uuid::now_v7(), 3, PointSource::Nook, "quote"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::StorageUnavailable(_)));
    }

    #[tokio::test]
    async fn failed_counter_surfaces_as_storage_error() {
        let mut repo = MockLedgerRepo::new();
        repo.expect_insert_entry().returning(|_| Ok(()));
        repo.expect_increment_points()
            .returning(|_, _| Err(anyhow::anyhow!("connection reset")));

        let ledger = Ledger::new(Arc::new(repo), clock());
        let err = ledger
            .append(NewLedgerEntry::new(Uuid::now_v7(), 2, PointSource::Nook, "takeaway"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::StorageUnavailable(msg) if msg.contains("connection reset")));
    }

    #[tokio::test]
    async fn balance_reports_drift() {
        let user = Uuid::now_v7();
        let mut repo = MockLedgerRepo::new();
        repo.expect_sum_points().with(eq(user)).returning(|_| Ok(60));

        let ledger = Ledger::new(Arc::new(repo), clock());
        let balance = ledger.balance(user, 65).await.unwrap();

        assert_eq!(balance.ledger_points, 60);
        assert_eq!(balance.drift, 5);
    }

    #[tokio::test]
    async fn query_wraps_page_metadata() {
        let user = Uuid::now_v7();
        let mut repo = MockLedgerRepo::new();
        repo.expect_query_entries()
            .withf(move |q| q.user_id == user && q.page.offset() == 20)
            .returning(|_| Ok((Vec::new(), 45)));

        let ledger = Ledger::new(Arc::new(repo), clock());
        let page = ledger
            .query(LedgerQuery {
                user_id: user,
                source: None,
                since: None,
                page: PageRequest::new(2, 20).unwrap(),
            })
            .await
            .unwrap();

        assert_eq!(page.total, 45);
        assert_eq!(page.pages(), 3);
    }
}
