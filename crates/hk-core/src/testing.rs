//! Test doubles shared with downstream test crates (`features = ["testing"]`).

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::services::{Repos, ServiceOptions, Services};
use crate::traits::{
    Clock, MockActivityRepo, MockAuthProvider, MockBookRepo, MockClubRepo, MockLedgerRepo,
    MockQuoteRepo, MockTimerRepo, MockUserRepo,
};

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write().expect("clock lock poisoned") = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().expect("clock lock poisoned");
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().expect("clock lock poisoned")
    }
}

/// 2026-03-14 09:30 UTC, a Saturday.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// One mock per port. Set expectations on the fields, then call [`MockPorts::into_services`].
pub struct MockPorts {
    pub users: MockUserRepo,
    pub ledger: MockLedgerRepo,
    pub activity: MockActivityRepo,
    pub books: MockBookRepo,
    pub timers: MockTimerRepo,
    pub quotes: MockQuoteRepo,
    pub clubs: MockClubRepo,
    pub auth: MockAuthProvider,
}

impl Default for MockPorts {
    fn default() -> Self {
        Self {
            users: MockUserRepo::new(),
            ledger: MockLedgerRepo::new(),
            activity: MockActivityRepo::new(),
            books: MockBookRepo::new(),
            timers: MockTimerRepo::new(),
            quotes: MockQuoteRepo::new(),
            clubs: MockClubRepo::new(),
            auth: MockAuthProvider::new(),
        }
    }
}

impl MockPorts {
    /// Lets every ledger write succeed.
    pub fn accept_ledger_writes(&mut self) {
        self.ledger.expect_insert_entry().returning(|_| Ok(()));
        self.ledger.expect_increment_points().returning(|_, _| Ok(()));
    }

    pub fn into_services(self, clock: Arc<FixedClock>) -> Services {
        let repos = Repos {
            users: Arc::new(self.users),
            ledger: Arc::new(self.ledger),
            activity: Arc::new(self.activity),
            books: Arc::new(self.books),
            timers: Arc::new(self.timers),
            quotes: Arc::new(self.quotes),
            clubs: Arc::new(self.clubs),
        };
        Services::with_options(repos, Arc::new(self.auth), clock, ServiceOptions::default())
    }
}
