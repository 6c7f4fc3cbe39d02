//! System-wide counters and the user directory. Moderators only.

use chrono::Duration;
use serde::Serialize;
use uuid::Uuid;

use super::Services;
use crate::error::Result;
use crate::models::{PageRequest, Paginated, User};

const TOP_USERS: u32 = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemStats {
    pub total_users: u64,
    pub active_users: u64,
    pub total_books: u64,
    pub total_tasks: u64,
    pub pending_quotes: u64,
    pub new_users_week: u64,
    pub new_books_week: u64,
    pub completed_tasks_week: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopUser {
    pub id: Uuid,
    pub username: String,
    pub points: i64,
    pub level: i32,
}

impl From<User> for TopUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            points: user.points,
            level: user.level,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub stats: SystemStats,
    pub top_users: Vec<TopUser>,
}

impl Services {
    /// "Week" counters cover the seven days before now.
    pub async fn admin_dashboard(&self, moderator_id: Uuid) -> Result<AdminDashboard> {
        self.require_admin(moderator_id).await?;

        let week_ago = self.clock.now() - Duration::days(7);
        let users = &self.repos.users;
        let stats = SystemStats {
            total_users: users.count_users(false, None).await?,
            active_users: users.count_users(true, None).await?,
            total_books: self.repos.books.count_all_books(None).await?,
            total_tasks: self.repos.timers.count_all_completed(None).await?,
            pending_quotes: self.repos.quotes.count_pending().await?,
            new_users_week: users.count_users(false, Some(week_ago)).await?,
            new_books_week: self.repos.books.count_all_books(Some(week_ago)).await?,
            completed_tasks_week: self.repos.timers.count_all_completed(Some(week_ago)).await?,
        };
        let top_users = users
            .top_by_points(TOP_USERS)
            .await?
            .into_iter()
            .map(TopUser::from)
            .collect();

        Ok(AdminDashboard { stats, top_users })
    }

    /// Newest account first, optionally narrowed by a case-insensitive match on
    /// username or email.
    pub async fn list_users(
        &self,
        moderator_id: Uuid,
        search: Option<String>,
        page: PageRequest,
    ) -> Result<Paginated<User>> {
        self.require_admin(moderator_id).await?;

        let search = search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let (users, total) = self.repos.users.search_users(search, page).await?;
        Ok(Paginated::new(users, page, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::error::AppError;
    use crate::models::{Preferences, Profile};
    use crate::testing::{fixed_now, FixedClock, MockPorts};

    fn account(id: Uuid, is_admin: bool, points: i64) -> User {
        User {
            id,
            username: format!("user{points}"),
            email: format!("user{points}@example.com"),
            password_hash: String::new(),
            is_admin,
            is_active: true,
            points,
            level: 1,
            profile: Profile::for_username("user"),
            preferences: Preferences::default(),
            created_at: fixed_now(),
            last_login: None,
        }
    }

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(fixed_now()))
    }

    #[tokio::test]
    async fn dashboard_counts_the_last_seven_days() {
        let admin_id = Uuid::now_v7();
        let week_ago = fixed_now() - Duration::days(7);
        let mut ports = MockPorts::default();
        ports.users
            .expect_get_user()
            .returning(move |id| Ok(Some(account(id, true, 0))));
        ports.users
            .expect_count_users()
            .returning(move |active_only, since| {
                Ok(match (active_only, since) {
                    (false, None) => 12,
                    (true, None) => 9,
                    (false, Some(s)) if s == week_ago => 3,
                    _ => 0,
                })
            });
        ports.users
            .expect_top_by_points()
            .withf(|limit| *limit == 10)
            .returning(|_| Ok(vec![account(Uuid::now_v7(), false, 340)]));
        ports.books
            .expect_count_all_books()
            .returning(move |since| Ok(if since == Some(week_ago) { 4 } else { 30 }));
        ports.timers
            .expect_count_all_completed()
            .returning(move |since| Ok(if since == Some(week_ago) { 7 } else { 80 }));
        ports.quotes.expect_count_pending().returning(|| Ok(2));

        let dashboard = ports
            .into_services(clock())
            .admin_dashboard(admin_id)
            .await
            .unwrap();

        assert_eq!(
            dashboard.stats,
            SystemStats {
                total_users: 12,
                active_users: 9,
                total_books: 30,
                total_tasks: 80,
                pending_quotes: 2,
                new_users_week: 3,
                new_books_week: 4,
                completed_tasks_week: 7,
            }
        );
        assert_eq!(dashboard.top_users[0].points, 340);
    }

    #[tokio::test]
    async fn non_admin_cannot_list_users() {
        let mut ports = MockPorts::default();
        ports.users
            .expect_get_user()
            .returning(|id| Ok(Some(account(id, false, 0))));
        ports.users.expect_search_users().never();

        let err = ports
            .into_services(clock())
            .list_users(Uuid::now_v7(), None, PageRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn blank_search_lists_everyone() {
        let mut ports = MockPorts::default();
        ports.users
            .expect_get_user()
            .returning(|id| Ok(Some(account(id, true, 0))));
        ports.users
            .expect_search_users()
            .withf(|search, _| search.is_none())
            .times(1)
            .returning(|_, _| Ok((vec![], 41)));

        let page = PageRequest::new(1, 20).unwrap();
        let listed = ports
            .into_services(clock())
            .list_users(Uuid::now_v7(), Some("  ".into()), page)
            .await
            .unwrap();

        assert_eq!((listed.total, listed.pages()), (41, 3));
    }
}
