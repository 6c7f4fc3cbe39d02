//! # Achievement table
//!
//! Static milestone definitions. A table is validated once when it is loaded, so
//! evaluation never has to guard against a zero threshold.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::progress::{Metric, UserStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Points,
    Reading,
    Completion,
    Productivity,
    Quotes,
    Streak,
    Social,
}

/// One milestone. `metric` is explicit because `streak` and `social` span two metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub name: String,
    pub description: String,
    pub category: AchievementCategory,
    pub metric: Metric,
    pub threshold: i64,
    pub icon: String,
}

/// A user's standing against one achievement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AchievementProgress {
    pub name: String,
    pub description: String,
    pub category: AchievementCategory,
    pub icon: String,
    pub threshold: i64,
    pub current: i64,
    pub completed: bool,
    /// Percentage in `[0, 100]`
    pub progress: f64,
}

impl AchievementProgress {
    fn measure(achievement: &Achievement, current: i64) -> Self {
        let ratio = current as f64 / achievement.threshold as f64;
        Self {
            name: achievement.name.clone(),
            description: achievement.description.clone(),
            category: achievement.category,
            icon: achievement.icon.clone(),
            threshold: achievement.threshold,
            current,
            completed: current >= achievement.threshold,
            progress: (ratio * 100.0).clamp(0.0, 100.0),
        }
    }
}

/// Progress grouped by category; definition order is kept inside each group.
pub type GroupedProgress = BTreeMap<AchievementCategory, Vec<AchievementProgress>>;

#[derive(Debug, Clone)]
pub struct AchievementTable {
    definitions: Vec<Achievement>,
}

impl AchievementTable {
    /// Rejects any definition whose threshold is not strictly positive.
    pub fn new(definitions: Vec<Achievement>) -> Result<Self> {
        if let Some(bad) = definitions.iter().find(|a| a.threshold <= 0) {
            return Err(AppError::InvalidThreshold {
                name: bad.name.clone(),
                threshold: bad.threshold,
            });
        }
        Ok(Self { definitions })
    }

    /// Loads a JSON array of definitions.
    pub fn from_json(raw: &str) -> Result<Self> {
        let definitions: Vec<Achievement> = serde_json::from_str(raw)
            .map_err(|e| AppError::validation(format!("achievement table: {e}")))?;
        Self::new(definitions)
    }

    pub fn definitions(&self) -> &[Achievement] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn evaluate(&self, stats: &UserStats) -> GroupedProgress {
        let mut grouped = GroupedProgress::new();
        for achievement in &self.definitions {
            let progress = AchievementProgress::measure(achievement, stats.value(achievement.metric));
            grouped.entry(achievement.category).or_default().push(progress);
        }
        grouped
    }

    /// The built-in milestone catalogue.
    pub fn standard() -> Self {
        use AchievementCategory as C;
        use Metric as M;

        let rows: [(&str, &str, C, M, i64, &str); 25] = [
            ("Getting Started", "Earn your first 100 points", C::Points, M::Points, 100, "🎯"),
            ("Point Collector", "Earn 500 points", C::Points, M::Points, 500, "💎"),
            ("Point Master", "Earn 1,000 points", C::Points, M::Points, 1000, "👑"),
            ("Point Legend", "Earn 5,000 points", C::Points, M::Points, 5000, "🏆"),
            ("First Book", "Add your first book", C::Reading, M::BooksAdded, 1, "📖"),
            ("Bookworm", "Add 10 books to your library", C::Reading, M::BooksAdded, 10, "🐛"),
            ("Book Collector", "Add 25 books to your library", C::Reading, M::BooksAdded, 25, "📚"),
            ("Library Master", "Add 50 books to your library", C::Reading, M::BooksAdded, 50, "🏛️"),
            ("First Finish", "Finish your first book", C::Completion, M::BooksFinished, 1, "✅"),
            ("Dedicated Reader", "Finish 5 books", C::Completion, M::BooksFinished, 5, "🎓"),
            ("Voracious Reader", "Finish 25 books", C::Completion, M::BooksFinished, 25, "🦈"),
            ("Reading Legend", "Finish 100 books", C::Completion, M::BooksFinished, 100, "👑"),
            ("First Task", "Complete your first focus session", C::Productivity, M::TasksCompleted, 1, "⏰"),
            ("Task Master", "Complete 50 focus sessions", C::Productivity, M::TasksCompleted, 50, "💪"),
            ("Focus Master", "Complete 100 focus sessions", C::Productivity, M::TasksCompleted, 100, "🧠"),
            ("Productivity Legend", "Complete 500 focus sessions", C::Productivity, M::TasksCompleted, 500, "🏆"),
            ("Quote Collector", "Add 10 quotes", C::Quotes, M::QuotesAdded, 10, "💬"),
            ("Wisdom Keeper", "Add 50 quotes", C::Quotes, M::QuotesAdded, 50, "🔮"),
            ("Quote Master", "Add 100 quotes", C::Quotes, M::QuotesAdded, 100, "📜"),
            ("Reading Streak", "Read for 7 consecutive days", C::Streak, M::ReadingStreak, 7, "🔥"),
            ("Reading Marathon", "Read for 30 consecutive days", C::Streak, M::ReadingStreak, 30, "🔥🔥"),
            ("Productivity Streak", "Complete tasks for 7 consecutive days", C::Streak, M::ProductivityStreak, 7, "⚡"),
            ("Productivity Marathon", "Complete tasks for 30 consecutive days", C::Streak, M::ProductivityStreak, 30, "⚡⚡"),
            ("Social Butterfly", "Join your first club", C::Social, M::ClubsJoined, 1, "🦋"),
            ("Club Leader", "Create your first club", C::Social, M::ClubsCreated, 1, "👥"),
        ];

        let definitions = rows
            .into_iter()
            .map(|(name, description, category, metric, threshold, icon)| Achievement {
                name: name.to_string(),
                description: description.to_string(),
                category,
                metric,
                threshold,
                icon: icon.to_string(),
            })
            .collect();

        Self { definitions }
    }
}
