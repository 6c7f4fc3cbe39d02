//! # Hook
//!
//! Focus timers. A user has at most one active timer; completing it records a
//! task (which feeds the productivity streak) and earns focus points.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{required, Awarded, Services};
use crate::error::{AppError, Result};
use crate::models::{
    ActiveTimer, CompletedTask, CustomPreset, NewLedgerEntry, PageRequest, Paginated, PointSource,
    TimerStatus, TimerType,
};
use crate::policy;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TimerStart {
    pub task_name: String,
    /// Planned minutes
    pub duration: i32,
    pub category: Option<String>,
    pub timer_type: Option<TimerType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TimerCompletion {
    pub mood_rating: Option<i32>,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TimerPreset {
    pub name: &'static str,
    pub duration: i32,
    #[serde(rename = "type")]
    pub timer_type: TimerType,
    pub category: &'static str,
    pub color: &'static str,
}

pub const PRESETS: [TimerPreset; 5] = [
    TimerPreset { name: "Pomodoro", duration: 25, timer_type: TimerType::Work, category: "general", color: "red" },
    TimerPreset { name: "Short Break", duration: 5, timer_type: TimerType::Break, category: "break", color: "orange" },
    TimerPreset { name: "Long Break", duration: 15, timer_type: TimerType::Break, category: "break", color: "green" },
    TimerPreset { name: "Deep Work", duration: 90, timer_type: TimerType::Work, category: "work", color: "blue" },
    TimerPreset { name: "Quick Task", duration: 10, timer_type: TimerType::Work, category: "general", color: "purple" },
];

const DEFAULT_CATEGORY: &str = "general";
const DEFAULT_PRESET_COLOR: &str = "blue";

/// Body of a custom preset save.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PresetDraft {
    pub name: String,
    pub duration: i32,
    #[serde(alias = "type")]
    pub timer_type: Option<TimerType>,
    pub category: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PresetCatalog {
    pub default_presets: &'static [TimerPreset],
    pub custom_presets: Vec<CustomPreset>,
}

impl Services {
    pub async fn active_timer(&self, user_id: Uuid) -> Result<Option<ActiveTimer>> {
        Ok(self.repos.timers.get_active(user_id).await?)
    }

    pub async fn start_timer(&self, user_id: Uuid, start: TimerStart) -> Result<ActiveTimer> {
        let task_name = required(&start.task_name, "task_name")?;
        if start.duration <= 0 {
            return Err(AppError::validation("duration must be a positive number of minutes"));
        }
        if self.repos.timers.get_active(user_id).await?.is_some() {
            return Err(AppError::Conflict(
                "an active timer already exists; complete or cancel it first".into(),
            ));
        }

        let category = start
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        let timer = ActiveTimer {
            id: Uuid::now_v7(),
            user_id,
            task_name,
            duration: start.duration,
            category,
            timer_type: start.timer_type.unwrap_or(TimerType::Work),
            status: TimerStatus::Active,
            started_at: self.clock.now(),
            paused_at: None,
            total_paused_secs: 0.0,
        };
        self.repos.timers.insert_active(timer.clone()).await?;
        log::debug!("user {user_id} started timer {}", timer.id);
        Ok(timer)
    }

    /// Pauses a running timer or resumes a paused one.
    pub async fn toggle_pause(&self, user_id: Uuid) -> Result<ActiveTimer> {
        let mut timer = self.require_active(user_id).await?;
        let now = self.clock.now();

        match (timer.status, timer.paused_at) {
            (TimerStatus::Active, _) => {
                timer.status = TimerStatus::Paused;
                timer.paused_at = Some(now);
            }
            (TimerStatus::Paused, Some(paused_at)) => {
                timer.total_paused_secs += seconds(now - paused_at);
                timer.status = TimerStatus::Active;
                timer.paused_at = None;
            }
            (TimerStatus::Paused, None) => {
                timer.status = TimerStatus::Active;
            }
        }

        self.repos.timers.update_active(timer.clone()).await?;
        Ok(timer)
    }

    pub async fn complete_timer(
        &self,
        user_id: Uuid,
        completion: TimerCompletion,
    ) -> Result<Awarded<CompletedTask>> {
        if let Some(rating) = completion.mood_rating {
            if !(1..=5).contains(&rating) {
                return Err(AppError::validation("mood_rating must be between 1 and 5"));
            }
        }
        let timer = self.require_active(user_id).await?;
        let now = self.clock.now();

        // 1. Elapsed focus time stops at the pause instant for a paused timer
        let stopped_at = timer.paused_at.unwrap_or(now);
        let focused_secs = seconds(stopped_at - timer.started_at) - timer.total_paused_secs;
        let actual_minutes = ((focused_secs / 60.0) as i64).max(1);

        // 2. Record the task and retire the timer
        let task = CompletedTask {
            id: Uuid::now_v7(),
            user_id,
            task_name: timer.task_name.clone(),
            planned_duration: timer.duration,
            actual_duration: i32::try_from(actual_minutes).unwrap_or(i32::MAX),
            category: timer.category.clone(),
            timer_type: timer.timer_type,
            mood_rating: completion.mood_rating,
            notes: completion.notes,
            started_at: timer.started_at,
            completed_at: now,
        };
        self.repos.timers.insert_completed(task.clone()).await?;
        self.repos.timers.delete_active(timer.id).await?;

        // 3. Award focus points
        let points = policy::focus_points(actual_minutes, completion.mood_rating);
        self.ledger
            .append(
                NewLedgerEntry::new(
                    user_id,
                    points,
                    PointSource::Hook,
                    format!("Completed {} ({actual_minutes} min)", task.task_name),
                )
                .with_metadata(json!({
                    "task_name": task.task_name,
                    "duration": actual_minutes,
                    "category": task.category,
                })),
            )
            .await?;

        Ok(Awarded::new(task, points))
    }

    /// Discards the active timer without points.
    pub async fn cancel_timer(&self, user_id: Uuid) -> Result<()> {
        let timer = self.require_active(user_id).await?;
        self.repos.timers.delete_active(timer.id).await?;
        Ok(())
    }

    /// Completed tasks, newest first. `days == 0` disables the date filter.
    pub async fn list_tasks(
        &self,
        user_id: Uuid,
        category: Option<String>,
        days: u32,
        page: PageRequest,
    ) -> Result<Paginated<CompletedTask>> {
        let since = (days > 0).then(|| self.clock.now() - Duration::days(i64::from(days)));
        let (tasks, total) = self
            .repos
            .timers
            .list_completed(user_id, category, since, page)
            .await?;
        Ok(Paginated::new(tasks, page, total))
    }

    /// Built-in presets followed by the user's own.
    pub async fn presets(&self, user_id: Uuid) -> Result<PresetCatalog> {
        let user = self.user(user_id).await?;
        Ok(PresetCatalog {
            default_presets: &PRESETS,
            custom_presets: user.preferences.timer_presets,
        })
    }

    /// Appends a preset to the user's saved ones.
    pub async fn save_preset(&self, user_id: Uuid, draft: PresetDraft) -> Result<CustomPreset> {
        let name = required(&draft.name, "name")?;
        if draft.duration <= 0 {
            return Err(AppError::validation("duration is required"));
        }
        let Some(timer_type) = draft.timer_type else {
            return Err(AppError::validation("type is required"));
        };
        let category = required(&draft.category, "category")?;
        let color = match draft.color.as_deref().map(str::trim) {
            Some(color) if !color.is_empty() => color.to_string(),
            _ => DEFAULT_PRESET_COLOR.to_string(),
        };

        let mut user = self.user(user_id).await?;
        let preset = CustomPreset {
            name,
            duration: draft.duration,
            timer_type,
            category,
            color,
        };
        user.preferences.timer_presets.push(preset.clone());
        self.repos.users.update_user(user).await?;
        Ok(preset)
    }

    async fn require_active(&self, user_id: Uuid) -> Result<ActiveTimer> {
        self.repos
            .timers
            .get_active(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Active timer", user_id))
    }
}

fn seconds(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 1000.0
}
