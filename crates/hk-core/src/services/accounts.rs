//! Registration, login, tokens and profile maintenance.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{required, Services};
use crate::error::{AppError, Result};
use crate::models::{NewLedgerEntry, PointSource, Preferences, Profile, User};
use crate::policy::REGISTRATION_POINTS;
use crate::traits::TokenKind;

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// A signed-in user with a fresh token pair.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub theme: Option<String>,
    pub avatar_style: Option<String>,
    pub timezone: Option<String>,
}

/// Fields of `Preferences` a user may set directly.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesUpdate {
    pub notifications: Option<bool>,
    pub timer_sound: Option<bool>,
    pub default_timer_duration: Option<i32>,
    pub animations: Option<bool>,
    pub compact_mode: Option<bool>,
    pub dashboard_layout: Option<String>,
}

impl PreferencesUpdate {
    fn is_empty(&self) -> bool {
        self.notifications.is_none()
            && self.timer_sound.is_none()
            && self.default_timer_duration.is_none()
            && self.animations.is_none()
            && self.compact_mode.is_none()
            && self.dashboard_layout.is_none()
    }
}

fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    Ok(())
}

impl Services {
    /// Creates an account and credits the welcome bonus.
    pub async fn register(&self, registration: Registration) -> Result<AuthSession> {
        let username = required(&registration.username, "username")?;
        let email = required(&registration.email, "email")?.to_lowercase();
        if registration.password.is_empty() {
            return Err(AppError::validation("password is required"));
        }
        if !EMAIL_PATTERN.is_match(&email) {
            return Err(AppError::validation("invalid email format"));
        }
        validate_password(&registration.password)?;

        if self.repos.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("email already registered".into()));
        }
        if self.repos.users.find_by_username(&username).await?.is_some() {
            return Err(AppError::Conflict("username already taken".into()));
        }

        let password_hash = self
            .auth
            .hash_password(&registration.password)
            .map_err(|e| AppError::Internal(format!("{e:#}")))?;

        let mut user = User {
            id: Uuid::now_v7(),
            profile: Profile::for_username(&username),
            username,
            email,
            password_hash,
            is_admin: false,
            is_active: true,
            points: 0,
            level: 1,
            preferences: Preferences::default(),
            created_at: self.clock.now(),
            last_login: None,
        };
        self.repos.users.create_user(user.clone()).await?;

        self.ledger
            .append(NewLedgerEntry::new(
                user.id,
                REGISTRATION_POINTS,
                PointSource::System,
                "Welcome bonus for joining Hooks!",
            ))
            .await?;
        user.points += REGISTRATION_POINTS;

        log::info!("registered user {} ({})", user.username, user.id);
        self.session_for(user)
    }

    /// Signs in by email (case-insensitive) or username.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<AuthSession> {
        let identifier = required(identifier, "identifier")?;
        if password.is_empty() {
            return Err(AppError::validation("password is required"));
        }

        let user = match self.repos.users.find_by_email(&identifier.to_lowercase()).await? {
            Some(user) => Some(user),
            None => self.repos.users.find_by_username(&identifier).await?,
        };
        let Some(mut user) = user else {
            return Err(AppError::Unauthorized("invalid credentials".into()));
        };
        if !self.auth.verify_password(password, &user.password_hash) {
            return Err(AppError::Unauthorized("invalid credentials".into()));
        }
        if !user.is_active {
            return Err(AppError::Unauthorized("account is deactivated".into()));
        }

        user.last_login = Some(self.clock.now());
        self.repos.users.update_user(user.clone()).await?;
        self.session_for(user)
    }

    /// Exchanges a refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String> {
        let user_id = self
            .auth
            .verify_token(refresh_token, TokenKind::Refresh)
            .map_err(|e| AppError::Unauthorized(format!("{e:#}")))?;
        let user = self.user(user_id).await?;
        if !user.is_active {
            return Err(AppError::Unauthorized("account is deactivated".into()));
        }
        self.issue(user.id, TokenKind::Access)
    }

    /// Resolves an access token to its user id.
    pub fn authenticate(&self, access_token: &str) -> Result<Uuid> {
        self.auth
            .verify_token(access_token, TokenKind::Access)
            .map_err(|e| AppError::Unauthorized(format!("{e:#}")))
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<User> {
        self.user(user_id).await
    }

    pub async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<User> {
        let mut user = self.user(user_id).await?;
        let profile = &mut user.profile;
        if let Some(display_name) = update.display_name {
            profile.display_name = required(&display_name, "display_name")?;
        }
        if let Some(bio) = update.bio {
            profile.bio = bio;
        }
        if let Some(theme) = update.theme {
            profile.theme = theme;
        }
        if let Some(avatar_style) = update.avatar_style {
            profile.avatar_style = avatar_style;
        }
        if let Some(timezone) = update.timezone {
            profile.timezone = timezone;
        }
        self.repos.users.update_user(user.clone()).await?;
        Ok(user)
    }

    /// Overwrites only the preference fields present in `update`.
    pub async fn update_preferences(
        &self,
        user_id: Uuid,
        update: PreferencesUpdate,
    ) -> Result<User> {
        if update.is_empty() {
            return Err(AppError::validation("no valid fields to update"));
        }
        if update.default_timer_duration.is_some_and(|d| d <= 0) {
            return Err(AppError::validation("default_timer_duration must be positive"));
        }

        let mut user = self.user(user_id).await?;
        let prefs = &mut user.preferences;
        if let Some(notifications) = update.notifications {
            prefs.notifications = notifications;
        }
        if let Some(timer_sound) = update.timer_sound {
            prefs.timer_sound = timer_sound;
        }
        if let Some(duration) = update.default_timer_duration {
            prefs.default_timer_duration = duration;
        }
        if let Some(animations) = update.animations {
            prefs.animations = animations;
        }
        if let Some(compact_mode) = update.compact_mode {
            prefs.compact_mode = compact_mode;
        }
        if let Some(layout) = update.dashboard_layout {
            prefs.dashboard_layout = layout;
        }
        self.repos.users.update_user(user.clone()).await?;
        Ok(user)
    }

    pub async fn change_password(&self, user_id: Uuid, current: &str, new: &str) -> Result<()> {
        let mut user = self.user(user_id).await?;
        if !self.auth.verify_password(current, &user.password_hash) {
            return Err(AppError::Unauthorized("current password is incorrect".into()));
        }
        validate_password(new)?;
        user.password_hash = self
            .auth
            .hash_password(new)
            .map_err(|e| AppError::Internal(format!("{e:#}")))?;
        self.repos.users.update_user(user).await?;
        Ok(())
    }

    fn session_for(&self, user: User) -> Result<AuthSession> {
        Ok(AuthSession {
            access_token: self.issue(user.id, TokenKind::Access)?,
            refresh_token: self.issue(user.id, TokenKind::Refresh)?,
            user,
        })
    }

    fn issue(&self, user_id: Uuid, kind: TokenKind) -> Result<String> {
        self.auth
            .issue_token(user_id, kind)
            .map_err(|e| AppError::Internal(format!("{e:#}")))
    }
}
