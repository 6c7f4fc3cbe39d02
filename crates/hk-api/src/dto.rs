//! Request bodies and query strings that have no direct counterpart in `hk_core`.

use std::str::FromStr;

use hk_core::services::quotes::VerifyAction;
use hk_core::{AppError, PageRequest};
use serde::Deserialize;

pub const DEFAULT_DAYS: u32 = 30;
pub const DEFAULT_LEADERBOARD_LIMIT: u32 = 10;

fn page_request(page: Option<u32>, limit: Option<u32>) -> Result<PageRequest, AppError> {
    let default = PageRequest::default();
    PageRequest::new(page.unwrap_or(default.page), limit.unwrap_or(default.limit))
}

/// Empty strings count as "no filter".
fn parse_filter<T: FromStr<Err = AppError>>(raw: Option<&str>) -> Result<Option<T>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some),
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "email", alias = "username")]
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BookQuoteRequest {
    pub text: String,
    pub page: String,
    pub context: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TakeawayRequest {
    pub takeaway: String,
    pub page_reference: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub action: VerifyAction,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserSearchQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl UserSearchQuery {
    pub fn page(&self) -> Result<PageRequest, AppError> {
        page_request(self.page, self.limit)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct BookListQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl BookListQuery {
    pub fn status(&self) -> Result<Option<hk_core::BookStatus>, AppError> {
        parse_filter(self.status.as_deref())
    }

    pub fn page(&self) -> Result<PageRequest, AppError> {
        page_request(self.page, self.limit)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    pub category: Option<String>,
    pub days: Option<u32>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl TaskQuery {
    pub fn category(&self) -> Option<String> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
    }

    pub fn days(&self) -> u32 {
        self.days.unwrap_or(DEFAULT_DAYS)
    }

    pub fn page(&self) -> Result<PageRequest, AppError> {
        page_request(self.page, self.limit)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub source: Option<String>,
    pub days: Option<u32>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl HistoryQuery {
    pub fn source(&self) -> Result<Option<hk_core::PointSource>, AppError> {
        parse_filter(self.source.as_deref())
    }

    pub fn days(&self) -> u32 {
        self.days.unwrap_or(DEFAULT_DAYS)
    }

    pub fn page(&self) -> Result<PageRequest, AppError> {
        page_request(self.page, self.limit)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub category: Option<String>,
    pub limit: Option<u32>,
}

impl LeaderboardQuery {
    pub fn category(&self) -> Result<hk_core::services::rewards::LeaderboardCategory, AppError> {
        Ok(parse_filter(self.category.as_deref())?.unwrap_or_default())
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmissionQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl SubmissionQuery {
    pub fn status(&self) -> Result<Option<hk_core::QuoteStatus>, AppError> {
        parse_filter(self.status.as_deref())
    }

    pub fn page(&self) -> Result<PageRequest, AppError> {
        page_request(self.page, self.limit)
    }
}
