use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const PROVIDER_WAHA: &str = "waha";

/// Locally cached projection of the remote session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlatformStatus {
    Stopped,
    Scanning,
    Working,
    Failed,
}

#[derive(Debug, Error)]
#[error("unknown platform status: {0}")]
pub struct UnknownPlatformStatus(pub String);

impl PlatformStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformStatus::Stopped => "STOPPED",
            PlatformStatus::Scanning => "SCANNING",
            PlatformStatus::Working => "WORKING",
            PlatformStatus::Failed => "FAILED",
        }
    }
}

impl FromStr for PlatformStatus {
    type Err = UnknownPlatformStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STOPPED" => Ok(PlatformStatus::Stopped),
            "SCANNING" => Ok(PlatformStatus::Scanning),
            "WORKING" => Ok(PlatformStatus::Working),
            "FAILED" => Ok(PlatformStatus::Failed),
            other => Err(UnknownPlatformStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for PlatformStatus {
    type Error = UnknownPlatformStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for PlatformStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedPlatform {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub provider: String,
    pub session_id: String,
    #[sqlx(try_from = "String")]
    pub status: PlatformStatus,
    pub agent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConnectedPlatform {
    pub fn new(tenant_id: String, name: String, session_id: String, agent_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id,
            name,
            provider: PROVIDER_WAHA.to_string(),
            session_id,
            status: PlatformStatus::Scanning,
            agent_id,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformSortField {
    Name,
    Status,
    CreatedAt,
    UpdatedAt,
}

impl PlatformSortField {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("name") => Self::Name,
            Some("status") => Self::Status,
            Some("createdAt") | Some("created_at") => Self::CreatedAt,
            _ => Self::UpdatedAt,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Status => "status",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }
}

/// Listing filter. Column names are resolved from closed enums so they are safe to splice into SQL.
#[derive(Debug, Clone)]
pub struct PlatformQuery {
    pub page: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub status: Option<PlatformStatus>,
    pub sort_by: PlatformSortField,
    pub descending: bool,
}

impl PlatformQuery {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;
    /// Highest page whose offset still fits in an `i64` at the largest page size.
    pub const MAX_PAGE: i64 = i64::MAX / Self::MAX_LIMIT;

    pub fn offset(&self) -> i64 {
        (self.page - 1).max(0).saturating_mul(self.limit)
    }

    /// Substring pattern for `LIKE ... ESCAPE '\'`. Wildcards typed by the caller match literally.
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                let mut pattern = String::with_capacity(s.len() + 2);
                pattern.push('%');
                for c in s.chars() {
                    if matches!(c, '\\' | '%' | '_') {
                        pattern.push('\\');
                    }
                    pattern.push(c);
                }
                pattern.push('%');
                pattern
            })
    }

    pub fn order_clause(&self) -> String {
        format!(
            " ORDER BY {} {}",
            self.sort_by.column(),
            if self.descending { "DESC" } else { "ASC" }
        )
    }
}

impl Default for PlatformQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
            search: None,
            status: None,
            sort_by: PlatformSortField::UpdatedAt,
            descending: true,
        }
    }
}
