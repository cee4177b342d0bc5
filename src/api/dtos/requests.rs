use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::models::platform::{PlatformQuery, PlatformSortField, PlatformStatus};

#[derive(Deserialize)]
pub struct CreateTenantRequest {
    pub name: String,
    pub slug: String,
}

#[derive(Deserialize)]
pub struct UpdateTenantRequest {
    pub name: Option<String>,
    pub webhook_url: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateSubscriptionRequest {
    pub subscription_expiry: Option<DateTime<Utc>>,
    pub platform_session_limit: Option<i32>,
}

#[derive(Deserialize)]
pub struct CreateAgentRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlatformRequest {
    pub name: Option<String>,
    pub agent_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlatformRequest {
    pub name: Option<String>,
    pub agent_id: Option<String>,
}

/// Raw list parameters. Everything is optional and malformed values fall back to defaults.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlatformListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl PlatformListParams {
    pub fn into_query(self) -> PlatformQuery {
        let page = self.page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1)
            .min(PlatformQuery::MAX_PAGE);

        let limit = self.limit
            .and_then(|l| l.trim().parse::<i64>().ok())
            .filter(|l| *l >= 1)
            .unwrap_or(PlatformQuery::DEFAULT_LIMIT)
            .min(PlatformQuery::MAX_LIMIT);

        let status = self.status
            .as_deref()
            .and_then(|s| s.trim().to_uppercase().parse::<PlatformStatus>().ok());

        let descending = !matches!(self.sort_order.as_deref().map(str::trim), Some(o) if o.eq_ignore_ascii_case("asc"));

        PlatformQuery {
            page,
            limit,
            search: self.search,
            status,
            sort_by: PlatformSortField::parse(self.sort_by.as_deref()),
            descending,
        }
    }
}
