use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub const TIER_CUSTOMER: &str = "customer";
pub const TIER_ADMIN: &str = "admin";

pub const MIN_SESSION_LIMIT: i32 = 1;
pub const MAX_SESSION_LIMIT: i32 = 10;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub tier: String,
    pub platform_session_limit: i32,
    pub subscription_expiry: Option<DateTime<Utc>>,
    /// Destination for inbound WhatsApp events (the n8n workflow webhook).
    pub webhook_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    pub fn new(name: String, slug: String, session_limit: i32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            slug,
            tier: TIER_CUSTOMER.to_string(),
            platform_session_limit: session_limit.clamp(MIN_SESSION_LIMIT, MAX_SESSION_LIMIT),
            subscription_expiry: None,
            webhook_url: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_admin_tier(&self) -> bool {
        self.tier == TIER_ADMIN
    }

    /// Only the customer tier is gated. A customer without an expiry has never been activated.
    pub fn subscription_active(&self, now: DateTime<Utc>) -> bool {
        if self.tier != TIER_CUSTOMER {
            return true;
        }
        matches!(self.subscription_expiry, Some(expiry) if expiry > now)
    }

    pub fn configured_webhook(&self) -> Option<&str> {
        self.webhook_url.as_deref().map(str::trim).filter(|url| !url.is_empty())
    }
}
