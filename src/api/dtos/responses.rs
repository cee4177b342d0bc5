use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::models::platform::PlatformStatus;
use crate::domain::services::platform_reconciler::{PlatformRecord, StatusReport};

#[derive(Serialize)]
pub struct TenantCreatedResponse {
    pub tenant_id: String,
    pub admin_username: String,
    pub admin_secret: String,
}

#[derive(Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct AgentSummary {
    pub id: String,
    pub name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformResponse {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub session_id: String,
    pub status: PlatformStatus,
    pub agent_id: Option<String>,
    pub agent: Option<AgentSummary>,
    pub subscription_suspended: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PlatformRecord> for PlatformResponse {
    fn from(record: PlatformRecord) -> Self {
        let PlatformRecord { platform, agent, subscription_suspended } = record;
        Self {
            id: platform.id,
            name: platform.name,
            provider: platform.provider,
            session_id: platform.session_id,
            status: platform.status,
            agent_id: platform.agent_id,
            agent: agent.map(|a| AgentSummary { id: a.id, name: a.name }),
            subscription_suspended,
            created_at: platform.created_at,
            updated_at: platform.updated_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self { page, limit, total, total_pages }
    }
}

#[derive(Serialize)]
pub struct PlatformListResponse {
    pub data: Vec<PlatformResponse>,
    pub pagination: Pagination,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: PlatformStatus,
    pub raw_status: String,
    pub is_connected: bool,
    pub subscription_suspended: bool,
}

impl From<StatusReport> for StatusResponse {
    fn from(report: StatusReport) -> Self {
        Self {
            status: report.status,
            raw_status: report.raw_status,
            is_connected: report.is_connected,
            subscription_suspended: report.subscription_suspended,
        }
    }
}

#[derive(Serialize)]
pub struct QrResponse {
    pub qr: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}
