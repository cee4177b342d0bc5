use crate::domain::models::{
    tenant::Tenant, user::User, agent::Agent, auth::RefreshTokenRecord,
    platform::{ConnectedPlatform, PlatformQuery, PlatformStatus},
    session::{SessionInfo, PollOutcome, RestartOutcome},
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn create(&self, tenant: &Tenant) -> Result<Tenant, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Tenant>, AppError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>, AppError>;
    async fn update(&self, tenant: &Tenant) -> Result<Tenant, AppError>;
    async fn update_subscription(&self, id: &str, expiry: Option<DateTime<Utc>>, session_limit: i32) -> Result<Tenant, AppError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_username(&self, tenant_id: &str, username: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, tenant_id: &str, id: &str) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn create_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), AppError>;
    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AppError>;
    /// Atomically replaces a refresh token with its successor. `Unauthorized` if it was already used.
    async fn rotate_refresh_token(&self, old_hash: &str, next: &RefreshTokenRecord) -> Result<(), AppError>;
    async fn delete_refresh_family(&self, family_id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait AgentRepository: Send + Sync {
    async fn create(&self, agent: &Agent) -> Result<Agent, AppError>;
    async fn find_by_id(&self, tenant_id: &str, id: &str) -> Result<Option<Agent>, AppError>;
    async fn list(&self, tenant_id: &str) -> Result<Vec<Agent>, AppError>;
}

/// Persistence for connected platforms. `session_id` is unique across all tenants.
#[async_trait]
pub trait PlatformRepository: Send + Sync {
    async fn create(&self, platform: &ConnectedPlatform) -> Result<ConnectedPlatform, AppError>;
    async fn find_by_id(&self, tenant_id: &str, id: &str) -> Result<Option<ConnectedPlatform>, AppError>;
    async fn find_by_session_id(&self, session_id: &str) -> Result<Option<ConnectedPlatform>, AppError>;
    async fn list(&self, tenant_id: &str, query: &PlatformQuery) -> Result<(Vec<ConnectedPlatform>, i64), AppError>;
    async fn list_session_ids(&self, tenant_id: &str) -> Result<Vec<String>, AppError>;
    async fn count_by_tenant(&self, tenant_id: &str) -> Result<i64, AppError>;
    async fn update(&self, platform: &ConnectedPlatform) -> Result<ConnectedPlatform, AppError>;
    async fn update_status(&self, id: &str, status: PlatformStatus) -> Result<(), AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

/// Adapter over the remote WhatsApp session service.
#[async_trait]
pub trait RemoteSessionClient: Send + Sync {
    /// `None` when the remote service does not know the session.
    async fn get_session(&self, session_id: &str) -> Result<Option<SessionInfo>, AppError>;

    /// Creates the session if needed and starts it. Starting an already running session succeeds.
    async fn create_and_start(&self, session_id: &str, webhook_url: &str) -> Result<(), AppError>;

    /// `Ok(None)` while the QR element is not rendered yet.
    async fn fetch_qr_image(&self, session_id: &str) -> Result<Option<String>, AppError>;

    /// Pure read, never fails.
    async fn get_status(&self, session_id: &str) -> PollOutcome;

    async fn ensure_started(&self, session_id: &str) -> RestartOutcome;

    /// Best effort. Failures are logged by the implementation.
    async fn stop(&self, session_id: &str);
}
