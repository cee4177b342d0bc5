//! Keeps connected platforms convergent with the remote session service.
//!
//! The `status` column is a cache of remote truth. It is refreshed whenever a
//! status poll gets a definite answer and is never consulted for access
//! decisions: a tenant whose subscription lapsed is reported as stopped
//! without asking the remote service at all.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::domain::models::{
    agent::Agent,
    platform::{ConnectedPlatform, PlatformQuery, PlatformStatus},
    session::{PollOutcome, QrOutcome, RestartOutcome},
    tenant::Tenant,
};
use crate::domain::ports::{AgentRepository, PlatformRepository, RemoteSessionClient, TenantRepository};
use crate::domain::services::session_id::SessionIdStrategy;
use crate::domain::services::session_state::map_poll_outcome;
use crate::error::AppError;

pub const QR_NOT_READY_MESSAGE: &str = "QR code is not ready yet. Please try again in a few seconds.";
const SUBSCRIPTION_INACTIVE_MESSAGE: &str =
    "Your subscription is inactive. Please contact an administrator to reactivate your WhatsApp connections.";

/// A platform row joined with the agent it routes to.
#[derive(Debug, Clone)]
pub struct PlatformRecord {
    pub platform: ConnectedPlatform,
    pub agent: Option<Agent>,
    pub subscription_suspended: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: PlatformStatus,
    pub raw_status: String,
    pub is_connected: bool,
    pub subscription_suspended: bool,
}

impl StatusReport {
    fn suspended() -> Self {
        Self {
            status: PlatformStatus::Stopped,
            raw_status: PlatformStatus::Stopped.as_str().to_string(),
            is_connected: false,
            subscription_suspended: true,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct PlatformChanges {
    pub name: Option<String>,
    /// An empty string unassigns the agent.
    pub agent_id: Option<String>,
}

pub struct PlatformReconciler {
    platforms: Arc<dyn PlatformRepository>,
    tenants: Arc<dyn TenantRepository>,
    agents: Arc<dyn AgentRepository>,
    sessions: Arc<dyn RemoteSessionClient>,
    strategy: SessionIdStrategy,
}

impl PlatformReconciler {
    pub fn new(
        platforms: Arc<dyn PlatformRepository>,
        tenants: Arc<dyn TenantRepository>,
        agents: Arc<dyn AgentRepository>,
        sessions: Arc<dyn RemoteSessionClient>,
        strategy: SessionIdStrategy,
    ) -> Self {
        Self { platforms, tenants, agents, sessions, strategy }
    }

    #[instrument(skip(self, name, agent_id))]
    pub async fn create(
        &self,
        tenant_id: &str,
        name: Option<&str>,
        agent_id: Option<&str>,
    ) -> Result<PlatformRecord, AppError> {
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        let agent_id = agent_id.map(str::trim).filter(|a| !a.is_empty());
        let (Some(name), Some(agent_id)) = (name, agent_id) else {
            return Err(AppError::Validation("Name and agent are required".into()));
        };

        let tenant = self.tenant(tenant_id).await?;
        if !tenant.subscription_active(Utc::now()) {
            return Err(AppError::SubscriptionInactive(SUBSCRIPTION_INACTIVE_MESSAGE.into()));
        }

        let current = self.platforms.count_by_tenant(tenant_id).await?;
        if current >= i64::from(tenant.platform_session_limit) {
            return Err(AppError::QuotaExceeded { current, limit: tenant.platform_session_limit });
        }

        let webhook_url = tenant.configured_webhook()
            .ok_or(AppError::WebhookNotConfigured)?
            .to_string();

        let agent = self.agents.find_by_id(tenant_id, agent_id).await?
            .ok_or(AppError::Validation("Agent not found for this account".into()))?;

        let session_id = self.strategy.session_id_for(tenant_id);
        if self.strategy.is_single_session() {
            self.evict_session_holder(&session_id).await?;
        }

        let platform = ConnectedPlatform::new(
            tenant_id.to_string(),
            name.to_string(),
            session_id.clone(),
            Some(agent.id.clone()),
        );
        let created = self.platforms.create(&platform).await?;

        if let Err(e) = self.sessions.create_and_start(&session_id, &webhook_url).await {
            warn!("Starting remote session {} failed, removing platform {}: {}", session_id, created.id, e);
            if let Err(cleanup) = self.platforms.delete(&created.id).await {
                warn!("Failed to remove platform {} after start failure: {:?}", created.id, cleanup);
            }
            return Err(match e {
                AppError::RemoteServiceUnavailable(_) => e,
                other => AppError::RemoteServiceUnavailable(other.to_string()),
            });
        }

        info!("Created platform {} with session {}", created.id, session_id);
        Ok(PlatformRecord { platform: created, agent: Some(agent), subscription_suspended: false })
    }

    /// Single-session mode: whoever holds the fixed session loses it.
    async fn evict_session_holder(&self, session_id: &str) -> Result<(), AppError> {
        if let Some(existing) = self.platforms.find_by_session_id(session_id).await? {
            info!("Single-session mode: tearing down platform {} holding session {}", existing.id, session_id);
            self.sessions.stop(session_id).await;
            self.platforms.delete(&existing.id).await?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn read_qr(&self, tenant_id: &str, platform_id: &str) -> Result<QrOutcome, AppError> {
        let platform = self.owned(tenant_id, platform_id).await?;
        let tenant = self.tenant(tenant_id).await?;
        if !tenant.subscription_active(Utc::now()) {
            return Err(AppError::SubscriptionInactive(SUBSCRIPTION_INACTIVE_MESSAGE.into()));
        }

        let outcome = self.observe(&platform.session_id).await;
        let ready = matches!(&outcome, PollOutcome::Reported(raw) if raw.qr_may_be_ready());
        if !ready {
            return Ok(QrOutcome::NotReady(QR_NOT_READY_MESSAGE.into()));
        }

        match self.sessions.fetch_qr_image(&platform.session_id).await {
            Ok(Some(image)) => Ok(QrOutcome::Ready(image)),
            Ok(None) => Ok(QrOutcome::NotReady(QR_NOT_READY_MESSAGE.into())),
            Err(e) => {
                warn!("QR fetch for session {} failed: {}", platform.session_id, e);
                Ok(QrOutcome::NotReady(QR_NOT_READY_MESSAGE.into()))
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn read_status(&self, tenant_id: &str, platform_id: &str) -> Result<StatusReport, AppError> {
        let platform = self.owned(tenant_id, platform_id).await?;
        let tenant = self.tenant(tenant_id).await?;
        if !tenant.subscription_active(Utc::now()) {
            return Ok(StatusReport::suspended());
        }

        let outcome = self.observe(&platform.session_id).await;
        let status = map_poll_outcome(&outcome);

        // An unreachable service proves nothing about the session, keep the cache as is.
        let definite = !matches!(outcome, PollOutcome::Unreachable(_));
        if definite && status != platform.status {
            info!("Platform {} status {} -> {}", platform.id, platform.status, status);
            self.platforms.update_status(&platform.id, status).await?;
        }

        Ok(StatusReport {
            status,
            raw_status: outcome.raw_label().to_string(),
            is_connected: status == PlatformStatus::Working,
            subscription_suspended: false,
        })
    }

    pub async fn list(&self, tenant_id: &str, query: &PlatformQuery) -> Result<(Vec<PlatformRecord>, i64), AppError> {
        let tenant = self.tenant(tenant_id).await?;
        let suspended = !tenant.subscription_active(Utc::now());

        let (rows, total) = self.platforms.list(tenant_id, query).await?;

        let mut agents: HashMap<String, Option<Agent>> = HashMap::new();
        let mut records = Vec::with_capacity(rows.len());
        for platform in rows {
            let agent = match &platform.agent_id {
                Some(agent_id) => {
                    if !agents.contains_key(agent_id) {
                        let found = self.agents.find_by_id(tenant_id, agent_id).await?;
                        agents.insert(agent_id.clone(), found);
                    }
                    agents.get(agent_id).cloned().flatten()
                }
                None => None,
            };
            records.push(PlatformRecord { platform, agent, subscription_suspended: suspended });
        }

        if suspended {
            self.suspend_tenant_sessions(tenant_id);
        }

        Ok((records, total))
    }

    pub async fn update(
        &self,
        tenant_id: &str,
        platform_id: &str,
        changes: PlatformChanges,
    ) -> Result<PlatformRecord, AppError> {
        let mut platform = self.owned(tenant_id, platform_id).await?;

        if let Some(name) = changes.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(AppError::Validation("Name cannot be empty".into()));
            }
            platform.name = name.to_string();
        }

        if let Some(agent_id) = changes.agent_id {
            let agent_id = agent_id.trim();
            platform.agent_id = if agent_id.is_empty() {
                None
            } else {
                let agent = self.agents.find_by_id(tenant_id, agent_id).await?
                    .ok_or(AppError::Validation("Agent not found for this account".into()))?;
                Some(agent.id)
            };
        }

        platform.updated_at = Utc::now();
        let updated = self.platforms.update(&platform).await?;
        let agent = match &updated.agent_id {
            Some(agent_id) => self.agents.find_by_id(tenant_id, agent_id).await?,
            None => None,
        };

        info!("Updated platform {}", updated.id);
        Ok(PlatformRecord { platform: updated, agent, subscription_suspended: false })
    }

    /// Remote teardown is attempted first and never blocks removal of the row.
    pub async fn delete(&self, tenant_id: &str, platform_id: &str) -> Result<(), AppError> {
        let platform = self.owned(tenant_id, platform_id).await?;
        self.sessions.stop(&platform.session_id).await;
        self.platforms.delete(&platform.id).await?;
        info!("Deleted platform {} (session {})", platform.id, platform.session_id);
        Ok(())
    }

    /// Reads remote status and, when the session is down, asks for a restart without waiting.
    async fn observe(&self, session_id: &str) -> PollOutcome {
        let outcome = self.sessions.get_status(session_id).await;
        match &outcome {
            PollOutcome::Unreachable(reason) => warn!("Session {} status unknown: {}", session_id, reason),
            _ if outcome.needs_restart() => {
                self.spawn_self_heal(session_id);
            }
            _ => {}
        }
        outcome
    }

    fn spawn_self_heal(&self, session_id: &str) {
        let sessions = self.sessions.clone();
        let session_id = session_id.to_string();
        tokio::spawn(async move {
            if let RestartOutcome::Failed(reason) = sessions.ensure_started(&session_id).await {
                warn!("Auto-restart of session {} failed: {}", session_id, reason);
            }
        });
    }

    fn suspend_tenant_sessions(&self, tenant_id: &str) {
        let platforms = self.platforms.clone();
        let sessions = self.sessions.clone();
        let tenant_id = tenant_id.to_string();
        tokio::spawn(async move {
            match platforms.list_session_ids(&tenant_id).await {
                Ok(session_ids) => {
                    info!("Subscription lapsed for tenant {}, stopping {} sessions", tenant_id, session_ids.len());
                    for session_id in session_ids {
                        sessions.stop(&session_id).await;
                    }
                }
                Err(e) => warn!("Could not load sessions of suspended tenant {}: {:?}", tenant_id, e),
            }
        });
    }

    async fn tenant(&self, tenant_id: &str) -> Result<Tenant, AppError> {
        self.tenants.find_by_id(tenant_id).await?
            .ok_or(AppError::NotFound("Tenant not found".into()))
    }

    async fn owned(&self, tenant_id: &str, platform_id: &str) -> Result<ConnectedPlatform, AppError> {
        self.platforms.find_by_id(tenant_id, platform_id).await?
            .ok_or(AppError::NotFound("Platform not found".into()))
    }
}
