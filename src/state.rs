use std::sync::Arc;
use crate::domain::ports::{
    AgentRepository, AuthRepository, PlatformRepository, TenantRepository, UserRepository,
};
use crate::domain::services::{auth_service::AuthService, platform_reconciler::PlatformReconciler};
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub tenant_repo: Arc<dyn TenantRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub auth_repo: Arc<dyn AuthRepository>,
    pub agent_repo: Arc<dyn AgentRepository>,
    pub platform_repo: Arc<dyn PlatformRepository>,
    pub auth_service: Arc<AuthService>,
    pub reconciler: Arc<PlatformReconciler>,
}
