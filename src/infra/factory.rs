use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::{info, warn};
use tracing::log::LevelFilter;
use argon2::{password_hash::SaltString, Argon2, PasswordHasher};

use crate::config::Config;
use crate::state::AppState;
use crate::domain::models::{tenant::{Tenant, TIER_ADMIN, MAX_SESSION_LIMIT}, user::User};
use crate::domain::ports::{
    AgentRepository, AuthRepository, PlatformRepository, RemoteSessionClient, TenantRepository, UserRepository,
};
use crate::domain::services::{auth_service::AuthService, platform_reconciler::PlatformReconciler};
use crate::error::AppError;
use crate::infra::waha::waha_client::WahaClient;
use crate::infra::repositories::{
    postgres_tenant_repo::PostgresTenantRepo, postgres_user_repo::PostgresUserRepo,
    postgres_auth_repo::PostgresAuthRepo, postgres_agent_repo::PostgresAgentRepo,
    postgres_platform_repo::PostgresPlatformRepo,
    sqlite_tenant_repo::SqliteTenantRepo, sqlite_user_repo::SqliteUserRepo,
    sqlite_auth_repo::SqliteAuthRepo, sqlite_agent_repo::SqliteAgentRepo,
    sqlite_platform_repo::SqlitePlatformRepo,
};

pub const ADMIN_TENANT_SLUG: &str = "platform-admin";

pub struct Repositories {
    pub tenant_repo: Arc<dyn TenantRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub auth_repo: Arc<dyn AuthRepository>,
    pub agent_repo: Arc<dyn AgentRepository>,
    pub platform_repo: Arc<dyn PlatformRepository>,
}

impl Repositories {
    pub fn sqlite(pool: &SqlitePool) -> Self {
        Self {
            tenant_repo: Arc::new(SqliteTenantRepo::new(pool.clone())),
            user_repo: Arc::new(SqliteUserRepo::new(pool.clone())),
            auth_repo: Arc::new(SqliteAuthRepo::new(pool.clone())),
            agent_repo: Arc::new(SqliteAgentRepo::new(pool.clone())),
            platform_repo: Arc::new(SqlitePlatformRepo::new(pool.clone())),
        }
    }

    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            tenant_repo: Arc::new(PostgresTenantRepo::new(pool.clone())),
            user_repo: Arc::new(PostgresUserRepo::new(pool.clone())),
            auth_repo: Arc::new(PostgresAuthRepo::new(pool.clone())),
            agent_repo: Arc::new(PostgresAgentRepo::new(pool.clone())),
            platform_repo: Arc::new(PostgresPlatformRepo::new(pool.clone())),
        }
    }
}

/// Wires repositories and the remote session client into the shared state.
pub fn assemble_state(config: &Config, repos: Repositories, session_client: Arc<dyn RemoteSessionClient>) -> AppState {
    let auth_service = Arc::new(AuthService::new(repos.auth_repo.clone(), config.clone()));
    let reconciler = Arc::new(PlatformReconciler::new(
        repos.platform_repo.clone(),
        repos.tenant_repo.clone(),
        repos.agent_repo.clone(),
        session_client,
        config.session_id_strategy(),
    ));

    AppState {
        config: config.clone(),
        tenant_repo: repos.tenant_repo,
        user_repo: repos.user_repo,
        auth_repo: repos.auth_repo,
        agent_repo: repos.agent_repo,
        platform_repo: repos.platform_repo,
        auth_service,
        reconciler,
    }
}

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;
    let session_client: Arc<dyn RemoteSessionClient> = Arc::new(WahaClient::new(
        config.waha_base_url.clone(),
        config.waha_api_key.clone(),
        Duration::from_secs(config.waha_timeout_secs),
    ));

    info!(
        "Remote session service at {} ({} mode)",
        config.waha_base_url,
        if config.session_id_strategy().is_single_session() { "single-session" } else { "per-tenant" }
    );

    let repos = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;
        Repositories::postgres(&pool)
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;
        Repositories::sqlite(&pool)
    };

    let state = assemble_state(config, repos, session_client);

    if let Some(password) = &config.bootstrap_admin_password
        && let Err(e) = ensure_admin_tenant(&state, password).await {
        warn!("Could not bootstrap the platform admin tenant: {}", e);
    }

    state
}

/// Creates the operator tenant that manages subscriptions, once.
pub async fn ensure_admin_tenant(state: &AppState, password: &str) -> Result<(), AppError> {
    if state.tenant_repo.find_by_slug(ADMIN_TENANT_SLUG).await?.is_some() {
        return Ok(());
    }

    let mut tenant = Tenant::new("Platform Admin".to_string(), ADMIN_TENANT_SLUG.to_string(), MAX_SESSION_LIMIT);
    tenant.tier = TIER_ADMIN.to_string();
    let tenant = state.tenant_repo.create(&tenant).await?;

    let salt = SaltString::generate(&mut rand::thread_rng());
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AppError::Internal)?
        .to_string();

    state.user_repo.create(&User::admin(tenant.id.clone(), "admin".to_string(), password_hash)).await?;
    info!("Bootstrapped platform admin tenant {}", tenant.id);
    Ok(())
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
