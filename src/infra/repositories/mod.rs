pub mod sqlite_tenant_repo;
pub mod sqlite_user_repo;
pub mod sqlite_auth_repo;
pub mod sqlite_agent_repo;
pub mod sqlite_platform_repo;

pub mod postgres_tenant_repo;
pub mod postgres_user_repo;
pub mod postgres_auth_repo;
pub mod postgres_agent_repo;
pub mod postgres_platform_repo;
