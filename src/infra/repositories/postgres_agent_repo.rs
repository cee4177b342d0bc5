use crate::domain::{models::agent::Agent, ports::AgentRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresAgentRepo {
    pool: PgPool,
}

impl PostgresAgentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AgentRepository for PostgresAgentRepo {
    async fn create(&self, agent: &Agent) -> Result<Agent, AppError> {
        sqlx::query_as::<_, Agent>(
            "INSERT INTO agents (id, tenant_id, name, description, created_at) VALUES ($1, $2, $3, $4, $5) RETURNING *"
        )
            .bind(&agent.id)
            .bind(&agent.tenant_id)
            .bind(&agent.name)
            .bind(&agent.description)
            .bind(agent.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, tenant_id: &str, id: &str) -> Result<Option<Agent>, AppError> {
        sqlx::query_as::<_, Agent>("SELECT * FROM agents WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self, tenant_id: &str) -> Result<Vec<Agent>, AppError> {
        sqlx::query_as::<_, Agent>(
            "SELECT * FROM agents WHERE tenant_id = $1 ORDER BY name ASC"
        )
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
