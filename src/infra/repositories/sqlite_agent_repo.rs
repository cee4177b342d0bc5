use crate::domain::{models::agent::Agent, ports::AgentRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteAgentRepo {
    pool: SqlitePool,
}

impl SqliteAgentRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AgentRepository for SqliteAgentRepo {
    async fn create(&self, agent: &Agent) -> Result<Agent, AppError> {
        sqlx::query_as::<_, Agent>(
            "INSERT INTO agents (id, tenant_id, name, description, created_at) VALUES (?, ?, ?, ?, ?) RETURNING *"
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
        sqlx::query_as::<_, Agent>("SELECT * FROM agents WHERE id = ? AND tenant_id = ?")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self, tenant_id: &str) -> Result<Vec<Agent>, AppError> {
        sqlx::query_as::<_, Agent>(
            "SELECT * FROM agents WHERE tenant_id = ? ORDER BY name ASC"
        )
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
