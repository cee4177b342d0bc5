use crate::domain::{
    models::platform::{ConnectedPlatform, PlatformQuery, PlatformStatus},
    ports::PlatformRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

pub struct SqlitePlatformRepo {
    pool: SqlitePool,
}

impl SqlitePlatformRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn push_filters(
    builder: &mut QueryBuilder<'_, Sqlite>,
    tenant_id: &str,
    query: &PlatformQuery,
) {
    builder.push(" WHERE tenant_id = ").push_bind(tenant_id.to_string());

    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }

    if let Some(pattern) = query.search_pattern() {
        builder
            .push(" AND (name LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR session_id LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

#[async_trait]
impl PlatformRepository for SqlitePlatformRepo {
    async fn create(&self, platform: &ConnectedPlatform) -> Result<ConnectedPlatform, AppError> {
        sqlx::query_as::<_, ConnectedPlatform>(
            r#"INSERT INTO connected_platforms (id, tenant_id, name, provider, session_id, status, agent_id, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
               RETURNING *"#
        )
            .bind(&platform.id)
            .bind(&platform.tenant_id)
            .bind(&platform.name)
            .bind(&platform.provider)
            .bind(&platform.session_id)
            .bind(platform.status.as_str())
            .bind(&platform.agent_id)
            .bind(platform.created_at)
            .bind(platform.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, tenant_id: &str, id: &str) -> Result<Option<ConnectedPlatform>, AppError> {
        sqlx::query_as::<_, ConnectedPlatform>(
            "SELECT * FROM connected_platforms WHERE id = ? AND tenant_id = ?"
        )
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_session_id(&self, session_id: &str) -> Result<Option<ConnectedPlatform>, AppError> {
        sqlx::query_as::<_, ConnectedPlatform>(
            "SELECT * FROM connected_platforms WHERE session_id = ?"
        )
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list(&self, tenant_id: &str, query: &PlatformQuery) -> Result<(Vec<ConnectedPlatform>, i64), AppError> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM connected_platforms");
        push_filters(&mut count, tenant_id, query);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        let mut select = QueryBuilder::<Sqlite>::new("SELECT * FROM connected_platforms");
        push_filters(&mut select, tenant_id, query);
        select.push(query.order_clause());
        select.push(" LIMIT ").push_bind(query.limit);
        select.push(" OFFSET ").push_bind(query.offset());

        let rows = select
            .build_query_as::<ConnectedPlatform>()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok((rows, total))
    }

    async fn list_session_ids(&self, tenant_id: &str) -> Result<Vec<String>, AppError> {
        sqlx::query_scalar::<_, String>(
            "SELECT session_id FROM connected_platforms WHERE tenant_id = ?"
        )
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn count_by_tenant(&self, tenant_id: &str) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM connected_platforms WHERE tenant_id = ?"
        )
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, platform: &ConnectedPlatform) -> Result<ConnectedPlatform, AppError> {
        sqlx::query_as::<_, ConnectedPlatform>(
            "UPDATE connected_platforms SET name=?, agent_id=?, updated_at=? WHERE id=? AND tenant_id=? RETURNING *"
        )
            .bind(&platform.name)
            .bind(&platform.agent_id)
            .bind(platform.updated_at)
            .bind(&platform.id)
            .bind(&platform.tenant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Platform not found".into()))
    }

    async fn update_status(&self, id: &str, status: PlatformStatus) -> Result<(), AppError> {
        sqlx::query("UPDATE connected_platforms SET status=?, updated_at=? WHERE id=?")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM connected_platforms WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Platform not found".into()));
        }
        Ok(())
    }
}
