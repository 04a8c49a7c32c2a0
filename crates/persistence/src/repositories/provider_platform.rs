//! Provider platform repository for database operations.

use domain::models::{CreateProviderPlatformRequest, ProviderPlatform};
use sqlx::{PgPool, Postgres, Transaction};

use crate::entities::ProviderPlatformEntity;
use crate::metrics::QueryTimer;

const COLUMNS: &str = "id, name, type, description, base_url, account_id, access_key, state, created_at, updated_at";

/// Repository for provider platform database operations.
#[derive(Clone)]
pub struct ProviderPlatformRepository {
    pool: PgPool,
}

impl ProviderPlatformRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn create(
        &self,
        request: &CreateProviderPlatformRequest,
    ) -> Result<ProviderPlatformEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_provider_platform");
        let query = format!(
            r#"
            INSERT INTO provider_platforms (name, type, description, base_url, account_id, access_key, state)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            COLUMNS
        );
        let result = sqlx::query_as::<_, ProviderPlatformEntity>(&query)
            .bind(&request.name)
            .bind(request.platform_type.as_str())
            .bind(&request.description)
            .bind(request.base_url.trim_end_matches('/'))
            .bind(&request.account_id)
            .bind(&request.access_key)
            .bind(request.state.as_str())
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<ProviderPlatformEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_provider_platform_by_id");
        let query = format!("SELECT {} FROM provider_platforms WHERE id = $1", COLUMNS);
        let result = sqlx::query_as::<_, ProviderPlatformEntity>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Lists platforms ordered by id with the total count.
    pub async fn list(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ProviderPlatformEntity>, i64), sqlx::Error> {
        let timer = QueryTimer::new("list_provider_platforms");
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM provider_platforms")
            .fetch_one(&self.pool)
            .await?;
        let query = format!(
            "SELECT {} FROM provider_platforms ORDER BY id LIMIT $1 OFFSET $2",
            COLUMNS
        );
        let rows = sqlx::query_as::<_, ProviderPlatformEntity>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        timer.record();
        Ok((rows, total))
    }

    pub async fn lock_by_id(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<Option<ProviderPlatformEntity>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM provider_platforms WHERE id = $1 FOR UPDATE",
            COLUMNS
        );
        sqlx::query_as::<_, ProviderPlatformEntity>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    pub async fn write(
        tx: &mut Transaction<'_, Postgres>,
        platform: &ProviderPlatform,
    ) -> Result<ProviderPlatformEntity, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE provider_platforms
            SET name = $2, description = $3, base_url = $4, account_id = $5,
                access_key = $6, state = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        );
        sqlx::query_as::<_, ProviderPlatformEntity>(&query)
            .bind(platform.id)
            .bind(&platform.name)
            .bind(&platform.description)
            .bind(platform.base_url.trim_end_matches('/'))
            .bind(&platform.account_id)
            .bind(&platform.access_key)
            .bind(platform.state.as_str())
            .fetch_one(&mut **tx)
            .await
    }

    /// Removes a platform; its mappings, programs and activity cascade.
    pub async fn delete(&self, id: i64) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_provider_platform");
        let result = sqlx::query("DELETE FROM provider_platforms WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}
