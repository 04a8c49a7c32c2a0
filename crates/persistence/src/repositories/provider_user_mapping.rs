//! Provider user mapping repository for database operations.

use domain::models::{MappingUpdate, NewProviderUserMapping};
use sqlx::PgPool;

use crate::entities::ProviderUserMappingEntity;
use crate::metrics::QueryTimer;

const COLUMNS: &str = "id, user_id, provider_platform_id, external_user_id, external_username, external_login_id, created_at";

/// Repository for identity mapping database operations.
#[derive(Clone)]
pub struct ProviderUserMappingRepository {
    pool: PgPool,
}

impl ProviderUserMappingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_external(
        &self,
        provider_platform_id: i64,
        external_user_id: &str,
    ) -> Result<Option<ProviderUserMappingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_mapping_by_external");
        let query = format!(
            "SELECT {} FROM provider_user_mappings WHERE provider_platform_id = $1 AND external_user_id = $2",
            COLUMNS
        );
        let result = sqlx::query_as::<_, ProviderUserMappingEntity>(&query)
            .bind(provider_platform_id)
            .bind(external_user_id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn find_for_user(
        &self,
        user_id: i64,
        provider_platform_id: i64,
    ) -> Result<Option<ProviderUserMappingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_mapping_for_user");
        let query = format!(
            "SELECT {} FROM provider_user_mappings WHERE user_id = $1 AND provider_platform_id = $2",
            COLUMNS
        );
        let result = sqlx::query_as::<_, ProviderUserMappingEntity>(&query)
            .bind(user_id)
            .bind(provider_platform_id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn list_for_provider(
        &self,
        provider_platform_id: i64,
    ) -> Result<Vec<ProviderUserMappingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_mappings_for_provider");
        let query = format!(
            "SELECT {} FROM provider_user_mappings WHERE provider_platform_id = $1 ORDER BY id",
            COLUMNS
        );
        let result = sqlx::query_as::<_, ProviderUserMappingEntity>(&query)
            .bind(provider_platform_id)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// All provider logins of one user.
    pub async fn list_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<ProviderUserMappingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_mappings_for_user");
        let query = format!(
            "SELECT {} FROM provider_user_mappings WHERE user_id = $1 ORDER BY provider_platform_id",
            COLUMNS
        );
        let result = sqlx::query_as::<_, ProviderUserMappingEntity>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn create(
        &self,
        mapping: &NewProviderUserMapping,
    ) -> Result<ProviderUserMappingEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_mapping");
        let query = format!(
            r#"
            INSERT INTO provider_user_mappings
                (user_id, provider_platform_id, external_user_id, external_username, external_login_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            COLUMNS
        );
        let result = sqlx::query_as::<_, ProviderUserMappingEntity>(&query)
            .bind(mapping.user_id)
            .bind(mapping.provider_platform_id)
            .bind(&mapping.external_user_id)
            .bind(&mapping.external_username)
            .bind(&mapping.external_login_id)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Updates the set fields of an existing mapping. Returns `None` when no row matches.
    pub async fn update(
        &self,
        user_id: i64,
        provider_platform_id: i64,
        update: &MappingUpdate,
    ) -> Result<Option<ProviderUserMappingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_mapping");
        let query = format!(
            r#"
            UPDATE provider_user_mappings
            SET external_user_id = COALESCE($3, external_user_id),
                external_username = COALESCE($4, external_username),
                external_login_id = COALESCE($5, external_login_id)
            WHERE user_id = $1 AND provider_platform_id = $2
            RETURNING {}
            "#,
            COLUMNS
        );
        let result = sqlx::query_as::<_, ProviderUserMappingEntity>(&query)
            .bind(user_id)
            .bind(provider_platform_id)
            .bind(&update.external_user_id)
            .bind(&update.external_username)
            .bind(&update.external_login_id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Removes the link between a user and a provider. Returns the number of rows deleted.
    pub async fn delete(&self, user_id: i64, provider_platform_id: i64) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_mapping");
        let result = sqlx::query(
            r#"
            DELETE FROM provider_user_mappings
            WHERE user_id = $1 AND provider_platform_id = $2
            "#,
        )
        .bind(user_id)
        .bind(provider_platform_id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}
