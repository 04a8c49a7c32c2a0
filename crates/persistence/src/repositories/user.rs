//! User repository for database operations.

use domain::models::{ExternalIdentity, NewUser};
use sqlx::PgPool;

use crate::entities::{ProviderUserMappingEntity, UserEntity};
use crate::metrics::QueryTimer;

/// Repository for user database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, username, email, name_first, name_last, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Create a user and its provider mapping in one transaction.
    pub async fn create_with_mapping(
        &self,
        user: &NewUser,
        identity: &ExternalIdentity,
    ) -> Result<(UserEntity, ProviderUserMappingEntity), sqlx::Error> {
        let timer = QueryTimer::new("create_user_with_mapping");
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (username, email, name_first, name_last)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, name_first, name_last, created_at, updated_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.name_first)
        .bind(&user.name_last)
        .fetch_one(&mut *tx)
        .await?;

        let mapping = sqlx::query_as::<_, ProviderUserMappingEntity>(
            r#"
            INSERT INTO provider_user_mappings
                (user_id, provider_platform_id, external_user_id, external_username, external_login_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, provider_platform_id, external_user_id,
                      external_username, external_login_id, created_at
            "#,
        )
        .bind(created.id)
        .bind(identity.provider_platform_id)
        .bind(&identity.external_user_id)
        .bind(&identity.external_username)
        .bind(&identity.external_login_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok((created, mapping))
    }
}
