//! User entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub name_first: String,
    pub name_last: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserEntity> for domain::models::User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            username: entity.username,
            email: entity.email,
            name_first: entity.name_first,
            name_last: entity.name_last,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
