//! Internal user domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Internal user record owned by the data store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub name_first: String,
    pub name_last: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to create a user during import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub name_first: String,
    pub name_last: String,
}
