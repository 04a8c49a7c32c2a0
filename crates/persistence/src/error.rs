//! Mapping of sqlx errors onto store errors.

use domain::services::StoreError;

/// Converts a database error, mapping constraint violations to their meaning.
pub fn store_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::RowNotFound => StoreError::NotFound("Record".to_string()),
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some("23505") => StoreError::Conflict(db_err.message().to_string()),
            Some("23503") => StoreError::NotFound(format!(
                "Referenced record ({})",
                db_err.constraint().unwrap_or("foreign key")
            )),
            Some("23514") | Some("22001") => StoreError::Invalid(db_err.message().to_string()),
            _ => StoreError::Database(err.to_string()),
        },
        _ => StoreError::Database(err.to_string()),
    }
}
