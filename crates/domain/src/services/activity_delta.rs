//! Conversion of reported cumulative totals into non-negative deltas.

use crate::models::ActivityIngest;

use super::store::StoreError;

/// Key under which the last reported total is tracked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActivityKey {
    pub user_id: i64,
    pub program_id: i64,
    /// Empty when the provider reports no external id.
    pub external_id: String,
}

impl From<&ActivityIngest> for ActivityKey {
    fn from(ingest: &ActivityIngest) -> Self {
        Self {
            user_id: ingest.user_id,
            program_id: ingest.program_id,
            external_id: ingest.external_id.clone().unwrap_or_default(),
        }
    }
}

/// Delta for a newly reported total. The first observation counts in full and
/// a total that went down yields zero.
pub fn compute_delta(last_total: Option<i64>, reported_total: i64) -> i64 {
    match last_total {
        None => reported_total.max(0),
        Some(last) => reported_total.saturating_sub(last).max(0),
    }
}

/// Rejects reports that cannot be ingested.
pub fn validate_ingest(ingest: &ActivityIngest) -> Result<(), StoreError> {
    if ingest.total_time < 0 {
        return Err(StoreError::Invalid(format!(
            "negative total_time {} for program {}",
            ingest.total_time, ingest.program_id
        )));
    }
    if ingest.activity_type.trim().is_empty() {
        return Err(StoreError::Invalid("activity type is empty".to_string()));
    }
    Ok(())
}
