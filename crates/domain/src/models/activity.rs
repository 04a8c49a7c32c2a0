//! Activity domain models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// An ingested usage event. Rows are insert-only and `time_delta >= 0`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Activity {
    pub id: i64,
    pub user_id: i64,
    pub program_id: i64,
    #[serde(rename = "type")]
    pub activity_type: String,
    /// Cumulative total reported by the provider at ingestion time, in seconds.
    pub total_time: i64,
    /// Increase over the previous reported total for the same key, in seconds.
    pub time_delta: i64,
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A reported cumulative total awaiting delta ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityIngest {
    pub user_id: i64,
    pub program_id: i64,
    pub activity_type: String,
    pub total_time: i64,
    pub external_id: Option<String>,
}

/// Request body for manual ingestion of a reported total.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateActivityRequest {
    pub program_id: i64,

    #[serde(rename = "type", default = "default_activity_type")]
    #[validate(length(min = 1, max = 64, message = "type must be 1-64 characters"))]
    pub activity_type: String,

    #[validate(range(min = 0, message = "total_time cannot be negative"))]
    pub total_time: i64,

    pub external_id: Option<String>,
}

fn default_activity_type() -> String {
    "interaction".to_string()
}

impl CreateActivityRequest {
    pub fn into_ingest(self, user_id: i64) -> ActivityIngest {
        ActivityIngest {
            user_id,
            program_id: self.program_id,
            activity_type: self.activity_type,
            total_time: self.total_time,
            external_id: self.external_id.filter(|s| !s.is_empty()),
        }
    }
}

/// Query for the daily activity view. No year means the trailing 365 days.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct DailyActivityQuery {
    #[validate(range(min = 1970, max = 9999, message = "year is out of range"))]
    pub year: Option<i32>,
}

/// One day of activity with its quartile rank among the active days of the range.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub total_time: i64,
    pub quartile: u8,
    pub activities: Vec<Activity>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_activity_request_defaults() {
        let req: CreateActivityRequest =
            serde_json::from_str(r#"{"program_id":4,"total_time":120,"external_id":""}"#).unwrap();
        assert_eq!(req.activity_type, "interaction");
        let ingest = req.into_ingest(9);
        assert_eq!(ingest.user_id, 9);
        assert_eq!(ingest.external_id, None);
    }

    #[test]
    fn test_create_activity_request_rejects_negative_total() {
        let req: CreateActivityRequest =
            serde_json::from_str(r#"{"program_id":4,"total_time":-5}"#).unwrap();
        assert!(req.validate().is_err());
    }
}
