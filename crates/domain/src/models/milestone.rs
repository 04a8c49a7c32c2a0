//! Milestone domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MILESTONE_ASSIGNMENT_SUBMISSION: &str = "assignment_submission";
pub const MILESTONE_QUIZ_SUBMISSION: &str = "quiz_submission";

/// Whether a milestone type counts toward course progress.
pub fn is_progress_milestone(milestone_type: &str) -> bool {
    milestone_type == MILESTONE_ASSIGNMENT_SUBMISSION || milestone_type == MILESTONE_QUIZ_SUBMISSION
}

/// A per-user, per-program progress event.
///
/// Unique on `(program_id, user_id, external_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Milestone {
    pub id: i64,
    pub user_id: i64,
    pub program_id: i64,
    pub external_id: String,
    #[serde(rename = "type")]
    pub milestone_type: String,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMilestone {
    pub user_id: i64,
    pub program_id: i64,
    pub external_id: String,
    pub milestone_type: String,
    pub is_completed: bool,
}

/// Partial update of a milestone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MilestonePatch {
    #[serde(rename = "type")]
    pub milestone_type: Option<String>,
    pub is_completed: Option<bool>,
}

impl MilestonePatch {
    pub fn is_empty(&self) -> bool {
        self.milestone_type.is_none() && self.is_completed.is_none()
    }

    pub fn apply(&self, milestone: &mut Milestone) {
        if let Some(v) = &self.milestone_type {
            milestone.milestone_type = v.clone();
        }
        if let Some(v) = self.is_completed {
            milestone.is_completed = v;
        }
    }
}
