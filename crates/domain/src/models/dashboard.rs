//! Per-user dashboard models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A program the user is working through, with course progress.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecentProgram {
    pub program_id: i64,
    pub name: String,
    pub alt_name: String,
    pub thumbnail_url: String,
    pub external_url: String,
    pub provider_platform_name: String,
    /// Percentage of progress milestones completed, 0-100.
    pub course_progress: f64,
}

/// A program with time spent over the last seven days.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentEnrollment {
    pub program_id: i64,
    pub name: String,
    pub alt_name: String,
    pub thumbnail_url: String,
    pub external_url: String,
    pub provider_platform_name: String,
    pub total_activity_time: i64,
}

/// Total time across all programs for one day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeeklyActivity {
    pub date: NaiveDate,
    pub total_time: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserDashboard {
    pub recent_programs: Vec<RecentProgram>,
    pub enrollments: Vec<CurrentEnrollment>,
    pub week_activity: Vec<WeeklyActivity>,
}

/// Store row for a program the user has activity in and no outcome for.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentProgramCandidate {
    pub program_id: i64,
    pub name: String,
    pub alt_name: String,
    pub thumbnail_url: String,
    pub external_url: String,
    pub provider_platform_name: String,
    pub total_progress_milestones: i64,
    /// Completed assignment/quiz submissions.
    pub completed_milestones: i64,
    /// Most recent completed progress milestone, if any.
    pub last_completed_at: Option<DateTime<Utc>>,
}

/// Store row for one activity event in the enrollment window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentActivityRow {
    pub program_id: i64,
    pub name: String,
    pub alt_name: String,
    pub thumbnail_url: String,
    pub external_url: String,
    pub provider_platform_name: String,
    pub time_delta: i64,
}

/// Store row for a program the user has any milestone in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrolledProgram {
    pub program_id: i64,
    pub name: String,
    pub alt_name: String,
    pub thumbnail_url: String,
    pub external_url: String,
    pub provider_platform_name: String,
}

impl From<EnrolledProgram> for CurrentEnrollment {
    fn from(p: EnrolledProgram) -> Self {
        Self {
            program_id: p.program_id,
            name: p.name,
            alt_name: p.alt_name,
            thumbnail_url: p.thumbnail_url,
            external_url: p.external_url,
            provider_platform_name: p.provider_platform_name,
            total_activity_time: 0,
        }
    }
}
