//! Per-user dashboard assembly.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::models::{
    CurrentEnrollment, EnrollmentActivityRow, RecentProgram, RecentProgramCandidate,
    UserDashboard,
};

use super::store::{DashboardStore, StoreError};

/// Maximum number of recent programs shown.
pub const RECENT_PROGRAM_LIMIT: usize = 3;

/// Default cap on zero-time enrollments listed when the user had no recent activity.
pub const DEFAULT_ENROLLMENT_FALLBACK_CAP: usize = 7;

/// Length of the enrollment and weekly activity window.
pub const ACTIVITY_WINDOW_DAYS: i64 = 7;

/// Completed progress milestones as a percentage of the program total, capped at 100.
pub fn course_progress(completed: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (completed.max(0) as f64 * 100.0 / total as f64).min(100.0)
}

/// Orders candidates by most recent completed milestone and keeps the top three.
/// Candidates without completed milestones go last in their given order.
pub fn rank_recent_programs(mut candidates: Vec<RecentProgramCandidate>) -> Vec<RecentProgram> {
    candidates.sort_by(|a, b| b.last_completed_at.cmp(&a.last_completed_at));
    candidates
        .into_iter()
        .take(RECENT_PROGRAM_LIMIT)
        .map(|c| RecentProgram {
            course_progress: course_progress(c.completed_milestones, c.total_progress_milestones),
            program_id: c.program_id,
            name: c.name,
            alt_name: c.alt_name,
            thumbnail_url: c.thumbnail_url,
            external_url: c.external_url,
            provider_platform_name: c.provider_platform_name,
        })
        .collect()
}

/// Sums time per program, one entry per program in first-seen order.
pub fn aggregate_enrollments(rows: Vec<EnrollmentActivityRow>) -> Vec<CurrentEnrollment> {
    let mut index: HashMap<i64, usize> = HashMap::new();
    let mut enrollments: Vec<CurrentEnrollment> = Vec::new();

    for row in rows {
        match index.get(&row.program_id) {
            Some(&i) => enrollments[i].total_activity_time += row.time_delta,
            None => {
                index.insert(row.program_id, enrollments.len());
                enrollments.push(CurrentEnrollment {
                    program_id: row.program_id,
                    name: row.name,
                    alt_name: row.alt_name,
                    thumbnail_url: row.thumbnail_url,
                    external_url: row.external_url,
                    provider_platform_name: row.provider_platform_name,
                    total_activity_time: row.time_delta,
                });
            }
        }
    }
    enrollments
}

/// Builds the dashboard for one user.
///
/// A failed recent-program query yields an empty list. Enrollment and weekly
/// activity failures fail the whole request.
pub async fn assemble_dashboard(
    store: &dyn DashboardStore,
    user_id: i64,
    now: DateTime<Utc>,
    fallback_cap: usize,
) -> Result<UserDashboard, StoreError> {
    let since = now - Duration::days(ACTIVITY_WINDOW_DAYS);

    let recent_programs = match store.recent_program_candidates(user_id).await {
        Ok(candidates) => rank_recent_programs(candidates),
        Err(e) => {
            tracing::warn!(user_id, error = %e, "Recent programs unavailable, returning none");
            Vec::new()
        }
    };

    let mut enrollments = aggregate_enrollments(store.enrollment_activity(user_id, since).await?);
    if enrollments.is_empty() {
        let programs = store.milestone_programs(user_id, fallback_cap).await?;
        tracing::debug!(user_id, count = programs.len(), "No recent enrollments, using milestone programs");
        enrollments = programs
            .into_iter()
            .take(fallback_cap)
            .map(CurrentEnrollment::from)
            .collect();
    }

    let week_activity = store.weekly_activity(user_id, since).await?;

    Ok(UserDashboard {
        recent_programs,
        enrollments,
        week_activity,
    })
}
