//! Daily activity buckets with quartile ranking.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::models::{Activity, DailyActivity};

use super::store::{ActivityStore, StoreError};

/// Quartile (1-4) of the day at `rank` among `n` days sorted by ascending total.
pub fn quartile_for_rank(rank: usize, n: usize) -> u8 {
    if rank < n / 4 {
        1
    } else if rank < n / 2 {
        2
    } else if rank < 3 * n / 4 {
        3
    } else {
        4
    }
}

/// Groups activity rows into days, ranks the days by total time and returns
/// them in date order.
///
/// Ties in total time keep the order in which the days were first seen.
pub fn aggregate_daily(activities: Vec<Activity>) -> Vec<DailyActivity> {
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();
    let mut days: Vec<DailyActivity> = Vec::new();

    for activity in activities {
        let date = activity.created_at.date_naive();
        match index.get(&date) {
            Some(&i) => {
                days[i].total_time += activity.time_delta;
                days[i].activities.push(activity);
            }
            None => {
                index.insert(date, days.len());
                days.push(DailyActivity {
                    date,
                    total_time: activity.time_delta,
                    quartile: 0,
                    activities: vec![activity],
                });
            }
        }
    }

    // sort_by_key is stable
    days.sort_by_key(|d| d.total_time);
    let n = days.len();
    for (rank, day) in days.iter_mut().enumerate() {
        day.quartile = quartile_for_rank(rank, n);
    }
    days.sort_by_key(|d| d.date);
    days
}

/// Query window for a calendar year, or the trailing 365 days through `now`.
pub fn daily_range(
    year: Option<i32>,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), StoreError> {
    match year {
        Some(year) => {
            let start = start_of_day(NaiveDate::from_ymd_opt(year, 1, 1))
                .ok_or_else(|| StoreError::Invalid(format!("year {} is out of range", year)))?;
            let next = start_of_day(NaiveDate::from_ymd_opt(year + 1, 1, 1))
                .ok_or_else(|| StoreError::Invalid(format!("year {} is out of range", year)))?;
            Ok((start, next - Duration::seconds(1)))
        }
        None => {
            let start = start_of_day(Some(now.date_naive() - Duration::days(365)))
                .ok_or_else(|| StoreError::Invalid("date range is out of range".to_string()))?;
            Ok((start, now))
        }
    }
}

fn start_of_day(date: Option<NaiveDate>) -> Option<DateTime<Utc>> {
    let naive = date?.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Daily buckets for one user over a year or the trailing 365 days.
pub async fn daily_activity(
    store: &dyn ActivityStore,
    user_id: i64,
    year: Option<i32>,
    now: DateTime<Utc>,
) -> Result<Vec<DailyActivity>, StoreError> {
    let (from, to) = daily_range(year, now)?;
    let activities = store.activities_between(user_id, from, to).await?;
    tracing::debug!(user_id, rows = activities.len(), "Aggregating daily activity");
    Ok(aggregate_daily(activities))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(id: i64, day: u32, delta: i64) -> Activity {
        Activity {
            id,
            user_id: 1,
            program_id: 1,
            activity_type: "interaction".to_string(),
            total_time: delta,
            time_delta: delta,
            external_id: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, day, 10, id as u32 % 60, 0).unwrap(),
        }
    }

    #[test]
    fn test_empty_input_yields_no_days() {
        assert!(aggregate_daily(Vec::new()).is_empty());
    }

    #[test]
    fn test_groups_by_day_and_sums_deltas() {
        let days = aggregate_daily(vec![
            activity(1, 2, 30),
            activity(2, 1, 10),
            activity(3, 2, 5),
        ]);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(days[0].total_time, 10);
        assert_eq!(days[1].total_time, 35);
        assert_eq!(days[1].activities.len(), 2);
    }

    #[test]
    fn test_quartile_partition_sizes() {
        for n in 0..40usize {
            let mut sizes = [0usize; 4];
            for rank in 0..n {
                sizes[quartile_for_rank(rank, n) as usize - 1] += 1;
            }
            assert_eq!(sizes[0], n / 4);
            assert_eq!(sizes[1], n / 2 - n / 4);
            assert_eq!(sizes[2], 3 * n / 4 - n / 2);
            assert_eq!(sizes[3], n - 3 * n / 4);
        }
    }

    #[test]
    fn test_two_days_rank_low_and_high() {
        // 100 on day one, 50 on day two
        let days = aggregate_daily(vec![activity(1, 1, 100), activity(2, 2, 50)]);
        assert_eq!(days[0].total_time, 100);
        assert_eq!(days[0].quartile, 4);
        assert_eq!(days[1].total_time, 50);
        assert_eq!(days[1].quartile, 2);
    }

    #[test]
    fn test_eight_days_quartiles_follow_totals() {
        let totals = [80, 10, 70, 20, 60, 30, 50, 40];
        let rows = totals
            .iter()
            .enumerate()
            .map(|(i, &t)| activity(i as i64 + 1, i as u32 + 1, t))
            .collect();
        let days = aggregate_daily(rows);
        let quartiles: Vec<u8> = days.iter().map(|d| d.quartile).collect();
        assert_eq!(quartiles, vec![4, 1, 4, 1, 3, 2, 3, 2]);
        assert!(days.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        // four days with equal totals: first seen gets the lowest rank
        let days = aggregate_daily(vec![
            activity(1, 4, 10),
            activity(2, 3, 10),
            activity(3, 2, 10),
            activity(4, 1, 10),
        ]);
        let by_day: Vec<(u32, u8)> = days
            .iter()
            .map(|d| (chrono::Datelike::day(&d.date), d.quartile))
            .collect();
        assert_eq!(by_day, vec![(1, 4), (2, 3), (3, 2), (4, 1)]);
    }

    #[test]
    fn test_daily_range_for_year() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let (from, to) = daily_range(Some(2024), now).unwrap();
        assert_eq!(from, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_daily_range_trailing_includes_today() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 0).unwrap();
        let (from, to) = daily_range(None, now).unwrap();
        assert_eq!(from, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        assert_eq!(to, now);
    }
}
