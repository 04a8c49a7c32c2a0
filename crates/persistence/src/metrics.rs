//! Store metrics.
//!
//! Query latency, pool gauges and the volume of activity time accepted by
//! delta ingestion.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::borrow::Cow;
use std::time::Instant;

const QUERY_DURATION: &str = "database_query_duration_seconds";

/// Publishes the connection pool gauges. Called from the health check.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as f64;
    let idle = pool.num_idle() as f64;

    gauge!("database_connections_total").set(size);
    gauge!("database_connections_idle").set(idle);
    gauge!("database_connections_active").set((size - idle).max(0.0));
}

/// Counts seconds credited to users by an ingested activity delta.
pub fn record_ingested_time(activity_type: &str, delta: i64) {
    if delta > 0 {
        counter!("activity_time_ingested_seconds_total", "type" => activity_type.to_string())
            .increment(delta as u64);
    }
}

/// Times one store query.
///
/// ```ignore
/// let timer = QueryTimer::new("upsert_program");
/// let row = sqlx::query_as::<_, UpsertedProgramEntity>(...).fetch_one(&pool).await;
/// timer.record();
/// ```
pub struct QueryTimer {
    query: Cow<'static, str>,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query: impl Into<Cow<'static, str>>) -> Self {
        Self {
            query: query.into(),
            start: Instant::now(),
        }
    }

    pub fn record(self) {
        histogram!(QUERY_DURATION, "query" => self.query.into_owned())
            .record(self.start.elapsed().as_secs_f64());
    }
}
