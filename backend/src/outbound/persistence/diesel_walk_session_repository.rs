//! PostgreSQL-backed `WalkSessionRepository` implementation using Diesel ORM.
//!
//! Finalisation is a conditional update on `ended_at IS NULL`, so two
//! concurrent end requests cannot both grade the same walk. The walker-stats
//! aggregate runs as a single SQL statement over graded, ended walks.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{Text, Timestamptz};
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{WalkSessionRepository, WalkSessionRepositoryError};
use crate::domain::{
    DeviceId, GradeCounts, GradeLetter, WalkGrade, WalkMetrics, WalkSession, WalkSource,
    WalkerStatsTotals,
};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{WalkSessionFinish, WalkSessionRow, WalkerStatsRow};
use super::pool::{DbPool, PoolError};
use super::schema::walk_sessions;

/// Anti-cheat aggregate over graded, ended walks since `$2`.
///
/// Averages are rounded to one decimal in the gateway, not in SQL.
const WALKER_STATS_SQL: &str = "\
SELECT \
    COUNT(*) AS total_walks, \
    COUNT(*) FILTER (WHERE grade = 'A') AS grade_a, \
    COUNT(*) FILTER (WHERE grade = 'B') AS grade_b, \
    COUNT(*) FILTER (WHERE grade = 'C') AS grade_c, \
    COUNT(*) FILTER (WHERE grade = 'F') AS grade_f, \
    AVG(grade_score)::float8 AS average_score, \
    AVG(carried_percent)::float8 AS average_carried_percent, \
    AVG(actual_walk_percent)::float8 AS average_actual_walk_percent, \
    COUNT(*) FILTER (WHERE cheat_flags & 1 <> 0) AS carried_incidents, \
    COUNT(*) FILTER (WHERE cheat_flags & 2 <> 0) AS vehicle_incidents, \
    COUNT(*) FILTER (WHERE cheat_flags & 4 <> 0) AS excessive_stop_incidents, \
    COUNT(*) FILTER (WHERE cheat_flags & 8 <> 0) AS leash_only_incidents \
FROM walk_sessions \
WHERE device_id = $1 \
  AND started_at >= $2 \
  AND ended_at IS NOT NULL \
  AND grade IS NOT NULL";

/// Diesel-backed implementation of the walk session repository port.
#[derive(Clone)]
pub struct DieselWalkSessionRepository {
    pool: DbPool,
}

impl DieselWalkSessionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> WalkSessionRepositoryError {
    map_pool_error(error, WalkSessionRepositoryError::connection)
}

fn map_error(
    operation: &'static str,
) -> impl FnOnce(diesel::result::Error) -> WalkSessionRepositoryError {
    move |err| {
        map_diesel_error(
            err,
            operation,
            WalkSessionRepositoryError::query,
            WalkSessionRepositoryError::connection,
        )
    }
}

fn session_to_row(session: &WalkSession) -> WalkSessionRow {
    let grade = session.grade.as_ref();
    WalkSessionRow {
        id: session.id,
        device_id: session.device_id.to_string(),
        started_at: session.started_at,
        ended_at: session.ended_at,
        start_latitude: session.start_latitude,
        start_longitude: session.start_longitude,
        duration_s: session.metrics.duration_seconds,
        distance_m: session.metrics.distance_metres,
        stop_count: session.metrics.stop_count,
        carried_seconds: session.metrics.carried_seconds,
        vehicle_seconds: session.metrics.vehicle_seconds,
        actual_walk_seconds: session.metrics.actual_walk_seconds,
        cheat_flags: session.metrics.cheat_flags,
        grade: grade.map(|g| g.grade.as_str().to_owned()),
        grade_score: grade.map(|g| g.score),
        carried_percent: grade.map(|g| g.carried_percent),
        actual_walk_percent: grade.map(|g| g.actual_walk_percent),
        vehicle_detected: grade.map(|g| g.vehicle_detected),
        cheat_summary: grade.and_then(|g| g.cheat_summary.clone()),
        source: session.source.as_str().to_owned(),
    }
}

fn session_to_finish(session: &WalkSession) -> WalkSessionFinish<'_> {
    let grade = session.grade.as_ref();
    WalkSessionFinish {
        ended_at: session.ended_at,
        duration_s: session.metrics.duration_seconds,
        distance_m: session.metrics.distance_metres,
        stop_count: session.metrics.stop_count,
        carried_seconds: session.metrics.carried_seconds,
        vehicle_seconds: session.metrics.vehicle_seconds,
        actual_walk_seconds: session.metrics.actual_walk_seconds,
        cheat_flags: session.metrics.cheat_flags,
        grade: grade.map(|g| g.grade.as_str()),
        grade_score: grade.map(|g| g.score),
        carried_percent: grade.map(|g| g.carried_percent),
        actual_walk_percent: grade.map(|g| g.actual_walk_percent),
        vehicle_detected: grade.map(|g| g.vehicle_detected),
        cheat_summary: grade.and_then(|g| g.cheat_summary.as_deref()),
    }
}

/// Convert a database row into a domain walk session.
///
/// A grade is only attached when both the letter and the score are stored.
fn row_to_walk_session(row: WalkSessionRow) -> Result<WalkSession, WalkSessionRepositoryError> {
    let device_id = DeviceId::new(&row.device_id)
        .map_err(|err| WalkSessionRepositoryError::query(format!("stored device id: {err}")))?;
    let source = WalkSource::from_str(&row.source)
        .map_err(|err| WalkSessionRepositoryError::query(err.to_string()))?;
    let grade = match (row.grade.as_deref(), row.grade_score) {
        (Some(letter), Some(score)) => Some(WalkGrade {
            grade: GradeLetter::from_str(letter)
                .map_err(|err| WalkSessionRepositoryError::query(err.to_string()))?,
            score,
            carried_percent: row.carried_percent.unwrap_or_default(),
            actual_walk_percent: row.actual_walk_percent.unwrap_or_default(),
            vehicle_detected: row.vehicle_detected.unwrap_or_default(),
            cheat_summary: row.cheat_summary,
        }),
        _ => None,
    };

    Ok(WalkSession {
        id: row.id,
        device_id,
        started_at: row.started_at,
        ended_at: row.ended_at,
        start_latitude: row.start_latitude,
        start_longitude: row.start_longitude,
        metrics: WalkMetrics {
            duration_seconds: row.duration_s,
            distance_metres: row.distance_m,
            stop_count: row.stop_count,
            carried_seconds: row.carried_seconds,
            vehicle_seconds: row.vehicle_seconds,
            actual_walk_seconds: row.actual_walk_seconds,
            cheat_flags: row.cheat_flags,
        },
        grade,
        source,
    })
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn stats_to_totals(row: WalkerStatsRow) -> WalkerStatsTotals {
    WalkerStatsTotals {
        total_walks: row.total_walks,
        grade_counts: GradeCounts {
            a: row.grade_a,
            b: row.grade_b,
            c: row.grade_c,
            f: row.grade_f,
        },
        average_score: row.average_score.map(round1),
        average_carried_percent: row.average_carried_percent.map(round1),
        average_actual_walk_percent: row.average_actual_walk_percent.map(round1),
        carried_incidents: row.carried_incidents,
        vehicle_incidents: row.vehicle_incidents,
        excessive_stop_incidents: row.excessive_stop_incidents,
        leash_only_incidents: row.leash_only_incidents,
    }
}

#[async_trait]
impl WalkSessionRepository for DieselWalkSessionRepository {
    async fn insert(&self, session: &WalkSession) -> Result<(), WalkSessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        diesel::insert_into(walk_sessions::table)
            .values(&session_to_row(session))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_error("insert walk session"))
    }

    async fn find_by_id(
        &self,
        session_id: &Uuid,
    ) -> Result<Option<WalkSession>, WalkSessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = walk_sessions::table
            .filter(walk_sessions::id.eq(session_id))
            .select(WalkSessionRow::as_select())
            .first::<WalkSessionRow>(&mut conn)
            .await
            .optional()
            .map_err(map_error("find walk session"))?;

        row.map(row_to_walk_session).transpose()
    }

    async fn finalize(&self, session: &WalkSession) -> Result<bool, WalkSessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let updated = diesel::update(walk_sessions::table)
            .filter(
                walk_sessions::id
                    .eq(session.id)
                    .and(walk_sessions::ended_at.is_null()),
            )
            .set(&session_to_finish(session))
            .execute(&mut conn)
            .await
            .map_err(map_error("finalize walk session"))?;

        Ok(updated == 1)
    }

    async fn list_for_device(
        &self,
        device_id: &DeviceId,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<WalkSession>, WalkSessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<WalkSessionRow> = walk_sessions::table
            .filter(walk_sessions::device_id.eq(device_id.as_ref()))
            .filter(walk_sessions::started_at.ge(since))
            .order((walk_sessions::started_at.desc(), walk_sessions::id.desc()))
            .limit(limit)
            .select(WalkSessionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_error("list walk sessions"))?;

        rows.into_iter().map(row_to_walk_session).collect()
    }

    async fn walker_stats(
        &self,
        device_id: &DeviceId,
        since: DateTime<Utc>,
    ) -> Result<WalkerStatsTotals, WalkSessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = diesel::sql_query(WALKER_STATS_SQL)
            .bind::<Text, _>(device_id.as_ref())
            .bind::<Timestamptz, _>(since)
            .get_result::<WalkerStatsRow>(&mut conn)
            .await
            .map_err(map_error("walker stats"))?;

        Ok(stats_to_totals(row))
    }
}
