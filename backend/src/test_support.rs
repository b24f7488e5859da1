//! Test doubles shared by unit and integration tests.
//!
//! Enabled for `cfg(test)` and by the `test-support` feature so the `tests/`
//! suites can drive the full HTTP stack without a database.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, Utc};
use mockable::Clock;
use uuid::Uuid;

use crate::domain::ports::{
    AnomalyLogRepository, AnomalyLogRepositoryError, DeviceStatusRepository,
    DeviceStatusRepositoryError, TelemetryHistoryRepository, TelemetryHistoryRepositoryError,
    WalkSessionRepository, WalkSessionRepositoryError,
};
use crate::domain::telemetry::CanonicalStatus;
use crate::domain::{
    AnomalyEntry, DeviceId, DeviceStatusSnapshot, LocationRecord, ScratchDaily, ScratchEvent,
    SleepSession, WalkGrade, WalkSession, WalkerStatsTotals,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clock pinned to a settable instant.
#[derive(Debug)]
pub struct FixtureClock {
    utc_now: Mutex<DateTime<Utc>>,
}

impl FixtureClock {
    pub fn at(utc_now: DateTime<Utc>) -> Self {
        Self {
            utc_now: Mutex::new(utc_now),
        }
    }

    /// Move the clock to a new instant.
    pub fn set(&self, utc_now: DateTime<Utc>) {
        *lock(&self.utc_now) = utc_now;
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.utc_now)
    }
}

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    UpsertStatus,
    FindStatus,
    InsertLocation,
    InsertScratchEvent,
    UpsertScratchDaily,
    InsertSleepSession,
    CountAnomalies,
    InsertAnomaly,
    InsertWalk,
    FinalizeWalk,
    WalkerStats,
}

#[derive(Debug, Default)]
struct StoreState {
    statuses: Vec<DeviceStatusSnapshot>,
    locations: Vec<LocationRecord>,
    scratch_events: Vec<ScratchEvent>,
    scratch_daily: Vec<ScratchDaily>,
    sleep_sessions: Vec<SleepSession>,
    anomalies: Vec<AnomalyEntry>,
    walks: Vec<WalkSession>,
    writes: usize,
}

/// In-memory stand-in for every store port.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    failing: Mutex<HashSet<StoreOp>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call of `op` fail.
    pub fn fail(&self, op: StoreOp) {
        lock(&self.failing).insert(op);
    }

    fn failing(&self, op: StoreOp) -> bool {
        lock(&self.failing).contains(&op)
    }

    fn write<F: FnOnce(&mut StoreState)>(&self, apply: F) {
        let mut state = lock(&self.state);
        state.writes += 1;
        apply(&mut state);
    }

    /// Total number of successful writes.
    pub fn write_count(&self) -> usize {
        lock(&self.state).writes
    }

    pub fn status(&self, device_id: &DeviceId) -> Option<DeviceStatusSnapshot> {
        lock(&self.state)
            .statuses
            .iter()
            .find(|s| &s.device_id == device_id)
            .cloned()
    }

    pub fn locations(&self) -> Vec<LocationRecord> {
        lock(&self.state).locations.clone()
    }

    pub fn scratch_events(&self) -> Vec<ScratchEvent> {
        lock(&self.state).scratch_events.clone()
    }

    pub fn scratch_daily(&self) -> Vec<ScratchDaily> {
        lock(&self.state).scratch_daily.clone()
    }

    pub fn sleep_sessions(&self) -> Vec<SleepSession> {
        lock(&self.state).sleep_sessions.clone()
    }

    pub fn anomalies(&self) -> Vec<AnomalyEntry> {
        lock(&self.state).anomalies.clone()
    }

    pub fn walks(&self) -> Vec<WalkSession> {
        lock(&self.state).walks.clone()
    }

    /// Seed a walk directly, bypassing the write counter.
    pub fn seed_walk(&self, walk: WalkSession) {
        lock(&self.state).walks.push(walk);
    }

    fn walks_since(&self, device_id: &DeviceId, since: DateTime<Utc>) -> Vec<WalkSession> {
        let mut walks: Vec<_> = lock(&self.state)
            .walks
            .iter()
            .filter(|w| &w.device_id == device_id && w.started_at >= since)
            .cloned()
            .collect();
        walks.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        walks
    }
}

#[async_trait]
impl DeviceStatusRepository for InMemoryStore {
    async fn upsert(
        &self,
        status: &CanonicalStatus,
        grade: Option<WalkGrade>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), DeviceStatusRepositoryError> {
        if self.failing(StoreOp::UpsertStatus) {
            return Err(DeviceStatusRepositoryError::connection("injected failure"));
        }
        self.write(|state| {
            let position = state
                .statuses
                .iter()
                .position(|s| s.device_id == status.device_id);
            let previous = position.map(|index| state.statuses.remove(index));
            let next = DeviceStatusSnapshot::upserted(
                previous.as_ref(),
                status,
                grade.as_ref(),
                updated_at,
            );
            state.statuses.push(next);
        });
        Ok(())
    }

    async fn find(
        &self,
        device_id: &DeviceId,
    ) -> Result<Option<DeviceStatusSnapshot>, DeviceStatusRepositoryError> {
        if self.failing(StoreOp::FindStatus) {
            return Err(DeviceStatusRepositoryError::connection("injected failure"));
        }
        Ok(self.status(device_id))
    }
}

#[async_trait]
impl TelemetryHistoryRepository for InMemoryStore {
    async fn insert_location(
        &self,
        record: &LocationRecord,
    ) -> Result<(), TelemetryHistoryRepositoryError> {
        if self.failing(StoreOp::InsertLocation) {
            return Err(TelemetryHistoryRepositoryError::query("injected failure"));
        }
        self.write(|state| state.locations.push(record.clone()));
        Ok(())
    }

    async fn insert_scratch_event(
        &self,
        event: &ScratchEvent,
    ) -> Result<(), TelemetryHistoryRepositoryError> {
        if self.failing(StoreOp::InsertScratchEvent) {
            return Err(TelemetryHistoryRepositoryError::query("injected failure"));
        }
        self.write(|state| state.scratch_events.push(event.clone()));
        Ok(())
    }

    async fn upsert_scratch_daily(
        &self,
        daily: &ScratchDaily,
    ) -> Result<(), TelemetryHistoryRepositoryError> {
        if self.failing(StoreOp::UpsertScratchDaily) {
            return Err(TelemetryHistoryRepositoryError::query("injected failure"));
        }
        self.write(|state| {
            state
                .scratch_daily
                .retain(|d| !(d.device_id == daily.device_id && d.day == daily.day));
            state.scratch_daily.push(daily.clone());
        });
        Ok(())
    }

    async fn insert_sleep_session(
        &self,
        session: &SleepSession,
    ) -> Result<(), TelemetryHistoryRepositoryError> {
        if self.failing(StoreOp::InsertSleepSession) {
            return Err(TelemetryHistoryRepositoryError::query("injected failure"));
        }
        self.write(|state| state.sleep_sessions.push(session.clone()));
        Ok(())
    }

    async fn list_locations(
        &self,
        device_id: &DeviceId,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<LocationRecord>, TelemetryHistoryRepositoryError> {
        let mut points: Vec<_> = self
            .locations()
            .into_iter()
            .filter(|p| &p.device_id == device_id && p.recorded_at >= since)
            .collect();
        points.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(points.into_iter().take(limit).collect())
    }

    async fn list_sleep_sessions(
        &self,
        device_id: &DeviceId,
        since: DateTime<Utc>,
    ) -> Result<Vec<SleepSession>, TelemetryHistoryRepositoryError> {
        let mut sessions: Vec<_> = self
            .sleep_sessions()
            .into_iter()
            .filter(|s| &s.device_id == device_id && s.started_at >= since)
            .collect();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(sessions)
    }

    async fn list_scratch_daily(
        &self,
        device_id: &DeviceId,
        since_day: NaiveDate,
    ) -> Result<Vec<ScratchDaily>, TelemetryHistoryRepositoryError> {
        let mut days: Vec<_> = self
            .scratch_daily()
            .into_iter()
            .filter(|d| &d.device_id == device_id && d.day >= since_day)
            .collect();
        days.sort_by(|a, b| b.day.cmp(&a.day));
        Ok(days)
    }
}

#[async_trait]
impl AnomalyLogRepository for InMemoryStore {
    async fn count_in_window(
        &self,
        device_id: &DeviceId,
        anomaly_type: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, AnomalyLogRepositoryError> {
        if self.failing(StoreOp::CountAnomalies) {
            return Err(AnomalyLogRepositoryError::connection("injected failure"));
        }
        let count = self
            .anomalies()
            .iter()
            .filter(|a| {
                &a.device_id == device_id
                    && a.anomaly_type == anomaly_type
                    && a.detected_at >= from
                    && a.detected_at < to
            })
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn insert(&self, entry: &AnomalyEntry) -> Result<(), AnomalyLogRepositoryError> {
        if self.failing(StoreOp::InsertAnomaly) {
            return Err(AnomalyLogRepositoryError::query("injected failure"));
        }
        self.write(|state| state.anomalies.push(entry.clone()));
        Ok(())
    }
}

#[async_trait]
impl WalkSessionRepository for InMemoryStore {
    async fn insert(&self, session: &WalkSession) -> Result<(), WalkSessionRepositoryError> {
        if self.failing(StoreOp::InsertWalk) {
            return Err(WalkSessionRepositoryError::connection("injected failure"));
        }
        self.write(|state| state.walks.push(session.clone()));
        Ok(())
    }

    async fn find_by_id(
        &self,
        session_id: &Uuid,
    ) -> Result<Option<WalkSession>, WalkSessionRepositoryError> {
        Ok(self.walks().into_iter().find(|w| &w.id == session_id))
    }

    async fn finalize(&self, session: &WalkSession) -> Result<bool, WalkSessionRepositoryError> {
        if self.failing(StoreOp::FinalizeWalk) {
            return Err(WalkSessionRepositoryError::query("injected failure"));
        }
        let mut state = lock(&self.state);
        let Some(stored) = state
            .walks
            .iter_mut()
            .find(|w| w.id == session.id && w.ended_at.is_none())
        else {
            return Ok(false);
        };
        *stored = session.clone();
        state.writes += 1;
        Ok(true)
    }

    async fn list_for_device(
        &self,
        device_id: &DeviceId,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<WalkSession>, WalkSessionRepositoryError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .walks_since(device_id, since)
            .into_iter()
            .take(limit)
            .collect())
    }

    async fn walker_stats(
        &self,
        device_id: &DeviceId,
        since: DateTime<Utc>,
    ) -> Result<WalkerStatsTotals, WalkSessionRepositoryError> {
        if self.failing(StoreOp::WalkerStats) {
            return Err(WalkSessionRepositoryError::query("injected failure"));
        }
        Ok(WalkerStatsTotals::from_walks(
            &self.walks_since(device_id, since),
        ))
    }
}
