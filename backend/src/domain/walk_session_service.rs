//! Walk session domain service.
//!
//! Implements the walk start and walk end driving port. Start stamps the
//! device's last known position; end grades the walk from the supplied
//! counters, falling back to the counters last reported by the collar.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::ports::{
    DeviceStatusRepository, DeviceStatusRepositoryError, EndWalkRequest, EndWalkResponse,
    StartWalkRequest, StartWalkResponse, WalkSessionCommand, WalkSessionRepository,
    WalkSessionRepositoryError,
};
use crate::domain::{DeviceId, DeviceStatusSnapshot, Error, WalkSession, WalkSessionError};

pub(crate) fn map_walk_repository_error(error: WalkSessionRepositoryError) -> Error {
    match error {
        WalkSessionRepositoryError::Connection { message } => Error::dependency_unavailable(
            format!("walk session repository unavailable: {message}"),
        ),
        WalkSessionRepositoryError::Query { message } => {
            Error::internal(format!("walk session repository error: {message}"))
        }
    }
}

fn map_walk_state_error(error: WalkSessionError) -> Error {
    match error {
        WalkSessionError::AlreadyEnded { .. } => Error::conflict(error.to_string()),
    }
}

/// Walk session service implementing [`WalkSessionCommand`].
#[derive(Clone)]
pub struct WalkSessionService<W, S> {
    walk_repo: Arc<W>,
    status_repo: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<W, S> WalkSessionService<W, S> {
    /// Create a new service over the walk and status repositories.
    pub fn new(walk_repo: Arc<W>, status_repo: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            walk_repo,
            status_repo,
            clock,
        }
    }
}

impl<W, S> WalkSessionService<W, S>
where
    S: DeviceStatusRepository,
{
    /// Latest snapshot, or `None` when it is missing or unreadable.
    async fn latest_status(&self, device_id: &DeviceId) -> Option<DeviceStatusSnapshot> {
        match self.status_repo.find(device_id).await {
            Ok(snapshot) => snapshot,
            Err(error) => {
                log_status_error(device_id, &error);
                None
            }
        }
    }
}

fn log_status_error(device_id: &DeviceId, error: &DeviceStatusRepositoryError) {
    warn!(
        device_id = %device_id,
        error = %error,
        "device status unavailable; continuing without it"
    );
}

#[async_trait]
impl<W, S> WalkSessionCommand for WalkSessionService<W, S>
where
    W: WalkSessionRepository,
    S: DeviceStatusRepository,
{
    async fn start_walk(&self, request: StartWalkRequest) -> Result<StartWalkResponse, Error> {
        let position = self
            .latest_status(&request.device_id)
            .await
            .and_then(|snapshot| snapshot.last_position());
        let session = WalkSession::open(
            Uuid::new_v4(),
            request.device_id,
            self.clock.utc(),
            position,
        );

        self.walk_repo
            .insert(&session)
            .await
            .map_err(map_walk_repository_error)?;

        info!(walk_id = %session.id, device_id = %session.device_id, "walk started");
        Ok(StartWalkResponse {
            walk_id: session.id,
            started_at: session.started_at,
        })
    }

    async fn end_walk(&self, request: EndWalkRequest) -> Result<EndWalkResponse, Error> {
        let not_found = || Error::not_found(format!("walk session {} not found", request.walk_id));
        let mut session = self
            .walk_repo
            .find_by_id(&request.walk_id)
            .await
            .map_err(map_walk_repository_error)?
            .filter(|session| session.device_id == request.device_id)
            .ok_or_else(not_found)?;

        let reported = self
            .latest_status(&request.device_id)
            .await
            .map(|snapshot| snapshot.walk_metrics())
            .unwrap_or_default();
        let metrics = request.counters.resolve(reported);
        let grade = session
            .finish(self.clock.utc(), metrics)
            .map_err(map_walk_state_error)?;

        let updated = self
            .walk_repo
            .finalize(&session)
            .await
            .map_err(map_walk_repository_error)?;
        if !updated {
            return Err(Error::conflict(format!(
                "walk session {} already ended",
                session.id
            )));
        }

        info!(
            walk_id = %session.id,
            grade = %grade.grade,
            score = grade.score,
            "walk ended"
        );
        Ok(EndWalkResponse { session, grade })
    }
}

#[cfg(test)]
#[path = "walk_session_service_tests.rs"]
mod tests;
