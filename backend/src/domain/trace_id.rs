//! Correlation id carried by every gateway request.
//!
//! The id lives in tokio task-local storage for the lifetime of a request, so
//! ingestion logs and error envelopes pick it up without it being passed
//! around. Spawned tasks do not inherit it; wrap them in [`TraceId::scope`].

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use tokio::task_local;
use uuid::Uuid;

/// Header used both to accept a caller's id and to echo the one in effect.
pub const TRACE_ID_HEADER: &str = "trace-id";

task_local! {
    static CURRENT: TraceId;
}

/// Request correlation id.
///
/// # Examples
/// ```
/// use collar_gateway::TraceId;
///
/// async fn ingest() {
///     if let Some(id) = TraceId::current() {
///         tracing::info!(trace_id = %id, "handling telemetry");
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Fresh random id.
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Id supplied by a caller, if it is a well-formed non-nil UUID.
    ///
    /// # Examples
    /// ```
    /// use collar_gateway::TraceId;
    ///
    /// assert!(TraceId::from_header("3f2b8c1e-9d4a-4f6e-8a7b-1c2d3e4f5a6b").is_some());
    /// assert!(TraceId::from_header("collar-01").is_none());
    /// ```
    pub fn from_header(raw: &str) -> Option<Self> {
        raw.trim()
            .parse::<Self>()
            .ok()
            .filter(|id| !id.0.is_nil())
    }

    /// Id of the request being served, if any.
    pub fn current() -> Option<Self> {
        CURRENT.try_with(|id| *id).ok()
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Run `fut` with `trace_id` as the current id.
    pub async fn scope<Fut: Future>(trace_id: Self, fut: Fut) -> Fut::Output {
        CURRENT.scope(trace_id, fut).await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[tokio::test]
    async fn scope_sets_the_current_id() {
        let expected = TraceId::generate();
        let observed = TraceId::scope(expected, async { TraceId::current() }).await;
        assert_eq!(observed, Some(expected));
        assert!(TraceId::current().is_none());
    }

    #[rstest]
    #[case("")]
    #[case("not-a-uuid")]
    #[case("00000000-0000-0000-0000-000000000000")]
    fn unusable_header_values_are_ignored(#[case] raw: &str) {
        assert!(TraceId::from_header(raw).is_none());
    }

    #[test]
    fn header_value_is_trimmed() {
        let uuid = Uuid::new_v4();
        let id = TraceId::from_header(&format!("  {uuid} ")).expect("valid header");
        assert_eq!(id.as_uuid(), &uuid);
    }
}
