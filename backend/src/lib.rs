//! Collar telemetry gateway.
//!
//! Accepts periodic reports from GPS collars, verifies their keyed checksum,
//! normalises the firmware's payload shapes, grades walks for anti-cheat
//! signals and fans each report out into the telemetry store. Read endpoints
//! serve the latest snapshot, history windows and walk statistics.
//!
//! The crate is laid out hexagonally: [`domain`] holds the pipeline and its
//! ports, [`inbound`] the Actix HTTP adapter and [`outbound`] the Diesel and
//! Prometheus adapters.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
