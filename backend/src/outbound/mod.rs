//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **metrics**: Prometheus exporters (feature-gated)
//!
//! Adapters are thin translators between domain records and infrastructure
//! representations. They contain no business logic.

#[cfg(feature = "metrics")]
pub mod metrics;
pub mod persistence;
