//! Shared Diesel error mapping for the telemetry repositories.
//!
//! Every repository port exposes the same `Connection`/`Query` split, so the
//! mapping is written once against constructor closures.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Map a pool failure into the repository's connection variant.
pub(crate) fn map_pool_error<E>(error: PoolError, connection: impl FnOnce(String) -> E) -> E {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map a Diesel failure into the repository's query or connection variant.
///
/// Lost connections surface as connection errors so services report the
/// store as unavailable; everything else is a query error. Driver detail is
/// logged at debug level and kept out of the returned message.
pub(crate) fn map_diesel_error<E>(
    error: DieselError,
    operation: &'static str,
    query: impl FnOnce(String) -> E,
    connection: impl FnOnce(String) -> E,
) -> E {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), operation, "diesel operation failed");
        }
        other => debug!(error = %other, operation, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _)
        | DieselError::BrokenTransactionManager => {
            connection(format!("{operation}: database connection error"))
        }
        DieselError::NotFound => query(format!("{operation}: record not found")),
        DieselError::DeserializationError(_) | DieselError::SerializationError(_) => {
            query(format!("{operation}: row conversion failed"))
        }
        _ => query(format!("{operation}: database error")),
    }
}
