//! Conversions from external infrastructure errors into domain errors.

use authbridge_common::storage::StorageError;
use authbridge_domain::BridgeError;
use rusqlite::Error as SqlError;
use tokio::task::JoinError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub BridgeError);

impl From<InfraError> for BridgeError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<BridgeError> for InfraError {
    fn from(value: BridgeError) -> Self {
        InfraError(value)
    }
}

trait IntoBridgeError {
    fn into_bridge(self) -> BridgeError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → BridgeError */
/* -------------------------------------------------------------------------- */

impl IntoBridgeError for SqlError {
    fn into_bridge(self) -> BridgeError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match err.code {
                    ErrorCode::DatabaseBusy => BridgeError::Store("database is busy".into()),
                    ErrorCode::DatabaseLocked => BridgeError::Store("database is locked".into()),
                    ErrorCode::ConstraintViolation => {
                        BridgeError::Store(format!("constraint violation: {message}"))
                    }
                    ErrorCode::CannotOpen => {
                        BridgeError::Store(format!("unable to open database: {message}"))
                    }
                    _ => BridgeError::Store(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::FromSqlConversionFailure(_, _, cause) => {
                BridgeError::Store(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, name, ty) => {
                BridgeError::Store(format!("invalid column type for '{name}': {ty}"))
            }
            other => BridgeError::Store(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_bridge())
    }
}

/* -------------------------------------------------------------------------- */
/* StorageError → BridgeError */
/* -------------------------------------------------------------------------- */

impl IntoBridgeError for StorageError {
    fn into_bridge(self) -> BridgeError {
        match self {
            StorageError::Rusqlite(err) => err.into_bridge(),
            StorageError::Timeout(secs) => {
                BridgeError::Store(format!("timed out after {secs}s waiting for a connection"))
            }
            other => BridgeError::Store(other.to_string()),
        }
    }
}

impl From<StorageError> for InfraError {
    fn from(value: StorageError) -> Self {
        InfraError(value.into_bridge())
    }
}

/// Map a failed `spawn_blocking` task.
pub fn map_join_error(err: JoinError) -> BridgeError {
    if err.is_cancelled() {
        BridgeError::Internal("blocking task cancelled".into())
    } else {
        BridgeError::Internal(format!("blocking task failed: {err}"))
    }
}
