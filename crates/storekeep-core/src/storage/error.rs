//! Storage error handling
//!
//! Provides typed errors for product store operations with descriptive
//! messages and recovery suggestions.

use std::error::Error as StdError;
use std::io;
use thiserror::Error;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Errors that can occur during product store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The database could not be opened or created
    #[error("Storage unavailable at '{location}': {source}")]
    StorageUnavailable {
        location: String,
        #[source]
        source: BoxError,
    },

    /// An operation was called before the store was initialized
    #[error("Store not initialized: cannot {operation} before initialize() succeeds")]
    NotInitialized { operation: &'static str },

    /// A single operation failed against an open store
    #[error("Failed to {operation}: {source}")]
    OperationFailed {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },
}

impl StoreError {
    /// Wrap an open/create failure
    pub fn unavailable(location: impl Into<String>, source: impl Into<BoxError>) -> Self {
        StoreError::StorageUnavailable {
            location: location.into(),
            source: source.into(),
        }
    }

    /// Build a closure that wraps a SQLite error with the operation name
    pub(crate) fn op(operation: &'static str) -> impl Fn(rusqlite::Error) -> Self {
        move |source| StoreError::OperationFailed { operation, source }
    }

    /// Check if retrying the same call may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StoreError::OperationFailed { .. })
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StoreError::StorageUnavailable { source, .. } => {
                match source.downcast_ref::<io::Error>().map(io::Error::kind) {
                    Some(io::ErrorKind::PermissionDenied) => Some(
                        "Check permissions on the data directory, or point STOREKEEP_DATA_DIR somewhere writable.",
                    ),
                    _ => Some("Check that the data directory exists and the database file is not corrupted."),
                }
            }
            StoreError::OperationFailed { .. } => Some("Try the operation again."),
            StoreError::NotInitialized { .. } => None,
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_display() {
        let err = StoreError::unavailable(
            "/data/storekeep.db",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );

        let msg = err.to_string();
        assert!(msg.contains("Storage unavailable"));
        assert!(msg.contains("/data/storekeep.db"));
        assert!(!err.is_recoverable());
        assert!(err
            .recovery_suggestion()
            .is_some_and(|s| s.contains("permissions")));
    }

    #[test]
    fn test_not_initialized_display() {
        let err = StoreError::NotInitialized { operation: "create product" };
        assert!(err.to_string().contains("create product"));
        assert!(err.recovery_suggestion().is_none());
    }

    #[test]
    fn test_operation_failed_is_recoverable() {
        let err = StoreError::op("delete product")(rusqlite::Error::InvalidQuery);
        assert!(matches!(
            err,
            StoreError::OperationFailed {
                operation: "delete product",
                ..
            }
        ));
        assert!(err.is_recoverable());
        assert!(err.to_string().starts_with("Failed to delete product"));
    }
}
