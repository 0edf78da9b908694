//! Error types for the sync driver.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The remote store rejected a request.
    #[error("remote rejected request on {table}: {message}")]
    Rejected {
        /// Remote table.
        table: String,
        /// Reason given by the remote store.
        message: String,
    },

    /// Local store error during sync.
    #[error("local store error: {0}")]
    Database(#[from] outpost_core::CoreError),

    /// Sync was cancelled.
    #[error("sync cancelled")]
    Cancelled,

    /// Invalid state transition.
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition {
        /// Current state.
        from: String,
        /// Attempted target state.
        to: String,
    },

    /// Timeout.
    #[error("operation timed out")]
    Timeout,

    /// Not connected.
    #[error("not connected to the remote store")]
    NotConnected,
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a rejection error.
    pub fn rejected(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error can be retried.
    ///
    /// Being offline is transient on a gatehouse station, so
    /// [`SyncError::NotConnected`] is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::Timeout | SyncError::NotConnected => true,
            _ => false,
        }
    }
}
