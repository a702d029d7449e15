//! Typed error types for par-notes-sync.

use thiserror::Error;

/// Failure talking to the persistence service.
///
/// These are logged by the sync path and never roll back in-memory state;
/// the next debounced snapshot carries the full tree again.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The configured base URL could not be parsed or uses an unsupported scheme.
    #[error("Invalid server URL '{url}': {reason}")]
    InvalidUrl {
        /// The rejected URL as configured.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// DNS, connection, TLS or timeout failure.
    #[error("Request to {url} failed: {message}")]
    Transport {
        /// Request URL.
        url: String,
        /// Underlying transport error.
        message: String,
    },

    /// The service answered with a non-2xx status.
    #[error("Request to {url} returned HTTP {status}")]
    Status {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// A request or response body was not the expected JSON shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The blocking worker running a sync batch panicked or was cancelled.
    #[error("Sync task failed: {0}")]
    Task(String),
}
