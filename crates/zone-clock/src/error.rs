//! Error types. None of these are meant to reach a user: every caller in this crate degrades to
//! the best previously known state and logs the error instead.
use std::io;

/// Errors raised by a [`Storage`] backend.
///
/// [`Storage`]: crate::storage::Storage
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Writing the value would exceed the backend's quota.
    #[error("storage quota exceeded writing {len} bytes under '{key}'")]
    QuotaExceeded {
        /// The key being written.
        key: String,
        /// Size of the rejected value, in bytes.
        len: usize,
    },
    /// The backend is disabled or otherwise unavailable.
    #[error("storage is unavailable")]
    Unavailable,
    /// I/O error from a file backed store.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// General error type for this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An IANA time zone id that `chrono-tz` doesn't know about.
    #[error("unknown time zone '{0}'")]
    UnknownTimeZone(String),
    /// User supplied text that doesn't match any accepted time format.
    #[error("unrecognized time: '{0}'")]
    UnrecognizedTime(String),
    /// A string that isn't a valid RFC 3339 timestamp.
    #[error("invalid timestamp '{text}': {source}")]
    Timestamp {
        /// The rejected input.
        text: String,
        /// Why chrono rejected it.
        #[source]
        source: chrono::ParseError,
    },
    /// Storage backend error.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// (De)serialization error for a stored payload or settings file.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// The shareable address isn't a valid URL.
    #[error("invalid location: {0}")]
    Url(#[from] url::ParseError),
    /// Error reading a settings file.
    #[error(transparent)]
    Io(#[from] io::Error),
}
