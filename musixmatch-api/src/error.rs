//! Error types for the Musixmatch API client.

use thiserror::Error;

/// Errors that can occur when interacting with the Musixmatch API.
///
/// Note that an unusable response body (no `message` envelope) is *not* an
/// error: request helpers report it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum MusixmatchError {
    /// HTTP transport error (connection refused, timeout, TLS failure, etc.).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success, non-redirect HTTP status.
    #[error("unexpected HTTP status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Redirects kept coming after the configured number of follows and the
    /// [`RedirectPolicy`](crate::transport::RedirectPolicy) asked to fail.
    #[error("too many redirects calling `{method}`")]
    RedirectLimit {
        /// API method being called.
        method: String,
    },

    /// Unknown API context name. Only `desktop` and `ios` exist.
    #[error("unknown API context `{0}` (expected `desktop` or `ios`)")]
    InvalidContext(String),

    /// A record-scoped track operation was invoked on a track that carries
    /// neither `track_id` nor `commontrack_id`.
    #[error("track has no track_id or commontrack_id")]
    MissingTrackId,

    /// No user token is configured. Run `login` first.
    #[error("not logged in")]
    NotLoggedIn,

    /// File I/O error (session read/write, lyrics file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to encode or decode JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors (e.g. missing config directory).
    #[error("{0}")]
    Other(String),
}

/// Convenience alias for `Result<T, MusixmatchError>`.
pub type Result<T> = std::result::Result<T, MusixmatchError>;
