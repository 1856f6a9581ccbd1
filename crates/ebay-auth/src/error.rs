//! Error types for the authorization code flow

/// Errors from OAuth flow operations.
///
/// Every variant is recoverable by the caller: entry points log the error and
/// leave previously persisted tokens untouched.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required client setting is missing or malformed
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The authorization or token endpoint could not be reached
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// Unexpected status, redirect, or response body
    #[error("protocol error: {0}")]
    Protocol(String),

    /// No valid token and no way to obtain one without user interaction
    #[error("no usable credential: {0}")]
    State(String),

    /// The property store could not be read or written
    #[error("property store error: {0}")]
    Store(String),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
