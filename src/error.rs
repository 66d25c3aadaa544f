//! Error types for the contention harness.
//!
//! Library code returns [`Error`]; the binary wraps it in `anyhow` at the
//! edges, the same split the config loader uses.

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the repository servers and the load generator.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Caller supplied parameters that would produce meaningless statistics.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A single request failed on the wire.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// IO error with context.
    #[error("IO error in {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }
}

/// Per-request failure observed by a load generator worker.
///
/// These never abort a run: the request is dropped from the sample set and
/// the error is handed back to the caller alongside the samples.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request exceeded the client timeout.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The server answered with a non-success status.
    #[error("unexpected status {0}")]
    Status(u16),

    /// The response body could not be read to the end.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// Any other client error.
    #[error("request failed: {0}")]
    Other(String),
}

impl TransportError {
    /// Classify a `reqwest` error.
    pub fn from_reqwest(err: &reqwest::Error, timeout: std::time::Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else if err.is_body() || err.is_decode() {
            Self::Body(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}
