//! Error types for the paper feed.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.

/// Errors from the HTTP client layer.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Middleware error
    #[error("Middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    /// Non-success HTTP status
    #[error("Unexpected status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or message
        message: String,
    },

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ClientError {
    /// Create a status error.
    #[must_use]
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status { status, message: message.into() }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Middleware(_) => true,
            Self::Parse(_) => false,
        }
    }
}

/// Errors from the paper source.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    /// Endpoint unreachable or answered with a non-success status
    #[error("Paper source unavailable: {0}")]
    SourceUnavailable(#[source] ClientError),

    /// Response could not be parsed into a feed
    #[error("Malformed response: {message}")]
    MalformedResponse {
        /// What was wrong with the payload
        message: String,
    },
}

impl SourceError {
    /// Create a malformed response error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse { message: message.into() }
    }
}

impl From<ClientError> for SourceError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Parse(e) => Self::malformed(e.to_string()),
            other => Self::SourceUnavailable(other),
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        Self::from(ClientError::from(err))
    }
}

impl From<reqwest_middleware::Error> for SourceError {
    fn from(err: reqwest_middleware::Error) -> Self {
        Self::from(ClientError::from(err))
    }
}

/// Errors from the remote persistence backend.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// A persistence call failed
    #[error("Remote store failure during {operation}: {source}")]
    RemoteStoreFailure {
        /// Operation being attempted (e.g. "insert like")
        operation: &'static str,
        /// Underlying client error
        #[source]
        source: ClientError,
    },

    /// No signed-in user
    #[error("No authenticated session")]
    Unauthenticated,

    /// The backend answered with something the client did not expect
    #[error("Unexpected store response during {operation}: {message}")]
    UnexpectedResponse {
        /// Operation being attempted
        operation: &'static str,
        /// Description of the mismatch
        message: String,
    },
}

impl StoreError {
    /// Wrap a client error for the given operation.
    #[must_use]
    pub fn failure(operation: &'static str, source: impl Into<ClientError>) -> Self {
        Self::RemoteStoreFailure { operation, source: source.into() }
    }

    /// Create an unexpected response error.
    #[must_use]
    pub fn unexpected(operation: &'static str, message: impl Into<String>) -> Self {
        Self::UnexpectedResponse { operation, message: message.into() }
    }

    /// Returns true for the silent "not signed in" case.
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for paper source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type alias for remote store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_retryable() {
        assert!(ClientError::status(503, "unavailable").is_retryable());
        assert!(ClientError::status(429, "slow down").is_retryable());
        assert!(!ClientError::status(404, "missing").is_retryable());
        assert!(!ClientError::status(400, "bad").is_retryable());
    }

    #[test]
    fn test_status_error_maps_to_unavailable() {
        let err = SourceError::from(ClientError::status(500, "boom"));
        assert!(matches!(err, SourceError::SourceUnavailable(_)));
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_parse_error_maps_to_malformed() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = SourceError::from(ClientError::from(parse));
        assert!(matches!(err, SourceError::MalformedResponse { .. }));
    }

    #[test]
    fn test_store_error_messages() {
        let err = StoreError::failure("insert like", ClientError::status(409, "duplicate"));
        assert!(err.to_string().contains("insert like"));
        assert!(!err.is_unauthenticated());
        assert!(StoreError::Unauthenticated.is_unauthenticated());
    }
}
