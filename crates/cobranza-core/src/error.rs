//! Unified error types for Cobranza.

use thiserror::Error;

/// Result type alias using CobranzaError.
pub type Result<T> = std::result::Result<T, CobranzaError>;

#[derive(Error, Debug)]
pub enum CobranzaError {
    // Request errors
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Transport not connected: {0}")]
    NotReady(String),

    #[error("Recipient not registered: {0}")]
    NotRegistered(String),

    // Transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Transient transport failure: {0}")]
    Transient(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    // Persistence errors
    #[error("Ledger error: {0}")]
    Ledger(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Internal(String),
}

impl CobranzaError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_ready(msg: impl Into<String>) -> Self {
        Self::NotReady(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn ledger(msg: impl Into<String>) -> Self {
        Self::Ledger(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// HTTP status code for this error when surfaced through the gateway.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotRegistered(_) => 404,
            Self::NotReady(_) | Self::Transport(_) | Self::Transient(_) => 503,
            Self::Timeout(_) => 504,
            Self::Ledger(_) | Self::Config(_) | Self::Io(_) | Self::Json(_) | Self::Internal(_) => {
                500
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CobranzaError::Transport("socket closed".into());
        assert!(err.to_string().contains("socket closed"));
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(
            CobranzaError::validation("x"),
            CobranzaError::Validation(_)
        ));
        assert!(matches!(
            CobranzaError::not_ready("x"),
            CobranzaError::NotReady(_)
        ));
        assert!(matches!(
            CobranzaError::transport("x"),
            CobranzaError::Transport(_)
        ));
    }

    #[test]
    fn test_http_status_map() {
        assert_eq!(CobranzaError::Validation("".into()).http_status(), 400);
        assert_eq!(CobranzaError::NotRegistered("".into()).http_status(), 404);
        assert_eq!(CobranzaError::NotReady("".into()).http_status(), 503);
        assert_eq!(CobranzaError::Transient("".into()).http_status(), 503);
        assert_eq!(CobranzaError::Timeout("".into()).http_status(), 504);
        assert_eq!(CobranzaError::Internal("".into()).http_status(), 500);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CobranzaError = io_err.into();
        assert!(matches!(err, CobranzaError::Io(_)));
        assert_eq!(err.http_status(), 500);
    }
}
