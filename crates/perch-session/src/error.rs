//! Error types for the session core.

use thiserror::Error;

/// Errors surfaced by the session core.
///
/// Transport-level connectivity failures are absorbed by the reconnect loop
/// and become state transitions rather than errors; only lifecycle misuse
/// and shutdown surface here. A `block_until_connected_timeout` window
/// running out is reported as `Ok(false)`, never as an error, so callers can
/// always tell a timeout apart from a close.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The manager was closed while the operation was in progress.
    #[error("session manager is closed")]
    Closed,

    /// `start` was called on an already started manager.
    #[error("session manager already started")]
    AlreadyStarted,

    /// The transport failed to (re-)establish a session.
    #[error("transport error: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_error_display() {
        assert_eq!(SessionError::Closed.to_string(), "session manager is closed");
    }

    #[test]
    fn test_already_started_error_display() {
        assert_eq!(
            SessionError::AlreadyStarted.to_string(),
            "session manager already started"
        );
    }

    #[test]
    fn test_transport_error_display() {
        let err = SessionError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "transport error: connection refused");
    }
}
