//! Failure types raised on the far side of the function execution boundary

use crate::grid::MemberId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Exception type reported by the grid when a function id is not registered
pub const FUNCTION_EXCEPTION: &str = "FunctionException";

/// Exception type used for rejected arguments
pub const ILLEGAL_ARGUMENT_EXCEPTION: &str = "IllegalArgumentException";

/// Exception type used for invalid remote state
pub const ILLEGAL_STATE_EXCEPTION: &str = "IllegalStateException";

/// An application error raised by a remote function and shipped back as a
/// result payload.
///
/// The exception type and message are preserved as sent, together with any
/// nested cause chain, so callers can still inspect what the function threw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    exception_type: String,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cause: Option<Box<RemoteError>>,
}

impl RemoteError {
    pub fn new(exception_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            exception_type: exception_type.into(),
            message: message.into(),
            cause: None,
        }
    }

    pub fn illegal_argument(message: impl Into<String>) -> Self {
        Self::new(ILLEGAL_ARGUMENT_EXCEPTION, message)
    }

    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::new(ILLEGAL_STATE_EXCEPTION, message)
    }

    pub fn function_not_registered(function_id: &str) -> Self {
        Self::new(
            FUNCTION_EXCEPTION,
            format!("Function named [{}] is not registered", function_id),
        )
    }

    /// Attach a nested cause
    pub fn with_cause(mut self, cause: RemoteError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn exception_type(&self) -> &str {
        &self.exception_type
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&RemoteError> {
        self.cause.as_deref()
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RemoteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

/// The transport could not deliver or complete a call
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Pool [{pool}] has been destroyed")]
    PoolDestroyed { pool: String },

    #[error("No servers available in [{source_name}]")]
    NoServersAvailable { source_name: String },

    #[error("Member [{member}] departed before returning results")]
    MemberDeparted { member: MemberId },

    #[error("Cache session [{session}] is closed")]
    SessionClosed { session: String },

    #[error("Connection failure: {0}")]
    Connection(String),
}

impl TransportError {
    pub fn pool_destroyed(pool: impl Into<String>) -> Self {
        Self::PoolDestroyed { pool: pool.into() }
    }

    pub fn no_servers_available(source_name: impl Into<String>) -> Self {
        Self::NoServersAvailable {
            source_name: source_name.into(),
        }
    }

    pub fn member_departed(member: MemberId) -> Self {
        Self::MemberDeparted { member }
    }

    pub fn session_closed(session: impl Into<String>) -> Self {
        Self::SessionClosed {
            session: session.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_remote_error_display_is_message() {
        let err = RemoteError::illegal_argument("TEST");
        assert_eq!(err.to_string(), "TEST");
        assert_eq!(err.exception_type(), ILLEGAL_ARGUMENT_EXCEPTION);
        assert!(err.source().is_none());
    }

    #[test]
    fn test_remote_error_cause_chain() {
        let err = RemoteError::illegal_state("outer").with_cause(RemoteError::illegal_argument("inner"));
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "inner");
        assert!(source.source().is_none());
        assert_eq!(err.cause().map(RemoteError::message), Some("inner"));
    }

    #[test]
    fn test_remote_error_serde() {
        let err = RemoteError::illegal_state("outer").with_cause(RemoteError::illegal_argument("inner"));
        let json = serde_json::to_string(&err).unwrap();
        let back: RemoteError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);

        let flat = serde_json::to_value(RemoteError::illegal_argument("x")).unwrap();
        assert!(flat.get("cause").is_none());
    }

    #[test]
    fn test_transport_error_display() {
        assert_eq!(
            TransportError::pool_destroyed("serverPool").to_string(),
            "Pool [serverPool] has been destroyed"
        );
        assert_eq!(
            TransportError::member_departed(MemberId::new("server1")).to_string(),
            "Member [server1] departed before returning results"
        );
    }
}
