//! Error types for gridfn
//!
//! Every failure surfaced by a function execution is a [`FunctionError`].
//! Remote failures (the function raised an error on a member) and transport
//! failures are both funnelled through the exception translator and carry a
//! [`FunctionExecutionError`] whose source is the original cause.

use std::fmt;
use thiserror::Error;

mod domain;

pub use domain::{
    RemoteError, TransportError, FUNCTION_EXCEPTION, ILLEGAL_ARGUMENT_EXCEPTION,
    ILLEGAL_STATE_EXCEPTION,
};

/// Result type alias for gridfn operations
pub type Result<T> = std::result::Result<T, FunctionError>;

/// Main error type for gridfn
#[derive(Error, Debug)]
pub enum FunctionError {
    /// No usable execution target could be produced
    #[error("{0}")]
    TargetUnresolved(String),

    /// The transport could not deliver or complete the call
    #[error(transparent)]
    InvocationFailed(FunctionExecutionError),

    /// The remote function executed but raised an application error
    #[error(transparent)]
    Execution(FunctionExecutionError),

    #[error("Result of Function [with ID [{function_id}]] cannot be adapted to {shape}: {reason}")]
    ResultShapeMismatch {
        function_id: String,
        shape: String,
        reason: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Registration error: {0}")]
    Registration(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FunctionError {
    pub fn target_unresolved(message: impl Into<String>) -> Self {
        FunctionError::TargetUnresolved(message.into())
    }

    pub fn shape_mismatch(
        function_id: impl Into<String>,
        shape: impl fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        FunctionError::ResultShapeMismatch {
            function_id: function_id.into(),
            shape: shape.to_string(),
            reason: reason.into(),
        }
    }

    /// The translated execution failure, for both remote and transport causes
    pub fn execution_error(&self) -> Option<&FunctionExecutionError> {
        match self {
            FunctionError::InvocationFailed(e) | FunctionError::Execution(e) => Some(e),
            _ => None,
        }
    }

    /// The error raised by the remote function, if that is what failed
    pub fn remote_cause(&self) -> Option<&RemoteError> {
        match self {
            FunctionError::Execution(e) => e.cause().remote(),
            _ => None,
        }
    }

    /// Whether a caller-side retry could succeed with unchanged configuration.
    ///
    /// Only transport failures and unresolved targets qualify; the pool or
    /// member set may become available later. Remote application errors and
    /// shape mismatches are deterministic.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            FunctionError::InvocationFailed(_) | FunctionError::TargetUnresolved(_)
        )
    }
}

/// What made a function execution fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionCause {
    Remote(RemoteError),
    Transport(TransportError),
}

impl ExecutionCause {
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            ExecutionCause::Remote(e) => Some(e),
            ExecutionCause::Transport(_) => None,
        }
    }

    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            ExecutionCause::Transport(e) => Some(e),
            ExecutionCause::Remote(_) => None,
        }
    }
}

impl From<RemoteError> for ExecutionCause {
    fn from(value: RemoteError) -> Self {
        ExecutionCause::Remote(value)
    }
}

impl From<TransportError> for ExecutionCause {
    fn from(value: TransportError) -> Self {
        ExecutionCause::Transport(value)
    }
}

/// Local failure of a named function execution.
///
/// The message always names the function id; the original cause is kept
/// unmodified and returned directly from [`std::error::Error::source`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionExecutionError {
    function_id: String,
    cause: ExecutionCause,
}

impl FunctionExecutionError {
    pub fn new(function_id: impl Into<String>, cause: impl Into<ExecutionCause>) -> Self {
        Self {
            function_id: function_id.into(),
            cause: cause.into(),
        }
    }

    pub fn function_id(&self) -> &str {
        &self.function_id
    }

    pub fn cause(&self) -> &ExecutionCause {
        &self.cause
    }

    pub fn into_cause(self) -> ExecutionCause {
        self.cause
    }
}

impl fmt::Display for FunctionExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Execution of Function [with ID [{}]] failed", self.function_id)
    }
}

impl std::error::Error for FunctionExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.cause {
            ExecutionCause::Remote(e) => Some(e),
            ExecutionCause::Transport(e) => Some(e),
        }
    }
}
