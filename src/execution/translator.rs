//! Exception translation
//!
//! Wraps whatever made a function execution fail into a local error that
//! names the function. The original cause is kept as-is, so its type and
//! message survive for callers inspecting `source()`.

use super::request::FunctionId;
use crate::error::{ExecutionCause, FunctionError, FunctionExecutionError};
use tracing::debug;

/// Wrap `cause` into the error surfaced for `function_id`.
///
/// Remote application errors become [`FunctionError::Execution`]; transport
/// failures become [`FunctionError::InvocationFailed`]. Both display as
/// `Execution of Function [with ID [<id>]] failed`.
pub fn translate(function_id: &FunctionId, cause: impl Into<ExecutionCause>) -> FunctionError {
    let error = FunctionExecutionError::new(function_id.as_str(), cause);
    match error.cause() {
        ExecutionCause::Remote(remote) => {
            debug!(
                function_id = %function_id,
                exception_type = remote.exception_type(),
                message = remote.message(),
                "Function raised an exception"
            );
            FunctionError::Execution(error)
        }
        ExecutionCause::Transport(transport) => {
            debug!(function_id = %function_id, error = %transport, "Function invocation failed");
            FunctionError::InvocationFailed(error)
        }
    }
}
