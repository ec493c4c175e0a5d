//! Invocation requests

use super::target::ExecutionTarget;
use crate::error::{FunctionError, Result};
use crate::grid::Value;
use std::fmt;

/// Name a remote function is registered under.
///
/// Only checked for being non-blank; whether the function exists is decided
/// by the grid at call time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionId(String);

impl FunctionId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(FunctionError::InvalidArgument(
                "Function ID must not be null or empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FunctionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One call of a function against one resolved target
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    function_id: FunctionId,
    arguments: Vec<Value>,
    target: ExecutionTarget,
}

impl InvocationRequest {
    pub fn new(function_id: FunctionId, arguments: Vec<Value>, target: ExecutionTarget) -> Self {
        Self {
            function_id,
            arguments,
            target,
        }
    }

    pub fn function_id(&self) -> &FunctionId {
        &self.function_id
    }

    /// Positional arguments, in call order
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    pub fn target(&self) -> &ExecutionTarget {
        &self.target
    }
}
