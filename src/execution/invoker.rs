//! Function invocation
//!
//! Dispatches one request to the transport matching its target variant and
//! hands back the raw outcome. No adaptation or translation happens here.

use super::request::InvocationRequest;
use super::target::ExecutionTarget;
use crate::grid::TransportResult;
use std::time::Instant;
use tracing::{debug, trace};

/// Send `request` to its target and wait for the complete result set
pub fn invoke(request: &InvocationRequest) -> TransportResult {
    let function_id = request.function_id().as_str();
    let arguments = request.arguments();
    let start = Instant::now();

    trace!(
        function_id,
        target = %request.target(),
        arguments = arguments.len(),
        "Dispatching function"
    );

    let outcome = match request.target() {
        ExecutionTarget::Pool { pool, scope, .. } => pool.execute(function_id, arguments, *scope),
        ExecutionTarget::CacheSession { session, scope } => {
            session.execute_on_servers(function_id, arguments, *scope)
        }
        ExecutionTarget::Region { region, filter, .. } => {
            region.execute(function_id, arguments, filter)
        }
        ExecutionTarget::Members { members, session } => {
            session.execute_on_members(members, function_id, arguments)
        }
    };

    debug!(
        function_id,
        target = %request.target(),
        elapsed_us = start.elapsed().as_micros() as u64,
        transport_ok = outcome.is_ok(),
        "Function dispatch complete"
    );

    outcome
}
