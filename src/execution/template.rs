//! Execution templates
//!
//! A [`FunctionTemplate`] runs one call as resolve, invoke, adapt, and
//! translate on failure. Only resolution differs between template kinds, so
//! the template is generic over its [`TargetResolver`].

use super::adapter::{self, AdaptedResult, Primitive, PrimitiveKind, ResultShape};
use super::invoker;
use super::request::{FunctionId, InvocationRequest};
use super::target::{MemberTargets, RegionTargets, ServerTargets, TargetResolver};
use super::translator;
use crate::error::{FunctionError, Result};
use crate::grid::Value;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Executes functions on a pool or on the servers of a cache session
pub type OnServerFunctionTemplate = FunctionTemplate<ServerTargets>;

/// Executes functions on the members hosting a region
pub type OnRegionFunctionTemplate = FunctionTemplate<RegionTargets>;

/// Executes functions on an explicit set of members
pub type OnMembersFunctionTemplate = FunctionTemplate<MemberTargets>;

/// Where a call currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPhase {
    Idle,
    Resolving,
    Invoking,
    Adapting,
    Succeeded,
    Failed,
}

impl ExecutionPhase {
    /// Whether the call has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionPhase::Succeeded | ExecutionPhase::Failed)
    }
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionPhase::Idle => write!(f, "idle"),
            ExecutionPhase::Resolving => write!(f, "resolving"),
            ExecutionPhase::Invoking => write!(f, "invoking"),
            ExecutionPhase::Adapting => write!(f, "adapting"),
            ExecutionPhase::Succeeded => write!(f, "succeeded"),
            ExecutionPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Per-template execution counters
#[derive(Debug, Default)]
pub struct ExecutionStats {
    executions: AtomicU64,
    succeeded: AtomicU64,
    unresolved: AtomicU64,
    invocation_failures: AtomicU64,
    remote_failures: AtomicU64,
    shape_mismatches: AtomicU64,
}

impl ExecutionStats {
    fn record<T>(&self, outcome: &Result<T>) {
        let counter = match outcome {
            Ok(_) => &self.succeeded,
            Err(FunctionError::TargetUnresolved(_)) => &self.unresolved,
            Err(FunctionError::InvocationFailed(_)) => &self.invocation_failures,
            Err(FunctionError::Execution(_)) => &self.remote_failures,
            Err(FunctionError::ResultShapeMismatch { .. }) => &self.shape_mismatches,
            Err(_) => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ExecutionStatsSnapshot {
        ExecutionStatsSnapshot {
            executions: self.executions.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            unresolved: self.unresolved.load(Ordering::Relaxed),
            invocation_failures: self.invocation_failures.load(Ordering::Relaxed),
            remote_failures: self.remote_failures.load(Ordering::Relaxed),
            shape_mismatches: self.shape_mismatches.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`ExecutionStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStatsSnapshot {
    pub executions: u64,
    pub succeeded: u64,
    pub unresolved: u64,
    pub invocation_failures: u64,
    pub remote_failures: u64,
    pub shape_mismatches: u64,
}

impl ExecutionStatsSnapshot {
    /// Calls that ended in any failure
    pub fn failed(&self) -> u64 {
        self.unresolved + self.invocation_failures + self.remote_failures + self.shape_mismatches
    }
}

/// Runs named functions against the target its resolver produces.
///
/// Safe to share across threads: each call resolves its own target into a
/// local value and builds its own request.
pub struct FunctionTemplate<R: TargetResolver> {
    resolver: R,
    stats: ExecutionStats,
}

impl<R: TargetResolver> FunctionTemplate<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            stats: ExecutionStats::default(),
        }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Reconfigure the resolver; takes effect on the next call
    pub fn resolver_mut(&mut self) -> &mut R {
        &mut self.resolver
    }

    pub fn stats(&self) -> ExecutionStatsSnapshot {
        self.stats.snapshot()
    }

    /// Execute `function_id` and adapt its results to `shape`
    pub fn execute(
        &self,
        function_id: &str,
        arguments: Vec<Value>,
        shape: ResultShape,
    ) -> Result<AdaptedResult> {
        self.execute_with(function_id, arguments, shape, |_, adapted| Ok(adapted))
    }

    /// Execute and deserialize the first result, absent when none came back
    pub fn execute_and_extract<T: DeserializeOwned>(
        &self,
        function_id: &str,
        arguments: Vec<Value>,
    ) -> Result<Option<T>> {
        self.execute_with(function_id, arguments, ResultShape::Single, |id, adapted| {
            adapter::extract(id, adapted.into_single())
        })
    }

    /// Execute and deserialize every result
    pub fn execute_and_collect<T: DeserializeOwned>(
        &self,
        function_id: &str,
        arguments: Vec<Value>,
    ) -> Result<Vec<T>> {
        self.execute_with(function_id, arguments, ResultShape::List, |id, adapted| {
            adapter::collect(id, adapted.into_list())
        })
    }

    /// Execute and coerce the first result to a primitive
    pub fn execute_primitive(
        &self,
        function_id: &str,
        arguments: Vec<Value>,
        kind: PrimitiveKind,
    ) -> Result<Primitive> {
        self.execute_with(function_id, arguments, ResultShape::Primitive(kind), |id, adapted| {
            adapted.primitive().ok_or_else(|| {
                FunctionError::shape_mismatch(id.as_str(), kind, "no primitive was produced")
            })
        })
    }

    /// Execute for effect only; a carried exception still fails the call
    pub fn execute_with_no_result(&self, function_id: &str, arguments: Vec<Value>) -> Result<()> {
        self.execute_with(function_id, arguments, ResultShape::None, |_, _| Ok(()))
    }

    fn execute_with<T, F>(
        &self,
        function_id: &str,
        arguments: Vec<Value>,
        shape: ResultShape,
        finish: F,
    ) -> Result<T>
    where
        F: FnOnce(&FunctionId, AdaptedResult) -> Result<T>,
    {
        let function_id = FunctionId::new(function_id)?;
        trace!(function_id = %function_id, phase = %ExecutionPhase::Idle, shape = %shape, "Starting call");
        self.stats.executions.fetch_add(1, Ordering::Relaxed);
        let start = Instant::now();

        let outcome = self
            .run(&function_id, arguments, shape)
            .and_then(|adapted| finish(&function_id, adapted));
        self.stats.record(&outcome);

        let elapsed_us = start.elapsed().as_micros() as u64;
        match &outcome {
            Ok(_) => debug!(
                function_id = %function_id,
                shape = %shape,
                phase = %ExecutionPhase::Succeeded,
                elapsed_us,
                "Function executed"
            ),
            Err(e) => warn!(
                function_id = %function_id,
                shape = %shape,
                phase = %ExecutionPhase::Failed,
                elapsed_us,
                error = %e,
                "Function execution failed"
            ),
        }
        outcome
    }

    fn run(
        &self,
        function_id: &FunctionId,
        arguments: Vec<Value>,
        shape: ResultShape,
    ) -> Result<AdaptedResult> {
        trace!(function_id = %function_id, phase = %ExecutionPhase::Resolving, "Resolving target");
        let target = self.resolver.resolve()?;

        trace!(function_id = %function_id, phase = %ExecutionPhase::Invoking, target = %target, "Invoking function");
        let request = InvocationRequest::new(function_id.clone(), arguments, target);
        let raw = invoker::invoke(&request).map_err(|e| translator::translate(function_id, e))?;

        trace!(
            function_id = %function_id,
            phase = %ExecutionPhase::Adapting,
            results = raw.as_ref().map(Vec::len).unwrap_or(0),
            "Adapting results"
        );
        adapter::adapt(function_id, raw, shape)
    }
}

impl<R: TargetResolver + fmt::Debug> fmt::Debug for FunctionTemplate<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTemplate")
            .field("resolver", &self.resolver)
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}
