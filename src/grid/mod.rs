//! Data grid collaborators
//!
//! The execution core does not own any grid resource. Cache sessions, pools
//! and regions are created and closed by the surrounding configuration layer
//! and handed to the templates as shared `Arc<dyn _>` handles. This module
//! defines those contracts, the server-side function SPI, and an in-process
//! grid implementation ([`local`]) used by tests, benchmarks and embedders.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐   resolve    ┌──────────────┐
//! │ FunctionTemplate│─────────────▶│ PoolResolver │
//! └────────┬────────┘              └──────────────┘
//!          │ dispatch
//!    ┌─────┴──────┬──────────────┬─────────────────┐
//!    ▼            ▼              ▼                 ▼
//! ┌──────┐  ┌──────────────┐ ┌────────┐  ┌──────────────────┐
//! │ Pool │  │ CacheSession │ │ Region │  │ members (session)│
//! └──────┘  └──────────────┘ └────────┘  └──────────────────┘
//! ```

use crate::error::{RemoteError, TransportError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub mod function;
pub mod local;
pub mod member;
pub mod pool;
pub mod registry;

pub use function::{FnFunction, Function, FunctionContext, RegionContext, ResultSender};
pub use member::{display_members, member_set, MemberId, MemberSet};
pub use pool::{CompositePoolResolver, PoolManager, PoolResolver, SessionPoolResolver};
pub use registry::FunctionRegistry;

/// Opaque value exchanged with remote functions (arguments and results)
pub use serde_json::Value;

/// Results of one invocation: the partial results in arrival order, or the
/// exception a remote function sent back instead.
pub type RawResults = std::result::Result<Vec<Value>, RemoteError>;

/// Outcome of handing a call to the transport
pub type TransportResult = std::result::Result<RawResults, TransportError>;

/// How many servers a server-targeted call is dispatched to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerScope {
    /// A single server chosen by the transport
    #[default]
    Any,
    /// Every server, one partial result set per server
    All,
}

impl fmt::Display for ServerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerScope::Any => write!(f, "any"),
            ServerScope::All => write!(f, "all"),
        }
    }
}

/// A managed set of connections to server members
pub trait Pool: Send + Sync {
    /// Name the pool is registered under
    fn name(&self) -> &str;

    fn is_destroyed(&self) -> bool;

    /// Execute a function on the pool's servers
    fn execute(&self, function_id: &str, arguments: &[Value], scope: ServerScope) -> TransportResult;
}

impl fmt::Debug for dyn Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool").field("name", &self.name()).finish()
    }
}

/// A keyed data set hosted by one or more members
pub trait Region: Send + Sync {
    fn name(&self) -> &str;

    /// Execute a function on the members hosting this region, restricted to
    /// the `filter` keys when any are given
    fn execute(&self, function_id: &str, arguments: &[Value], filter: &[Value]) -> TransportResult;
}

impl fmt::Debug for dyn Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region").field("name", &self.name()).finish()
    }
}

/// A live cache session connected to the grid
pub trait CacheSession: Send + Sync {
    fn name(&self) -> &str;

    fn is_closed(&self) -> bool;

    /// Look up a pool by name
    fn find_pool(&self, name: &str) -> Option<Arc<dyn Pool>>;

    /// Look up a region by name
    fn region(&self, name: &str) -> Option<Arc<dyn Region>>;

    /// All members currently known to the session
    fn members(&self) -> MemberSet;

    /// Members belonging to any of the given groups
    fn members_in_groups(&self, groups: &[String]) -> MemberSet;

    /// Execute a function on the session's servers
    fn execute_on_servers(
        &self,
        function_id: &str,
        arguments: &[Value],
        scope: ServerScope,
    ) -> TransportResult;

    /// Execute a function on every member in `members`
    fn execute_on_members(
        &self,
        members: &MemberSet,
        function_id: &str,
        arguments: &[Value],
    ) -> TransportResult;
}

impl fmt::Debug for dyn CacheSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheSession").field("name", &self.name()).finish()
    }
}
