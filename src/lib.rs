#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

//! # gridfn
//!
//! gridfn lets application code call named server-side functions on a data
//! grid without knowing whether the call lands on a connection pool, the
//! servers of a cache session, the members hosting a region, or an explicit
//! set of members.
//!
//! ## Features
//!
//! - **Late binding**: function ids are looked up on the grid at call time
//! - **Fresh resolution**: the target is resolved on every call, failures are never cached
//! - **Declared result shapes**: single value, list, primitive, or no result
//! - **Exception fidelity**: remote errors surface unmodified as the direct cause
//! - **Synchronous**: a call returns once the remote round trip completes
//!
//! ## Quick Start
//!
//! ```
//! use gridfn::execution::{OnMembersFunctionTemplate, MemberTargets, ResultShape};
//! use gridfn::grid::local::{LocalCluster, LocalSession};
//! use gridfn::grid::{member_set, FnFunction};
//! use gridfn::Result;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! fn main() -> Result<()> {
//!     let cluster = LocalCluster::with_members(["server1", "server2"]);
//!     cluster.register_function(Arc::new(FnFunction::new("echo", |args| {
//!         Ok(args.first().cloned().unwrap_or_default())
//!     })))?;
//!     let session = Arc::new(LocalSession::new("cache", cluster));
//!
//!     let template = OnMembersFunctionTemplate::new(MemberTargets::members(
//!         session,
//!         member_set(["server1", "server2"]),
//!     ));
//!     let echoed = template.execute("echo", vec![json!("hi")], ResultShape::List)?;
//!     assert_eq!(echoed.into_list().len(), 2);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`execution`]: target resolution, invocation, result adaptation, exception translation
//! - [`grid`]: pool, cache session and region contracts, function SPI, in-process grid
//! - [`config`]: TOML configuration and environment overrides
//! - [`logging`]: `tracing` subscriber setup
//! - [`error`]: error types and Result alias
//!
//! ## Configuration
//!
//! | Option | Env Variable | Default | Description |
//! |--------|--------------|---------|-------------|
//! | `[server] pool_name` | `GRIDFN_POOL_NAME` | `DEFAULT` pool, then session | Pool to execute on |
//! | `[region] name` | `GRIDFN_REGION` | none | Region to execute on |
//! | `[members] groups` | `GRIDFN_MEMBER_GROUPS` | all members | Member groups |
//! | `[logging] level` | `GRIDFN_LOG_LEVEL` | `info` | Log filter when `RUST_LOG` is unset |

pub mod config;
pub mod error;
pub mod execution;
pub mod grid;
pub mod logging;

pub use config::ConfigFile;
pub use error::{FunctionError, FunctionExecutionError, RemoteError, Result, TransportError};
pub use execution::{
    AdaptedResult, ExecutionTarget, FunctionId, FunctionTemplate, MemberTargets,
    OnMembersFunctionTemplate, OnRegionFunctionTemplate, OnServerFunctionTemplate, Primitive,
    PrimitiveKind, RegionTargets, ResultShape, ServerTargets, TargetResolver,
};
pub use grid::{CacheSession, Function, Pool, PoolResolver, Region, ServerScope, Value};
pub use logging::{init_logging, LoggingConfig};
