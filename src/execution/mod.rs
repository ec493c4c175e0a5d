//! Function execution
//!
//! One call flows through four stages:
//!
//! 1. [`target`] resolves exactly one [`ExecutionTarget`] from the template's
//!    configuration, fresh on every call.
//! 2. [`invoker`] dispatches the [`InvocationRequest`] to that target and
//!    returns the raw partial results, or the exception a remote function
//!    sent back.
//! 3. [`adapter`] converts raw results into the declared [`ResultShape`].
//! 4. [`translator`] turns any remote or transport failure into a
//!    [`FunctionError`](crate::error::FunctionError) naming the function.
//!
//! [`FunctionTemplate`] ties the stages together and is generic over the
//! resolver, giving one template kind per target family.
//!
//! # Example
//!
//! ```
//! use gridfn::execution::{FunctionTemplate, ResultShape, ServerTargets};
//! use gridfn::grid::local::{LocalCluster, LocalSession};
//! use gridfn::grid::FnFunction;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let cluster = LocalCluster::with_members(["server1"]);
//! cluster
//!     .register_function(Arc::new(FnFunction::new("returnFive", |_| Ok(json!(5)))))
//!     .unwrap();
//! let session = Arc::new(LocalSession::new("cache", cluster));
//!
//! let template = FunctionTemplate::new(ServerTargets::with_session(session));
//! let five: Option<i64> = template.execute_and_extract("returnFive", vec![]).unwrap();
//! assert_eq!(five, Some(5));
//! ```

pub mod adapter;
pub mod invoker;
pub mod request;
pub mod target;
pub mod template;
pub mod translator;

pub use adapter::{AdaptedResult, Primitive, PrimitiveKind, ResultShape};
pub use request::{FunctionId, InvocationRequest};
pub use target::{
    ExecutionTarget, MemberSelection, MemberTargets, RegionTargets, ServerTargets, TargetKind,
    TargetResolver,
};
pub use template::{
    ExecutionPhase, ExecutionStats, ExecutionStatsSnapshot, FunctionTemplate,
    OnMembersFunctionTemplate, OnRegionFunctionTemplate, OnServerFunctionTemplate,
};
