//! Shared test fixtures for gridfn integration tests
//!
//! # Usage
//!
//! In your test file, add:
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```
//!
//! # Features
//!
//! - `TestGrid`: an in-process cluster of three members with a cache session,
//!   a `serverPool` pool and a `Customers` region
//! - The standard test functions, registered on every member
//! - Assertion helpers for translated execution failures

#![allow(dead_code)]

use gridfn::error::{FunctionError, RemoteError};
use gridfn::grid::local::{LocalCluster, LocalMember, LocalPool, LocalRegion, LocalSession};
use gridfn::grid::{FnFunction, Function, FunctionContext, Value};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const SERVER_POOL: &str = "serverPool";
pub const CUSTOMERS: &str = "Customers";

/// An in-process grid wired the way the integration tests expect
pub struct TestGrid {
    pub cluster: LocalCluster,
    pub session: Arc<LocalSession>,
    pub pool: Arc<LocalPool>,
    pub region: Arc<LocalRegion>,
    /// Incremented by every `logEvent` call
    pub events: Arc<AtomicU64>,
}

impl TestGrid {
    pub fn event_count(&self) -> u64 {
        self.events.load(Ordering::SeqCst)
    }
}

/// Three members: `server1` in group `east`, `server2` and `server3` in `west`
pub fn test_grid() -> TestGrid {
    let cluster = LocalCluster::new();
    cluster.add_member(LocalMember::new("server1").with_groups(["east"]));
    cluster.add_member(LocalMember::new("server2").with_groups(["west"]));
    cluster.add_member(LocalMember::new("server3").with_groups(["west"]));

    let events = Arc::new(AtomicU64::new(0));
    for function in standard_functions(events.clone()) {
        cluster
            .register_function(function)
            .expect("register test function");
    }

    let region = cluster.create_region(CUSTOMERS);
    region.put("alice", json!({"name": "Alice", "tier": "gold"}));
    region.put("bob", json!({"name": "Bob", "tier": "silver"}));
    region.put("carol", json!({"name": "Carol", "tier": "gold"}));

    let session = Arc::new(LocalSession::new("testCache", cluster.clone()));
    let pool = session.create_pool(SERVER_POOL, cluster.member_ids());

    TestGrid {
        cluster,
        session,
        pool,
        region,
        events,
    }
}

/// The functions every member of a [`TestGrid`] hosts
pub fn standard_functions(events: Arc<AtomicU64>) -> Vec<Arc<dyn Function>> {
    vec![
        throwing_function("exceptionThrowingFunction"),
        Arc::new(FnFunction::new("echo", |args| {
            Ok(args.first().cloned().unwrap_or(Value::Null))
        })),
        Arc::new(FnFunction::new("returnFive", |_| Ok(json!(5)))),
        Arc::new(FnFunction::new("returnList", |_| Ok(json!(["one", "two", "three"])))),
        Arc::new(FnFunction::new("returnPrimitive", |_| Ok(json!(7)))),
        Arc::new(FnFunction::new("returnNothing", |_| Ok(Value::Null))),
        Arc::new(FnFunction::new("sum", |args| {
            let total: i64 = args.iter().filter_map(Value::as_i64).sum();
            Ok(json!(total))
        })),
        Arc::new(FnFunction::no_result("logEvent", move |_| {
            events.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })),
        Arc::new(MemberName),
        Arc::new(RegionKeys),
        Arc::new(Streaming),
    ]
}

/// Always raises `IllegalArgumentException("TEST")`
pub fn throwing_function(id: &str) -> Arc<dyn Function> {
    Arc::new(FnFunction::new(id, |_| {
        Err(RemoteError::illegal_argument("TEST"))
    }))
}

/// Sends back the id of the member it ran on
struct MemberName;

impl Function for MemberName {
    fn id(&self) -> &str {
        "memberName"
    }

    fn execute(&self, context: &mut FunctionContext<'_>) {
        let name = json!(context.member().as_str());
        context.result_sender().last_result(name);
    }
}

/// Sends back the keys of the region entries it was given
struct RegionKeys;

impl Function for RegionKeys {
    fn id(&self) -> &str {
        "regionKeys"
    }

    fn execute(&self, context: &mut FunctionContext<'_>) {
        let keys: Option<Vec<Value>> = context
            .region()
            .map(|region| region.entries.keys().map(|k| json!(k)).collect());
        let sender = context.result_sender();
        match keys {
            Some(keys) => sender.last_result(Value::Array(keys)),
            None => sender.send_exception(RemoteError::illegal_state(
                "regionKeys must be executed on a region",
            )),
        }
    }
}

/// Sends each argument back as a separate partial result
struct Streaming;

impl Function for Streaming {
    fn id(&self) -> &str {
        "streaming"
    }

    fn execute(&self, context: &mut FunctionContext<'_>) {
        let arguments = context.arguments().to_vec();
        let sender = context.result_sender();
        for argument in arguments {
            sender.send_result(argument);
        }
    }
}

/// Assert that `err` is the translated failure of `function_id` whose direct
/// cause is an `IllegalArgumentException("TEST")` without a nested cause
pub fn assert_remote_test_failure(err: &FunctionError, function_id: &str) {
    use std::error::Error;

    assert!(
        matches!(err, FunctionError::Execution(_)),
        "expected a remote execution failure, got {:?}",
        err
    );
    assert_eq!(
        err.to_string(),
        format!("Execution of Function [with ID [{}]] failed", function_id)
    );
    let cause = err.source().expect("translated failure has a cause");
    assert_eq!(cause.to_string(), "TEST");
    assert!(cause.source().is_none());
    assert_eq!(
        err.remote_cause().map(RemoteError::exception_type),
        Some(gridfn::error::ILLEGAL_ARGUMENT_EXCEPTION)
    );
}
