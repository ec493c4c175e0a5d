//! Server-side function SPI
//!
//! A [`Function`] is a unit of computation registered on members under a
//! string id. It reports results through the [`ResultSender`] of its
//! [`FunctionContext`], and reports failures the same way: an exception sent
//! with [`ResultSender::send_exception`] travels back to the caller as data.

use super::{MemberId, Value};
use crate::error::RemoteError;
use std::collections::BTreeMap;
use std::fmt;

/// A server-side function
pub trait Function: Send + Sync {
    /// Id the function is registered and invoked under
    fn id(&self) -> &str;

    /// Whether the function sends results back
    fn has_result(&self) -> bool {
        true
    }

    fn execute(&self, context: &mut FunctionContext<'_>);
}

impl fmt::Debug for dyn Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("id", &self.id())
            .field("has_result", &self.has_result())
            .finish()
    }
}

/// Region data visible to a region-targeted function
#[derive(Debug)]
pub struct RegionContext<'a> {
    pub name: &'a str,
    /// Routing keys the call was restricted to (empty = whole region)
    pub filter: &'a [Value],
    /// Entries selected by the filter
    pub entries: BTreeMap<String, Value>,
}

/// Everything a function sees while executing on one member
#[derive(Debug)]
pub struct FunctionContext<'a> {
    function_id: &'a str,
    arguments: &'a [Value],
    member: &'a MemberId,
    region: Option<RegionContext<'a>>,
    sender: ResultSender,
}

impl<'a> FunctionContext<'a> {
    pub fn new(function_id: &'a str, arguments: &'a [Value], member: &'a MemberId) -> Self {
        Self {
            function_id,
            arguments,
            member,
            region: None,
            sender: ResultSender::default(),
        }
    }

    pub fn with_region(mut self, region: RegionContext<'a>) -> Self {
        self.region = Some(region);
        self
    }

    pub fn function_id(&self) -> &str {
        self.function_id
    }

    pub fn arguments(&self) -> &[Value] {
        self.arguments
    }

    /// Positional argument, `None` when fewer arguments were passed
    pub fn argument(&self, index: usize) -> Option<&Value> {
        self.arguments.get(index)
    }

    pub fn member(&self) -> &MemberId {
        self.member
    }

    pub fn region(&self) -> Option<&RegionContext<'a>> {
        self.region.as_ref()
    }

    pub fn result_sender(&mut self) -> &mut ResultSender {
        &mut self.sender
    }

    pub(crate) fn into_sender(self) -> ResultSender {
        self.sender
    }
}

/// Collects what a function sends back from one member
#[derive(Debug, Default)]
pub struct ResultSender {
    results: Vec<Value>,
    exception: Option<RemoteError>,
    closed: bool,
}

impl ResultSender {
    /// Send a partial result
    pub fn send_result(&mut self, value: Value) {
        if !self.closed {
            self.results.push(value);
        }
    }

    /// Send the final result; later sends are ignored
    pub fn last_result(&mut self, value: Value) {
        self.send_result(value);
        self.closed = true;
    }

    /// Ship an exception back to the caller in place of results
    pub fn send_exception(&mut self, exception: RemoteError) {
        if self.exception.is_none() {
            self.exception = Some(exception);
        }
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn finish(self) -> std::result::Result<Vec<Value>, RemoteError> {
        match self.exception {
            Some(exception) => Err(exception),
            None => Ok(self.results),
        }
    }
}

type Handler = dyn Fn(&[Value]) -> std::result::Result<Value, RemoteError> + Send + Sync;

/// A [`Function`] backed by a closure over the call arguments
///
/// The closure's return value becomes the single result; an `Err` is sent
/// back as the function's exception.
pub struct FnFunction {
    id: String,
    has_result: bool,
    handler: Box<Handler>,
}

impl FnFunction {
    pub fn new<F>(id: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&[Value]) -> std::result::Result<Value, RemoteError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            has_result: true,
            handler: Box::new(handler),
        }
    }

    /// A function whose return value is discarded
    pub fn no_result<F>(id: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&[Value]) -> std::result::Result<(), RemoteError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            has_result: false,
            handler: Box::new(move |args| handler(args).map(|()| Value::Null)),
        }
    }
}

impl Function for FnFunction {
    fn id(&self) -> &str {
        &self.id
    }

    fn has_result(&self) -> bool {
        self.has_result
    }

    fn execute(&self, context: &mut FunctionContext<'_>) {
        let outcome = (self.handler)(context.arguments());
        let sender = context.result_sender();
        match outcome {
            Ok(value) if self.has_result => sender.last_result(value),
            Ok(_) => {}
            Err(exception) => sender.send_exception(exception),
        }
    }
}
