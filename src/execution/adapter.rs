//! Result adaptation
//!
//! Converts the raw partial results of one invocation into the shape the
//! caller declared. A carried remote exception short-circuits adaptation for
//! every shape and goes to the exception translator untouched.

use super::request::FunctionId;
use super::translator;
use crate::error::{FunctionError, Result};
use crate::grid::{RawResults, Value};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The form a caller expects the result in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultShape {
    /// First result, or absent when nothing came back
    Single,
    /// Every result, in arrival order
    List,
    /// First result coerced to a primitive
    Primitive(PrimitiveKind),
    /// Results are discarded
    None,
}

impl fmt::Display for ResultShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultShape::Single => write!(f, "single value"),
            ResultShape::List => write!(f, "list"),
            ResultShape::Primitive(kind) => write!(f, "{}", kind),
            ResultShape::None => write!(f, "no result"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// 64-bit float, also used for decimals
    Double,
    Bool,
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveKind::Int => write!(f, "int"),
            PrimitiveKind::Long => write!(f, "long"),
            PrimitiveKind::Double => write!(f, "double"),
            PrimitiveKind::Bool => write!(f, "boolean"),
        }
    }
}

/// An unboxed primitive result
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Int(i32),
    Long(i64),
    Double(f64),
    Bool(bool),
}

impl Primitive {
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Primitive::Int(v) => Some(i64::from(v)),
            Primitive::Long(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Primitive::Int(v) => Some(f64::from(v)),
            Primitive::Long(v) => Some(v as f64),
            Primitive::Double(v) => Some(v),
            Primitive::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Primitive::Bool(v) => Some(v),
            _ => None,
        }
    }
}

/// A result adapted to its declared shape
#[derive(Debug, Clone, PartialEq)]
pub enum AdaptedResult {
    Single(Option<Value>),
    List(Vec<Value>),
    Primitive(Primitive),
    None,
}

impl AdaptedResult {
    pub fn into_single(self) -> Option<Value> {
        match self {
            AdaptedResult::Single(value) => value,
            AdaptedResult::List(values) => values.into_iter().next(),
            _ => None,
        }
    }

    pub fn into_list(self) -> Vec<Value> {
        match self {
            AdaptedResult::List(values) => values,
            AdaptedResult::Single(value) => value.into_iter().collect(),
            _ => Vec::new(),
        }
    }

    pub fn primitive(&self) -> Option<Primitive> {
        match self {
            AdaptedResult::Primitive(p) => Some(*p),
            _ => None,
        }
    }
}

/// Adapt raw results to `shape`
pub fn adapt(function_id: &FunctionId, raw: RawResults, shape: ResultShape) -> Result<AdaptedResult> {
    let results = raw.map_err(|cause| translator::translate(function_id, cause))?;

    Ok(match shape {
        ResultShape::Single => AdaptedResult::Single(results.into_iter().next()),
        ResultShape::List => AdaptedResult::List(unwrap_list(results)),
        ResultShape::Primitive(kind) => {
            let first = results.into_iter().next().ok_or_else(|| {
                FunctionError::shape_mismatch(function_id.as_str(), kind, "no result was returned")
            })?;
            AdaptedResult::Primitive(coerce(function_id, &first, kind)?)
        }
        ResultShape::None => AdaptedResult::None,
    })
}

/// A lone array result is the list itself, not a list holding a list
fn unwrap_list(mut results: Vec<Value>) -> Vec<Value> {
    if results.len() == 1 && results[0].is_array() {
        if let Some(Value::Array(inner)) = results.pop() {
            return inner;
        }
    }
    results
}

fn coerce(function_id: &FunctionId, value: &Value, kind: PrimitiveKind) -> Result<Primitive> {
    let mismatch = |reason: String| FunctionError::shape_mismatch(function_id.as_str(), kind, reason);

    match kind {
        PrimitiveKind::Int => integral(value)
            .and_then(|v| i32::try_from(v).ok())
            .map(Primitive::Int)
            .ok_or_else(|| mismatch(format!("{} is not an int", value))),
        PrimitiveKind::Long => integral(value)
            .map(Primitive::Long)
            .ok_or_else(|| mismatch(format!("{} is not a long", value))),
        PrimitiveKind::Double => decimal(value)
            .map(Primitive::Double)
            .ok_or_else(|| mismatch(format!("{} is not a double", value))),
        PrimitiveKind::Bool => match value {
            Value::Bool(b) => Ok(Primitive::Bool(*b)),
            Value::String(s) => s
                .parse::<bool>()
                .map(Primitive::Bool)
                .map_err(|_| mismatch(format!("{} is not a boolean", value))),
            other => Err(mismatch(format!("{} is not a boolean", other))),
        },
    }
}

/// Whole numbers, including integral floats and numeric strings
fn integral(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn decimal(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Deserialize an optional single result into `T`
pub fn extract<T: DeserializeOwned>(function_id: &FunctionId, value: Option<Value>) -> Result<Option<T>> {
    value
        .map(|v| deserialize(function_id, v))
        .transpose()
}

/// Deserialize every list element into `T`
pub fn collect<T: DeserializeOwned>(function_id: &FunctionId, values: Vec<Value>) -> Result<Vec<T>> {
    values
        .into_iter()
        .map(|v| deserialize(function_id, v))
        .collect()
}

fn deserialize<T: DeserializeOwned>(function_id: &FunctionId, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        FunctionError::shape_mismatch(function_id.as_str(), std::any::type_name::<T>(), e.to_string())
    })
}
