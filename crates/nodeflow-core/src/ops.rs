//! Operation capability traits and the keyword-input wrapper.
//!
//! Operations are values implementing one of three invocation shapes;
//! the registry indexes them by name in three disjoint maps and the
//! executor dispatches with a plain map lookup. Bodies are synchronous:
//! plain operations run inline, progress and stream operations run on a
//! dedicated blocking worker with their reporter wired to the executor's
//! event channel.

use serde_json::{Map, Value};

use crate::error::{NodeflowError, Result};
use crate::reporter::{ProgressReporter, StreamReporter};

/// Coerced keyword inputs for one invocation, with typed accessors.
/// Accessor failures are operation execution errors, which matches a
/// missing or ill-typed required argument.
#[derive(Debug, Clone, Default)]
pub struct OpInputs {
    values: Map<String, Value>,
}

impl OpInputs {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&Value> {
        self.values
            .get(name)
            .ok_or_else(|| NodeflowError::MissingParameter(name.to_string()))
    }

    pub fn req_f64(&self, name: &str) -> Result<f64> {
        self.require(name)?
            .as_f64()
            .ok_or_else(|| type_error(name, "a number"))
    }

    pub fn req_i64(&self, name: &str) -> Result<i64> {
        self.require(name)?
            .as_i64()
            .ok_or_else(|| type_error(name, "an integer"))
    }

    pub fn req_str(&self, name: &str) -> Result<&str> {
        self.require(name)?
            .as_str()
            .ok_or_else(|| type_error(name, "a string"))
    }

    pub fn req_bool(&self, name: &str) -> Result<bool> {
        self.require(name)?
            .as_bool()
            .ok_or_else(|| type_error(name, "a boolean"))
    }

    pub fn req_array(&self, name: &str) -> Result<&Vec<Value>> {
        self.require(name)?
            .as_array()
            .ok_or_else(|| type_error(name, "a list"))
    }

    pub fn req_object(&self, name: &str) -> Result<&Map<String, Value>> {
        self.require(name)?
            .as_object()
            .ok_or_else(|| type_error(name, "an object"))
    }

    /// Optional accessors treat an absent key and an explicit null alike.
    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn opt_f64(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(Value::as_f64)
    }

    pub fn opt_i64(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(Value::as_i64)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }
}

fn type_error(name: &str, expected: &str) -> NodeflowError {
    NodeflowError::Operation(format!("parameter '{}' must be {}", name, expected))
}

/// A plain operation: coerced inputs in, value out.
pub trait PlainOp: Send + Sync + 'static {
    fn invoke(&self, inputs: OpInputs) -> Result<Value>;
}

/// A long-running operation that reports percent progress while it runs.
pub trait ProgressOp: Send + Sync + 'static {
    fn invoke(&self, inputs: OpInputs, reporter: &ProgressReporter) -> Result<Value>;
}

/// An operation that streams text chunks while producing a final value.
pub trait StreamOp: Send + Sync + 'static {
    fn invoke(&self, inputs: OpInputs, reporter: &StreamReporter) -> Result<Value>;
}

impl<F> PlainOp for F
where
    F: Fn(OpInputs) -> Result<Value> + Send + Sync + 'static,
{
    fn invoke(&self, inputs: OpInputs) -> Result<Value> {
        self(inputs)
    }
}

impl<F> ProgressOp for F
where
    F: Fn(OpInputs, &ProgressReporter) -> Result<Value> + Send + Sync + 'static,
{
    fn invoke(&self, inputs: OpInputs, reporter: &ProgressReporter) -> Result<Value> {
        self(inputs, reporter)
    }
}

impl<F> StreamOp for F
where
    F: Fn(OpInputs, &StreamReporter) -> Result<Value> + Send + Sync + 'static,
{
    fn invoke(&self, inputs: OpInputs, reporter: &StreamReporter) -> Result<Value> {
        self(inputs, reporter)
    }
}
