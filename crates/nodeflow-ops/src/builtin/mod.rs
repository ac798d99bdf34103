pub mod llm;
pub mod math;
pub mod progress;
pub mod stream;
pub mod text;

use nodeflow_core::error::{NodeflowError, Result};
use serde_json::Value;

/// Build a JSON number from a float, rejecting NaN and infinities so a
/// domain error surfaces as an operation error instead of a null output.
pub(crate) fn number(value: f64) -> Result<Value> {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| NodeflowError::Operation("result is not a finite number".to_string()))
}
