use nodeflow_core::error::{NodeflowError, Result};
use nodeflow_core::ops::{OpInputs, PlainOp};
use serde_json::Value;

use super::number;

pub struct AddOp;

impl PlainOp for AddOp {
    fn invoke(&self, inputs: OpInputs) -> Result<Value> {
        number(inputs.req_f64("a")? + inputs.req_f64("b")?)
    }
}

pub struct SubtractOp;

impl PlainOp for SubtractOp {
    fn invoke(&self, inputs: OpInputs) -> Result<Value> {
        number(inputs.req_f64("a")? - inputs.req_f64("b")?)
    }
}

pub struct MultiplyOp;

impl PlainOp for MultiplyOp {
    fn invoke(&self, inputs: OpInputs) -> Result<Value> {
        number(inputs.req_f64("a")? * inputs.req_f64("b")?)
    }
}

pub struct DivideOp;

impl PlainOp for DivideOp {
    fn invoke(&self, inputs: OpInputs) -> Result<Value> {
        let b = inputs.req_f64("b")?;
        if b == 0.0 {
            return Err(NodeflowError::Operation("Division by zero".to_string()));
        }
        number(inputs.req_f64("a")? / b)
    }
}

pub struct ModuloOp;

impl PlainOp for ModuloOp {
    fn invoke(&self, inputs: OpInputs) -> Result<Value> {
        let b = inputs.req_f64("b")?;
        if b == 0.0 {
            return Err(NodeflowError::Operation("Division by zero".to_string()));
        }
        number(inputs.req_f64("a")?.rem_euclid(b))
    }
}

pub struct PowerOp;

impl PlainOp for PowerOp {
    fn invoke(&self, inputs: OpInputs) -> Result<Value> {
        number(inputs.req_f64("a")?.powf(inputs.req_f64("b")?))
    }
}

pub struct SqrtOp;

impl PlainOp for SqrtOp {
    fn invoke(&self, inputs: OpInputs) -> Result<Value> {
        number(inputs.req_f64("a")?.sqrt())
    }
}

pub struct LogOp;

impl PlainOp for LogOp {
    fn invoke(&self, inputs: OpInputs) -> Result<Value> {
        number(inputs.req_f64("a")?.ln())
    }
}

pub struct ExpOp;

impl PlainOp for ExpOp {
    fn invoke(&self, inputs: OpInputs) -> Result<Value> {
        number(inputs.req_f64("a")?.exp())
    }
}

/// Index into a list (integer index, negative wraps from the end) or an
/// object (string key).
pub struct AtIndexOp;

impl PlainOp for AtIndexOp {
    fn invoke(&self, inputs: OpInputs) -> Result<Value> {
        let object = inputs.require("object")?;
        let index = inputs.require("index")?;

        match object {
            Value::Array(items) => {
                let i = index.as_i64().ok_or_else(|| {
                    NodeflowError::Operation("Index for a list must be an integer".to_string())
                })?;
                let len = items.len() as i64;
                let i = if i < 0 { i + len } else { i };
                if i < 0 || i >= len {
                    return Err(NodeflowError::Operation(format!(
                        "Index {} out of range for list of length {}",
                        i, len
                    )));
                }
                Ok(items[i as usize].clone())
            }
            Value::Object(map) => {
                let key = index.as_str().ok_or_else(|| {
                    NodeflowError::Operation("Index for an object must be a string".to_string())
                })?;
                map.get(key).cloned().ok_or_else(|| {
                    NodeflowError::Operation(format!("Key '{}' not found", key))
                })
            }
            _ => Err(NodeflowError::Operation(
                "parameter 'object' must be a list or an object".to_string(),
            )),
        }
    }
}
