//! Coercion of raw client-supplied values into declared parameter types.
//!
//! A failure here is a node-level error, recorded and emitted; it never
//! aborts the execution. `null` fails for every type except `any`, which
//! is how a failed upstream's output surfaces downstream.

use nodeflow_core::error::{NodeflowError, Result};
use nodeflow_core::types::{FunctionSchema, ParamSchema, ValueType};
use serde_json::{Map, Value};

/// Coerce every declared parameter in `inputs`; undeclared keys pass
/// through untouched.
pub fn coerce_inputs(schema: &FunctionSchema, inputs: Map<String, Value>) -> Result<Map<String, Value>> {
    let mut coerced = Map::with_capacity(inputs.len());
    for (name, value) in inputs {
        let value = match schema.param(&name) {
            Some(param) => coerce_value(value, param)?,
            None => value,
        };
        coerced.insert(name, value);
    }
    Ok(coerced)
}

/// Coerce one value to its parameter's declared type.
pub fn coerce_value(value: Value, param: &ParamSchema) -> Result<Value> {
    if param.ty == ValueType::Any {
        return Ok(value);
    }
    if value.is_null() {
        return Err(error(param, "cannot coerce null"));
    }

    match param.ty {
        ValueType::Int => coerce_int(value, param),
        ValueType::Float => coerce_float(value, param),
        ValueType::Str => coerce_str(value, param),
        ValueType::Bool => coerce_bool(value, param),
        ValueType::List => coerce_list(value, param),
        ValueType::Dict => coerce_dict(value, param),
        ValueType::Literal => coerce_literal(value, param),
        ValueType::Image => match value {
            Value::String(_) => Ok(value),
            other => Err(error(param, &format!("expected an image data URL, got {}", kind(&other)))),
        },
        ValueType::Any => unreachable!(),
    }
}

fn coerce_int(value: Value, param: &ParamSchema) -> Result<Value> {
    match value {
        Value::Number(ref n) => {
            if n.is_i64() || n.is_u64() {
                Ok(value)
            } else {
                // float source truncates toward zero
                Ok(Value::from(n.as_f64().unwrap_or(0.0).trunc() as i64))
            }
        }
        // A boolean source is never sent through the integer conversion.
        Value::Bool(_) => Ok(value),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| error(param, &format!("cannot parse '{}' as int", s))),
        other => Err(error(param, &format!("cannot coerce {} to int", kind(&other)))),
    }
}

fn coerce_float(value: Value, param: &ParamSchema) -> Result<Value> {
    let float = |f: f64| {
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| error(param, "not a finite float"))
    };
    match value {
        Value::Number(n) => float(n.as_f64().unwrap_or(0.0)),
        Value::Bool(b) => float(if b { 1.0 } else { 0.0 }),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(f) => float(f),
            Err(_) => Err(error(param, &format!("cannot parse '{}' as float", s))),
        },
        other => Err(error(param, &format!("cannot coerce {} to float", kind(&other)))),
    }
}

fn coerce_str(value: Value, _param: &ParamSchema) -> Result<Value> {
    match value {
        Value::String(_) => Ok(value),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        other => Ok(Value::String(other.to_string())),
    }
}

fn coerce_bool(value: Value, param: &ParamSchema) -> Result<Value> {
    match value {
        Value::Bool(_) => Ok(value),
        Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Value::Bool(true)),
            "false" | "0" | "no" => Ok(Value::Bool(false)),
            _ => Err(error(param, &format!("cannot parse '{}' as bool", s))),
        },
        other => Err(error(param, &format!("cannot coerce {} to bool", kind(&other)))),
    }
}

fn coerce_list(value: Value, param: &ParamSchema) -> Result<Value> {
    match value {
        Value::Array(_) => Ok(value),
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(Value::Array(items)) => Ok(Value::Array(items)),
            Ok(_) => Err(error(param, "JSON string does not decode to a list")),
            Err(e) => Err(error(param, &format!("invalid JSON: {}", e))),
        },
        other => Err(error(param, &format!("cannot coerce {} to list", kind(&other)))),
    }
}

fn coerce_dict(value: Value, param: &ParamSchema) -> Result<Value> {
    match value {
        Value::Object(_) => Ok(value),
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(Value::Object(map)) => Ok(Value::Object(map)),
            Ok(_) => Err(error(param, "JSON string does not decode to an object")),
            Err(e) => Err(error(param, &format!("invalid JSON: {}", e))),
        },
        other => Err(error(param, &format!("cannot coerce {} to dict", kind(&other)))),
    }
}

fn coerce_literal(value: Value, param: &ParamSchema) -> Result<Value> {
    let Value::String(ref s) = value else {
        return Err(error(param, &format!("literal value must be a string, got {}", kind(&value))));
    };
    let admissible = param.literal_values.as_deref().unwrap_or(&[]);
    if admissible.iter().any(|v| v == s) {
        Ok(value)
    } else {
        Err(error(
            param,
            &format!("'{}' is not one of {:?}", s, admissible),
        ))
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

fn error(param: &ParamSchema, message: &str) -> NodeflowError {
    NodeflowError::Coercion {
        param: param.name.clone(),
        message: message.to_string(),
    }
}
