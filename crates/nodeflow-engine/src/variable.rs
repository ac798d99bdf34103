//! Variable node semantics: typed constant production with optional
//! LLM-message wrapping.

use serde_json::{json, Map, Value};

/// Produce a variable node's output from its data blob. The declared
/// `variableType` drives conversion with lenient fallbacks (a bad number
/// becomes 0, a bad list becomes `[]`); `llmMessageFormat` wraps strings
/// and images into chat-message records, and the legacy
/// `textContentFormat` wraps strings into `{type, content}`.
pub fn variable_output(data: &Map<String, Value>) -> Value {
    let value = data.get("variableValue").unwrap_or(&Value::Null);
    let variable_type = data
        .get("variableType")
        .and_then(Value::as_str)
        .unwrap_or("String");
    let llm_message_format = flag(data, "llmMessageFormat");
    let text_content_format = flag(data, "textContentFormat");
    let role = data
        .get("llmMessageRole")
        .and_then(Value::as_str)
        .unwrap_or("user");

    match variable_type {
        "Number" => number_value(value),
        "Boolean" => Value::Bool(truthy(value)),
        "List" => match value {
            Value::Array(_) => value.clone(),
            _ => json!([]),
        },
        "Object" => match value {
            Value::Object(_) => value.clone(),
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(Value::Object(map)) => Value::Object(map),
                _ => json!({}),
            },
            _ => json!({}),
        },
        "Image" => {
            let url = stringify(value);
            if llm_message_format {
                json!({
                    "role": role,
                    "content": [{ "type": "image_url", "image_url": { "url": url } }],
                })
            } else {
                Value::String(url)
            }
        }
        _ => {
            // String, and any unrecognized declared type
            let text = stringify(value);
            if llm_message_format {
                json!({ "role": role, "content": text })
            } else if text_content_format {
                json!({ "type": "text", "content": text })
            } else {
                Value::String(text)
            }
        }
    }
}

fn flag(data: &Map<String, Value>, key: &str) -> bool {
    data.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn number_value(value: &Value) -> Value {
    match value {
        Value::Number(_) => value.clone(),
        Value::String(s) => {
            // integer unless the text carries a decimal point
            if s.contains('.') {
                s.trim().parse::<f64>().map(|f| json!(f)).unwrap_or(json!(0))
            } else {
                s.trim().parse::<i64>().map(|i| json!(i)).unwrap_or(json!(0))
            }
        }
        _ => json!(0),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.to_lowercase().as_str(), "true" | "1" | "yes"),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Null => false,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
