//! Input resolution: mapping upstream outputs and node-data literals
//! onto the handle names a node expects.

use std::collections::HashSet;

use nodeflow_core::error::{NodeflowError, Result};
use nodeflow_core::graph::{GraphEdge, GraphNode};
use nodeflow_core::types::FunctionSchema;
use serde_json::{Map, Value};

/// Extract an upstream value from the output table, indexing multi-output
/// object values by the source handle. The handles `output` and `result`
/// select the whole value; any other handle is a declared key.
pub fn extract_output(
    outputs: &Map<String, Value>,
    source_id: &str,
    source_handle: &str,
) -> Result<Value> {
    let Some(value) = outputs.get(source_id) else {
        // An upstream that recorded nothing resolves to null.
        return Ok(Value::Null);
    };

    if source_handle == "output" || source_handle == "result" {
        return Ok(value.clone());
    }

    match value {
        Value::Object(map) => map.get(source_handle).cloned().ok_or_else(|| {
            NodeflowError::MissingOutputKey {
                key: source_handle.to_string(),
                available: map.keys().cloned().collect(),
            }
        }),
        _ => Err(NodeflowError::NonObjectOutput {
            key: source_handle.to_string(),
        }),
    }
}

/// Build a function node's raw input mapping: schema defaults, then
/// node-data literals, then upstream edge values; later sources win.
/// Parameters that end up unset stay absent; whether that is an error is
/// the operation's own call.
pub fn function_inputs(
    node: &GraphNode,
    schema: &FunctionSchema,
    incoming: &[&GraphEdge],
    outputs: &Map<String, Value>,
) -> Result<Map<String, Value>> {
    let mut inputs = Map::new();

    for param in &schema.params {
        if let Some(value) = node.data.get(&param.name) {
            inputs.insert(param.name.clone(), value.clone());
        } else if let Some(default) = &param.default {
            inputs.insert(param.name.clone(), default.clone());
        }
    }

    let param_names: HashSet<&str> = schema.params.iter().map(|p| p.name.as_str()).collect();
    for edge in incoming {
        let handle = edge.target_port();
        if !param_names.contains(handle) {
            continue;
        }
        let value = extract_output(outputs, &edge.source, edge.source_port())?;
        inputs.insert(handle.to_string(), value);
    }

    Ok(inputs)
}

/// Sort a list node's inbound edges by their `input-N` index; handles
/// that do not parse sort as index 0, matching the wire convention.
pub fn sort_list_edges<'a>(incoming: &[&'a GraphEdge]) -> Vec<&'a GraphEdge> {
    let mut edges = incoming.to_vec();
    edges.sort_by_key(|edge| {
        edge.target_port()
            .strip_prefix("input-")
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(0)
    });
    edges
}
