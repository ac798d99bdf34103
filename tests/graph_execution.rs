//! End-to-end execution scenarios over the repository nodepacks.

mod common;

use std::sync::Arc;

use serde_json::{json, Value};

use common::{repo_registry, request, run_trace, statuses_for};
use nodeflow_core::NodeflowError;
use nodeflow_engine::GraphExecutor;

fn variable(id: &str, ty: &str, value: &str) -> Value {
    json!({
        "id": id, "type": "variableNode",
        "data": { "variableType": ty, "variableValue": value }
    })
}

fn function(id: &str, name: &str, data: Value) -> Value {
    let mut data = data;
    data["functionName"] = json!(name);
    json!({ "id": id, "type": "functionNode", "data": data })
}

fn view(id: &str) -> Value {
    json!({ "id": id, "type": "viewNode", "data": {} })
}

fn edge(source: &str, source_handle: &str, target: &str, target_handle: &str) -> Value {
    json!({
        "source": source, "sourceHandle": source_handle,
        "target": target, "targetHandle": target_handle
    })
}

#[tokio::test]
async fn pure_arithmetic_pipeline() {
    let req = request(json!({
        "nodes": [
            variable("v1", "Number", "5"),
            variable("v2", "Number", "3"),
            variable("v3", "Number", "2"),
            variable("v4", "Number", "4"),
            function("n1", "add", json!({})),
            function("n2", "add", json!({})),
            function("n3", "multiply", json!({})),
            view("V"),
        ],
        "edges": [
            edge("v1", "output", "n1", "a"),
            edge("v2", "output", "n1", "b"),
            edge("v3", "output", "n2", "a"),
            edge("v4", "output", "n2", "b"),
            edge("n1", "output", "n3", "a"),
            edge("n2", "output", "n3", "b"),
            edge("n3", "output", "V", "input"),
        ]
    }));

    let (result, frames) = run_trace(Arc::new(repo_registry()), &req).await;
    let results = result.unwrap();
    assert_eq!(results["V"].as_f64().unwrap(), 48.0);

    // executing events arrive in dispatch order
    let executing: Vec<&str> = frames
        .iter()
        .filter(|f| f["status"] == "executing")
        .filter_map(|f| f["node_id"].as_str())
        .collect();
    assert_eq!(executing, vec!["v1", "v2", "v3", "v4", "n1", "n2", "n3", "V"]);

    // node numbers are the 1-indexed dispatch positions
    let n3_frame = frames
        .iter()
        .find(|f| f["node_id"] == "n3" && f["status"] == "executing")
        .unwrap();
    assert_eq!(n3_frame["node_number"], 7);
    assert_eq!(n3_frame["inputs"], json!({ "a": 8.0, "b": 6.0 }));
}

#[tokio::test]
async fn cycle_is_rejected_before_any_node_runs() {
    let req = request(json!({
        "nodes": [
            function("a", "add", json!({})),
            function("b", "add", json!({})),
        ],
        "edges": [
            edge("a", "output", "b", "a"),
            edge("b", "output", "a", "a"),
        ]
    }));

    let (result, frames) = run_trace(Arc::new(repo_registry()), &req).await;
    let err = result.unwrap_err();
    assert!(matches!(err, NodeflowError::Cycle));
    assert!(err.to_string().contains("cycle"));
    assert!(frames.is_empty());
}

#[tokio::test]
async fn per_node_failure_is_isolated() {
    let req = request(json!({
        "nodes": [
            function("d", "divide", json!({ "a": "1", "b": "0" })),
            view("V"),
        ],
        "edges": [edge("d", "output", "V", "input")]
    }));

    let (result, frames) = run_trace(Arc::new(repo_registry()), &req).await;
    let results = result.unwrap();
    assert!(results.contains_key("V"));
    assert_eq!(results["V"], Value::Null);

    assert_eq!(statuses_for(&frames, "d"), vec!["executing", "error"]);
    let error_frame = frames.iter().find(|f| f["node_id"] == "d" && f["status"] == "error");
    assert!(error_frame.unwrap()["error"]
        .as_str()
        .unwrap()
        .contains("Division by zero"));

    assert_eq!(frames.last().unwrap()["status"], "done");
}

#[tokio::test]
async fn multi_output_routing() {
    let req = request(json!({
        "nodes": [
            variable("name", "String", "Ada Lovelace"),
            function("split", "split_name", json!({})),
            view("V1"),
            view("V2"),
        ],
        "edges": [
            edge("name", "output", "split", "name"),
            edge("split", "first", "V1", "input"),
            edge("split", "last", "V2", "input"),
        ]
    }));

    let (result, _) = run_trace(Arc::new(repo_registry()), &req).await;
    let results = result.unwrap();
    assert_eq!(results["V1"], json!("Ada"));
    assert_eq!(results["V2"], json!("Lovelace"));
}

#[tokio::test]
async fn list_node_collects_inputs_in_index_order() {
    let req = request(json!({
        "nodes": [
            variable("v1", "Number", "1"),
            variable("v2", "Number", "2"),
            variable("v3", "Number", "3"),
            { "id": "l", "type": "listNode", "data": { "inputCount": 3 } },
            view("V"),
        ],
        "edges": [
            edge("v3", "output", "l", "input-2"),
            edge("v1", "output", "l", "input-0"),
            edge("v2", "output", "l", "input-1"),
            edge("l", "output", "V", "input"),
        ]
    }));

    let (result, _) = run_trace(Arc::new(repo_registry()), &req).await;
    assert_eq!(result.unwrap()["V"], json!([1, 2, 3]));
}

#[tokio::test]
async fn view_map_is_complete_even_when_unconnected() {
    let req = request(json!({
        "nodes": [view("V1"), view("V2")],
        "edges": []
    }));

    let (result, _) = run_trace(Arc::new(repo_registry()), &req).await;
    let results = result.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results["V1"], Value::Null);
    assert_eq!(results["V2"], Value::Null);
}

#[tokio::test]
async fn schema_defaults_apply_to_unwired_params() {
    // countdown's `from` defaults to 10 in its manifest
    let req = request(json!({
        "nodes": [
            function("c", "countdown", json!({})),
            view("V"),
        ],
        "edges": [edge("c", "output", "V", "input")]
    }));

    let (result, _) = run_trace(Arc::new(repo_registry()), &req).await;
    assert_eq!(result.unwrap()["V"], json!(10));
}

#[tokio::test]
async fn variable_llm_message_wrapping() {
    let req = request(json!({
        "nodes": [
            { "id": "m", "type": "variableNode", "data": {
                "variableType": "String",
                "variableValue": "What is Rust?",
                "llmMessageFormat": true,
                "llmMessageRole": "user",
            }},
            view("V"),
        ],
        "edges": [edge("m", "output", "V", "input")]
    }));

    let (result, _) = run_trace(Arc::new(repo_registry()), &req).await;
    assert_eq!(
        result.unwrap()["V"],
        json!({ "role": "user", "content": "What is Rust?" })
    );
}

#[tokio::test]
async fn unknown_edge_endpoint_is_structural() {
    let req = request(json!({
        "nodes": [view("V")],
        "edges": [edge("ghost", "output", "V", "input")]
    }));

    let executor = GraphExecutor::new(Arc::new(repo_registry()));
    let err = executor.execute(&req).await.unwrap_err();
    assert!(matches!(err, NodeflowError::UnknownNode(id) if id == "ghost"));
}

#[tokio::test]
async fn duplicate_inbound_handle_is_structural() {
    let req = request(json!({
        "nodes": [
            variable("v1", "Number", "1"),
            variable("v2", "Number", "2"),
            function("n", "sqrt", json!({})),
        ],
        "edges": [
            edge("v1", "output", "n", "a"),
            edge("v2", "output", "n", "a"),
        ]
    }));

    let executor = GraphExecutor::new(Arc::new(repo_registry()));
    let err = executor.execute(&req).await.unwrap_err();
    assert!(matches!(err, NodeflowError::DuplicateInput { .. }));
}

#[tokio::test]
async fn downstream_of_failure_records_its_own_coercion_error() {
    // divide fails, its null output reaches multiply, which fails to
    // coerce null for a float parameter; the graph still completes.
    let req = request(json!({
        "nodes": [
            function("d", "divide", json!({ "a": "1", "b": "0" })),
            function("m", "multiply", json!({ "b": "2" })),
            view("V"),
        ],
        "edges": [
            edge("d", "output", "m", "a"),
            edge("m", "output", "V", "input"),
        ]
    }));

    let (result, frames) = run_trace(Arc::new(repo_registry()), &req).await;
    assert_eq!(result.unwrap()["V"], Value::Null);

    assert_eq!(statuses_for(&frames, "m"), vec!["executing", "error"]);
    let m_error = frames
        .iter()
        .find(|f| f["node_id"] == "m" && f["status"] == "error")
        .unwrap();
    assert!(m_error["error"].as_str().unwrap().contains("'a'"));
}

#[tokio::test]
async fn env_vars_restored_after_wire_execution() {
    std::env::remove_var("NODEFLOW_WIRE_TEST_VAR");
    let req = request(json!({
        "nodes": [view("V")],
        "edges": [],
        "env_vars": { "NODEFLOW_WIRE_TEST_VAR": "present" }
    }));

    let executor = GraphExecutor::new(Arc::new(repo_registry()));
    executor.execute(&req).await.unwrap();
    assert!(std::env::var("NODEFLOW_WIRE_TEST_VAR").is_err());
}
