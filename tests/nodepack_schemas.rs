//! Schema introspection over the repository's shipped nodepacks.

mod common;

use common::repo_registry;
use serde_json::Value;

#[test]
fn discovery_is_deterministic_and_complete() {
    let registry = repo_registry();
    let names: Vec<&str> = registry.schemas().iter().map(|s| s.name.as_str()).collect();

    // packs are scanned in name order (basic, llm, text); within a pack,
    // plain units come before progress and stream units
    assert_eq!(
        names,
        vec![
            "add",
            "subtract",
            "multiply",
            "divide",
            "modulo",
            "power",
            "sqrt",
            "log",
            "exp",
            "at_index",
            "process_items",
            "countdown",
            "stream_text",
            "openai_chat_completion",
            "get_openai_message_content",
            "openai_chat_completion_stream",
            "concat",
            "uppercase",
            "lowercase",
            "split_name",
            "template",
        ]
    );
}

#[test]
fn wire_shape_of_schema_listing() {
    let registry = repo_registry();
    let listing = serde_json::to_value(registry.schemas()).unwrap();
    let entries = listing.as_array().unwrap();

    let find = |name: &str| -> &Value {
        entries
            .iter()
            .find(|e| e["name"] == name)
            .unwrap_or_else(|| panic!("schema '{}' missing", name))
    };

    let add = find("add");
    assert_eq!(add["docstring"], "Add two numbers.");
    assert!(add["filepath"].as_str().unwrap().ends_with("basic/ops.toml"));
    assert_eq!(add["params"][0]["name"], "a");
    assert_eq!(add["params"][0]["type"], "float");
    assert_eq!(add["returns"], serde_json::json!([{ "name": "result", "type": "float" }]));
    assert!(add.get("is_progress_node").is_none());

    let progress = find("process_items");
    assert_eq!(progress["is_progress_node"], true);

    let stream = find("stream_text");
    assert_eq!(stream["is_stream_node"], true);
    assert_eq!(stream["params"][1]["default"], 8);

    let split = find("split_name");
    let returns = split["returns"].as_array().unwrap();
    let names: Vec<&str> = returns.iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["first", "last"]);

    let llm_stream = find("openai_chat_completion_stream");
    let effort = llm_stream["params"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == "reasoning_effort")
        .unwrap();
    assert_eq!(effort["type"], "literal");
    assert_eq!(
        effort["literal_values"],
        serde_json::json!(["none", "low", "medium", "high"])
    );
}

#[test]
fn progress_and_stream_kinds_dispatchable() {
    let registry = repo_registry();
    assert!(matches!(
        registry.lookup("process_items"),
        Some((_, nodeflow_ops::RegisteredOp::Progress(_)))
    ));
    assert!(matches!(
        registry.lookup("openai_chat_completion_stream"),
        Some((_, nodeflow_ops::RegisteredOp::Stream(_)))
    ));
    assert!(matches!(
        registry.lookup("add"),
        Some((_, nodeflow_ops::RegisteredOp::Plain(_)))
    ));
}
