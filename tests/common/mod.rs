#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::mpsc;

use nodeflow_core::event::{ChannelSink, ExecEvent};
use nodeflow_core::graph::ExecuteRequest;
use nodeflow_core::Result;
use nodeflow_engine::GraphExecutor;
use nodeflow_ops::{OpLibrary, OpRegistry};
use nodeflow_packs::load_nodepacks;

/// Registry built from the repository's own nodepack tree.
pub fn repo_registry() -> OpRegistry {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("nodepacks");
    load_nodepacks(&dir, &OpLibrary::with_builtins())
}

pub fn request(value: Value) -> ExecuteRequest {
    serde_json::from_value(value).expect("valid request")
}

/// Run a graph and collect the wire-shaped event frames alongside the
/// result.
pub async fn run_trace(
    registry: Arc<OpRegistry>,
    request: &ExecuteRequest,
) -> (Result<Map<String, Value>>, Vec<Value>) {
    let executor = GraphExecutor::new(registry);
    let (tx, mut rx) = mpsc::unbounded_channel::<ExecEvent>();
    let result = {
        let sink = ChannelSink::new(tx);
        executor.run(request, &sink).await
    };

    let mut frames = Vec::new();
    while let Ok(event) = rx.try_recv() {
        frames.push(serde_json::to_value(&event).expect("serializable event"));
    }
    (result, frames)
}

/// Status strings of frames belonging to one node.
pub fn statuses_for<'a>(frames: &'a [Value], node_id: &str) -> Vec<&'a str> {
    frames
        .iter()
        .filter(|f| f["node_id"] == node_id)
        .filter_map(|f| f["status"].as_str())
        .collect()
}
