use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderName, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use nodeflow_core::event::{EventSink, ExecEvent};
use nodeflow_core::graph::ExecuteRequest;
use nodeflow_core::types::FunctionSchema;
use nodeflow_engine::GraphExecutor;

use crate::state::AppState;

// GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Nodeflow backend API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// GET /get_schema
pub async fn get_schema(State(state): State<Arc<AppState>>) -> Json<Vec<FunctionSchema>> {
    let registry = state.registry();
    debug!(ops = registry.schemas().len(), "Serving schema listing");
    Json(registry.schemas().to_vec())
}

// POST /execute: run to completion, return the view result map.
// Structural failures are a 500; per-node failures surface only as null
// entries in the map.
pub async fn execute(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let executor = GraphExecutor::new(state.registry());
    match executor.execute(&request).await {
        Ok(results) => Ok(Json(json!({ "results": results }))),
        Err(e) => {
            warn!(error = %e, "Graph execution failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error executing graph: {}", e),
            ))
        }
    }
}

/// Sink that serializes events straight into the SSE frame channel.
struct FrameSink {
    tx: mpsc::UnboundedSender<Value>,
}

impl EventSink for FrameSink {
    fn emit(&self, event: ExecEvent) {
        if let Ok(frame) = serde_json::to_value(&event) {
            let _ = self.tx.send(frame);
        }
    }
}

// POST /execute/stream: run and emit the SSE trace. Frame order is
// event order; the last frame is `done` or the terminal global error.
pub async fn execute_stream(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExecuteRequest>,
) -> impl IntoResponse {
    let registry = state.registry();
    let (tx, rx) = mpsc::unbounded_channel::<Value>();

    tokio::spawn(async move {
        let executor = GraphExecutor::new(registry);
        let sink = FrameSink { tx: tx.clone() };
        if let Err(e) = executor.run(&request, &sink).await {
            warn!(error = %e, "Graph execution failed");
            let _ = tx.send(json!({ "status": "error", "error": e.to_string() }));
        }
    });

    let frames = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|frame| (frame, rx))
    })
    .map(|frame| Ok::<_, Infallible>(Event::default().data(frame.to_string())));

    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            // keep intermediaries from buffering the stream
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Sse::new(frames),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[test]
    fn frame_sink_serializes_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = FrameSink { tx };

        let mut results = Map::new();
        results.insert("v".into(), json!(48.0));
        sink.emit(ExecEvent::Done { results });

        let frame = rx.try_recv().unwrap();
        assert_eq!(frame["status"], "done");
        assert_eq!(frame["results"]["v"], 48.0);
    }

    #[test]
    fn global_error_frame_shape() {
        let frame = json!({ "status": "error", "error": "Graph contains a cycle" });
        assert_eq!(frame["status"], "error");
        assert!(frame.get("node_id").is_none());
    }
}
