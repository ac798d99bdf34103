//! The graph executor: dependency-ordered, sequential execution of a
//! heterogeneous node graph with per-node lifecycle events.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

use nodeflow_core::error::{NodeflowError, Result};
use nodeflow_core::event::{EventSink, ExecEvent, NullSink};
use nodeflow_core::graph::{ExecuteRequest, GraphEdge, GraphNode, NodeKind};
use nodeflow_core::ops::{OpInputs, ProgressOp, StreamOp};
use nodeflow_core::reporter::{ProgressReporter, StreamReporter};
use nodeflow_core::types::FunctionSchema;
use nodeflow_ops::{OpRegistry, RegisteredOp};

use crate::env::{execution_lock, EnvGuard};
use crate::{coerce, resolve, topo, variable};

/// Executes submitted graphs against an operation registry.
///
/// Nodes run one at a time in topological order; per-node failures are
/// recorded as events (the node's output becomes null) and execution
/// continues. Only structural errors (a cycle, an unknown edge endpoint,
/// a duplicate inbound handle) abort the run, before any node event is
/// emitted.
pub struct GraphExecutor {
    registry: Arc<OpRegistry>,
}

impl GraphExecutor {
    pub fn new(registry: Arc<OpRegistry>) -> Self {
        Self { registry }
    }

    /// Run to completion, discarding the event trace. Progress and
    /// stream operations still run; their reporters feed a null sink.
    pub async fn execute(&self, request: &ExecuteRequest) -> Result<Map<String, Value>> {
        self.run(request, &NullSink).await
    }

    /// Run the graph, emitting the full event trace into `sink`. The
    /// final `done` event carries the same view result map this returns.
    pub async fn run(
        &self,
        request: &ExecuteRequest,
        sink: &dyn EventSink,
    ) -> Result<Map<String, Value>> {
        // Env vars are process-global; executions are admitted one at a
        // time so no other run observes the mutated environment.
        let _admission = execution_lock().lock_owned().await;
        let _env = request
            .env_vars
            .as_ref()
            .filter(|vars| !vars.is_empty())
            .map(EnvGuard::apply);

        topo::validate(&request.nodes, &request.edges)?;
        let order = topo::sort(&request.nodes, &request.edges)?;

        let execution = Uuid::new_v4();
        info!(
            execution = %execution,
            nodes = request.nodes.len(),
            edges = request.edges.len(),
            "Executing graph"
        );

        let node_map: HashMap<&str, &GraphNode> =
            request.nodes.iter().map(|n| (n.id.as_str(), n)).collect();
        let mut incoming: HashMap<&str, Vec<&GraphEdge>> = HashMap::new();
        for edge in &request.edges {
            incoming.entry(edge.target.as_str()).or_default().push(edge);
        }

        let mut outputs: Map<String, Value> = Map::new();
        let mut view_results: Map<String, Value> = Map::new();

        for (idx, node_id) in order.iter().enumerate() {
            let node = node_map[node_id.as_str()];
            let inbound = incoming
                .get(node_id.as_str())
                .map(|edges| edges.as_slice())
                .unwrap_or(&[]);

            match node.kind() {
                NodeKind::Variable => {
                    let ctx = NodeCtx::new(node, idx + 1, node.label("Variable"));
                    run_variable(node, &ctx, &mut outputs, sink);
                }
                NodeKind::List => {
                    let ctx = NodeCtx::new(node, idx + 1, node.label("List"));
                    run_list(node, &ctx, inbound, &mut outputs, sink);
                }
                NodeKind::View => {
                    let ctx = NodeCtx::new(node, idx + 1, node.label("View"));
                    run_view(node, &ctx, inbound, &mut outputs, &mut view_results, sink);
                }
                NodeKind::Function => {
                    self.run_function(node, idx + 1, inbound, &mut outputs, sink)
                        .await;
                }
            }
        }

        info!(execution = %execution, views = view_results.len(), "Graph execution complete");
        sink.emit(ExecEvent::Done {
            results: view_results.clone(),
        });
        Ok(view_results)
    }

    async fn run_function(
        &self,
        node: &GraphNode,
        number: usize,
        inbound: &[&GraphEdge],
        outputs: &mut Map<String, Value>,
        sink: &dyn EventSink,
    ) {
        let function_name = node.function_name().unwrap_or("").to_string();
        let fallback = if function_name.is_empty() {
            "Unknown"
        } else {
            function_name.as_str()
        };
        let ctx = NodeCtx::new(node, number, node.label(fallback));

        let Some((schema, op)) = self.registry.lookup(&function_name) else {
            let message = if function_name.is_empty() {
                "Function node declares no functionName".to_string()
            } else {
                NodeflowError::UnknownOperation(function_name.clone()).to_string()
            };
            error!(node_id = %ctx.id, error = %message, "Cannot dispatch node");
            sink.emit(ctx.executing(Map::new()));
            outputs.insert(ctx.id.clone(), Value::Null);
            sink.emit(ctx.node_error(Map::new(), message));
            return;
        };

        let raw = match resolve::function_inputs(node, schema, inbound, outputs) {
            Ok(raw) => raw,
            Err(e) => {
                error!(node_id = %ctx.id, error = %e, "Input resolution failed");
                sink.emit(ctx.executing(Map::new()));
                outputs.insert(ctx.id.clone(), Value::Null);
                sink.emit(ctx.node_error(Map::new(), e.to_string()));
                return;
            }
        };

        let coerced = match coerce::coerce_inputs(schema, raw.clone()) {
            Ok(coerced) => coerced,
            Err(e) => {
                error!(node_id = %ctx.id, function = %function_name, error = %e, "Coercion failed");
                sink.emit(ctx.executing(raw.clone()));
                outputs.insert(ctx.id.clone(), Value::Null);
                sink.emit(ctx.node_error(raw, e.to_string()));
                return;
            }
        };

        debug!(node_id = %ctx.id, function = %function_name, "Dispatching node");
        sink.emit(ctx.executing(coerced.clone()));

        let result = match op {
            RegisteredOp::Plain(op) => op.invoke(OpInputs::new(coerced.clone())),
            RegisteredOp::Progress(op) => run_progress_worker(op, &ctx, &coerced, sink).await,
            RegisteredOp::Stream(op) => run_stream_worker(op, &ctx, &coerced, sink).await,
        };
        let result = result.and_then(|value| {
            check_declared_outputs(schema, &value)?;
            Ok(value)
        });

        match result {
            Ok(value) => {
                debug!(node_id = %ctx.id, function = %function_name, "Node completed");
                outputs.insert(ctx.id.clone(), value.clone());
                sink.emit(ctx.completed(coerced, value));
            }
            Err(e) => {
                error!(node_id = %ctx.id, function = %function_name, error = %e, "Node failed");
                outputs.insert(ctx.id.clone(), Value::Null);
                sink.emit(ctx.node_error(coerced, e.to_string()));
            }
        }
    }
}

/// Per-node event context: id, 1-indexed dispatch position, display name.
struct NodeCtx {
    id: String,
    number: usize,
    name: String,
}

impl NodeCtx {
    fn new(node: &GraphNode, number: usize, name: String) -> Self {
        Self {
            id: node.id.clone(),
            number,
            name,
        }
    }

    fn executing(&self, inputs: Map<String, Value>) -> ExecEvent {
        ExecEvent::Executing {
            node_id: self.id.clone(),
            node_number: self.number,
            node_name: self.name.clone(),
            inputs,
        }
    }

    fn progress(&self, inputs: Map<String, Value>, progress: f64, message: String) -> ExecEvent {
        ExecEvent::Progress {
            node_id: self.id.clone(),
            node_number: self.number,
            node_name: self.name.clone(),
            inputs,
            progress,
            progress_message: message,
        }
    }

    fn streaming(&self, inputs: Map<String, Value>, text: String, chunk: String) -> ExecEvent {
        ExecEvent::Streaming {
            node_id: self.id.clone(),
            node_number: self.number,
            node_name: self.name.clone(),
            inputs,
            streaming_text: text,
            streaming_chunk: chunk,
        }
    }

    fn completed(&self, inputs: Map<String, Value>, output: Value) -> ExecEvent {
        ExecEvent::Completed {
            node_id: self.id.clone(),
            node_number: self.number,
            node_name: self.name.clone(),
            inputs,
            output,
        }
    }

    fn node_error(&self, inputs: Map<String, Value>, error: String) -> ExecEvent {
        ExecEvent::Error {
            node_id: self.id.clone(),
            node_number: self.number,
            node_name: self.name.clone(),
            inputs,
            error,
        }
    }
}

fn run_variable(
    node: &GraphNode,
    ctx: &NodeCtx,
    outputs: &mut Map<String, Value>,
    sink: &dyn EventSink,
) {
    sink.emit(ctx.executing(Map::new()));
    let output = variable::variable_output(&node.data);
    outputs.insert(ctx.id.clone(), output.clone());
    sink.emit(ctx.completed(Map::new(), output));
}

fn run_list(
    node: &GraphNode,
    ctx: &NodeCtx,
    inbound: &[&GraphEdge],
    outputs: &mut Map<String, Value>,
    sink: &dyn EventSink,
) {
    let sorted = resolve::sort_list_edges(inbound);
    let mut inputs = Map::new();
    let mut items = Vec::with_capacity(sorted.len());

    for (idx, edge) in sorted.iter().enumerate() {
        match resolve::extract_output(outputs, &edge.source, edge.source_port()) {
            Ok(value) => {
                inputs.insert(format!("input-{}", idx), value.clone());
                items.push(value);
            }
            Err(e) => {
                error!(node_id = %ctx.id, error = %e, "List input resolution failed");
                sink.emit(ctx.executing(inputs.clone()));
                outputs.insert(node.id.clone(), Value::Null);
                sink.emit(ctx.node_error(inputs, e.to_string()));
                return;
            }
        }
    }

    sink.emit(ctx.executing(inputs.clone()));
    let output = Value::Array(items);
    outputs.insert(node.id.clone(), output.clone());
    sink.emit(ctx.completed(inputs, output));
}

fn run_view(
    node: &GraphNode,
    ctx: &NodeCtx,
    inbound: &[&GraphEdge],
    outputs: &mut Map<String, Value>,
    view_results: &mut Map<String, Value>,
    sink: &dyn EventSink,
) {
    let Some(edge) = inbound.first() else {
        sink.emit(ctx.executing(Map::new()));
        outputs.insert(node.id.clone(), Value::Null);
        view_results.insert(node.id.clone(), Value::Null);
        sink.emit(ctx.completed(Map::new(), Value::Null));
        return;
    };

    match resolve::extract_output(outputs, &edge.source, edge.source_port()) {
        Ok(value) => {
            let mut inputs = Map::new();
            inputs.insert("input".to_string(), value.clone());
            sink.emit(ctx.executing(inputs.clone()));
            outputs.insert(node.id.clone(), value.clone());
            view_results.insert(node.id.clone(), value.clone());
            sink.emit(ctx.completed(inputs, value));
        }
        Err(e) => {
            error!(node_id = %ctx.id, error = %e, "View input resolution failed");
            sink.emit(ctx.executing(Map::new()));
            outputs.insert(node.id.clone(), Value::Null);
            view_results.insert(node.id.clone(), Value::Null);
            sink.emit(ctx.node_error(Map::new(), e.to_string()));
        }
    }
}

/// Run a progress operation on a blocking worker, forwarding reporter
/// ticks into the event stream until the worker finishes. The channel
/// closes when the worker drops its reporter, so every tick is forwarded
/// before the worker is joined.
async fn run_progress_worker(
    op: Arc<dyn ProgressOp>,
    ctx: &NodeCtx,
    inputs: &Map<String, Value>,
    sink: &dyn EventSink,
) -> Result<Value> {
    let (tx, mut rx) = mpsc::unbounded_channel::<(f64, String)>();
    let reporter = ProgressReporter::with_sink(move |percent, message| {
        let _ = tx.send((percent, message.to_string()));
    });
    let op_inputs = OpInputs::new(inputs.clone());
    let worker = tokio::task::spawn_blocking(move || op.invoke(op_inputs, &reporter));

    while let Some((percent, message)) = rx.recv().await {
        sink.emit(ctx.progress(inputs.clone(), percent, message));
    }

    match worker.await {
        Ok(result) => result,
        Err(e) => Err(NodeflowError::Operation(format!("Worker failed: {}", e))),
    }
}

/// Same orchestration for a stream operation; the executor accumulates
/// the full text and attaches it, with each new chunk, to the events.
async fn run_stream_worker(
    op: Arc<dyn StreamOp>,
    ctx: &NodeCtx,
    inputs: &Map<String, Value>,
    sink: &dyn EventSink,
) -> Result<Value> {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let reporter = StreamReporter::with_sink(move |chunk| {
        let _ = tx.send(chunk.to_string());
    });
    let op_inputs = OpInputs::new(inputs.clone());
    let worker = tokio::task::spawn_blocking(move || op.invoke(op_inputs, &reporter));

    let mut text = String::new();
    while let Some(chunk) = rx.recv().await {
        text.push_str(&chunk);
        sink.emit(ctx.streaming(inputs.clone(), text.clone(), chunk));
    }

    match worker.await {
        Ok(result) => result,
        Err(e) => Err(NodeflowError::Operation(format!("Worker failed: {}", e))),
    }
}

/// A unit declaring multiple return keys must produce an object carrying
/// every declared key; a shortfall is an error on the producing node.
fn check_declared_outputs(schema: &FunctionSchema, value: &Value) -> Result<()> {
    if !schema.is_multi_output() {
        return Ok(());
    }
    let Value::Object(map) = value else {
        return Err(NodeflowError::Operation(
            "Multi-output operation must return an object".to_string(),
        ));
    };
    for ret in &schema.returns {
        if !map.contains_key(&ret.name) {
            return Err(NodeflowError::MissingOutputKey {
                key: ret.name.clone(),
                available: map.keys().cloned().collect(),
            });
        }
    }
    Ok(())
}
