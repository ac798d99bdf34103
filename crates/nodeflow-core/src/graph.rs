use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The four node shapes the executor recognizes. Any type string other
/// than the three builtin ones is a function node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Variable,
    List,
    View,
    Function,
}

/// A node in a submitted graph. `data` is a kind-specific blob: function
/// nodes mirror schema parameter names to raw values (plus `functionName`
/// and `label`), variable nodes carry `variableType` / `variableValue`
/// and the message-format flags, list nodes carry an input arity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl GraphNode {
    pub fn kind(&self) -> NodeKind {
        match self.node_type.as_str() {
            "variableNode" => NodeKind::Variable,
            "listNode" => NodeKind::List,
            "viewNode" => NodeKind::View,
            _ => NodeKind::Function,
        }
    }

    /// Display label for the event trace, falling back to a kind name.
    pub fn label(&self, fallback: &str) -> String {
        self.data
            .get("label")
            .and_then(Value::as_str)
            .unwrap_or(fallback)
            .to_string()
    }

    /// The operation a function node dispatches to.
    pub fn function_name(&self) -> Option<&str> {
        self.data.get("functionName").and_then(Value::as_str)
    }
}

/// A directed connection between two node handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "sourceHandle", default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(rename = "targetHandle", default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

impl GraphEdge {
    /// Output port on the source node; single-output ops use `output`.
    pub fn source_port(&self) -> &str {
        self.source_handle.as_deref().unwrap_or("output")
    }

    /// Input port on the target node.
    pub fn target_port(&self) -> &str {
        self.target_handle.as_deref().unwrap_or("")
    }
}

/// A graph execution request: nodes, edges and an optional env-var map
/// applied for the duration of the execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_vars: Option<HashMap<String, String>>,
}
