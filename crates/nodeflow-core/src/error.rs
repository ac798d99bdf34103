use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeflowError {
    // Graph structural errors abort the execution before any node runs
    #[error("Graph contains a cycle")]
    Cycle,

    #[error("Edge references unknown node '{0}'")]
    UnknownNode(String),

    #[error("Node '{node}' input '{handle}' has more than one inbound edge")]
    DuplicateInput { node: String, handle: String },

    // Node-level errors are recorded per node, never propagated
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Parameter '{param}': {message}")]
    Coercion { param: String, message: String },

    #[error("Missing required parameter '{0}'")]
    MissingParameter(String),

    #[error("Operation failed: {0}")]
    Operation(String),

    #[error("Output missing declared key '{key}' (available: {available:?})")]
    MissingOutputKey { key: String, available: Vec<String> },

    #[error("Cannot extract key '{key}' from non-object output")]
    NonObjectOutput { key: String },

    // Introspection errors skip the offending unit, never fatal
    #[error("Manifest error: {0}")]
    Manifest(String),

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NodeflowError>;
