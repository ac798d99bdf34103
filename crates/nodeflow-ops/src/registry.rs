use std::collections::HashMap;
use std::sync::Arc;

use nodeflow_core::ops::{PlainOp, ProgressOp, StreamOp};
use nodeflow_core::types::{FunctionSchema, OpKind};

struct Entry<T: ?Sized> {
    op: Arc<T>,
    schema_idx: usize,
}

/// Name-indexed lookup of operations, partitioned by kind, plus the
/// ordered schema list the introspector produced alongside them.
///
/// Built once at server start (or per request in reload mode); lookups
/// take `&self` and are safe to share across requests. There is no
/// mutation API beyond the loader's registration phase.
pub struct OpRegistry {
    plain: HashMap<String, Entry<dyn PlainOp>>,
    progress: HashMap<String, Entry<dyn ProgressOp>>,
    stream: HashMap<String, Entry<dyn StreamOp>>,
    schemas: Vec<FunctionSchema>,
}

impl Default for OpRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A resolved operation, ready for kind-specific dispatch.
#[derive(Clone)]
pub enum RegisteredOp {
    Plain(Arc<dyn PlainOp>),
    Progress(Arc<dyn ProgressOp>),
    Stream(Arc<dyn StreamOp>),
}

impl OpRegistry {
    pub fn new() -> Self {
        Self {
            plain: HashMap::new(),
            progress: HashMap::new(),
            stream: HashMap::new(),
            schemas: Vec::new(),
        }
    }

    /// Register a plain operation. Returns false (and registers nothing)
    /// when the name is already taken within the kind.
    pub fn register_plain(&mut self, schema: FunctionSchema, op: Arc<dyn PlainOp>) -> bool {
        debug_assert_eq!(schema.kind, OpKind::Plain);
        if self.plain.contains_key(&schema.name) {
            return false;
        }
        let name = schema.name.clone();
        let schema_idx = self.push_schema(schema);
        self.plain.insert(name, Entry { op, schema_idx });
        true
    }

    pub fn register_progress(&mut self, schema: FunctionSchema, op: Arc<dyn ProgressOp>) -> bool {
        debug_assert_eq!(schema.kind, OpKind::Progress);
        if self.progress.contains_key(&schema.name) {
            return false;
        }
        let name = schema.name.clone();
        let schema_idx = self.push_schema(schema);
        self.progress.insert(name, Entry { op, schema_idx });
        true
    }

    pub fn register_stream(&mut self, schema: FunctionSchema, op: Arc<dyn StreamOp>) -> bool {
        debug_assert_eq!(schema.kind, OpKind::Stream);
        if self.stream.contains_key(&schema.name) {
            return false;
        }
        let name = schema.name.clone();
        let schema_idx = self.push_schema(schema);
        self.stream.insert(name, Entry { op, schema_idx });
        true
    }

    fn push_schema(&mut self, schema: FunctionSchema) -> usize {
        self.schemas.push(schema);
        self.schemas.len() - 1
    }

    /// All schemas in registration order.
    pub fn schemas(&self) -> &[FunctionSchema] {
        &self.schemas
    }

    /// Resolve an operation by name. Progress and stream entries shadow
    /// plain ones so a function node dispatches to the richest kind.
    pub fn lookup(&self, name: &str) -> Option<(&FunctionSchema, RegisteredOp)> {
        if let Some(entry) = self.progress.get(name) {
            return Some((
                &self.schemas[entry.schema_idx],
                RegisteredOp::Progress(entry.op.clone()),
            ));
        }
        if let Some(entry) = self.stream.get(name) {
            return Some((
                &self.schemas[entry.schema_idx],
                RegisteredOp::Stream(entry.op.clone()),
            ));
        }
        if let Some(entry) = self.plain.get(name) {
            return Some((
                &self.schemas[entry.schema_idx],
                RegisteredOp::Plain(entry.op.clone()),
            ));
        }
        None
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plain.contains_key(name)
            || self.progress.contains_key(name)
            || self.stream.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
