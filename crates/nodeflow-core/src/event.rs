use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::mpsc;

/// A node lifecycle event emitted during graph execution.
///
/// Serialized form is the wire protocol: one JSON object per event,
/// discriminated on `status`. The terminal global `error` frame is not an
/// event; the protocol layer renders it from the executor's returned
/// structural error, so the tag space here stays unambiguous.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExecEvent {
    Executing {
        node_id: String,
        node_number: usize,
        node_name: String,
        inputs: Map<String, Value>,
    },
    Progress {
        node_id: String,
        node_number: usize,
        node_name: String,
        inputs: Map<String, Value>,
        progress: f64,
        progress_message: String,
    },
    Streaming {
        node_id: String,
        node_number: usize,
        node_name: String,
        inputs: Map<String, Value>,
        streaming_text: String,
        streaming_chunk: String,
    },
    Completed {
        node_id: String,
        node_number: usize,
        node_name: String,
        inputs: Map<String, Value>,
        output: Value,
    },
    Error {
        node_id: String,
        node_number: usize,
        node_name: String,
        inputs: Map<String, Value>,
        error: String,
    },
    Done {
        results: Map<String, Value>,
    },
}

impl ExecEvent {
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::Executing { node_id, .. }
            | Self::Progress { node_id, .. }
            | Self::Streaming { node_id, .. }
            | Self::Completed { node_id, .. }
            | Self::Error { node_id, .. } => Some(node_id.as_str()),
            Self::Done { .. } => None,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Executing { .. } => "executing",
            Self::Progress { .. } => "progress",
            Self::Streaming { .. } => "streaming",
            Self::Completed { .. } => "completed",
            Self::Error { .. } => "error",
            Self::Done { .. } => "done",
        }
    }
}

/// Where the executor writes its event trace.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ExecEvent);
}

/// Sink that discards every event. Used by the synchronous execute path.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: ExecEvent) {}
}

/// Sink that forwards events into an unbounded channel. Send errors are
/// ignored: a departed receiver only stops delivery, never execution.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ExecEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<ExecEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: ExecEvent) {
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn executing_frame_shape() {
        let mut inputs = Map::new();
        inputs.insert("a".into(), json!(5.0));
        let event = ExecEvent::Executing {
            node_id: "n1".into(),
            node_number: 3,
            node_name: "Add".into(),
            inputs,
        };

        let v = serde_json::to_value(&event).unwrap();
        assert_eq!(v["status"], "executing");
        assert_eq!(v["node_number"], 3);
        assert_eq!(v["inputs"]["a"], 5.0);
    }

    #[test]
    fn done_frame_carries_results_only() {
        let mut results = Map::new();
        results.insert("view-1".into(), json!(48.0));
        let v = serde_json::to_value(&ExecEvent::Done { results }).unwrap();
        assert_eq!(v["status"], "done");
        assert_eq!(v["results"]["view-1"], 48.0);
        assert!(v.get("node_id").is_none());
    }

    #[test]
    fn streaming_frame_shape() {
        let event = ExecEvent::Streaming {
            node_id: "s1".into(),
            node_number: 1,
            node_name: "Stream".into(),
            inputs: Map::new(),
            streaming_text: "Hello ".into(),
            streaming_chunk: "lo ".into(),
        };
        let v = serde_json::to_value(&event).unwrap();
        assert_eq!(v["status"], "streaming");
        assert_eq!(v["streaming_text"], "Hello ");
        assert_eq!(v["streaming_chunk"], "lo ");
    }

    #[test]
    fn channel_sink_forwards() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = ChannelSink::new(tx);
        sink.emit(ExecEvent::Done {
            results: Map::new(),
        });
        let event = rx.try_recv().unwrap();
        assert_eq!(event.status(), "done");
    }
}
