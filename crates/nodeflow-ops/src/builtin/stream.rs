use nodeflow_core::error::Result;
use nodeflow_core::ops::{OpInputs, StreamOp};
use nodeflow_core::reporter::StreamReporter;
use serde_json::Value;

/// Re-emit `text` through the stream reporter in `chunk_size`-character
/// chunks, then return the full text.
pub struct StreamTextOp;

impl StreamOp for StreamTextOp {
    fn invoke(&self, inputs: OpInputs, reporter: &StreamReporter) -> Result<Value> {
        let text = inputs.req_str("text")?;
        let chunk_size = inputs.opt_i64("chunk_size").unwrap_or(8).max(1) as usize;

        let chars: Vec<char> = text.chars().collect();
        for chunk in chars.chunks(chunk_size) {
            let piece: String = chunk.iter().collect();
            reporter.emit(&piece);
        }
        Ok(Value::String(text.to_string()))
    }
}
