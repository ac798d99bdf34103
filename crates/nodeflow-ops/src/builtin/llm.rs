//! OpenAI-compatible chat completion operations. Bodies are synchronous
//! (they run on the executor's blocking workers), so the blocking reqwest
//! client is used throughout.

use std::io::{BufRead, BufReader};

use nodeflow_core::error::{NodeflowError, Result};
use nodeflow_core::ops::{OpInputs, PlainOp, StreamOp};
use nodeflow_core::reporter::StreamReporter;
use serde_json::{json, Map, Value};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_API_KEY_VARIABLE: &str = "OPENAI_API_KEY";

fn api_key(inputs: &OpInputs) -> Result<String> {
    let variable = inputs
        .opt_str("api_key_variable")
        .unwrap_or(DEFAULT_API_KEY_VARIABLE);
    std::env::var(variable).map_err(|_| {
        NodeflowError::Operation(format!(
            "Environment variable '{}' is not set",
            variable
        ))
    })
}

fn request_body(inputs: &OpInputs, stream: bool) -> Result<Value> {
    let mut body = Map::new();
    body.insert("model".into(), json!(inputs.req_str("model")?));
    body.insert("messages".into(), Value::Array(inputs.req_array("messages")?.clone()));

    if let Some(max_tokens) = inputs.opt_i64("max_tokens") {
        body.insert("max_tokens".into(), json!(max_tokens));
    }
    if let Some(temperature) = inputs.opt_f64("temperature") {
        body.insert("temperature".into(), json!(temperature));
    }
    if let Some(effort) = inputs.opt_str("reasoning_effort") {
        body.insert("reasoning_effort".into(), json!(effort));
    }
    if let Some(seed) = inputs.opt_i64("seed") {
        body.insert("seed".into(), json!(seed));
    }
    if let Some(top_p) = inputs.opt_f64("top_p") {
        body.insert("top_p".into(), json!(top_p));
    }
    if stream {
        body.insert("stream".into(), json!(true));
        body.insert("stream_options".into(), json!({ "include_usage": true }));
    }
    Ok(Value::Object(body))
}

fn send(inputs: &OpInputs, body: &Value) -> Result<reqwest::blocking::Response> {
    let base_url = inputs.opt_str("base_url").unwrap_or(DEFAULT_BASE_URL);
    let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
    debug!(url = %url, "Chat completion request");

    let response = reqwest::blocking::Client::new()
        .post(&url)
        .bearer_auth(api_key(inputs)?)
        .json(body)
        .send()
        .map_err(|e| NodeflowError::Operation(format!("Request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let detail = response.text().unwrap_or_default();
        return Err(NodeflowError::Operation(format!(
            "API returned HTTP {}: {}",
            status, detail
        )));
    }
    Ok(response)
}

/// Non-streaming chat completion; returns the provider response object.
pub struct OpenAiChatCompletionOp;

impl PlainOp for OpenAiChatCompletionOp {
    fn invoke(&self, inputs: OpInputs) -> Result<Value> {
        let body = request_body(&inputs, false)?;
        let response = send(&inputs, &body)?;
        response
            .json()
            .map_err(|e| NodeflowError::Operation(format!("Invalid response body: {}", e)))
    }
}

/// Extract `choices[0].message.content` from a chat completion response.
pub struct GetOpenAiMessageContentOp;

impl PlainOp for GetOpenAiMessageContentOp {
    fn invoke(&self, inputs: OpInputs) -> Result<Value> {
        let response = inputs.req_object("response")?;
        response
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .cloned()
            .ok_or_else(|| {
                NodeflowError::Operation(
                    "Response has no choices[0].message.content".to_string(),
                )
            })
    }
}

/// Streaming chat completion. Each content delta is emitted through the
/// stream reporter; the return value is a response object shaped like the
/// non-streaming one, with the accumulated message content.
pub struct OpenAiChatCompletionStreamOp;

impl StreamOp for OpenAiChatCompletionStreamOp {
    fn invoke(&self, inputs: OpInputs, reporter: &StreamReporter) -> Result<Value> {
        let body = request_body(&inputs, true)?;
        let response = send(&inputs, &body)?;

        let mut content = String::new();
        let mut response_id = None;
        let mut response_model = None;
        let mut created = None;
        let mut finish_reason = None;
        let mut usage = None;

        // One `data: <json>` line per SSE event; the terminator is `[DONE]`.
        for line in BufReader::new(response).lines() {
            let line =
                line.map_err(|e| NodeflowError::Operation(format!("Stream read failed: {}", e)))?;
            let Some(data) = line.strip_prefix("data:").map(str::trim) else {
                continue;
            };
            if data.is_empty() {
                continue;
            }
            if data == "[DONE]" {
                break;
            }

            let chunk: Value = serde_json::from_str(data)
                .map_err(|e| NodeflowError::Operation(format!("Invalid stream chunk: {}", e)))?;

            if response_id.is_none() {
                response_id = chunk.get("id").and_then(Value::as_str).map(String::from);
            }
            if response_model.is_none() {
                response_model = chunk.get("model").and_then(Value::as_str).map(String::from);
            }
            if created.is_none() {
                created = chunk.get("created").and_then(Value::as_i64);
            }

            if let Some(choices) = chunk.get("choices").and_then(Value::as_array) {
                for choice in choices {
                    if let Some(delta) = choice
                        .get("delta")
                        .and_then(|d| d.get("content"))
                        .and_then(Value::as_str)
                    {
                        content.push_str(delta);
                        reporter.emit(delta);
                    }
                    if let Some(reason) = choice.get("finish_reason").and_then(Value::as_str) {
                        finish_reason = Some(reason.to_string());
                    }
                }
            }

            if let Some(u) = chunk.get("usage").filter(|u| u.is_object()) {
                usage = Some(u.clone());
            }
        }

        let mut result = json!({
            "id": response_id,
            "object": "chat.completion",
            "created": created,
            "model": response_model.unwrap_or_else(|| {
                inputs.opt_str("model").unwrap_or_default().to_string()
            }),
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": finish_reason.unwrap_or_else(|| "stop".to_string()),
            }],
        });
        if let Some(usage) = usage {
            result["usage"] = usage;
        }
        Ok(result)
    }
}
