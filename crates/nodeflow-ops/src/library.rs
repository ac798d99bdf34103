use std::collections::HashMap;
use std::sync::Arc;

use nodeflow_core::ops::{PlainOp, ProgressOp, StreamOp};

use crate::builtin;

/// The compiled operation library: binding names to callables, one map
/// per invocation kind. Nodepack manifests resolve their `impl` bindings
/// against this when the registry is built.
pub struct OpLibrary {
    plain: HashMap<String, Arc<dyn PlainOp>>,
    progress: HashMap<String, Arc<dyn ProgressOp>>,
    stream: HashMap<String, Arc<dyn StreamOp>>,
}

impl OpLibrary {
    pub fn new() -> Self {
        Self {
            plain: HashMap::new(),
            progress: HashMap::new(),
            stream: HashMap::new(),
        }
    }

    /// Library with every builtin callable registered.
    pub fn with_builtins() -> Self {
        let mut library = Self::new();

        // basic math
        library.add_plain("add", builtin::math::AddOp);
        library.add_plain("subtract", builtin::math::SubtractOp);
        library.add_plain("multiply", builtin::math::MultiplyOp);
        library.add_plain("divide", builtin::math::DivideOp);
        library.add_plain("modulo", builtin::math::ModuloOp);
        library.add_plain("power", builtin::math::PowerOp);
        library.add_plain("sqrt", builtin::math::SqrtOp);
        library.add_plain("log", builtin::math::LogOp);
        library.add_plain("exp", builtin::math::ExpOp);
        library.add_plain("at_index", builtin::math::AtIndexOp);

        // text
        library.add_plain("concat", builtin::text::ConcatOp);
        library.add_plain("uppercase", builtin::text::UppercaseOp);
        library.add_plain("lowercase", builtin::text::LowercaseOp);
        library.add_plain("split_name", builtin::text::SplitNameOp);
        library.add_plain("template", builtin::text::TemplateOp);

        // progress
        library.add_progress("process_items", builtin::progress::ProcessItemsOp);
        library.add_progress("countdown", builtin::progress::CountdownOp);

        // stream
        library.add_stream("stream_text", builtin::stream::StreamTextOp);
        library.add_stream(
            "openai_chat_completion_stream",
            builtin::llm::OpenAiChatCompletionStreamOp,
        );

        // llm
        library.add_plain("openai_chat_completion", builtin::llm::OpenAiChatCompletionOp);
        library.add_plain(
            "get_openai_message_content",
            builtin::llm::GetOpenAiMessageContentOp,
        );

        library
    }

    pub fn add_plain(&mut self, name: impl Into<String>, op: impl PlainOp) {
        self.plain.insert(name.into(), Arc::new(op));
    }

    pub fn add_progress(&mut self, name: impl Into<String>, op: impl ProgressOp) {
        self.progress.insert(name.into(), Arc::new(op));
    }

    pub fn add_stream(&mut self, name: impl Into<String>, op: impl StreamOp) {
        self.stream.insert(name.into(), Arc::new(op));
    }

    pub fn plain(&self, name: &str) -> Option<Arc<dyn PlainOp>> {
        self.plain.get(name).cloned()
    }

    pub fn progress(&self, name: &str) -> Option<Arc<dyn ProgressOp>> {
        self.progress.get(name).cloned()
    }

    pub fn stream(&self, name: &str) -> Option<Arc<dyn StreamOp>> {
        self.stream.get(name).cloned()
    }
}

impl Default for OpLibrary {
    fn default() -> Self {
        Self::new()
    }
}
