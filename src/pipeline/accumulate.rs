//! Fold streamed chunks back into a buffered completion.

use crate::pipeline::decode::StreamReader;
use crate::types::{
    ChatCompletionChunk, ChatCompletionResponse, Choice, FinishReason, FunctionCall, Message,
    Role, ToolCall, ToolCallDelta, Usage,
};
use crate::Result;
use std::collections::BTreeMap;
use tokio::io::AsyncBufRead;

/// Collects chunk deltas per choice index.
///
/// Tool call fragments are keyed by their delta `index`; the first fragment
/// carries id and name, the rest only append to `arguments`. Arguments are
/// kept as the raw string the model produced.
#[derive(Debug, Default)]
pub struct ChunkAccumulator {
    id: String,
    object: String,
    created: i64,
    model: String,
    system_fingerprint: Option<String>,
    usage: Option<Usage>,
    choices: BTreeMap<u32, ChoiceState>,
}

#[derive(Debug, Default)]
struct ChoiceState {
    role: Option<Role>,
    content: String,
    saw_content: bool,
    tool_calls: BTreeMap<u32, ToolCall>,
    finish_reason: Option<FinishReason>,
}

impl ChoiceState {
    fn on_tool_call(&mut self, delta: &ToolCallDelta) {
        let call = self.tool_calls.entry(delta.index).or_insert_with(|| ToolCall {
            id: String::new(),
            call_type: "function".to_string(),
            function: FunctionCall {
                name: String::new(),
                arguments: String::new(),
            },
        });
        if let Some(id) = delta.id.as_deref().filter(|id| !id.is_empty()) {
            call.id = id.to_string();
        }
        if let Some(kind) = &delta.call_type {
            call.call_type = kind.clone();
        }
        if let Some(function) = &delta.function {
            if let Some(name) = function.name.as_deref().filter(|n| !n.is_empty()) {
                call.function.name = name.to_string();
            }
            if let Some(fragment) = &function.arguments {
                call.function.arguments.push_str(fragment);
            }
        }
    }
}

impl ChunkAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &ChatCompletionChunk) {
        if self.id.is_empty() {
            self.id = chunk.id.clone();
            self.object = "chat.completion".to_string();
            self.created = chunk.created;
            self.model = chunk.model.clone();
        }
        if chunk.system_fingerprint.is_some() {
            self.system_fingerprint = chunk.system_fingerprint.clone();
        }
        if let Some(usage) = chunk.usage() {
            self.usage = Some(usage.clone());
        }

        for choice in &chunk.choices {
            let state = self.choices.entry(choice.index).or_default();
            if let Some(role) = choice.delta.role {
                state.role = Some(role);
            }
            if let Some(text) = &choice.delta.content {
                state.content.push_str(text);
                state.saw_content = true;
            }
            for delta in choice.delta.tool_calls.iter().flatten() {
                state.on_tool_call(delta);
            }
            if choice.finish_reason.is_some() {
                state.finish_reason = choice.finish_reason;
            }
        }
    }

    /// Text collected so far for choice `index`.
    pub fn content(&self, index: u32) -> Option<&str> {
        self.choices.get(&index).map(|c| c.content.as_str())
    }

    pub fn finish(self) -> ChatCompletionResponse {
        let choices = self
            .choices
            .into_iter()
            .map(|(index, state)| {
                let tool_calls: Vec<ToolCall> = state.tool_calls.into_values().collect();
                Choice {
                    index,
                    message: Message {
                        role: state.role.unwrap_or(Role::Assistant),
                        content: (state.saw_content || tool_calls.is_empty())
                            .then_some(state.content),
                        name: None,
                        tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
                        tool_call_id: None,
                    },
                    finish_reason: state.finish_reason,
                    logprobs: None,
                }
            })
            .collect();

        ChatCompletionResponse {
            id: self.id,
            object: self.object,
            created: self.created,
            model: self.model,
            choices,
            usage: self.usage,
            system_fingerprint: self.system_fingerprint,
            ..ChatCompletionResponse::default()
        }
    }
}

impl<R> StreamReader<ChatCompletionChunk, R>
where
    R: AsyncBufRead + Unpin,
{
    /// Drain the stream into one response carrying the stream's headers.
    pub async fn collect_response(mut self) -> Result<ChatCompletionResponse> {
        let mut acc = ChunkAccumulator::new();
        while let Some(chunk) = self.next().await? {
            acc.push(&chunk);
        }
        let mut response = acc.finish();
        response.headers = self.headers().clone();
        response.rate_limits = self.rate_limits().clone();
        Ok(response)
    }
}
