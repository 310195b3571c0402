//! Chat completion endpoints and the fluent request builder.

use crate::client::core::AiClient;
use crate::pipeline::ChatCompletionStream;
use crate::types::{
    ChatCompletionRequest, ChatCompletionResponse, JsonSchemaFormat, Message, ResponseFormat,
    ToolDefinition,
};
use crate::{Error, ErrorContext, Result};
use regex::Regex;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;
use std::time::Duration;

pub const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

impl AiClient {
    /// Buffered chat completion, retried on transient failures.
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        self.send_unary(CHAT_COMPLETIONS_PATH, request).await
    }

    /// Streaming chat completion. Read chunks with [`StreamReader::next`](crate::pipeline::StreamReader::next).
    pub async fn chat_completion_stream(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionStream> {
        self.send_stream(CHAT_COMPLETIONS_PATH, request).await
    }

    /// Ask for JSON matching `T`'s schema and parse the first choice into `T`.
    ///
    /// The schema is generated by `schemars` and sent as a strict `json_schema`
    /// response format. Content wrapped in a ``` fence is unwrapped first.
    pub async fn chat_completion_json<T>(&self, request: &ChatCompletionRequest) -> Result<T>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let mut request = request.clone();
        request.response_format = Some(ResponseFormat::json_schema(schema_format::<T>()?));

        let response = self.chat_completion(&request).await?;
        let content = response.content().ok_or_else(|| {
            Error::validation_with_context(
                "response has no content to parse",
                ErrorContext::new()
                    .with_field_path("response.choices[0].message.content")
                    .with_details(format!("response id {}", response.id))
                    .with_source("chat_completion_json"),
            )
        })?;

        serde_json::from_str(extract_json(content)).map_err(|source| Error::StructuredOutput {
            response_id: response.id.clone(),
            source,
        })
    }
}

fn schema_format<T: JsonSchema>() -> Result<JsonSchemaFormat> {
    let root = schemars::schema_for!(T);
    let (name, description) = root
        .schema
        .metadata
        .as_ref()
        .map(|m| (m.title.clone(), m.description.clone()))
        .unwrap_or_default();
    let schema = serde_json::to_value(&root)?;
    Ok(JsonSchemaFormat {
        name: name.unwrap_or_else(T::schema_name),
        description,
        schema,
        strict: true,
    })
}

/// The body of the first ``` fenced block, or the whole text when there is none.
fn extract_json(content: &str) -> &str {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    let fence = FENCE.get_or_init(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").ok());
    fence
        .as_ref()
        .and_then(|re| re.captures(content))
        .and_then(|c| c.get(1))
        .map_or(content, |m| m.as_str())
        .trim()
}

/// Fluent construction of a [`ChatCompletionRequest`] bound to a client.
pub struct ChatRequestBuilder<'a> {
    client: &'a AiClient,
    request: ChatCompletionRequest,
}

impl<'a> ChatRequestBuilder<'a> {
    pub(crate) fn new(client: &'a AiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            request: ChatCompletionRequest::new(model, Vec::new()),
        }
    }

    /// Replace the conversation.
    pub fn messages(mut self, messages: Vec<Message>) -> Self {
        self.request.messages = messages;
        self
    }

    /// Append one message.
    pub fn message(mut self, message: Message) -> Self {
        self.request.messages.push(message);
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.request.temperature = Some(temp);
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.request.top_p = Some(top_p);
        self
    }

    pub fn max_tokens(mut self, max: u32) -> Self {
        self.request.max_tokens = Some(max);
        self
    }

    pub fn stop(mut self, stop: Vec<String>) -> Self {
        self.request.stop = Some(stop);
        self
    }

    pub fn seed(mut self, seed: i64) -> Self {
        self.request.seed = Some(seed);
        self
    }

    /// Set tools for function calling.
    pub fn tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.request.tools = Some(tools);
        self
    }

    /// Set tool_choice (OpenAI-style).
    pub fn tool_choice(mut self, tool_choice: serde_json::Value) -> Self {
        self.request.tool_choice = Some(tool_choice);
        self
    }

    pub fn response_format(mut self, format: ResponseFormat) -> Self {
        self.request.response_format = Some(format);
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.request.retry_delay = Some(delay);
        self
    }

    /// The request as built so far.
    pub fn build(self) -> ChatCompletionRequest {
        self.request
    }

    pub async fn execute(self) -> Result<ChatCompletionResponse> {
        self.client.chat_completion(&self.request).await
    }

    pub async fn execute_stream(self) -> Result<ChatCompletionStream> {
        self.client.chat_completion_stream(&self.request).await
    }

    pub async fn execute_json<T>(self) -> Result<T>
    where
        T: DeserializeOwned + JsonSchema,
    {
        self.client.chat_completion_json(&self.request).await
    }
}
