//! 类型系统模块：聊天补全请求、响应与流式分片的强类型表示。
//!
//! # Types Module
//!
//! Strongly-typed representations of the chat completion wire format.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | Chat message with role and content |
//! | [`Role`] | Message role (system, user, assistant, tool) |
//! | [`ChatCompletionRequest`] | One inference call |
//! | [`ChatCompletionResponse`] | Buffered completion, with captured response headers |
//! | [`ChatCompletionChunk`] | One streamed unit of a completion |
//! | [`ToolCall`] | Function/tool call from model response |
//! | [`ToolDefinition`] | Tool definition for model context |
//!
//! ## Example
//!
//! ```rust
//! use ai_inference_client::types::{ChatCompletionRequest, Message, ToolDefinition};
//!
//! let mut request = ChatCompletionRequest::new(
//!     "llama-3.1-8b-instant",
//!     vec![
//!         Message::system("You are a helpful assistant"),
//!         Message::user("What's the weather?"),
//!     ],
//! );
//! request.tools = Some(vec![ToolDefinition::function(
//!     "get_weather",
//!     Some("Get current weather for a location".to_string()),
//!     Some(serde_json::json!({
//!         "type": "object",
//!         "properties": {"location": {"type": "string"}}
//!     })),
//! )]);
//! ```

pub mod chat;
pub mod message;
pub mod tool;

pub use chat::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, Choice, ChunkChoice,
    ChunkDelta, FinishReason, JsonSchemaFormat, ResponseFormat, ResponseFormatType, Usage, XGroq,
};
pub use message::{Message, Role};
pub use tool::{FunctionCall, FunctionCallDelta, FunctionDefinition, ToolCall, ToolCallDelta, ToolDefinition};
