//! # ai-inference-client
//!
//! 面向 OpenAI 兼容聊天补全接口的异步客户端引擎：流式读取、错误解码、限流信息与重试分发。
//!
//! Async client engine for OpenAI-compatible chat completion APIs (Groq by default).
//!
//! ## Overview
//!
//! - **Streaming**: [`pipeline::StreamReader`] turns a `text/event-stream` body into
//!   typed chunks, tolerating keep-alive noise up to a limit and surfacing
//!   in-band error frames as structured errors.
//! - **Errors**: one [`Error`] enum; failed responses are decoded into
//!   [`ApiError`] with the HTTP status attached.
//! - **Rate limits**: every response exposes a [`RateLimitSnapshot`] built from
//!   the `x-ratelimit-*` headers.
//! - **Retries**: unary calls re-send on 500/503 with a fixed delay, bounded by
//!   [`RetryPolicy`]. Streams are never retried.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ai_inference_client::{AiClient, Message};
//!
//! #[tokio::main]
//! async fn main() -> ai_inference_client::Result<()> {
//!     let client = AiClient::builder().api_key("your-api-key").build()?;
//!
//!     let mut stream = client
//!         .chat("llama-3.1-8b-instant")
//!         .message(Message::user("Hello, how are you?"))
//!         .execute_stream()
//!         .await?;
//!
//!     while let Some(chunk) = stream.next().await? {
//!         print!("{}", chunk.content().unwrap_or_default());
//!     }
//!     println!("\nremaining tokens: {}", stream.rate_limits().remaining_tokens);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Client, builder, configuration, dispatcher and retry policy |
//! | [`pipeline`] | Stream reader state machine and chunk accumulation |
//! | [`transport`] | HTTP transport over reqwest |
//! | [`resilience`] | Rate limit header extraction |
//! | [`types`] | Chat completion wire types |
//! | [`error`] | Error taxonomy and error envelope decoding |

pub mod client;
pub mod error;
pub mod error_code;
pub mod pipeline;
pub mod resilience;
pub mod transport;
pub mod types;

pub use client::{AiClient, AiClientBuilder, ApiRequest, ClientConfig, HeaderAware, RetryPolicy};
pub use error::{ApiError, Error, ErrorContext, ErrorEnvelope};
pub use error_code::ErrorCode;
pub use pipeline::{ChatCompletionStream, StreamReader, StreamState};
pub use resilience::{RateLimitSnapshot, ResetTime};
pub use types::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, Message, Role, ToolCall,
};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `Result<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;
