//! 流水线处理模块：将流式响应字节解码为强类型分片。
//!
//! # Streaming Pipeline
//!
//! ```text
//! HTTP body → StreamReader (SSE lines) → ChatCompletionChunk → ChunkAccumulator
//!                   │
//!             ErrorAccumulator (non-frame bytes, decoded at end of stream)
//! ```
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`StreamReader`] | Pull-based SSE frame decoder with an empty-message limit |
//! | [`ErrorAccumulator`] | Buffer for bytes that may form an error envelope |
//! | [`ChunkAccumulator`] | Folds chunks into a [`ChatCompletionResponse`](crate::types::ChatCompletionResponse) |
//!
//! ## Example
//!
//! ```rust
//! use ai_inference_client::pipeline::StreamReader;
//! use ai_inference_client::types::ChatCompletionChunk;
//!
//! # tokio_test::block_on(async {
//! let body: &[u8] = b"data: {\"id\":\"1\",\"choices\":[]}\n\ndata: [DONE]\n\n";
//! let mut reader: StreamReader<ChatCompletionChunk, _> = StreamReader::new(body, 10);
//! while let Some(chunk) = reader.next().await? {
//!     println!("{}", chunk.id);
//! }
//! # Ok::<(), ai_inference_client::Error>(())
//! # }).unwrap();
//! ```

pub mod accumulate;
pub mod decode;
pub mod error_buffer;

pub use accumulate::ChunkAccumulator;
pub use decode::{StreamReader, StreamState, DEFAULT_EMPTY_MESSAGES_LIMIT};
pub use error_buffer::ErrorAccumulator;

use crate::transport::ResponseBody;
use crate::types::ChatCompletionChunk;

/// Reader over a live chat completion response body.
pub type ChatCompletionStream = StreamReader<ChatCompletionChunk, ResponseBody>;
