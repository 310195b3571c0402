//! 客户端模块：请求分发、重试策略与聊天补全入口。
//!
//! Unified client interface.
//!
//! Keep the public surface small and predictable. Implementation details are
//! split into submodules under `src/client/`.

pub mod builder;
pub mod chat;
pub mod config;
pub mod core;
pub mod error_classification;
pub mod execution;
pub mod policy;

pub use builder::AiClientBuilder;
pub use chat::{ChatRequestBuilder, CHAT_COMPLETIONS_PATH};
pub use config::ClientConfig;
pub use core::AiClient;
pub use execution::{ApiRequest, HeaderAware};
pub use policy::{Decision, RetryPolicy};
