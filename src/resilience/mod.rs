//! 弹性模块：从响应头中提取限流信息。
//!
//! # Resilience Signals
//!
//! Facts reported by the server that callers use to pace themselves. The client
//! never acts on them on its own; it only captures them.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`rate_limit`] | `x-ratelimit-*` header snapshot and reset-interval parsing |
//!
//! ```rust
//! use ai_inference_client::resilience::rate_limit::RateLimitSnapshot;
//! use reqwest::header::{HeaderMap, HeaderValue};
//!
//! let mut headers = HeaderMap::new();
//! headers.insert("x-ratelimit-remaining-requests", HeaderValue::from_static("99"));
//! let snapshot = RateLimitSnapshot::from_headers(&headers);
//! assert_eq!(snapshot.remaining_requests, 99);
//! assert_eq!(snapshot.limit_requests, 0);
//! ```

pub mod rate_limit;

pub use rate_limit::{RateLimitSnapshot, ResetTime};
