//! HTTP transport: request construction and response body adaptation.

pub mod http;

pub use http::{body_reader, CallKind, HttpTransport, ResponseBody, TransportError};
