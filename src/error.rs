use crate::error_code::ErrorCode;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Structured error context for configuration and validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "config.base_url", "request.messages")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "client_builder", "request_validator")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the client.
///
/// Every failure of `send_unary`, `send_stream` and `StreamReader::next` is one of
/// these variants; nothing is swallowed on the way to the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// The request could not be sent (connect, TLS, timeout before a response).
    #[error("Network transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    /// Reading the response body failed after the response started.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Non-success status or in-band stream error with a well-formed envelope.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Non-success status whose body is not an error envelope.
    #[error("Request error: status code {status}{}", format_source(.source))]
    Request {
        status: u16,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The stream kept sending non-data lines past the configured limit.
    #[error("stream has sent too many empty messages (limit {limit})")]
    TooManyEmptyStreamMessages { limit: usize },

    /// An in-band error frame was captured but never became a decodable envelope.
    #[error("stream terminated while capturing an error frame: {partial}")]
    StreamTerminated { partial: String },

    /// A success body or a data frame did not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// JSON-mode content could not be parsed into the requested type.
    #[error("Structured output error (response {response_id}): {source}")]
    StructuredOutput {
        response_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

fn format_source(source: &Option<serde_json::Error>) -> String {
    match source {
        Some(e) => format!(", message: {}", e),
        None => ", message: response carried no error envelope".to_string(),
    }
}

impl Error {
    /// Create a new validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Validation { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }

    /// The decoded API error, if this is a protocol error.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Api(e) => Some(e),
            _ => None,
        }
    }

    /// HTTP status attached to the failure, when one is known.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(e) => e.status,
            Error::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for decoded API errors carrying a transient server status (500, 503).
    pub fn is_transient(&self) -> bool {
        self.api_error()
            .and_then(|e| e.status)
            .map(crate::client::error_classification::is_transient_status)
            .unwrap_or(false)
    }
}

/// Error information returned by the remote API inside an [`ErrorEnvelope`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawApiError")]
pub struct ApiError {
    /// Human readable message. Array messages are joined with `", "`.
    pub message: String,
    /// The `type` tag, e.g. `"invalid_request_error"`.
    pub kind: String,
    pub param: Option<String>,
    pub code: Option<ErrorCode>,
    /// HTTP status of the response that carried the envelope. `None` for in-band stream errors.
    pub status: Option<u16>,
}

impl ApiError {
    pub fn new(message: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: kind.into(),
            param: None,
            code: None,
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "error, status code: {}, message: {}", status, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Deserialize)]
struct RawApiError {
    #[serde(default)]
    message: Option<RawMessage>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    param: Option<String>,
    #[serde(default)]
    code: Option<Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMessage {
    One(String),
    Many(Vec<String>),
}

impl From<RawApiError> for ApiError {
    fn from(raw: RawApiError) -> Self {
        let message = match raw.message {
            Some(RawMessage::One(s)) => s,
            Some(RawMessage::Many(parts)) => parts.join(", "),
            None => String::new(),
        };
        ApiError {
            message,
            kind: raw.kind.unwrap_or_default(),
            param: raw.param,
            code: raw.code.as_ref().and_then(ErrorCode::from_json),
            status: None,
        }
    }
}

/// The `{"error": {...}}` wrapper used by failed responses and in-band stream errors.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub error: Option<ApiError>,
}

/// Decode the body of a failed response into an [`Error`].
///
/// A well-formed envelope becomes [`Error::Api`] carrying `status`; a body that
/// does not parse, or parses without an `error` member, becomes [`Error::Request`].
pub fn decode_error_body(status: u16, body: &[u8]) -> Error {
    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope { error: Some(api) }) => Error::Api(api.with_status(status)),
        Ok(ErrorEnvelope { error: None }) => Error::Request {
            status,
            source: None,
        },
        Err(e) => Error::Request {
            status,
            source: Some(e),
        },
    }
}

/// Best-effort envelope parse used by the stream reader's terminal path.
pub(crate) fn parse_envelope(bytes: &[u8]) -> Option<ApiError> {
    if bytes.is_empty() {
        return None;
    }
    serde_json::from_slice::<ErrorEnvelope>(bytes)
        .ok()
        .and_then(|env| env.error)
}
