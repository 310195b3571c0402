//! 错误码：服务端返回的 `code` 字段可能是字符串也可能是整数。
//!
//! Provider error codes.
//!
//! The `code` member of an error envelope is loosely typed on the wire: some
//! endpoints send `"invalid_api_key"`, others send `429`, and many send `null`.
//! [`ErrorCode`] keeps the distinction instead of collapsing everything into a
//! string, and is chosen from the JSON token type at decode time.
//!
//! ```rust
//! use ai_inference_client::error_code::ErrorCode;
//! use serde_json::json;
//!
//! assert_eq!(ErrorCode::from_json(&json!(503)), Some(ErrorCode::Numeric(503)));
//! assert_eq!(
//!     ErrorCode::from_json(&json!("model_not_found")),
//!     Some(ErrorCode::Text("model_not_found".into()))
//! );
//! assert_eq!(ErrorCode::from_json(&json!(null)), None);
//! ```

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Error code reported by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Textual code, e.g. `"rate_limit_exceeded"`.
    Text(String),
    /// Integer code, e.g. `429`.
    Numeric(i64),
}

impl ErrorCode {
    /// Map a raw JSON value onto a code. `null` means "absent".
    ///
    /// Integral numbers become [`ErrorCode::Numeric`]; anything else that is not
    /// a string (floats, booleans, objects) keeps its JSON text as [`ErrorCode::Text`].
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(ErrorCode::Text(s.clone())),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(ErrorCode::Numeric(i)),
                None => Some(ErrorCode::Text(n.to_string())),
            },
            other => Some(ErrorCode::Text(other.to_string())),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ErrorCode::Text(s) => Some(s),
            ErrorCode::Numeric(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ErrorCode::Numeric(i) => Some(*i),
            ErrorCode::Text(_) => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Text(s) => f.write_str(s),
            ErrorCode::Numeric(i) => write!(f, "{}", i),
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ErrorCode::Text(s) => serializer.serialize_str(s),
            ErrorCode::Numeric(i) => serializer.serialize_i64(*i),
        }
    }
}
