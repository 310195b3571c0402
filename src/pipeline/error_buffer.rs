use crate::error::{parse_envelope, ApiError};

/// Bytes the frame parser refused, kept in case they turn out to be an error body.
///
/// Servers sometimes answer a streaming call with a plain JSON error, or switch to
/// an in-band `data: {"error": ...}` frame. Whatever lands here is only interpreted
/// once the reader hits a terminal condition.
#[derive(Debug, Default, Clone)]
pub struct ErrorAccumulator {
    buf: Vec<u8>,
}

impl ErrorAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Accumulated bytes, `None` while nothing has been written.
    pub fn bytes(&self) -> Option<&[u8]> {
        if self.buf.is_empty() {
            None
        } else {
            Some(&self.buf)
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Interpret the contents as an error envelope.
    pub fn decode(&self) -> Option<ApiError> {
        self.bytes().and_then(parse_envelope)
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.buf).into_owned()
    }
}
