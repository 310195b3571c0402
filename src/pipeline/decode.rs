//! 流式读取器：逐行解析 SSE 数据帧的状态机。
//!
//! Line-oriented reader for `text/event-stream` completion bodies.
//!
//! Frames are `data: <json>` lines. `data: [DONE]` ends the stream. Anything that
//! is not a data frame (keep-alive blank lines, `: comments`, `event:` lines, or a
//! raw JSON error body) is tolerated up to a limit and kept aside in an
//! [`ErrorAccumulator`] so that an error sent outside the framing can still be
//! reported as a structured [`ApiError`](crate::error::ApiError).

use crate::pipeline::error_buffer::ErrorAccumulator;
use crate::resilience::RateLimitSnapshot;
use crate::{BoxStream, Error, Result};
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use std::io;
use std::marker::PhantomData;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

pub const DATA_PREFIX: &[u8] = b"data: ";
pub const ERROR_PREFIX: &[u8] = br#"data: {"error":"#;
pub const DONE_SENTINEL: &[u8] = b"[DONE]";

/// Non-data lines tolerated per stream before giving up.
pub const DEFAULT_EMPTY_MESSAGES_LIMIT: usize = 10;

/// Lifecycle of a [`StreamReader`]. `Finished` and `Closed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Reading,
    /// An in-band `data: {"error":` frame was seen; the next read ends the stream.
    ErrorCapture,
    Finished,
    Closed,
}

impl StreamState {
    pub fn is_terminal(self) -> bool {
        matches!(self, StreamState::Finished | StreamState::Closed)
    }
}

/// Pull-based decoder of one streaming response.
///
/// Single owner: `next` takes `&mut self`, so one reader is driven by one caller
/// at a time. Dropping the reader (or calling [`close`](Self::close)) releases the
/// underlying body.
pub struct StreamReader<T, R> {
    source: Option<R>,
    line: Vec<u8>,
    errors: ErrorAccumulator,
    empty_messages: usize,
    empty_messages_limit: usize,
    state: StreamState,
    // The blank line right after a data frame is its SSE delimiter, not an empty message.
    after_frame: bool,
    headers: HeaderMap,
    rate_limits: RateLimitSnapshot,
    _chunk: PhantomData<fn() -> T>,
}

impl<T, R> StreamReader<T, R> {
    pub fn new(source: R, empty_messages_limit: usize) -> Self {
        Self {
            source: Some(source),
            line: Vec::with_capacity(512),
            errors: ErrorAccumulator::new(),
            empty_messages: 0,
            empty_messages_limit,
            state: StreamState::Reading,
            after_frame: false,
            headers: HeaderMap::new(),
            rate_limits: RateLimitSnapshot::default(),
            _chunk: PhantomData,
        }
    }

    /// Attach the headers of the response this body belongs to.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.rate_limits = RateLimitSnapshot::from_headers(&headers);
        self.headers = headers;
        self
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// Non-data lines seen so far. Never decreases.
    pub fn empty_messages(&self) -> usize {
        self.empty_messages
    }

    pub fn empty_messages_limit(&self) -> usize {
        self.empty_messages_limit
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn rate_limits(&self) -> &RateLimitSnapshot {
        &self.rate_limits
    }

    /// Release the byte source. Idempotent; later `next` calls report end of stream.
    pub fn close(&mut self) {
        self.source = None;
        self.state = StreamState::Closed;
    }
}

impl<T, R> StreamReader<T, R>
where
    T: DeserializeOwned,
    R: AsyncBufRead + Unpin,
{
    /// Next decoded chunk.
    ///
    /// `Ok(None)` is the end-of-stream signal and repeats forever once returned.
    /// A chunk that fails to decode yields [`Error::Decode`] and the reader stays
    /// usable; every other error is terminal.
    pub async fn next(&mut self) -> Result<Option<T>> {
        if self.state.is_terminal() {
            return Ok(None);
        }

        loop {
            self.line.clear();
            let read = match self.source.as_mut() {
                Some(source) => source.read_until(b'\n', &mut self.line).await,
                None => Ok(0),
            };
            match read {
                Ok(0) => return self.terminate(None),
                Err(e) => return self.terminate(Some(e)),
                Ok(_) if self.state == StreamState::ErrorCapture => return self.terminate(None),
                Ok(_) => {}
            }

            let line = self.line.trim_ascii();
            if line.starts_with(ERROR_PREFIX) {
                self.errors.reset();
                self.state = StreamState::ErrorCapture;
            }
            let capturing = self.state == StreamState::ErrorCapture;

            if capturing || !line.starts_with(DATA_PREFIX) {
                let delimiter = line.is_empty() && self.after_frame && !capturing;
                self.after_frame = false;
                if delimiter {
                    continue;
                }

                let payload = if capturing {
                    line.strip_prefix(DATA_PREFIX).unwrap_or(line)
                } else {
                    line
                };
                self.errors.write(payload);
                self.empty_messages += 1;
                if self.empty_messages > self.empty_messages_limit {
                    self.state = StreamState::Finished;
                    debug!(
                        empty_messages = self.empty_messages,
                        limit = self.empty_messages_limit,
                        "stream exceeded empty message limit"
                    );
                    return Err(Error::TooManyEmptyStreamMessages {
                        limit: self.empty_messages_limit,
                    });
                }
                continue;
            }

            let payload = &line[DATA_PREFIX.len()..];
            if payload == DONE_SENTINEL {
                self.state = StreamState::Finished;
                debug!(empty_messages = self.empty_messages, "stream reached [DONE]");
                return Ok(None);
            }

            self.after_frame = true;
            let chunk = serde_json::from_slice::<T>(payload)?;
            self.errors.reset();
            return Ok(Some(chunk));
        }
    }

    fn terminate(&mut self, read_error: Option<io::Error>) -> Result<Option<T>> {
        let capturing = self.state == StreamState::ErrorCapture;
        self.state = StreamState::Finished;

        if let Some(api) = self.errors.decode() {
            debug!(error_message = api.message.as_str(), "stream ended with an error envelope");
            return Err(Error::Api(api));
        }
        if let Some(e) = read_error {
            return Err(Error::Io(e));
        }
        if capturing {
            return Err(Error::StreamTerminated {
                partial: self.errors.to_string_lossy(),
            });
        }
        debug!("stream ended without [DONE]");
        Ok(None)
    }
}

impl<T, R> StreamReader<T, R>
where
    T: DeserializeOwned + Send + 'static,
    R: AsyncBufRead + Unpin + Send + 'static,
{
    /// Adapt into a `futures::Stream` that ends with the end-of-stream signal or
    /// after a terminal error.
    pub fn into_stream(self) -> BoxStream<'static, T> {
        Box::pin(futures::stream::unfold(self, |mut reader| async move {
            match reader.next().await {
                Ok(Some(chunk)) => Some((Ok(chunk), reader)),
                Ok(None) => None,
                Err(e) => Some((Err(e), reader)),
            }
        }))
    }
}
