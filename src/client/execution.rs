//! 请求执行逻辑：带重试的非流式请求与单次流式请求。
//!
//! Request execution: the unary retry loop and the single-shot streaming call.

use crate::client::core::AiClient;
use crate::client::error_classification::is_failure_status;
use crate::client::policy::Decision;
use crate::error::decode_error_body;
use crate::pipeline::StreamReader;
use crate::transport::{body_reader, CallKind, ResponseBody, TransportError};
use crate::{Error, Result};
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A request body the dispatcher can send.
///
/// The dispatcher works on a clone and only changes the stream flag, so the
/// caller's value is never mutated.
pub trait ApiRequest: Serialize + Clone + Send + Sync {
    fn set_stream(&mut self, stream: bool);

    /// Pause before re-sending after a transient failure. `None` uses the client default.
    fn retry_delay(&self) -> Option<Duration> {
        None
    }
}

/// A unary response that wants the headers of the exchange that produced it.
pub trait HeaderAware {
    fn attach_headers(&mut self, headers: &HeaderMap);
}

impl ApiRequest for serde_json::Value {
    fn set_stream(&mut self, stream: bool) {
        if let Some(obj) = self.as_object_mut() {
            obj.insert("stream".to_string(), serde_json::Value::Bool(stream));
        }
    }
}

impl HeaderAware for serde_json::Value {
    fn attach_headers(&mut self, _headers: &HeaderMap) {}
}

impl AiClient {
    /// POST `request` to `path` and decode the JSON answer.
    ///
    /// Transient API failures (500, 503 with an error envelope) are re-sent
    /// according to the client's [`RetryPolicy`](crate::client::RetryPolicy).
    pub async fn send_unary<Req, Resp>(&self, path: &str, request: &Req) -> Result<Resp>
    where
        Req: ApiRequest,
        Resp: DeserializeOwned + HeaderAware,
    {
        self.send_unary_with_headers(path, request, None).await
    }

    /// Like [`send_unary`](Self::send_unary) with extra request headers. A
    /// `Content-Type` given here replaces the JSON default.
    pub async fn send_unary_with_headers<Req, Resp>(
        &self,
        path: &str,
        request: &Req,
        extra_headers: Option<&HeaderMap>,
    ) -> Result<Resp>
    where
        Req: ApiRequest,
        Resp: DeserializeOwned + HeaderAware,
    {
        let mut request = request.clone();
        request.set_stream(false);
        let body = serde_json::to_vec(&request)?;

        let mut attempt: u32 = 0;
        loop {
            let err = match self
                .execute_unary_once::<Resp>(path, body.clone(), extra_headers)
                .await
            {
                Ok(resp) => return Ok(resp),
                Err(err) => err,
            };

            match self.policy.decide(&err, attempt, request.retry_delay()) {
                Decision::Retry { delay } => {
                    warn!(
                        http_status = err.status().unwrap_or_default(),
                        endpoint = path,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Decision::Fail => return Err(err),
            }
        }
    }

    async fn execute_unary_once<Resp>(
        &self,
        path: &str,
        body: Vec<u8>,
        extra_headers: Option<&HeaderMap>,
    ) -> Result<Resp>
    where
        Resp: DeserializeOwned + HeaderAware,
    {
        let client_request_id = Uuid::new_v4().to_string();
        let start = Instant::now();

        let resp = self
            .transport
            .post(path, body, CallKind::Unary, extra_headers, &client_request_id)
            .await?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;

        if is_failure_status(status) {
            let err = decode_error_body(status, &bytes);
            info!(
                http_status = status,
                client_request_id = client_request_id.as_str(),
                endpoint = path,
                duration_ms = start.elapsed().as_millis() as u64,
                "request failed"
            );
            return Err(err);
        }

        let mut value: Resp = serde_json::from_slice(&bytes)?;
        value.attach_headers(&headers);
        debug!(
            http_status = status,
            client_request_id = client_request_id.as_str(),
            endpoint = path,
            duration_ms = start.elapsed().as_millis() as u64,
            "request completed"
        );
        Ok(value)
    }

    /// POST `request` with streaming enabled and hand back a reader over the body.
    ///
    /// Never retried. A failed status is decoded from the body before any reader
    /// is created.
    pub async fn send_stream<Req, T>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<StreamReader<T, ResponseBody>>
    where
        Req: ApiRequest,
        T: DeserializeOwned,
    {
        let mut request = request.clone();
        request.set_stream(true);
        let body = serde_json::to_vec(&request)?;

        let client_request_id = Uuid::new_v4().to_string();
        let start = Instant::now();
        let resp = self
            .transport
            .post(path, body, CallKind::Stream, None, &client_request_id)
            .await?;
        let status = resp.status().as_u16();

        if is_failure_status(status) {
            let bytes = resp
                .bytes()
                .await
                .map_err(|e| Error::Transport(TransportError::Http(e)))?;
            info!(
                http_status = status,
                client_request_id = client_request_id.as_str(),
                endpoint = path,
                duration_ms = start.elapsed().as_millis() as u64,
                "streaming request failed"
            );
            return Err(decode_error_body(status, &bytes));
        }

        let headers = resp.headers().clone();
        info!(
            http_status = status,
            client_request_id = client_request_id.as_str(),
            endpoint = path,
            duration_ms = start.elapsed().as_millis() as u64,
            "request started streaming"
        );
        Ok(StreamReader::new(body_reader(resp), self.config.empty_messages_limit).with_headers(headers))
    }
}
