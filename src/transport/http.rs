use crate::client::config::ClientConfig;
use crate::{Error, ErrorContext, Result};
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use reqwest::Proxy;
use std::io;
use std::pin::Pin;
use std::time::Duration;

/// Header carrying our per-attempt correlation id.
pub const CLIENT_REQUEST_ID_HEADER: &str = "x-client-request-id";

/// Which of the two call shapes a request belongs to. Decides the header set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// Buffered JSON request/response.
    Unary,
    /// Long-lived `text/event-stream` response.
    Stream,
}

/// Raw response body chunks, with transport failures surfaced as `io::Error`.
pub type ByteStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send + 'static>>;

/// Live response body exposed as an `AsyncBufRead`, ready for line-oriented reads.
pub type ResponseBody = tokio_util::io::StreamReader<ByteStream, Bytes>;

/// Adapt a streaming HTTP response into a buffered byte source.
pub fn body_reader(resp: reqwest::Response) -> ResponseBody {
    let stream: ByteStream = Box::pin(resp.bytes_stream().map_err(io::Error::other));
    tokio_util::io::StreamReader::new(stream)
}

/// Thin wrapper over `reqwest::Client` that knows the base URL, credentials and
/// the header conventions for unary and streaming calls.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    organization: Option<String>,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            Error::configuration_with_context(
                "API key is required",
                ErrorContext::new()
                    .with_field_path("config.api_key")
                    .with_details("set AI_API_KEY or call AiClientBuilder::api_key")
                    .with_source("http_transport"),
            )
        })?;

        url::Url::parse(&config.base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid base URL: {}", e),
                ErrorContext::new()
                    .with_field_path("config.base_url")
                    .with_details(config.base_url.clone())
                    .with_source("http_transport"),
            )
        })?;

        let client = match &config.http_client {
            Some(client) => client.clone(),
            None => Self::build_client(config)?,
        };

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            organization: config.organization.clone(),
            timeout: config.timeout,
        })
    }

    fn build_client(config: &ClientConfig) -> Result<reqwest::Client> {
        // No client-wide total timeout: it would cut long streams. Unary calls get
        // `config.timeout` per request instead.
        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Some(config.pool_idle_timeout))
            .http2_adaptive_window(true)
            .http2_keep_alive_interval(Some(Duration::from_secs(30)))
            .http2_keep_alive_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = Proxy::all(proxy_url).map_err(|e| {
                Error::configuration_with_context(
                    format!("Invalid proxy URL: {}", e),
                    ErrorContext::new()
                        .with_field_path("config.proxy_url")
                        .with_source("http_transport"),
                )
            })?;
            builder = builder.proxy(proxy);
        }

        builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))
    }

    /// Full URL for an endpoint path such as `/chat/completions`.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Headers for a call shape. `extra` headers win, and a caller-supplied
    /// `Content-Type` (e.g. multipart) is never overwritten on unary calls.
    pub fn headers_for(kind: CallKind, extra: Option<&HeaderMap>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        match kind {
            CallKind::Stream => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
                headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
                headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
            }
            CallKind::Unary => {
                headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
            }
        }
        if let Some(extra) = extra {
            for (name, value) in extra {
                headers.insert(name.clone(), value.clone());
            }
        }
        if kind == CallKind::Unary && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        headers
    }

    /// Issue one POST. Returns the raw response whatever its status.
    pub async fn post(
        &self,
        path: &str,
        body: Vec<u8>,
        kind: CallKind,
        extra_headers: Option<&HeaderMap>,
        client_request_id: &str,
    ) -> Result<reqwest::Response> {
        let url = self.endpoint_url(path);
        let mut req = self
            .client
            .post(&url)
            .headers(Self::headers_for(kind, extra_headers))
            .header(CLIENT_REQUEST_ID_HEADER, client_request_id)
            .bearer_auth(&self.api_key)
            .body(body);

        if let Some(org) = &self.organization {
            req = req.header("OpenAI-Organization", org);
        }
        if kind == CallKind::Unary {
            req = req.timeout(self.timeout);
        }

        req.send()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
