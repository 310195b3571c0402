use crate::client::config::ClientConfig;
use crate::client::core::AiClient;
use crate::Result;
use std::time::Duration;

/// Builder for creating clients with custom configuration.
#[derive(Debug, Clone, Default)]
pub struct AiClientBuilder {
    config: ClientConfig,
}

impl AiClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from [`ClientConfig::from_env`].
    pub fn from_env() -> Self {
        Self {
            config: ClientConfig::from_env(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Override the API base URL, e.g. to point at a mock server.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn organization(mut self, org: impl Into<String>) -> Self {
        self.config.organization = Some(org.into());
        self
    }

    pub fn empty_messages_limit(mut self, limit: usize) -> Self {
        self.config.empty_messages_limit = limit;
        self
    }

    /// Total time allowed for a unary call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn pool_max_idle_per_host(mut self, n: usize) -> Self {
        self.config.pool_max_idle_per_host = n;
        self
    }

    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.config.proxy_url = Some(url.into());
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = Some(n);
        self
    }

    /// Keep re-sending transient failures until one succeeds.
    pub fn unbounded_retries(mut self) -> Self {
        self.config.max_retries = None;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay = delay;
        self
    }

    /// Use an existing `reqwest::Client`. Pool, proxy and connect settings are then ignored.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.config.http_client = Some(client);
        self
    }

    /// Build the client. Fails when the API key is missing or the base URL does not parse.
    pub fn build(self) -> Result<AiClient> {
        AiClient::from_config(self.config)
    }
}
