use crate::client::builder::AiClientBuilder;
use crate::client::chat::ChatRequestBuilder;
use crate::client::config::ClientConfig;
use crate::client::policy::RetryPolicy;
use crate::transport::HttpTransport;
use crate::Result;
use std::sync::Arc;

/// Client for an OpenAI-compatible chat completion API.
///
/// Cheap to clone; clones share the connection pool. No state is shared
/// between calls other than that pool, so concurrent calls on one client are fine.
#[derive(Clone)]
pub struct AiClient {
    pub(crate) config: Arc<ClientConfig>,
    pub(crate) transport: Arc<HttpTransport>,
    pub(crate) policy: RetryPolicy,
}

impl AiClient {
    /// Client with default settings for the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        AiClientBuilder::new().api_key(api_key).build()
    }

    pub fn builder() -> AiClientBuilder {
        AiClientBuilder::new()
    }

    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Ok(Self {
            policy: RetryPolicy::from_config(&config),
            config: Arc::new(config),
            transport,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Start a fluent chat request for `model`.
    pub fn chat(&self, model: impl Into<String>) -> ChatRequestBuilder<'_> {
        ChatRequestBuilder::new(self, model)
    }
}
