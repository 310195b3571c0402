//! 客户端配置：显式传入的运行参数，可从环境变量加载。
//!
//! Explicit client configuration. Nothing here is process-global; every
//! [`AiClient`](crate::AiClient) owns its own copy.

use crate::pipeline::DEFAULT_EMPTY_MESSAGES_LIMIT;
use keyring::Entry;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

const KEYRING_SERVICE: &str = "ai-inference";
const KEYRING_USER: &str = "api-key";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub organization: Option<String>,
    /// Non-data stream lines tolerated before a stream is abandoned.
    pub empty_messages_limit: usize,
    /// Total time for a unary call. Streams are not bounded by it.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
    pub proxy_url: Option<String>,
    /// `None` retries transient failures without limit.
    pub max_retries: Option<u32>,
    pub retry_delay: Duration,
    /// Use this client instead of building one.
    pub http_client: Option<reqwest::Client>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            organization: None,
            empty_messages_limit: DEFAULT_EMPTY_MESSAGES_LIMIT,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_max_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            proxy_url: None,
            max_retries: Some(3),
            retry_delay: Duration::from_millis(500),
            http_client: None,
        }
    }
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Defaults overridden by `AI_*` environment variables.
    ///
    /// The API key comes from the OS keyring (`ai-inference` / `api-key`) when an
    /// entry exists, otherwise from `AI_API_KEY`. Unparseable numbers are ignored.
    pub fn from_env() -> Self {
        let mut config = Self {
            api_key: Self::api_key_from_keyring().or_else(|| env_string("AI_API_KEY")),
            ..Self::default()
        };

        if let Some(url) = env_string("AI_BASE_URL") {
            config.base_url = url;
        }
        config.organization = env_string("AI_ORGANIZATION");
        config.proxy_url = env_string("AI_PROXY_URL");
        if let Some(secs) = env_parse::<u64>("AI_HTTP_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(n) = env_parse("AI_HTTP_POOL_MAX_IDLE_PER_HOST") {
            config.pool_max_idle_per_host = n;
        }
        if let Some(secs) = env_parse::<u64>("AI_HTTP_POOL_IDLE_TIMEOUT_SECS") {
            config.pool_idle_timeout = Duration::from_secs(secs);
        }
        if let Some(limit) = env_parse("AI_STREAM_EMPTY_MESSAGES_LIMIT") {
            config.empty_messages_limit = limit;
        }
        if let Some(raw) = env_string("AI_MAX_RETRIES") {
            // "unlimited" lifts the cap.
            config.max_retries = if raw.eq_ignore_ascii_case("unlimited") {
                None
            } else {
                raw.parse().ok().or(config.max_retries)
            };
        }
        if let Some(ms) = env_parse::<u64>("AI_RETRY_DELAY_MS") {
            config.retry_delay = Duration::from_millis(ms);
        }
        config
    }

    fn api_key_from_keyring() -> Option<String> {
        let entry = Entry::new(KEYRING_SERVICE, KEYRING_USER).ok()?;
        entry.get_password().ok()
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}
