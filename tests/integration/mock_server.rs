//! Mock HTTP server setup for integration tests

use ai_inference_client::client::CHAT_COMPLETIONS_PATH;
use ai_inference_client::{AiClient, AiClientBuilder};
use mockito::{Mock, Server, ServerGuard};
use std::time::Duration;

pub const API_KEY: &str = "test-key";

/// Test fixture that owns a mock server and builds clients pointed at it.
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    /// Builder pointed at the mock server, with a near-zero retry delay.
    pub fn builder(&self) -> AiClientBuilder {
        AiClientBuilder::new()
            .api_key(API_KEY)
            .base_url(&self.base_url)
            .retry_delay(Duration::from_millis(1))
    }

    pub fn client(&self) -> AiClient {
        self.builder().build().expect("client builds")
    }

    /// SSE body: each chunk becomes a `data:` frame followed by a blank line.
    pub fn sse_body(chunks: &[&str]) -> String {
        chunks
            .iter()
            .map(|chunk| {
                if chunk.starts_with("data: ") {
                    format!("{}\n\n", chunk)
                } else {
                    format!("data: {}\n\n", chunk)
                }
            })
            .collect()
    }

    /// Successful streaming response.
    pub async fn mock_sse_stream(&mut self, chunks: &[&str]) -> Mock {
        self.server
            .mock("POST", CHAT_COMPLETIONS_PATH)
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(Self::sse_body(chunks))
            .create_async()
            .await
    }

    /// JSON response with the given status, expected to be hit `hits` times.
    pub async fn mock_json_response(&mut self, status: usize, body: &str, hits: usize) -> Mock {
        self.server
            .mock("POST", CHAT_COMPLETIONS_PATH)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }
}

pub fn completion_body(id: &str, content: &str) -> String {
    serde_json::json!({
        "id": id,
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "llama-3.1-8b-instant",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 5, "completion_tokens": 2, "total_tokens": 7}
    })
    .to_string()
}

pub fn chunk_frame(id: &str, content: &str) -> String {
    serde_json::json!({
        "id": id,
        "object": "chat.completion.chunk",
        "created": 1_700_000_000,
        "model": "llama-3.1-8b-instant",
        "choices": [{"index": 0, "delta": {"content": content}, "finish_reason": null}]
    })
    .to_string()
}
