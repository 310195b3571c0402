//! Integration tests for streaming responses

use crate::mock_server::{chunk_frame, MockServerFixture};
use ai_inference_client::client::CHAT_COMPLETIONS_PATH;
use ai_inference_client::types::FinishReason;
use ai_inference_client::{ChatCompletionRequest, Error, Message, StreamState};
use futures::StreamExt;
use mockito::Matcher;
use serde_json::json;

fn request() -> ChatCompletionRequest {
    ChatCompletionRequest::new("llama-3.1-8b-instant", vec![Message::user("stream please")])
}

#[tokio::test]
async fn test_sse_streaming_response() {
    let mut fixture = MockServerFixture::new().await;
    let frames = [
        chunk_frame("c1", "Hello"),
        chunk_frame("c1", " World"),
        "[DONE]".to_string(),
    ];
    let frames: Vec<&str> = frames.iter().map(String::as_str).collect();
    let _mock = fixture.mock_sse_stream(&frames).await;

    let mut stream = fixture.client().chat_completion_stream(&request()).await.unwrap();
    let mut text = String::new();
    while let Some(chunk) = stream.next().await.unwrap() {
        text.push_str(chunk.content().unwrap_or_default());
    }
    assert_eq!(text, "Hello World");
    assert_eq!(stream.state(), StreamState::Finished);
    assert!(stream.next().await.unwrap().is_none());
}

#[tokio::test]
async fn test_stream_request_shape() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("POST", CHAT_COMPLETIONS_PATH)
        .match_header("accept", "text/event-stream")
        .match_header("cache-control", "no-cache")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({"stream": true})))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_header("x-ratelimit-remaining-tokens", "1234")
        .with_header("x-ratelimit-reset-tokens", "7.66s")
        .with_body(MockServerFixture::sse_body(&["[DONE]"]))
        .create_async()
        .await;

    let mut stream = fixture.client().chat_completion_stream(&request()).await.unwrap();
    assert_eq!(stream.rate_limits().remaining_tokens, 1234);
    assert_eq!(stream.rate_limits().reset_tokens.as_str(), "7.66s");
    assert_eq!(stream.headers()["content-type"], "text/event-stream");
    assert!(stream.next().await.unwrap().is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_stream_error_status_is_decoded() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_response(
            401,
            r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error","code":"invalid_api_key"}}"#,
            1,
        )
        .await;

    let err = fixture
        .client()
        .chat_completion_stream(&request())
        .await
        .err()
        .expect("stream should fail");
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.api_error().map(|e| e.message.as_str()), Some("Invalid API Key"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_stream_is_never_retried() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_response(503, r#"{"error":{"message":"busy","type":"server_error"}}"#, 1)
        .await;

    let err = fixture
        .client()
        .chat_completion_stream(&request())
        .await
        .err()
        .expect("stream should fail");
    assert!(err.is_transient());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_in_band_error_over_http_200() {
    let mut fixture = MockServerFixture::new().await;
    let first = chunk_frame("c1", "partial");
    let _mock = fixture
        .mock_sse_stream(&[
            first.as_str(),
            r#"{"error":{"message":"model crashed","type":"internal_error","code":500}}"#,
        ])
        .await;

    let mut stream = fixture.client().chat_completion_stream(&request()).await.unwrap();
    assert!(stream.next().await.unwrap().is_some());
    match stream.next().await {
        Err(Error::Api(api)) => {
            assert_eq!(api.message, "model crashed");
            assert_eq!(api.status, None);
        }
        other => panic!("expected in-band Api error, got {other:?}"),
    }
    assert!(stream.next().await.unwrap().is_none());
}

#[tokio::test]
async fn test_too_many_empty_messages_over_http() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture
        .server
        .mock("POST", CHAT_COMPLETIONS_PATH)
        .with_status(200)
        .with_body(": ping\n: ping\n: ping\n: ping\n")
        .create_async()
        .await;

    let client = fixture.builder().empty_messages_limit(2).build().unwrap();
    let mut stream = client.chat_completion_stream(&request()).await.unwrap();
    assert!(matches!(
        stream.next().await,
        Err(Error::TooManyEmptyStreamMessages { limit: 2 })
    ));
    assert!(stream.next().await.unwrap().is_none());
}

#[tokio::test]
async fn test_collect_response_assembles_tool_calls() {
    let mut fixture = MockServerFixture::new().await;
    let frames = [
        json!({"id": "t", "choices": [{"index": 0, "delta": {"role": "assistant", "tool_calls": [
            {"index": 0, "id": "call_1", "type": "function", "function": {"name": "lookup", "arguments": "{\"q\":"}}
        ]}}]}),
        json!({"id": "t", "choices": [{"index": 0, "delta": {"tool_calls": [
            {"index": 0, "function": {"arguments": "\"rust\"}"}}
        ]}, "finish_reason": "tool_calls"}],
        "x_groq": {"id": "req_1", "usage": {"prompt_tokens": 9, "completion_tokens": 3, "total_tokens": 12}}}),
    ]
    .map(|v| v.to_string());
    let _mock = fixture
        .mock_sse_stream(&[frames[0].as_str(), frames[1].as_str(), "[DONE]"])
        .await;

    let stream = fixture.client().chat_completion_stream(&request()).await.unwrap();
    let resp = stream.collect_response().await.unwrap();
    let choice = &resp.choices[0];
    assert_eq!(choice.finish_reason, Some(FinishReason::ToolCalls));
    let call = &choice.message.tool_calls.as_ref().unwrap()[0];
    assert_eq!(call.id, "call_1");
    assert_eq!(call.function.arguments_json().unwrap(), json!({"q": "rust"}));
    assert_eq!(resp.usage.map(|u| u.total_tokens), Some(12));
}

#[tokio::test]
async fn test_into_stream_adapter() {
    let mut fixture = MockServerFixture::new().await;
    let frames = [chunk_frame("a", "1"), chunk_frame("a", "2"), chunk_frame("a", "3")];
    let _mock = fixture
        .mock_sse_stream(&[frames[0].as_str(), frames[1].as_str(), frames[2].as_str(), "[DONE]"])
        .await;

    let stream = fixture.client().chat_completion_stream(&request()).await.unwrap();
    let parts: Vec<String> = stream
        .into_stream()
        .map(|chunk| chunk.unwrap().content().unwrap_or_default().to_string())
        .collect()
        .await;
    assert_eq!(parts, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_close_releases_stream() {
    let mut fixture = MockServerFixture::new().await;
    let frame = chunk_frame("a", "x");
    let _mock = fixture.mock_sse_stream(&[frame.as_str(), "[DONE]"]).await;

    let mut stream = fixture.client().chat_completion_stream(&request()).await.unwrap();
    stream.close();
    stream.close();
    assert_eq!(stream.state(), StreamState::Closed);
    assert!(stream.next().await.unwrap().is_none());
}
