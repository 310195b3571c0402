//! Unary dispatch: retries, error decoding and header capture

use crate::mock_server::{completion_body, MockServerFixture, API_KEY};
use ai_inference_client::client::CHAT_COMPLETIONS_PATH;
use ai_inference_client::{ChatCompletionRequest, ChatCompletionResponse, Error, ErrorCode, Message};
use mockito::Matcher;
use serde_json::json;
use std::time::{Duration, Instant};

const SERVER_ERROR: &str =
    r#"{"error":{"message":"upstream overloaded","type":"server_error","code":null}}"#;

fn request() -> ChatCompletionRequest {
    ChatCompletionRequest::new("llama-3.1-8b-instant", vec![Message::user("hello")])
}

fn expected_body() -> serde_json::Value {
    json!({
        "model": "llama-3.1-8b-instant",
        "messages": [{"role": "user", "content": "hello"}]
    })
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let mut fixture = MockServerFixture::new().await;
    let unavailable = fixture
        .server
        .mock("POST", CHAT_COMPLETIONS_PATH)
        .match_body(Matcher::Json(expected_body()))
        .with_status(503)
        .with_body(SERVER_ERROR)
        .expect(2)
        .create_async()
        .await;
    let ok = fixture
        .server
        .mock("POST", CHAT_COMPLETIONS_PATH)
        .match_body(Matcher::Json(expected_body()))
        .with_status(200)
        .with_body(completion_body("ok", "hi there"))
        .expect(1)
        .create_async()
        .await;

    let client = fixture.client();
    let resp = client.chat_completion(&request()).await.unwrap();

    assert_eq!(resp.id, "ok");
    assert_eq!(resp.content(), Some("hi there"));
    unavailable.assert_async().await;
    ok.assert_async().await;
}

#[tokio::test]
async fn test_internal_server_error_is_retried() {
    let mut fixture = MockServerFixture::new().await;
    let failing = fixture.mock_json_response(500, SERVER_ERROR, 1).await;
    let ok = fixture.mock_json_response(200, r#"{"id":"ok"}"#, 1).await;

    let resp = fixture.client().chat_completion(&request()).await.unwrap();
    assert_eq!(resp.id, "ok");
    failing.assert_async().await;
    ok.assert_async().await;
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mut fixture = MockServerFixture::new().await;
    let bad = fixture
        .mock_json_response(
            400,
            r#"{"error":{"message":"bad model","type":"invalid_request_error","param":"model","code":"model_not_found"}}"#,
            1,
        )
        .await;

    let err = fixture.client().chat_completion(&request()).await.unwrap_err();
    match &err {
        Error::Api(api) => {
            assert_eq!(api.status, Some(400));
            assert_eq!(api.message, "bad model");
            assert_eq!(api.param.as_deref(), Some("model"));
            assert_eq!(api.code, Some(ErrorCode::Text("model_not_found".into())));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "API error: error, status code: 400, message: bad model"
    );
    bad.assert_async().await;
}

#[tokio::test]
async fn test_rate_limited_is_not_retried() {
    let mut fixture = MockServerFixture::new().await;
    let limited = fixture
        .mock_json_response(
            429,
            r#"{"error":{"message":"slow down","type":"rate_limit","code":429}}"#,
            1,
        )
        .await;

    let err = fixture.client().chat_completion(&request()).await.unwrap_err();
    assert_eq!(err.status(), Some(429));
    assert_eq!(
        err.api_error().and_then(|e| e.code.clone()),
        Some(ErrorCode::Numeric(429))
    );
    limited.assert_async().await;
}

#[tokio::test]
async fn test_retries_are_capped() {
    let mut fixture = MockServerFixture::new().await;
    let unavailable = fixture.mock_json_response(503, SERVER_ERROR, 3).await;

    let client = fixture.builder().max_retries(2).build().unwrap();
    let err = client.chat_completion(&request()).await.unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert!(err.is_transient());
    unavailable.assert_async().await;
}

#[tokio::test]
async fn test_failure_without_envelope_is_request_error() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture.mock_json_response(503, "<html>gateway</html>", 1).await;

    let err = fixture.client().chat_completion(&request()).await.unwrap_err();
    match err {
        Error::Request { status, source } => {
            assert_eq!(status, 503);
            assert!(source.is_some());
        }
        other => panic!("expected Request error, got {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_malformed_success_body_is_decode_error() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_json_response(200, "not json", 1).await;

    let err = fixture.client().chat_completion(&request()).await.unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
}

#[tokio::test]
async fn test_request_retry_delay_is_honored() {
    let mut fixture = MockServerFixture::new().await;
    let _unavailable = fixture.mock_json_response(503, SERVER_ERROR, 1).await;
    let _ok = fixture.mock_json_response(200, r#"{"id":"ok"}"#, 1).await;

    let req = request().with_retry_delay(Duration::from_millis(80));
    let start = Instant::now();
    fixture.client().chat_completion(&req).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(80));
}

#[tokio::test]
async fn test_unary_request_shape() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("POST", CHAT_COMPLETIONS_PATH)
        .match_header("authorization", format!("Bearer {API_KEY}").as_str())
        .match_header("accept", "application/json")
        .match_header("content-type", "application/json")
        .match_header(
            "x-client-request-id",
            Matcher::Regex(r"^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-".to_string()),
        )
        // Exact match: the stream flag is forced off and omitted.
        .match_body(Matcher::Json(expected_body()))
        .with_status(200)
        .with_body(r#"{"id":"shape"}"#)
        .create_async()
        .await;

    let mut req = request();
    req.stream = true;
    let resp = fixture.client().chat_completion(&req).await.unwrap();
    assert_eq!(resp.id, "shape");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_response_carries_rate_limits() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture
        .server
        .mock("POST", CHAT_COMPLETIONS_PATH)
        .with_status(200)
        .with_header("x-ratelimit-limit-requests", "14400")
        .with_header("x-ratelimit-remaining-requests", "14399")
        .with_header("x-ratelimit-limit-tokens", "6000")
        .with_header("x-ratelimit-remaining-tokens", "5990")
        .with_header("x-ratelimit-reset-requests", "6s")
        .with_header("x-ratelimit-reset-tokens", "100ms")
        .with_body(completion_body("rl", "ok"))
        .create_async()
        .await;

    let resp = fixture.client().chat_completion(&request()).await.unwrap();
    let limits = &resp.rate_limits;
    assert_eq!(limits.limit_requests, 14400);
    assert_eq!(limits.remaining_requests, 14399);
    assert_eq!(limits.limit_tokens, 6000);
    assert_eq!(limits.remaining_tokens, 5990);
    assert_eq!(limits.reset_requests.as_str(), "6s");
    assert_eq!(limits.reset_tokens.duration(), Some(Duration::from_millis(100)));
    assert!(resp.headers.contains_key("x-ratelimit-limit-tokens"));
    assert_eq!(resp.usage.map(|u| u.total_tokens), Some(7));
}

#[tokio::test]
async fn test_generic_send_unary_with_json_values() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("POST", "/models/echo")
        .match_body(Matcher::PartialJson(json!({"input": "x", "stream": false})))
        .with_status(200)
        .with_body(r#"{"echo":"x"}"#)
        .create_async()
        .await;

    let client = fixture.client();
    let out: serde_json::Value = client
        .send_unary("/models/echo", &json!({"input": "x"}))
        .await
        .unwrap();
    assert_eq!(out["echo"], "x");
    mock.assert_async().await;

    let typed: Result<ChatCompletionResponse, _> =
        client.send_unary("/missing", &json!({})).await;
    assert_eq!(typed.unwrap_err().status(), Some(501));
}
