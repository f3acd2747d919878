#![allow(clippy::unwrap_used, clippy::expect_used)]
use std::time::Duration;

use serde_json::json;
use vidchat_service::{
    AnswerService, ChatRequest, HttpAnswerService, ServiceConfig, ServiceError,
};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service_for(server: &MockServer) -> HttpAnswerService {
    HttpAnswerService::new(ServiceConfig::new(server.uri())).expect("mock server uri is valid")
}

#[tokio::test]
async fn chat_posts_message_and_decodes_steps() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({ "message": "2+2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "video_id": "abc123",
            "video_title": "Basics",
            "video_views": 42,
            "reply_steps": [
                "First, 2 means two units.",
                "Then add another two units.",
                "Result: 4."
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = service_for(&server)
        .chat(ChatRequest::new("2+2"))
        .await
        .expect("chat succeeds");

    assert_eq!(response.video_id, "abc123");
    assert_eq!(response.video_title, "Basics");
    assert_eq!(response.video_views, 42);
    assert_eq!(response.step_texts().len(), 3);
}

#[tokio::test]
async fn chat_surfaces_non_success_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Error processing chat"))
        .mount(&server)
        .await;

    let error = service_for(&server)
        .chat(ChatRequest::new("hello"))
        .await
        .expect_err("500 must fail");

    match error {
        ServiceError::UnexpectedStatus { status, body, .. } => {
            assert_eq!(status, 500);
            assert_eq!(body, "Error processing chat");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn chat_rejects_malformed_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "reply": "no video" })))
        .mount(&server)
        .await;

    let error = service_for(&server)
        .chat(ChatRequest::new("hello"))
        .await
        .expect_err("payload without video must fail");

    assert!(matches!(error, ServiceError::DecodePayload { .. }));
}

#[tokio::test]
async fn chat_times_out_on_slow_service() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(5))
                .set_body_json(json!({
                    "video_id": "x",
                    "video_title": "x",
                    "video_views": 1,
                    "reply": "late"
                })),
        )
        .mount(&server)
        .await;

    let service = HttpAnswerService::new(
        ServiceConfig::new(server.uri()).with_request_timeout(Duration::from_millis(100)),
    )
    .expect("valid config");

    let error = service
        .chat(ChatRequest::new("hello"))
        .await
        .expect_err("slow service must time out");

    assert!(matches!(error, ServiceError::SendRequest { .. }));
}

#[tokio::test]
async fn random_video_and_health_decode() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/random-video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "video_id": "r1",
            "video_url": "https://www.youtube.com/watch?v=r1",
            "title": "Trending",
            "views": 1000
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "YouTube Chat Video API with AI Search is running!"
        })))
        .mount(&server)
        .await;

    let service = service_for(&server);

    let video = service.random_video().await.expect("random video succeeds");
    assert_eq!(video.video_id, "r1");
    assert_eq!(video.title, "Trending");
    assert_eq!(video.views, 1000);

    let banner = service.health().await.expect("health succeeds");
    assert_eq!(banner, "YouTube Chat Video API with AI Search is running!");
}
