//! Tests for mailing-list signup

mod common;

use common::TestApp;
use jokeboard::{HttpNewsletterClient, NewsletterClient, NewsletterConfig};
use std::sync::atomic::Ordering;
use wiremock::matchers::{bearer_token, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test: a signup lands on the success page and reaches the list
#[tokio::test]
async fn test_signup_success() {
    let app = TestApp::new();

    let response = app
        .server()
        .post("/signup")
        .form(&[
            ("first_name", "Carol"),
            ("last_name", "Jones"),
            ("email", "carol@example.com"),
        ])
        .await;

    assert_eq!(response.status_code(), 303);
    assert_eq!(response.header("location"), "/success");

    let subscribed = app.newsletter.subscribed.read().unwrap();
    assert_eq!(subscribed.len(), 1);
    assert_eq!(
        subscribed[0],
        (
            "Carol".to_string(),
            "Jones".to_string(),
            "carol@example.com".to_string()
        )
    );
}

/// Test: when the list API says no, the visitor lands on the failure page
#[tokio::test]
async fn test_signup_failure() {
    let app = TestApp::new();
    app.newsletter.fail.store(true, Ordering::SeqCst);

    let response = app
        .server()
        .post("/signup")
        .form(&[
            ("first_name", "Carol"),
            ("last_name", "Jones"),
            ("email", "carol@example.com"),
        ])
        .await;

    assert_eq!(response.status_code(), 303);
    assert_eq!(response.header("location"), "/failure");
}

/// Test: blank names never reach the list API
#[tokio::test]
async fn test_signup_blank_fields_rejected() {
    let app = TestApp::new();

    let response = app
        .server()
        .post("/signup")
        .form(&[
            ("first_name", "  "),
            ("last_name", "Jones"),
            ("email", "carol@example.com"),
        ])
        .await;

    assert_eq!(response.status_code(), 303);
    assert_eq!(response.header("location"), "/failure");
    assert!(app.newsletter.subscribed.read().unwrap().is_empty());
}

/// Test: a malformed email never reaches the list API
#[tokio::test]
async fn test_signup_invalid_email_rejected() {
    let app = TestApp::new();

    let response = app
        .server()
        .post("/signup")
        .form(&[
            ("first_name", "Carol"),
            ("last_name", "Jones"),
            ("email", "not-an-email"),
        ])
        .await;

    assert_eq!(response.status_code(), 303);
    assert_eq!(response.header("location"), "/failure");
    assert!(app.newsletter.subscribed.read().unwrap().is_empty());
}

/// Test: the outcome pages render for anyone
#[tokio::test]
async fn test_outcome_pages_render() {
    let app = TestApp::new();

    let response = app.server().get("/success").await;
    assert_eq!(response.status_code(), 200);
    assert!(response.text().contains("on the list"));

    let response = app.server().get("/failure").await;
    assert_eq!(response.status_code(), 200);
    assert!(response.text().contains("try again"));
}

/// Test: the real HTTP client counts a 200 as subscribed and sends the
/// expected body and bearer token
#[tokio::test]
async fn test_http_client_accepts_200() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/lists/abc123"))
        .and(bearer_token("test-key"))
        .and(body_partial_json(serde_json::json!({
            "members": [{
                "email_address": "carol@example.com",
                "status": "subscribed",
            }]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpNewsletterClient::new(NewsletterConfig {
        api_url: format!("{}/lists/abc123", mock_server.uri()),
        api_key: "test-key".to_string(),
    });

    // The client is blocking, so hop off the async runtime to call it
    let result =
        tokio::task::spawn_blocking(move || client.subscribe("Carol", "Jones", "carol@example.com"))
            .await
            .unwrap();

    assert!(result.is_ok());
}

/// Test: any non-200 status is a failure
#[tokio::test]
async fn test_http_client_rejects_other_statuses() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&mock_server)
        .await;

    let client = HttpNewsletterClient::new(NewsletterConfig {
        api_url: mock_server.uri(),
        api_key: "test-key".to_string(),
    });

    let result =
        tokio::task::spawn_blocking(move || client.subscribe("Carol", "Jones", "carol@example.com"))
            .await
            .unwrap();

    assert!(result.is_err());
}
