//! Tests for the contact form

mod common;

use common::TestApp;

/// Test: a valid message is handed to the mailer with the visitor's
/// address for replies
#[tokio::test]
async fn test_contact_sends_mail() {
    let app = TestApp::new();

    let response = app
        .server()
        .post("/contact")
        .form(&[
            ("email", "visitor@example.com"),
            ("message", "I have a joke for you, call me."),
        ])
        .await;

    assert_eq!(response.status_code(), 200);
    assert!(response.text().contains("has been sent"));

    let sent = app.mailer.sent.read().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "visitor@example.com");
    assert_eq!(sent[0].1, "I have a joke for you, call me.");
}

/// Test: messages under ten characters are rejected before the mailer
#[tokio::test]
async fn test_contact_short_message_rejected() {
    let app = TestApp::new();

    let response = app
        .server()
        .post("/contact")
        .form(&[("email", "visitor@example.com"), ("message", "hi there")])
        .await;

    assert_eq!(response.status_code(), 200);
    assert!(response.text().contains("at least 10 characters"));
    assert!(app.mailer.sent.read().unwrap().is_empty());
}

/// Test: a ten character message is long enough
#[tokio::test]
async fn test_contact_minimum_length_message() {
    let app = TestApp::new();

    let response = app
        .server()
        .post("/contact")
        .form(&[("email", "visitor@example.com"), ("message", "0123456789")])
        .await;

    assert_eq!(response.status_code(), 200);
    assert!(response.text().contains("has been sent"));
    assert_eq!(app.mailer.sent.read().unwrap().len(), 1);
}

/// Test: a malformed reply address is rejected before the mailer
#[tokio::test]
async fn test_contact_invalid_email_rejected() {
    let app = TestApp::new();

    let response = app
        .server()
        .post("/contact")
        .form(&[
            ("email", "not-an-email"),
            ("message", "long enough message text"),
        ])
        .await;

    assert_eq!(response.status_code(), 200);
    assert!(response.text().contains("valid email"));
    assert!(app.mailer.sent.read().unwrap().is_empty());
}

/// Test: the form page renders for anonymous visitors
#[tokio::test]
async fn test_contact_page_renders() {
    let app = TestApp::new();

    let response = app.server().get("/contact").await;
    assert_eq!(response.status_code(), 200);
    assert!(response.text().contains("Contact us"));
}
