//! Tests for the aggregated feed and random page

mod common;

use common::{register_user, TestApp};

/// Test: an empty feed invites the first post
#[tokio::test]
async fn test_empty_feed() {
    let app = TestApp::new();

    let response = app.server().get("/").await;
    assert_eq!(response.status_code(), 200);
    assert!(response.text().contains("No jokes yet."));
}

/// Test: jokes are grouped per author and kept in posting order
#[tokio::test]
async fn test_feed_groups_and_orders() {
    let app = TestApp::new();

    let alice = app.server();
    register_user(&alice, "alice@example.com", "secret1").await;
    alice.post("/submit").form(&[("joke", "alpha one")]).await;
    alice.post("/submit").form(&[("joke", "alpha two")]).await;

    let bob = app.server();
    register_user(&bob, "bob@example.com", "secret2").await;
    bob.post("/submit").form(&[("joke", "beta one")]).await;

    let body = app.server().get("/").await.text();

    let alice_heading = body.find("Jokes by alice").expect("alice missing");
    let bob_heading = body.find("Jokes by bob").expect("bob missing");
    let first = body.find("alpha one").expect("first joke missing");
    let second = body.find("alpha two").expect("second joke missing");

    // Alice registered first, so her section comes first
    assert!(alice_heading < bob_heading);
    // Within a section, oldest joke first
    assert!(first < second);
}

/// Test: users without jokes stay off the feed
#[tokio::test]
async fn test_feed_skips_jokeless_users() {
    let app = TestApp::new();

    let alice = app.server();
    register_user(&alice, "alice@example.com", "secret1").await;
    alice.post("/submit").form(&[("joke", "the only joke")]).await;

    let bob = app.server();
    register_user(&bob, "bob@example.com", "secret2").await;

    let body = app.server().get("/").await.text();
    assert!(body.contains("Jokes by alice"));
    assert!(!body.contains("Jokes by bob"));
}

/// Test: only the email's local part is shown, never the full address
#[tokio::test]
async fn test_feed_hides_full_email() {
    let app = TestApp::new();

    let alice = app.server();
    register_user(&alice, "alice@example.com", "secret1").await;
    alice.post("/submit").form(&[("joke", "hello")]).await;

    let body = app.server().get("/").await.text();
    assert!(body.contains("Jokes by alice"));
    assert!(!body.contains("alice@example.com"));
}

/// Test: the random page embeds every joke for the client-side pick
#[tokio::test]
async fn test_random_page_has_all_jokes() {
    let app = TestApp::new();

    let alice = app.server();
    register_user(&alice, "alice@example.com", "secret1").await;
    alice.post("/submit").form(&[("joke", "first joke")]).await;
    alice.post("/submit").form(&[("joke", "second joke")]).await;

    let response = app.server().get("/random").await;
    assert_eq!(response.status_code(), 200);

    let body = response.text();
    assert!(body.contains("joke-pool"));
    assert!(body.contains("first joke"));
    assert!(body.contains("second joke"));
}

/// Test: the feed is readable without logging in, but has no action
/// buttons then
#[tokio::test]
async fn test_anonymous_feed_is_read_only() {
    let app = TestApp::new();

    let alice = app.server();
    register_user(&alice, "alice@example.com", "secret1").await;
    alice.post("/submit").form(&[("joke", "public joke")]).await;

    let body = app.server().get("/").await.text();
    assert!(body.contains("public joke"));
    assert!(!body.contains("/favourites"));
    assert!(!body.contains("/delete"));
}
