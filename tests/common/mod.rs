//! Common test utilities for jokeboard integration tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::sync::RwLock;

use axum_test::{TestServer, TestServerConfig};
use jokeboard::{
    routes, AppState, InMemorySessionStore, InMemoryUserStore, Mailer, NewsletterClient,
    OauthProviders,
};
use tower_cookies::Key;

/// Mock contact mailer that captures messages
#[derive(Default, Clone)]
pub struct MockMailer {
    /// Captured (reply_to, message) pairs
    pub sent: Arc<RwLock<Vec<(String, String)>>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Mailer for MockMailer {
    fn send_contact(&self, reply_to: &str, message: &str) -> Result<(), String> {
        self.sent
            .write()
            .unwrap()
            .push((reply_to.to_string(), message.to_string()));
        Ok(())
    }
}

/// Mock mailing-list client that captures signups and can be told to fail
#[derive(Default, Clone)]
pub struct MockNewsletter {
    /// Captured (first_name, last_name, email) triples
    pub subscribed: Arc<RwLock<Vec<(String, String, String)>>>,
    /// When set, every subscribe call fails
    pub fail: Arc<AtomicBool>,
}

impl MockNewsletter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NewsletterClient for MockNewsletter {
    fn subscribe(&self, first_name: &str, last_name: &str, email: &str) -> Result<(), String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err("list API returned 503".to_string());
        }
        self.subscribed.write().unwrap().push((
            first_name.to_string(),
            last_name.to_string(),
            email.to_string(),
        ));
        Ok(())
    }
}

/// Shared app state plus the mocks behind it. Call [`TestApp::server`]
/// once per simulated browser; the servers share the state but each
/// keeps its own cookie jar.
pub struct TestApp {
    pub state: Arc<AppState<InMemoryUserStore, InMemorySessionStore, MockMailer, MockNewsletter>>,
    pub mailer: MockMailer,
    pub newsletter: MockNewsletter,
}

impl TestApp {
    pub fn new() -> Self {
        let mailer = MockMailer::new();
        let newsletter = MockNewsletter::new();

        let state = Arc::new(AppState::new(
            InMemoryUserStore::new(),
            InMemorySessionStore::new(),
            mailer.clone(),
            newsletter.clone(),
            OauthProviders::none(),
            Key::generate(),
        ));

        Self {
            state,
            mailer,
            newsletter,
        }
    }

    /// Create a test server that remembers its cookies
    pub fn server(&self) -> TestServer {
        let config = TestServerConfig {
            save_cookies: true,
            ..Default::default()
        };
        TestServer::new_with_config(routes::create_router(self.state.clone()), config)
            .expect("Failed to create test server")
    }
}

/// Helper to register a local account; the server's cookie jar ends up
/// logged in as that user
pub async fn register_user(server: &TestServer, email: &str, password: &str) {
    let response = server
        .post("/register")
        .form(&[
            ("email", email),
            ("password", password),
            ("confirm", password),
        ])
        .await;
    assert_eq!(response.status_code(), 303);
}

/// Helper to log in through the login form
pub async fn login_user(server: &TestServer, email: &str, password: &str) {
    let response = server
        .post("/login")
        .form(&[("email", email), ("password", password)])
        .await;
    assert_eq!(response.status_code(), 303);
}
