//! HTTP routes for the app

mod auth;
mod home;
mod jokes;
mod oauth;
mod pages;
mod session;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_cookies::CookieManagerLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::mailer::Mailer;
use crate::newsletter::NewsletterClient;
use crate::state::AppState;
use crate::store::{SessionStore, UserStore};

/// Create the router with all routes
pub fn create_router<U, S, M, N>(state: Arc<AppState<U, S, M, N>>) -> Router
where
    U: UserStore + 'static,
    S: SessionStore + 'static,
    M: Mailer + 'static,
    N: NewsletterClient + 'static,
{
    create_router_with_static_path(state, "public")
}

/// Create the router with a custom static file path
pub fn create_router_with_static_path<U, S, M, N>(
    state: Arc<AppState<U, S, M, N>>,
    static_path: &str,
) -> Router
where
    U: UserStore + 'static,
    S: SessionStore + 'static,
    M: Mailer + 'static,
    N: NewsletterClient + 'static,
{
    Router::new()
        .route("/", get(home::home))
        .route("/random", get(home::random))
        .route("/register", get(auth::register_form).post(auth::register))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/auth/google", get(oauth::google_start))
        .route("/auth/google/jokes", get(oauth::google_callback))
        .route("/auth/facebook", get(oauth::facebook_start))
        .route("/auth/facebook/jokes", get(oauth::facebook_callback))
        .route("/submit", get(jokes::submit_form).post(jokes::submit))
        .route("/edit", get(jokes::edit))
        .route("/update", post(jokes::update))
        .route("/update/{joke_id}", get(jokes::update_form))
        .route("/delete", post(jokes::delete))
        .route("/favourites", post(jokes::favourite))
        .route("/inappropriate", post(jokes::inappropriate))
        .route("/terms", get(pages::terms))
        .route("/contact", get(pages::contact_form).post(pages::contact))
        .route("/signup", post(pages::signup))
        .route("/success", get(pages::success))
        .route("/failure", get(pages::failure))
        // Serve static files (stylesheet)
        .nest_service("/public", ServeDir::new(static_path))
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Checks the rough shape of an email address: a non-empty local part,
/// one @, a dotted domain
pub(crate) fn is_valid_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
