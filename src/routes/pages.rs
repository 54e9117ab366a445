//! Terms, contact form and mailing-list signup

use std::sync::Arc;

use axum::extract::State;
use axum::response::Redirect;
use maud::Markup;
use serde::Deserialize;
use tower_cookies::Cookies;

use crate::error::AppError;
use crate::mailer::Mailer;
use crate::newsletter::NewsletterClient;
use crate::state::AppState;
use crate::store::{SessionStore, UserStore};
use crate::views;

/// Minimum contact message length
const MIN_MESSAGE_LENGTH: usize = 10;

/// GET /terms
pub async fn terms<U, S, M, N>(
    State(state): State<Arc<AppState<U, S, M, N>>>,
    cookies: Cookies,
) -> Markup
where
    U: UserStore,
    S: SessionStore,
    M: Mailer,
    N: NewsletterClient,
{
    let user = super::session::current_user(
        &cookies,
        &state.cookie_key,
        &state.user_store,
        &state.session_store,
    );
    views::terms_page(user.as_ref())
}

/// GET /contact
pub async fn contact_form<U, S, M, N>(
    State(state): State<Arc<AppState<U, S, M, N>>>,
    cookies: Cookies,
) -> Markup
where
    U: UserStore,
    S: SessionStore,
    M: Mailer,
    N: NewsletterClient,
{
    let user = super::session::current_user(
        &cookies,
        &state.cookie_key,
        &state.user_store,
        &state.session_store,
    );
    views::contact_page(user.as_ref(), false, None)
}

#[derive(Deserialize)]
pub struct ContactForm {
    pub email: String,
    pub message: String,
}

/// POST /contact
pub async fn contact<U, S, M, N>(
    State(state): State<Arc<AppState<U, S, M, N>>>,
    cookies: Cookies,
    axum::Form(form): axum::Form<ContactForm>,
) -> Markup
where
    U: UserStore,
    S: SessionStore,
    M: Mailer,
    N: NewsletterClient,
{
    let user = super::session::current_user(
        &cookies,
        &state.cookie_key,
        &state.user_store,
        &state.session_store,
    );
    let user = user.as_ref();

    let email = form.email.trim();
    let message = form.message.trim();

    if !super::is_valid_email(email) {
        return views::contact_page(user, false, Some("Enter a valid email address."));
    }
    if message.len() < MIN_MESSAGE_LENGTH {
        return views::contact_page(
            user,
            false,
            Some("Your message must be at least 10 characters long."),
        );
    }

    match state.mailer.send_contact(email, message) {
        Ok(()) => views::contact_page(user, true, None),
        Err(e) => {
            tracing::error!("Contact mail failed: {}", e);
            views::contact_page(
                user,
                false,
                Some("Sorry, we couldn't send your message. Please try again later."),
            )
        }
    }
}

#[derive(Deserialize)]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// POST /signup
pub async fn signup<U, S, M, N>(
    State(state): State<Arc<AppState<U, S, M, N>>>,
    axum::Form(form): axum::Form<SignupForm>,
) -> Result<Redirect, AppError>
where
    U: UserStore + 'static,
    S: SessionStore + 'static,
    M: Mailer + 'static,
    N: NewsletterClient + 'static,
{
    let first_name = form.first_name.trim().to_string();
    let last_name = form.last_name.trim().to_string();
    let email = form.email.trim().to_string();

    if first_name.is_empty() || last_name.is_empty() || !super::is_valid_email(&email) {
        return Ok(Redirect::to("/failure"));
    }

    // Run in a blocking task since the list API client is reqwest::blocking
    let result = tokio::task::spawn_blocking(move || {
        state.newsletter.subscribe(&first_name, &last_name, &email)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?;

    match result {
        Ok(()) => Ok(Redirect::to("/success")),
        Err(e) => {
            tracing::warn!("Mailing list signup failed: {}", e);
            Ok(Redirect::to("/failure"))
        }
    }
}

/// GET /success
pub async fn success<U, S, M, N>(
    State(state): State<Arc<AppState<U, S, M, N>>>,
    cookies: Cookies,
) -> Markup
where
    U: UserStore,
    S: SessionStore,
    M: Mailer,
    N: NewsletterClient,
{
    let user = super::session::current_user(
        &cookies,
        &state.cookie_key,
        &state.user_store,
        &state.session_store,
    );
    views::success_page(user.as_ref())
}

/// GET /failure
pub async fn failure<U, S, M, N>(
    State(state): State<Arc<AppState<U, S, M, N>>>,
    cookies: Cookies,
) -> Markup
where
    U: UserStore,
    S: SessionStore,
    M: Mailer,
    N: NewsletterClient,
{
    let user = super::session::current_user(
        &cookies,
        &state.cookie_key,
        &state.user_store,
        &state.session_store,
    );
    views::failure_page(user.as_ref())
}
