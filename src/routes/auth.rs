//! Local account registration and login

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use maud::Markup;
use serde::Deserialize;
use tower_cookies::Cookies;

use crate::crypto::{hash_password, verify_password};
use crate::error::AppError;
use crate::mailer::Mailer;
use crate::newsletter::NewsletterClient;
use crate::state::AppState;
use crate::store::{SessionStore, UserStore};
use crate::views;

/// Minimum password length
const MIN_PASSWORD_LENGTH: usize = 6;
/// Maximum password length (bcrypt ignores everything past 72 bytes)
const MAX_PASSWORD_LENGTH: usize = 72;

/// Shown for unknown email and wrong password alike, so the form never
/// reveals which addresses have an account
const BAD_CREDENTIALS: &str = "Incorrect email or password.";

#[derive(Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

/// GET /login
pub async fn login_form(Query(query): Query<LoginQuery>) -> Markup {
    let message = match query.error.as_deref() {
        Some("login-required") => Some("Please log in first."),
        Some("oauth") => Some("External login failed. Please try again."),
        _ => None,
    };
    views::login_page(message)
}

/// GET /register
pub async fn register_form() -> Markup {
    views::register_page(None)
}

#[derive(Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub confirm: String,
}

/// POST /register
pub async fn register<U, S, M, N>(
    State(state): State<Arc<AppState<U, S, M, N>>>,
    cookies: Cookies,
    axum::Form(form): axum::Form<RegisterForm>,
) -> Result<Response, AppError>
where
    U: UserStore,
    S: SessionStore,
    M: Mailer,
    N: NewsletterClient,
{
    let email = form.email.trim();

    // Validate before touching the store
    if !super::is_valid_email(email) {
        return Ok(views::register_page(Some("Enter a valid email address.")).into_response());
    }
    if form.password.len() < MIN_PASSWORD_LENGTH {
        return Ok(
            views::register_page(Some("Password must be at least 6 characters long."))
                .into_response(),
        );
    }
    if form.password.len() > MAX_PASSWORD_LENGTH {
        return Ok(views::register_page(Some("Password is too long.")).into_response());
    }
    if form.password != form.confirm {
        return Ok(views::register_page(Some("Passwords do not match.")).into_response());
    }

    // Hash password
    let password_hash =
        hash_password(&form.password).map_err(|e| AppError::Internal(e.to_string()))?;

    // Create user; a duplicate email surfaces here as DuplicateEmail
    let user = state.user_store.create_local_user(email, &password_hash)?;

    // Log the new user straight in
    super::session::start_session(&cookies, &state.cookie_key, &state.session_store, user.id)?;

    Ok(Redirect::to("/").into_response())
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// POST /login
pub async fn login<U, S, M, N>(
    State(state): State<Arc<AppState<U, S, M, N>>>,
    cookies: Cookies,
    axum::Form(form): axum::Form<LoginForm>,
) -> Result<Response, AppError>
where
    U: UserStore,
    S: SessionStore,
    M: Mailer,
    N: NewsletterClient,
{
    let email = form.email.trim();

    if !super::is_valid_email(email) {
        return Ok(views::login_page(Some("Enter a valid email address.")).into_response());
    }

    // Find user by email
    let user = match state.user_store.get_user_by_email(email)? {
        Some(user) => user,
        None => return Ok(views::login_page(Some(BAD_CREDENTIALS)).into_response()),
    };

    // Federated accounts have no password to check
    let Some(password_hash) = &user.password_hash else {
        return Ok(views::login_page(Some(BAD_CREDENTIALS)).into_response());
    };

    // Verify password
    let valid = verify_password(&form.password, password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if !valid {
        return Ok(views::login_page(Some(BAD_CREDENTIALS)).into_response());
    }

    // Create session
    super::session::start_session(&cookies, &state.cookie_key, &state.session_store, user.id)?;

    Ok(Redirect::to("/").into_response())
}

/// GET /logout
pub async fn logout<U, S, M, N>(
    State(state): State<Arc<AppState<U, S, M, N>>>,
    cookies: Cookies,
) -> Redirect
where
    U: UserStore,
    S: SessionStore,
    M: Mailer,
    N: NewsletterClient,
{
    // Get and delete session
    if let Some(session) =
        super::session::session_from_cookies(&cookies, &state.cookie_key, &state.session_store)
    {
        let _ = state.session_store.delete(&session.id);
    }

    super::session::clear_session_cookie(&cookies);

    Redirect::to("/")
}
