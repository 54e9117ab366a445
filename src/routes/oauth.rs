//! Federated login endpoints
//!
//! Each flow starts by stashing a pending login (CSRF state token plus
//! PKCE verifier) and redirecting to the provider. The callback redeems
//! the state token exactly once, trades the code for an access token,
//! reads the subject id from the profile and finds or creates the
//! matching account. Anything that goes wrong lands back on the login
//! page.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Redirect;
use chrono::Utc;
use serde::Deserialize;
use tower_cookies::Cookies;

use crate::error::AppError;
use crate::mailer::Mailer;
use crate::newsletter::NewsletterClient;
use crate::state::AppState;
use crate::store::{Provider, SessionStore, UserStore};

/// How long a pending login stays redeemable
const LOGIN_STATE_TTL_MINUTES: i64 = 10;

fn login_failed() -> Redirect {
    Redirect::to("/login?error=oauth")
}

fn start<U, S, M, N>(
    state: &AppState<U, S, M, N>,
    provider: Provider,
) -> Result<Redirect, AppError>
where
    U: UserStore,
    S: SessionStore,
    M: Mailer,
    N: NewsletterClient,
{
    let Some(oauth) = state.oauth.get(provider) else {
        tracing::warn!("{} login requested but not configured", provider.as_str());
        return Ok(login_failed());
    };

    // Sweep pending logins that were never completed
    let _ = state
        .user_store
        .cleanup_expired_login_states(LOGIN_STATE_TTL_MINUTES);

    let (auth_url, login_state) = oauth.authorize();
    state.user_store.create_login_state(login_state)?;

    Ok(Redirect::to(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

async fn callback<U, S, M, N>(
    state: &AppState<U, S, M, N>,
    cookies: &Cookies,
    query: CallbackQuery,
    provider: Provider,
) -> Result<Redirect, AppError>
where
    U: UserStore,
    S: SessionStore,
    M: Mailer,
    N: NewsletterClient,
{
    // The provider reports denial and other failures in the query string
    if let Some(error) = &query.error {
        tracing::info!("{} login refused: {}", provider.as_str(), error);
        return Ok(login_failed());
    }

    let (Some(code), Some(token)) = (&query.code, &query.state) else {
        return Ok(login_failed());
    };

    // Redeem the state token; a second redemption gets None
    let Some(login_state) = state.user_store.take_login_state(token)? else {
        tracing::warn!("{} callback with unknown or reused state", provider.as_str());
        return Ok(login_failed());
    };

    if login_state.provider != provider {
        tracing::warn!("{} callback redeemed another provider's state", provider.as_str());
        return Ok(login_failed());
    }

    let age = Utc::now() - login_state.created_at;
    if age.num_minutes() >= LOGIN_STATE_TTL_MINUTES {
        tracing::info!("{} callback for an expired login", provider.as_str());
        return Ok(login_failed());
    }

    let Some(oauth) = state.oauth.get(provider) else {
        tracing::warn!("{} callback but provider not configured", provider.as_str());
        return Ok(login_failed());
    };

    let access_token = match oauth.exchange_code(code, login_state.pkce_verifier).await {
        Ok(access_token) => access_token,
        Err(e) => {
            tracing::warn!("{} code exchange failed: {}", provider.as_str(), e);
            return Ok(login_failed());
        }
    };

    let subject = match oauth.fetch_subject(&access_token).await {
        Ok(subject) => subject,
        Err(e) => {
            tracing::warn!("{} profile fetch failed: {}", provider.as_str(), e);
            return Ok(login_failed());
        }
    };

    // First login creates the account, later logins find it
    let user = state.user_store.find_or_create_federated(provider, &subject)?;

    super::session::start_session(cookies, &state.cookie_key, &state.session_store, user.id)?;

    Ok(Redirect::to("/submit"))
}

/// GET /auth/google
pub async fn google_start<U, S, M, N>(
    State(state): State<Arc<AppState<U, S, M, N>>>,
) -> Result<Redirect, AppError>
where
    U: UserStore,
    S: SessionStore,
    M: Mailer,
    N: NewsletterClient,
{
    start(&state, Provider::Google)
}

/// GET /auth/google/jokes
pub async fn google_callback<U, S, M, N>(
    State(state): State<Arc<AppState<U, S, M, N>>>,
    cookies: Cookies,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, AppError>
where
    U: UserStore,
    S: SessionStore,
    M: Mailer,
    N: NewsletterClient,
{
    callback(&state, &cookies, query, Provider::Google).await
}

/// GET /auth/facebook
pub async fn facebook_start<U, S, M, N>(
    State(state): State<Arc<AppState<U, S, M, N>>>,
) -> Result<Redirect, AppError>
where
    U: UserStore,
    S: SessionStore,
    M: Mailer,
    N: NewsletterClient,
{
    start(&state, Provider::Facebook)
}

/// GET /auth/facebook/jokes
pub async fn facebook_callback<U, S, M, N>(
    State(state): State<Arc<AppState<U, S, M, N>>>,
    cookies: Cookies,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, AppError>
where
    U: UserStore,
    S: SessionStore,
    M: Mailer,
    N: NewsletterClient,
{
    callback(&state, &cookies, query, Provider::Facebook).await
}
