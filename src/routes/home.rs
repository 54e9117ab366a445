//! Feed pages

use std::sync::Arc;

use axum::extract::State;
use maud::Markup;
use tower_cookies::Cookies;

use crate::error::AppError;
use crate::mailer::Mailer;
use crate::newsletter::NewsletterClient;
use crate::state::AppState;
use crate::store::{SessionStore, UserStore};
use crate::views;

/// GET /
pub async fn home<U, S, M, N>(
    State(state): State<Arc<AppState<U, S, M, N>>>,
    cookies: Cookies,
) -> Result<Markup, AppError>
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

    let feed = state.user_store.list_feed()?;

    Ok(views::home_page(user.as_ref(), &feed))
}

/// GET /random
///
/// Ships the whole feed and lets the browser pick, so "show another"
/// costs no request.
pub async fn random<U, S, M, N>(
    State(state): State<Arc<AppState<U, S, M, N>>>,
    cookies: Cookies,
) -> Result<Markup, AppError>
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

    let feed = state.user_store.list_feed()?;

    Ok(views::random_page(user.as_ref(), &feed))
}
