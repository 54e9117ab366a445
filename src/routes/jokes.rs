//! Joke submission and management endpoints
//!
//! Edit and delete are always scoped by the acting user's id as well as
//! the joke id, so a forged form value can never touch another user's
//! jokes. The like and flag toggles are open to any logged-in user.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use maud::Markup;
use serde::Deserialize;
use tower_cookies::Cookies;

use crate::error::AppError;
use crate::mailer::Mailer;
use crate::newsletter::NewsletterClient;
use crate::state::AppState;
use crate::store::{JokeId, SessionStore, UserStore};
use crate::views;

/// GET /submit
pub async fn submit_form<U, S, M, N>(
    State(state): State<Arc<AppState<U, S, M, N>>>,
    cookies: Cookies,
) -> Result<Markup, AppError>
where
    U: UserStore,
    S: SessionStore,
    M: Mailer,
    N: NewsletterClient,
{
    let user = super::session::require_user(
        &cookies,
        &state.cookie_key,
        &state.user_store,
        &state.session_store,
    )?;

    Ok(views::submit_page(&user, None))
}

#[derive(Deserialize)]
pub struct SubmitForm {
    pub joke: String,
}

/// POST /submit
pub async fn submit<U, S, M, N>(
    State(state): State<Arc<AppState<U, S, M, N>>>,
    cookies: Cookies,
    axum::Form(form): axum::Form<SubmitForm>,
) -> Result<Response, AppError>
where
    U: UserStore,
    S: SessionStore,
    M: Mailer,
    N: NewsletterClient,
{
    let user = super::session::require_user(
        &cookies,
        &state.cookie_key,
        &state.user_store,
        &state.session_store,
    )?;

    let text = form.joke.trim();
    if text.is_empty() {
        return Ok(views::submit_page(&user, Some("A joke needs some text.")).into_response());
    }

    state.user_store.add_joke(user.id, text)?;

    Ok(Redirect::to("/").into_response())
}

/// GET /edit
pub async fn edit<U, S, M, N>(
    State(state): State<Arc<AppState<U, S, M, N>>>,
    cookies: Cookies,
) -> Result<Markup, AppError>
where
    U: UserStore,
    S: SessionStore,
    M: Mailer,
    N: NewsletterClient,
{
    let user = super::session::require_user(
        &cookies,
        &state.cookie_key,
        &state.user_store,
        &state.session_store,
    )?;

    let jokes = state.user_store.list_jokes(user.id)?;

    Ok(views::edit_page(&user, &jokes))
}

/// GET /update/{joke_id}
pub async fn update_form<U, S, M, N>(
    State(state): State<Arc<AppState<U, S, M, N>>>,
    cookies: Cookies,
    Path(joke_id): Path<String>,
) -> Result<Markup, AppError>
where
    U: UserStore,
    S: SessionStore,
    M: Mailer,
    N: NewsletterClient,
{
    let user = super::session::require_user(
        &cookies,
        &state.cookie_key,
        &state.user_store,
        &state.session_store,
    )?;

    // Owner-scoped lookup: someone else's joke id reads as missing
    let joke = state
        .user_store
        .get_joke(user.id, &JokeId(joke_id))?
        .ok_or(AppError::JokeNotFound)?;

    Ok(views::update_page(&user, &joke))
}

#[derive(Deserialize)]
pub struct UpdateForm {
    /// The joke id, named after the edit button that posts it
    pub update: String,
    /// Present when the edit form is saved, absent when the jokes list
    /// only asks for the form
    pub text: Option<String>,
}

/// POST /update
pub async fn update<U, S, M, N>(
    State(state): State<Arc<AppState<U, S, M, N>>>,
    cookies: Cookies,
    axum::Form(form): axum::Form<UpdateForm>,
) -> Result<Response, AppError>
where
    U: UserStore,
    S: SessionStore,
    M: Mailer,
    N: NewsletterClient,
{
    let user = super::session::require_user(
        &cookies,
        &state.cookie_key,
        &state.user_store,
        &state.session_store,
    )?;

    let Some(text) = &form.text else {
        // No text yet: the jokes list wants the edit form
        return Ok(Redirect::to(&format!("/update/{}", form.update)).into_response());
    };

    let text = text.trim();
    if text.is_empty() {
        return Ok(Redirect::to(&format!("/update/{}", form.update)).into_response());
    }

    // Fails with JokeNotFound unless this user owns the joke
    state
        .user_store
        .update_joke_text(user.id, &JokeId(form.update.clone()), text)?;

    Ok(Redirect::to("/edit").into_response())
}

#[derive(Deserialize)]
pub struct DeleteForm {
    pub delete: String,
}

/// POST /delete
pub async fn delete<U, S, M, N>(
    State(state): State<Arc<AppState<U, S, M, N>>>,
    cookies: Cookies,
    axum::Form(form): axum::Form<DeleteForm>,
) -> Result<Redirect, AppError>
where
    U: UserStore,
    S: SessionStore,
    M: Mailer,
    N: NewsletterClient,
{
    let user = super::session::require_user(
        &cookies,
        &state.cookie_key,
        &state.user_store,
        &state.session_store,
    )?;

    // Deleting an id this user doesn't own is a quiet no-op
    state.user_store.delete_joke(user.id, &JokeId(form.delete))?;

    Ok(Redirect::to("/edit"))
}

#[derive(Deserialize)]
pub struct FavouriteForm {
    pub favourite: String,
}

/// POST /favourites
pub async fn favourite<U, S, M, N>(
    State(state): State<Arc<AppState<U, S, M, N>>>,
    cookies: Cookies,
    axum::Form(form): axum::Form<FavouriteForm>,
) -> Result<Redirect, AppError>
where
    U: UserStore,
    S: SessionStore,
    M: Mailer,
    N: NewsletterClient,
{
    super::session::require_user(
        &cookies,
        &state.cookie_key,
        &state.user_store,
        &state.session_store,
    )?;

    state.user_store.toggle_liked(&JokeId(form.favourite))?;

    Ok(Redirect::to("/"))
}

#[derive(Deserialize)]
pub struct InappropriateForm {
    pub inappropriate: String,
}

/// POST /inappropriate
pub async fn inappropriate<U, S, M, N>(
    State(state): State<Arc<AppState<U, S, M, N>>>,
    cookies: Cookies,
    axum::Form(form): axum::Form<InappropriateForm>,
) -> Result<Redirect, AppError>
where
    U: UserStore,
    S: SessionStore,
    M: Mailer,
    N: NewsletterClient,
{
    super::session::require_user(
        &cookies,
        &state.cookie_key,
        &state.user_store,
        &state.session_store,
    )?;

    state.user_store.toggle_flagged(&JokeId(form.inappropriate))?;

    Ok(Redirect::to("/"))
}
