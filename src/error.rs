//! Application error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use thiserror::Error;

use crate::views;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Login required")]
    AuthRequired,

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Joke not found")]
    JokeNotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::AuthRequired => {
                Redirect::to("/login?error=login-required").into_response()
            }
            AppError::DuplicateEmail => (
                StatusCode::CONFLICT,
                views::register_page(Some("That email address is already registered.")),
            )
                .into_response(),
            AppError::JokeNotFound => {
                (StatusCode::NOT_FOUND, views::not_found_page()).into_response()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, views::error_page()).into_response()
            }
        }
    }
}
