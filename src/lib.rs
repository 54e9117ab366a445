//! Jokeboard
//!
//! A small joke-sharing site: register locally or log in with Google or
//! Facebook, post jokes, edit or delete your own, browse everyone's in
//! one feed, and sign up for the mailing list.

pub mod config;
pub mod crypto;
pub mod error;
pub mod mailer;
pub mod newsletter;
pub mod oauth;
pub mod routes;
pub mod state;
pub mod store;
pub mod views;

pub use config::Config;
pub use error::AppError;
pub use mailer::{ConsoleMailer, Mailer, SmtpConfig, SmtpMailer};
pub use newsletter::{DisabledNewsletter, HttpNewsletterClient, NewsletterClient, NewsletterConfig};
pub use oauth::{OauthProvider, OauthProviders};
pub use routes::{create_router, create_router_with_static_path};
pub use state::AppState;
pub use store::{InMemorySessionStore, InMemoryUserStore, SessionStore, SqliteStore, UserStore};
