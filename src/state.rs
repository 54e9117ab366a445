//! Shared application state

use tower_cookies::Key;

use crate::mailer::Mailer;
use crate::newsletter::NewsletterClient;
use crate::oauth::OauthProviders;
use crate::store::{SessionStore, UserStore};

/// Application state shared across handlers
pub struct AppState<U, S, M, N> {
    /// User, joke and pending-login storage
    pub user_store: U,
    /// Session storage
    pub session_store: S,
    /// Contact-form mail delivery
    pub mailer: M,
    /// Mailing-list signups
    pub newsletter: N,
    /// Configured federated login providers
    pub oauth: OauthProviders,
    /// Key for signing session cookies
    pub cookie_key: Key,
}

impl<U, S, M, N> AppState<U, S, M, N>
where
    U: UserStore,
    S: SessionStore,
    M: Mailer,
    N: NewsletterClient,
{
    pub fn new(
        user_store: U,
        session_store: S,
        mailer: M,
        newsletter: N,
        oauth: OauthProviders,
        cookie_key: Key,
    ) -> Self {
        Self {
            user_store,
            session_store,
            mailer,
            newsletter,
            oauth,
            cookie_key,
        }
    }
}
