//! Storage abstractions for the app

pub mod memory;
pub mod models;
pub mod sqlite;

pub use memory::{InMemorySessionStore, InMemoryUserStore};
pub use models::*;
pub use sqlite::SqliteStore;

use crate::error::AppError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, AppError>;

/// How long a session stays valid
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 14;

/// Trait for user, joke and pending-login storage
pub trait UserStore: Send + Sync {
    /// Create a local account. Fails with `DuplicateEmail` if the address
    /// is already registered.
    fn create_local_user(&self, email: &str, password_hash: &str) -> StoreResult<User>;

    /// Get a user by ID
    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>>;

    /// Get a user by email address
    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Find the account linked to a provider subject, creating it on first
    /// login. Atomic: concurrent first logins resolve to a single account.
    fn find_or_create_federated(&self, provider: Provider, subject: &str) -> StoreResult<User>;

    /// Every user owning at least one joke, in account creation order,
    /// each with their full joke list oldest first
    fn list_feed(&self) -> StoreResult<Vec<FeedEntry>>;

    /// Append a joke to a user's collection
    fn add_joke(&self, user_id: UserId, text: &str) -> StoreResult<Joke>;

    /// List one user's jokes, oldest first
    fn list_jokes(&self, user_id: UserId) -> StoreResult<Vec<Joke>>;

    /// Get a joke, scoped to its owner
    fn get_joke(&self, user_id: UserId, joke_id: &JokeId) -> StoreResult<Option<Joke>>;

    /// Replace a joke's text. Fails with `JokeNotFound` unless the joke
    /// exists and belongs to the given user.
    fn update_joke_text(&self, user_id: UserId, joke_id: &JokeId, text: &str) -> StoreResult<()>;

    /// Delete a joke. An id the user doesn't own is a no-op.
    fn delete_joke(&self, user_id: UserId, joke_id: &JokeId) -> StoreResult<()>;

    /// Flip a joke's liked flag. Unknown ids are ignored.
    fn toggle_liked(&self, joke_id: &JokeId) -> StoreResult<()>;

    /// Flip a joke's flagged flag. Unknown ids are ignored.
    fn toggle_flagged(&self, joke_id: &JokeId) -> StoreResult<()>;

    /// Store a pending OAuth login
    fn create_login_state(&self, state: LoginState) -> StoreResult<()>;

    /// Fetch and delete a pending OAuth login in one step, so each state
    /// token can be redeemed exactly once
    fn take_login_state(&self, token: &str) -> StoreResult<Option<LoginState>>;

    /// Delete pending OAuth logins older than the given age
    fn cleanup_expired_login_states(&self, max_age_minutes: i64) -> StoreResult<u64>;
}

/// Trait for session storage
pub trait SessionStore: Send + Sync {
    /// Create a new session for a user
    fn create(&self, user_id: UserId) -> StoreResult<Session>;

    /// Get a session by ID. Expired sessions read as absent.
    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>>;

    /// Delete a session
    fn delete(&self, session_id: &SessionId) -> StoreResult<()>;
}
