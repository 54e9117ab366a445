//! Session cookie helpers
//!
//! The session id travels in a signed cookie. Signing keeps the id
//! tamper-proof; the session itself lives server-side and expiry is
//! enforced by the store on read.

use tower_cookies::{Cookie, Cookies, Key};

use crate::error::AppError;
use crate::store::{Session, SessionId, SessionStore, User, UserId, UserStore};

const SESSION_COOKIE: &str = "jokeboard_session";

/// Helper to get the current session from the signed cookie
pub fn session_from_cookies<S: SessionStore>(
    cookies: &Cookies,
    key: &Key,
    session_store: &S,
) -> Option<Session> {
    cookies.signed(key).get(SESSION_COOKIE).and_then(|c| {
        let session_id = SessionId(c.value().to_string());
        session_store.get(&session_id).ok().flatten()
    })
}

/// Resolve the logged-in user, if any
pub fn current_user<U: UserStore, S: SessionStore>(
    cookies: &Cookies,
    key: &Key,
    user_store: &U,
    session_store: &S,
) -> Option<User> {
    let session = session_from_cookies(cookies, key, session_store)?;
    user_store.get_user(session.user_id).ok().flatten()
}

/// Like [`current_user`], but an anonymous visitor becomes `AuthRequired`
/// and lands back on the login page
pub fn require_user<U: UserStore, S: SessionStore>(
    cookies: &Cookies,
    key: &Key,
    user_store: &U,
    session_store: &S,
) -> Result<User, AppError> {
    current_user(cookies, key, user_store, session_store).ok_or(AppError::AuthRequired)
}

/// Create a session for the user and hand its id to the browser
pub fn start_session<S: SessionStore>(
    cookies: &Cookies,
    key: &Key,
    session_store: &S,
    user_id: UserId,
) -> Result<(), AppError> {
    let session = session_store.create(user_id)?;
    set_session_cookie(cookies, key, &session.id.0);
    Ok(())
}

/// Helper to set the signed session cookie
pub fn set_session_cookie(cookies: &Cookies, key: &Key, session_id: &str) {
    let cookie = Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .build();
    cookies.signed(key).add(cookie);
}

/// Helper to clear the session cookie
pub fn clear_session_cookie(cookies: &Cookies) {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .max_age(tower_cookies::cookie::time::Duration::ZERO)
        .build();
    cookies.add(cookie);
}
