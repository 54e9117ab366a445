//! Data models for joke storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Federated login provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Google,
    Facebook,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Facebook => "facebook",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "google" => Some(Provider::Google),
            "facebook" => Some(Provider::Facebook),
            _ => None,
        }
    }
}

/// Unique user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

/// Unique joke identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JokeId(pub String);

/// Unique session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// A user account
///
/// Local accounts have an email and a password hash. Federated accounts
/// carry the provider's subject id instead and may have no email at all,
/// since only the basic profile scope is requested.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub facebook_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name shown next to the user's jokes. Never the full email address.
    pub fn display_name(&self) -> String {
        if let Some(email) = &self.email {
            email.split('@').next().unwrap_or(email.as_str()).to_string()
        } else if self.google_id.is_some() {
            "a Google user".to_string()
        } else if self.facebook_id.is_some() {
            "a Facebook user".to_string()
        } else {
            "anonymous".to_string()
        }
    }
}

/// A joke, always owned by exactly one user
#[derive(Debug, Clone)]
pub struct Joke {
    pub id: JokeId,
    pub text: String,
    pub liked: bool,
    pub flagged: bool,
    pub created_at: DateTime<Utc>,
}

/// One user's slice of the feed: the user plus every joke they posted,
/// oldest first
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub user: User,
    pub jokes: Vec<Joke>,
}

/// A logged-in session
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// A pending OAuth login: the CSRF state token handed to the provider
/// together with the PKCE verifier needed back at the callback
#[derive(Debug, Clone)]
pub struct LoginState {
    pub token: String,
    pub pkce_verifier: String,
    pub provider: Provider,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_uses_local_part() {
        let user = User {
            id: UserId(1),
            email: Some("alice@example.com".to_string()),
            password_hash: Some("hash".to_string()),
            google_id: None,
            facebook_id: None,
            created_at: Utc::now(),
        };
        assert_eq!(user.display_name(), "alice");
    }

    #[test]
    fn test_display_name_for_federated_user() {
        let user = User {
            id: UserId(2),
            email: None,
            password_hash: None,
            google_id: Some("sub-123".to_string()),
            facebook_id: None,
            created_at: Utc::now(),
        };
        assert_eq!(user.display_name(), "a Google user");
    }
}
