//! Application configuration

use tower_cookies::Key;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,

    /// Public base URL, used to build OAuth redirect URLs
    pub base_url: String,

    /// Path to the SQLite database. None runs on the in-memory store.
    pub database_url: Option<String>,

    /// Secret the session cookie signing key is derived from
    pub session_secret: Option<String>,

    /// Google OAuth credentials
    pub google: Option<ProviderCredentials>,

    /// Facebook OAuth credentials
    pub facebook: Option<ProviderCredentials>,
}

/// Client id and secret for one OAuth provider
#[derive(Debug, Clone)]
pub struct ProviderCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// - PORT (default: 3000)
    /// - APP_BASE_URL (default: http://localhost:PORT)
    /// - DATABASE_URL (optional SQLite path; unset runs in memory)
    /// - SESSION_SECRET (optional, at least 32 bytes)
    /// - GOOGLE_CLIENT_ID / GOOGLE_CLIENT_SECRET
    /// - FACEBOOK_APP_ID / FACEBOOK_APP_SECRET
    pub fn from_env() -> Self {
        // Helper to get non-empty env var
        fn get_env(key: &str) -> Option<String> {
            std::env::var(key).ok().filter(|s| !s.is_empty())
        }

        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let base_url =
            get_env("APP_BASE_URL").unwrap_or_else(|| format!("http://localhost:{}", port));

        // Accept plain paths as well as sqlite: URLs
        let database_url = get_env("DATABASE_URL").map(|url| {
            url.trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:")
                .to_string()
        });

        let session_secret = get_env("SESSION_SECRET");

        let google = match (get_env("GOOGLE_CLIENT_ID"), get_env("GOOGLE_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(ProviderCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        let facebook = match (get_env("FACEBOOK_APP_ID"), get_env("FACEBOOK_APP_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(ProviderCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        Self {
            port,
            base_url,
            database_url,
            session_secret,
            google,
            facebook,
        }
    }

    /// Key for signing session cookies. Derived from SESSION_SECRET when
    /// set, generated fresh otherwise (sessions then die with the process).
    pub fn session_key(&self) -> Result<Key, String> {
        match &self.session_secret {
            Some(secret) if secret.len() >= 32 => Ok(Key::derive_from(secret.as_bytes())),
            Some(_) => Err("SESSION_SECRET must be at least 32 bytes".to_string()),
            None => {
                tracing::warn!("SESSION_SECRET not set, generating a transient cookie key");
                Ok(Key::generate())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            database_url: None,
            session_secret: None,
            google: None,
            facebook: None,
        }
    }

    #[test]
    fn test_short_session_secret_rejected() {
        let mut config = base_config();
        config.session_secret = Some("too-short".to_string());
        assert!(config.session_key().is_err());
    }

    #[test]
    fn test_session_key_is_deterministic() {
        let mut config = base_config();
        config.session_secret = Some("0123456789abcdef0123456789abcdef".to_string());
        let first = config.session_key().unwrap();
        let second = config.session_key().unwrap();
        assert_eq!(first.master(), second.master());
    }

    #[test]
    fn test_missing_secret_generates_key() {
        let config = base_config();
        assert!(config.session_key().is_ok());
    }
}
