//! Mailing-list signup client

use std::time::Duration;

/// Trait for mailing-list signups
pub trait NewsletterClient: Send + Sync {
    /// Subscribe an address to the mailing list
    fn subscribe(&self, first_name: &str, last_name: &str, email: &str) -> Result<(), String>;
}

/// Allow using Box<dyn NewsletterClient> as a NewsletterClient
impl NewsletterClient for Box<dyn NewsletterClient> {
    fn subscribe(&self, first_name: &str, last_name: &str, email: &str) -> Result<(), String> {
        (**self).subscribe(first_name, last_name, email)
    }
}

/// Configuration for the list provider's HTTP API
#[derive(Debug, Clone)]
pub struct NewsletterConfig {
    /// Members endpoint, e.g. https://us1.api.mailchimp.com/3.0/lists/<id>
    pub api_url: String,
    /// API key, sent as a bearer token
    pub api_key: String,
}

impl NewsletterConfig {
    /// Create config from LIST_API_URL and LIST_API_KEY
    pub fn from_env() -> Option<Self> {
        // Helper to get non-empty env var
        fn get_env(key: &str) -> Option<String> {
            std::env::var(key).ok().filter(|s| !s.is_empty())
        }

        let api_url = get_env("LIST_API_URL")?;
        let api_key = get_env("LIST_API_KEY")?;

        Some(Self { api_url, api_key })
    }
}

/// Client that POSTs new members to the list provider
pub struct HttpNewsletterClient {
    config: NewsletterConfig,
}

impl HttpNewsletterClient {
    pub fn new(config: NewsletterConfig) -> Self {
        Self { config }
    }
}

impl NewsletterClient for HttpNewsletterClient {
    fn subscribe(&self, first_name: &str, last_name: &str, email: &str) -> Result<(), String> {
        // Built per call: a blocking client can't be constructed on the
        // async runtime, and subscribe only runs inside a blocking task
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        let body = serde_json::json!({
            "members": [{
                "email_address": email,
                "status": "subscribed",
                "merge_fields": {
                    "FNAME": first_name,
                    "LNAME": last_name,
                }
            }]
        });

        let response = client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .map_err(|e| format!("List API request failed: {}", e))?;

        // Only a 200 counts as subscribed
        if response.status() != reqwest::StatusCode::OK {
            return Err(format!("List API returned {}", response.status()));
        }

        tracing::info!(email = %email, "Subscribed to mailing list");
        Ok(())
    }
}

/// Stand-in used when no list provider is configured
pub struct DisabledNewsletter;

impl NewsletterClient for DisabledNewsletter {
    fn subscribe(&self, _first_name: &str, _last_name: &str, email: &str) -> Result<(), String> {
        tracing::warn!(email = %email, "Mailing list signup attempted without a configured provider");
        Err("Mailing list is not configured".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_newsletter_rejects() {
        let client = DisabledNewsletter;
        assert!(client.subscribe("Ada", "Lovelace", "ada@example.com").is_err());
    }
}
