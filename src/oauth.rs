//! Federated login via OAuth 2.0 with PKCE
//!
//! Each provider carries its own endpoints, so tests can point a provider
//! at a local stand-in instead of Google or Facebook.

use chrono::Utc;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;

use crate::config::Config;
use crate::store::{LoginState, Provider};

/// Google userinfo payload. Only the subject id is needed, since just the
/// profile scope is requested.
#[derive(Debug, Deserialize)]
struct GoogleProfile {
    sub: String,
}

/// Facebook Graph API /me payload
#[derive(Debug, Deserialize)]
struct FacebookProfile {
    id: String,
}

/// OAuth client type with auth URL and token URL set.
type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// One configured login provider
pub struct OauthProvider {
    provider: Provider,
    client_id: ClientId,
    client_secret: ClientSecret,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    redirect_url: RedirectUrl,
    userinfo_url: String,
    scopes: Vec<String>,
}

impl OauthProvider {
    /// Create a provider with explicit endpoints
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provider: Provider,
        client_id: &str,
        client_secret: &str,
        auth_url: &str,
        token_url: &str,
        userinfo_url: &str,
        redirect_url: &str,
        scopes: &[&str],
    ) -> Result<Self, String> {
        Ok(Self {
            provider,
            client_id: ClientId::new(client_id.to_string()),
            client_secret: ClientSecret::new(client_secret.to_string()),
            auth_url: AuthUrl::new(auth_url.to_string()).map_err(|e| e.to_string())?,
            token_url: TokenUrl::new(token_url.to_string()).map_err(|e| e.to_string())?,
            redirect_url: RedirectUrl::new(redirect_url.to_string()).map_err(|e| e.to_string())?,
            userinfo_url: userinfo_url.to_string(),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Google with its production endpoints. Only the profile scope is
    /// requested, so no email address comes back.
    pub fn google(client_id: &str, client_secret: &str, base_url: &str) -> Result<Self, String> {
        Self::new(
            Provider::Google,
            client_id,
            client_secret,
            "https://accounts.google.com/o/oauth2/v2/auth",
            "https://oauth2.googleapis.com/token",
            "https://www.googleapis.com/oauth2/v3/userinfo",
            &format!("{}/auth/google/jokes", base_url.trim_end_matches('/')),
            &["profile"],
        )
    }

    /// Facebook with its production endpoints
    pub fn facebook(client_id: &str, client_secret: &str, base_url: &str) -> Result<Self, String> {
        Self::new(
            Provider::Facebook,
            client_id,
            client_secret,
            "https://www.facebook.com/v19.0/dialog/oauth",
            "https://graph.facebook.com/v19.0/oauth/access_token",
            "https://graph.facebook.com/v19.0/me",
            &format!("{}/auth/facebook/jokes", base_url.trim_end_matches('/')),
            &["public_profile"],
        )
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    fn create_client(&self) -> ConfiguredClient {
        BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone())
    }

    /// Build the authorization redirect with a fresh CSRF state and PKCE
    /// challenge. The returned login state must be persisted before
    /// redirecting the browser.
    pub fn authorize(&self) -> (String, LoginState) {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let client = self.create_client();
        let mut request = client.authorize_url(CsrfToken::new_random);
        for scope in &self.scopes {
            request = request.add_scope(Scope::new(scope.clone()));
        }
        let (auth_url, csrf_state) = request.set_pkce_challenge(pkce_challenge).url();

        let state = LoginState {
            token: csrf_state.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
            provider: self.provider,
            created_at: Utc::now(),
        };

        (auth_url.to_string(), state)
    }

    /// Exchange the callback code for an access token
    pub async fn exchange_code(&self, code: &str, pkce_verifier: String) -> Result<String, String> {
        // Create HTTP client for token exchange
        let http_client = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| e.to_string())?;

        let token_result = self
            .create_client()
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier))
            .request_async(&http_client)
            .await
            .map_err(|e| format!("Token exchange failed: {}", e))?;

        Ok(token_result.access_token().secret().clone())
    }

    /// Fetch the provider's stable subject id for the logged-in user
    pub async fn fetch_subject(&self, access_token: &str) -> Result<String, String> {
        let client = reqwest::Client::new();

        let response = client
            .get(&self.userinfo_url)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("Userinfo request returned {}", response.status()));
        }

        match self.provider {
            Provider::Google => {
                let profile: GoogleProfile = response.json().await.map_err(|e| e.to_string())?;
                Ok(profile.sub)
            }
            Provider::Facebook => {
                let profile: FacebookProfile = response.json().await.map_err(|e| e.to_string())?;
                Ok(profile.id)
            }
        }
    }
}

/// The set of configured providers. Missing or bad credentials leave a
/// provider disabled rather than failing startup.
#[derive(Default)]
pub struct OauthProviders {
    pub google: Option<OauthProvider>,
    pub facebook: Option<OauthProvider>,
}

impl OauthProviders {
    /// No providers configured
    pub fn none() -> Self {
        Self::default()
    }

    /// Build providers from whatever credentials the config carries
    pub fn from_config(config: &Config) -> Self {
        let google = config.google.as_ref().and_then(|creds| {
            match OauthProvider::google(&creds.client_id, &creds.client_secret, &config.base_url) {
                Ok(provider) => Some(provider),
                Err(e) => {
                    tracing::warn!("Ignoring Google login config: {}", e);
                    None
                }
            }
        });

        let facebook = config.facebook.as_ref().and_then(|creds| {
            match OauthProvider::facebook(&creds.client_id, &creds.client_secret, &config.base_url)
            {
                Ok(provider) => Some(provider),
                Err(e) => {
                    tracing::warn!("Ignoring Facebook login config: {}", e);
                    None
                }
            }
        });

        Self { google, facebook }
    }

    pub fn get(&self, provider: Provider) -> Option<&OauthProvider> {
        match provider {
            Provider::Google => self.google.as_ref(),
            Provider::Facebook => self.facebook.as_ref(),
        }
    }
}
