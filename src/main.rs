//! Jokeboard
//!
//! A small joke-sharing site: register locally or log in with Google or
//! Facebook, post jokes, edit or delete your own, browse everyone's in
//! one feed, and sign up for the mailing list.

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jokeboard::mailer::Mailer;
use jokeboard::newsletter::NewsletterClient;
use jokeboard::oauth::OauthProviders;
use jokeboard::store::{SessionStore, UserStore};
use jokeboard::{
    routes, AppState, Config, ConsoleMailer, DisabledNewsletter, HttpNewsletterClient,
    InMemorySessionStore, InMemoryUserStore, NewsletterConfig, SmtpConfig, SmtpMailer,
    SqliteStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up a local .env before reading the environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jokeboard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!(port = config.port, base_url = %config.base_url, "Loaded configuration");

    let cookie_key = config.session_key().map_err(anyhow::Error::msg)?;

    let oauth = OauthProviders::from_config(&config);
    if oauth.google.is_some() {
        tracing::info!("Google login enabled");
    }
    if oauth.facebook.is_some() {
        tracing::info!("Facebook login enabled");
    }

    // Use SMTP when configured, otherwise print contact mail to the console
    let mailer: Box<dyn Mailer> = match SmtpConfig::from_env() {
        Some(smtp) => Box::new(SmtpMailer::new(smtp).map_err(anyhow::Error::msg)?),
        None => {
            tracing::warn!("SMTP not configured, contact mail goes to the console");
            Box::new(ConsoleMailer::new())
        }
    };

    let newsletter: Box<dyn NewsletterClient> = match NewsletterConfig::from_env() {
        Some(list) => Box::new(HttpNewsletterClient::new(list)),
        None => {
            tracing::warn!("LIST_API_URL not set, mailing list signups will fail");
            Box::new(DisabledNewsletter)
        }
    };

    match &config.database_url {
        Some(path) => {
            tracing::info!("Using sqlite storage at {}", path);
            let store = Arc::new(SqliteStore::open(path)?);
            let state = Arc::new(AppState::new(
                store.clone(),
                store,
                mailer,
                newsletter,
                oauth,
                cookie_key,
            ));
            serve(state, config.port).await
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage");
            let state = Arc::new(AppState::new(
                InMemoryUserStore::new(),
                InMemorySessionStore::new(),
                mailer,
                newsletter,
                oauth,
                cookie_key,
            ));
            serve(state, config.port).await
        }
    }
}

async fn serve<U, S, M, N>(state: Arc<AppState<U, S, M, N>>, port: u16) -> Result<()>
where
    U: UserStore + 'static,
    S: SessionStore + 'static,
    M: Mailer + 'static,
    N: NewsletterClient + 'static,
{
    let app = routes::create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Jokeboard listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
