//! SMTP-based mailer for production

use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};

use super::Mailer;

/// Configuration for SMTP delivery
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP server host (e.g., "smtp.resend.com")
    pub host: String,
    /// SMTP server port (typically 465 for TLS, 587 for STARTTLS)
    pub port: u16,
    /// SMTP username
    pub username: String,
    /// SMTP password (or API key for services like Resend)
    pub password: String,
    /// From email address
    pub from_email: String,
    /// Where contact-form messages are delivered
    pub inbox: String,
}

impl SmtpConfig {
    /// Create config from environment variables
    ///
    /// Required:
    /// - SMTP_HOST
    /// - SMTP_USERNAME
    /// - SMTP_PASSWORD
    /// - SMTP_FROM_EMAIL
    ///
    /// Optional:
    /// - SMTP_PORT (default: 465)
    /// - CONTACT_INBOX (default: the from address)
    pub fn from_env() -> Option<Self> {
        // Helper to get non-empty env var
        fn get_env(key: &str) -> Option<String> {
            std::env::var(key).ok().filter(|s| !s.is_empty())
        }

        let host = get_env("SMTP_HOST")?;
        let username = get_env("SMTP_USERNAME")?;
        let password = get_env("SMTP_PASSWORD")?;
        let from_email = get_env("SMTP_FROM_EMAIL")?;

        let port = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(465);

        let inbox = get_env("CONTACT_INBOX").unwrap_or_else(|| from_email.clone());

        Some(Self {
            host,
            port,
            username,
            password,
            from_email,
            inbox,
        })
    }
}

/// SMTP mailer for production use
pub struct SmtpMailer {
    transport: SmtpTransport,
    from_email: String,
    inbox: String,
}

impl SmtpMailer {
    /// Create a new SMTP mailer
    pub fn new(config: SmtpConfig) -> Result<Self, String> {
        let creds = Credentials::new(config.username, config.password);

        let transport = SmtpTransport::relay(&config.host)
            .map_err(|e| format!("Failed to create SMTP transport: {}", e))?
            .port(config.port)
            .credentials(creds)
            .build();

        // Test the connection
        transport
            .test_connection()
            .map_err(|e| format!("SMTP connection test failed: {}", e))?;

        tracing::info!(host = %config.host, port = config.port, "SMTP connection established");

        Ok(Self {
            transport,
            from_email: config.from_email,
            inbox: config.inbox,
        })
    }
}

impl Mailer for SmtpMailer {
    fn send_contact(&self, reply_to: &str, message: &str) -> Result<(), String> {
        let from = self
            .from_email
            .parse()
            .map_err(|e| format!("Invalid from address: {}", e))?;

        let to = self
            .inbox
            .parse()
            .map_err(|e| format!("Invalid inbox address: {}", e))?;

        let reply = reply_to
            .parse()
            .map_err(|e| format!("Invalid reply-to address: {}", e))?;

        let body = format!("From: {}\n\n{}", reply_to, message);

        let email = Message::builder()
            .from(from)
            .to(to)
            .reply_to(reply)
            .subject("New contact form message")
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| format!("Failed to build email: {}", e))?;

        self.transport
            .send(&email)
            .map_err(|e| format!("Failed to send email: {}", e))?;

        tracing::info!(reply_to = %reply_to, "Contact message delivered");
        Ok(())
    }
}
