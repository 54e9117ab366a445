//! Console mailer for development

use super::Mailer;

/// Mailer that logs to console (for development)
pub struct ConsoleMailer;

impl ConsoleMailer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleMailer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mailer for ConsoleMailer {
    fn send_contact(&self, reply_to: &str, message: &str) -> Result<(), String> {
        println!();
        println!("========================================");
        println!("  CONTACT MESSAGE FROM: {}", reply_to);
        println!("  {}", message);
        println!("========================================");
        println!();

        tracing::info!(reply_to = %reply_to, "Contact message logged");

        Ok(())
    }
}
