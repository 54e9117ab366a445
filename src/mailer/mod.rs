//! Outbound mail abstractions

pub mod console;
pub mod smtp;

pub use console::ConsoleMailer;
pub use smtp::{SmtpConfig, SmtpMailer};

/// Trait for delivering contact-form messages
pub trait Mailer: Send + Sync {
    /// Deliver a contact-form message. `reply_to` is the address the
    /// visitor typed into the form.
    fn send_contact(&self, reply_to: &str, message: &str) -> Result<(), String>;
}

/// Allow using Box<dyn Mailer> as a Mailer
impl Mailer for Box<dyn Mailer> {
    fn send_contact(&self, reply_to: &str, message: &str) -> Result<(), String> {
        (**self).send_contact(reply_to, message)
    }
}
