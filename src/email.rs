//! ==============================================================================
//! email.rs - alert mail
//! ==============================================================================
//!
//! purpose:
//!     sends a batch of weather alerts as one plain-text mail over smtp
//!     (STARTTLS on the submission port, then login).
//!
//! relationships:
//!     - configured by: config.rs ([alerts.email])
//!     - used by: alerts.rs (after the console report)
//!
//! sending blocks on network io; callers run it on the blocking pool.
//!
//! ==============================================================================

use crate::alerts::Alert;
use crate::config::EmailConfig;

use anyhow::{Context, Result};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

pub const SUBJECT: &str = "Weather Station Alert";

/// plain-text body listing every alert of one cycle
pub fn alert_body(alerts: &[Alert]) -> String {
    let lines: Vec<String> = alerts.iter().map(|alert| format!("- {}", alert)).collect();
    format!(
        "The following weather alerts have been detected:\n\n{}\n\n\
         This is an automated message from your Raspberry Pi Weather Station.",
        lines.join("\n")
    )
}

#[derive(Clone)]
pub struct EmailNotifier {
    transport: SmtpTransport,
    sender: Mailbox,
    recipients: Vec<Mailbox>,
}

impl EmailNotifier {
    /// validate addresses and prepare the transport; no connection is made here
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let sender: Mailbox = config
            .sender
            .parse()
            .with_context(|| format!("invalid alert sender '{}'", config.sender))?;

        let recipients = config
            .recipients
            .iter()
            .map(|r| r.parse::<Mailbox>().with_context(|| format!("invalid alert recipient '{}'", r)))
            .collect::<Result<Vec<_>>>()?;
        if recipients.is_empty() {
            anyhow::bail!("[alerts.email] needs at least one recipient");
        }

        let transport = SmtpTransport::starttls_relay(&config.smtp_server)
            .with_context(|| format!("invalid smtp server '{}'", config.smtp_server))?
            .port(config.smtp_port)
            .credentials(Credentials::new(config.username.clone(), config.password.clone()))
            .build();

        Ok(Self { transport, sender, recipients })
    }

    pub fn recipients(&self) -> String {
        self.recipients.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", ")
    }

    pub fn message(&self, alerts: &[Alert]) -> Result<Message> {
        let mut builder = Message::builder()
            .from(self.sender.clone())
            .subject(SUBJECT)
            .header(ContentType::TEXT_PLAIN);
        for recipient in &self.recipients {
            builder = builder.to(recipient.clone());
        }
        builder.body(alert_body(alerts)).context("failed to build alert mail")
    }

    /// blocking
    pub fn send(&self, alerts: &[Alert]) -> Result<()> {
        let message = self.message(alerts)?;
        self.transport.send(&message).context("smtp delivery failed")?;
        Ok(())
    }
}
