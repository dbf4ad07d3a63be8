//! Email service for contact form notifications.
//!
//! Uses SMTP via lettre for delivery with Askama HTML and plain text templates.
//! Notifications are best effort: [`EmailService::notify_contact`] detaches the
//! send onto its own task and only logs the outcome.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::models::ContactMessage;

/// HTML template for the contact notification.
#[derive(Template)]
#[template(path = "email/contact_notification.html")]
struct ContactNotificationHtml<'a> {
    name: &'a str,
    email: &'a str,
    subject: &'a str,
    message: &'a str,
}

/// Plain text template for the contact notification.
#[derive(Template)]
#[template(path = "email/contact_notification.txt")]
struct ContactNotificationText<'a> {
    name: &'a str,
    email: &'a str,
    subject: &'a str,
    message: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for outbound notifications.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    notify_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            notify_address: config.notify_address.clone(),
        })
    }

    /// Forward a contact submission to the notification mailbox in the background.
    ///
    /// Returns immediately. Delivery failures are logged and never reach the caller.
    pub fn notify_contact(&self, msg: &ContactMessage) {
        let service = self.clone();
        let msg = msg.clone();
        tokio::spawn(async move {
            match service.send_contact_notification(&msg).await {
                Ok(()) => tracing::info!(contact_id = %msg.id, "Contact notification sent"),
                Err(e) => tracing::warn!(
                    contact_id = %msg.id,
                    error = %e,
                    "Contact notification failed"
                ),
            }
        });
    }

    /// Send the contact notification and wait for the relay's answer.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or a template fails to render.
    pub async fn send_contact_notification(&self, msg: &ContactMessage) -> Result<(), EmailError> {
        let html = ContactNotificationHtml {
            name: &msg.name,
            email: msg.email.as_str(),
            subject: &msg.subject,
            message: &msg.message,
        }
        .render()?;
        let text = ContactNotificationText {
            name: &msg.name,
            email: msg.email.as_str(),
            subject: &msg.subject,
            message: &msg.message,
        }
        .render()?;

        let reply_to: Mailbox = msg
            .email
            .as_str()
            .parse()
            .map_err(|_| EmailError::InvalidAddress(msg.email.to_string()))?;

        self.send_multipart_email(
            &format!("Contact Form: {}", msg.subject),
            Some(reply_to),
            &text,
            &html,
        )
        .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        subject: &str,
        reply_to: Option<Mailbox>,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let mut builder = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(self
                .notify_address
                .parse()
                .map_err(|_| EmailError::InvalidAddress(self.notify_address.clone()))?)
            .subject(subject);
        if let Some(reply_to) = reply_to {
            builder = builder.reply_to(reply_to);
        }

        let email = builder.multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(text_body.to_string()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html_body.to_string()),
                ),
        )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %self.notify_address, subject = %subject, "Email sent successfully");
        Ok(())
    }
}
