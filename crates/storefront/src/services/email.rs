//! Transactional email for buyers and the bakery's inbox.
//!
//! Uses SMTP via lettre with Askama templates (HTML + plain text pairs).
//! Callers treat sends as best-effort: a failed email is logged, never
//! surfaced as a failed request.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::models::{Profile, Socio};
use crate::views::OrderView;

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

// =============================================================================
// Templates
// =============================================================================

#[derive(Template)]
#[template(path = "email/verify_email.html")]
struct VerifyEmailHtml<'a> {
    business_name: &'a str,
    link: &'a str,
}

#[derive(Template)]
#[template(path = "email/verify_email.txt")]
struct VerifyEmailText<'a> {
    business_name: &'a str,
    link: &'a str,
}

#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetHtml<'a> {
    link: &'a str,
}

#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetText<'a> {
    link: &'a str,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    order: &'a OrderView,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    order: &'a OrderView,
}

#[derive(Template)]
#[template(path = "email/admin_new_order.html")]
struct AdminNewOrderHtml<'a> {
    order: &'a OrderView,
}

#[derive(Template)]
#[template(path = "email/admin_new_order.txt")]
struct AdminNewOrderText<'a> {
    order: &'a OrderView,
}

#[derive(Template)]
#[template(path = "email/admin_new_registration.txt")]
struct AdminNewRegistrationText<'a> {
    profile: &'a Profile,
}

#[derive(Template)]
#[template(path = "email/admin_new_socio.txt")]
struct AdminNewSocioText<'a> {
    socio: &'a Socio,
}

// =============================================================================
// Service
// =============================================================================

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    admin_notify: Option<String>,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay parameters are invalid.
    pub fn new(config: &EmailConfig, admin_notify: Option<String>) -> Result<Self, SmtpError> {
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
            admin_notify,
        })
    }

    /// Send the "confirm your email" link after registration.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_verification(
        &self,
        to: &str,
        business_name: &str,
        link: &str,
    ) -> Result<(), EmailError> {
        let html = VerifyEmailHtml { business_name, link }.render()?;
        let text = VerifyEmailText { business_name, link }.render()?;

        self.send_multipart_email(to, "Confirma tu correo - Delicias Florencia", &text, &html)
            .await
    }

    /// Send a password reset link.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_password_reset(&self, to: &str, link: &str) -> Result<(), EmailError> {
        let html = PasswordResetHtml { link }.render()?;
        let text = PasswordResetText { link }.render()?;

        self.send_multipart_email(to, "Restablece tu contraseña - Delicias Florencia", &text, &html)
            .await
    }

    /// Send the order confirmation to the buyer.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_order_confirmation(
        &self,
        to: &str,
        order: &OrderView,
    ) -> Result<(), EmailError> {
        let html = OrderConfirmationHtml { order }.render()?;
        let text = OrderConfirmationText { order }.render()?;
        let subject = format!("Recibimos tu pedido #{} - Delicias Florencia", order.number);

        self.send_multipart_email(to, &subject, &text, &html).await
    }

    /// Tell the bakery about a new order.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn notify_new_order(&self, order: &OrderView) -> Result<(), EmailError> {
        let Some(to) = self.admin_notify.as_deref() else {
            return Ok(());
        };
        let html = AdminNewOrderHtml { order }.render()?;
        let text = AdminNewOrderText { order }.render()?;
        let subject = format!(
            "Nuevo pedido #{} de {} ({})",
            order.number, order.business_name, order.total
        );

        self.send_multipart_email(to, &subject, &text, &html).await
    }

    /// Tell the bakery a business registered and awaits approval.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn notify_new_registration(&self, profile: &Profile) -> Result<(), EmailError> {
        let Some(to) = self.admin_notify.as_deref() else {
            return Ok(());
        };
        let text = AdminNewRegistrationText { profile }.render()?;
        let subject = format!(
            "Nueva solicitud mayorista: {}",
            profile.business.business_name
        );

        self.send_text_email(to, &subject, &text).await
    }

    /// Tell the bakery about a new partner application.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn notify_new_socio(&self, socio: &Socio) -> Result<(), EmailError> {
        let Some(to) = self.admin_notify.as_deref() else {
            return Ok(());
        };
        let text = AdminNewSocioText { socio }.render()?;
        let subject = format!("Nueva postulación de socio: {} ({})", socio.name, socio.comuna);

        self.send_text_email(to, &subject, &text).await
    }

    fn message_builder(&self, to: &str, subject: &str) -> Result<lettre::message::MessageBuilder, EmailError> {
        Ok(Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject))
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = self.message_builder(to, subject)?.multipart(
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

        tracing::info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }

    /// Send a plain text email (internal notices).
    async fn send_text_email(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        let email = self
            .message_builder(to, subject)?
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }
}
