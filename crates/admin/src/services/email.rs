//! Buyer notifications sent from the back office.
//!
//! Uses SMTP via lettre with Askama templates (HTML + plain text pairs).
//! Sends are best-effort: handlers log a failed email and carry on.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::models::Profile;
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
#[template(path = "email/account_approved.html")]
struct AccountApprovedHtml<'a> {
    contact_name: &'a str,
    business_name: &'a str,
    link: &'a str,
}

#[derive(Template)]
#[template(path = "email/account_approved.txt")]
struct AccountApprovedText<'a> {
    contact_name: &'a str,
    business_name: &'a str,
    link: &'a str,
}

#[derive(Template)]
#[template(path = "email/account_rejected.html")]
struct AccountRejectedHtml<'a> {
    contact_name: &'a str,
    business_name: &'a str,
}

#[derive(Template)]
#[template(path = "email/account_rejected.txt")]
struct AccountRejectedText<'a> {
    contact_name: &'a str,
    business_name: &'a str,
}

#[derive(Template)]
#[template(path = "email/order_status.html")]
struct OrderStatusHtml<'a> {
    order: &'a OrderView,
    link: &'a str,
}

#[derive(Template)]
#[template(path = "email/order_status.txt")]
struct OrderStatusText<'a> {
    order: &'a OrderView,
    link: &'a str,
}

// =============================================================================
// Service
// =============================================================================

/// Email service for buyer notifications.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay parameters are invalid.
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
        })
    }

    /// Tell a buyer their wholesale account was approved.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_account_approved(
        &self,
        profile: &Profile,
        portal_link: &str,
    ) -> Result<(), EmailError> {
        let html = AccountApprovedHtml {
            contact_name: &profile.contact_name,
            business_name: &profile.business_name,
            link: portal_link,
        }
        .render()?;
        let text = AccountApprovedText {
            contact_name: &profile.contact_name,
            business_name: &profile.business_name,
            link: portal_link,
        }
        .render()?;

        self.send_multipart_email(
            profile.email.as_str(),
            "Tu cuenta mayorista fue aprobada - Delicias Florencia",
            &text,
            &html,
        )
        .await
    }

    /// Tell a buyer their wholesale account was not approved.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_account_rejected(&self, profile: &Profile) -> Result<(), EmailError> {
        let html = AccountRejectedHtml {
            contact_name: &profile.contact_name,
            business_name: &profile.business_name,
        }
        .render()?;
        let text = AccountRejectedText {
            contact_name: &profile.contact_name,
            business_name: &profile.business_name,
        }
        .render()?;

        self.send_multipart_email(
            profile.email.as_str(),
            "Sobre tu solicitud mayorista - Delicias Florencia",
            &text,
            &html,
        )
        .await
    }

    /// Tell a buyer their order changed status.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_order_status(&self, order: &OrderView, link: &str) -> Result<(), EmailError> {
        let html = OrderStatusHtml { order, link }.render()?;
        let text = OrderStatusText { order, link }.render()?;
        let subject = format!(
            "Pedido #{}: {} - Delicias Florencia",
            order.number,
            order.status.label()
        );

        self.send_multipart_email(&order.email, &subject, &text, &html)
            .await
    }

    fn message_builder(
        &self,
        to: &str,
        subject: &str,
    ) -> Result<lettre::message::MessageBuilder, EmailError> {
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
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use delicias_core::OrderStatus;

    use super::*;
    use crate::views::tests::order;

    #[test]
    fn test_approved_templates_contain_portal_link() {
        let link = "https://deliciasflorencia.cl/mayorista";
        let html = AccountApprovedHtml {
            contact_name: "Luis",
            business_name: "Almacén <Don Lucho>",
            link,
        }
        .render()
        .unwrap();
        assert!(html.contains(link));
        assert!(!html.contains("<Don Lucho>"));

        let text = AccountApprovedText {
            contact_name: "Luis",
            business_name: "Almacén <Don Lucho>",
            link,
        }
        .render()
        .unwrap();
        assert!(text.contains("Almacén <Don Lucho>"));
        assert!(text.contains(link));
    }

    #[test]
    fn test_rejected_template_names_business() {
        let text = AccountRejectedText {
            contact_name: "Luis",
            business_name: "Almacén Don Lucho",
        }
        .render()
        .unwrap();
        assert!(text.contains("Almacén Don Lucho"));
    }

    #[test]
    fn test_order_status_templates_show_new_status() {
        let view = OrderView::from(&order(OrderStatus::Confirmed));
        let link = "https://deliciasflorencia.cl/mayorista/pedidos/41";

        let text = OrderStatusText { order: &view, link }.render().unwrap();
        assert!(text.contains("#41"));
        assert!(text.contains("Confirmado"));
        assert!(text.contains(link));

        let html = OrderStatusHtml { order: &view, link }.render().unwrap();
        assert!(html.contains("$85.537"));
    }
}
