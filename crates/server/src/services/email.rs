//! Email service for transactional mail.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates. Three
//! message types: order confirmation, shipment notice, and contact-form
//! relay. All senders here are best-effort from their caller's point of
//! view: the ledger state is already durable before any mail goes out.

use askama::Template;
use chrono::Utc;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message,
    message::{MessageBuilder, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
    Tokio1Executor,
};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::models::OrderWithDetails;

/// Transport construction error, re-exported for state setup.
pub use lettre::transport::smtp::Error as EmailTransportError;

/// One rendered cart line for the email templates.
struct EmailLine {
    quantity: i32,
    name: String,
    unit_price: String,
}

/// HTML template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    order_id: i32,
    date: &'a str,
    lines: &'a [EmailLine],
    shipping_method: &'a str,
    shipping_cost: &'a str,
    total: &'a str,
    full_name: &'a str,
    street: &'a str,
    city: &'a str,
    state: &'a str,
    zip: &'a str,
    status: &'a str,
}

/// Plain text template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    order_id: i32,
    date: &'a str,
    lines: &'a [EmailLine],
    shipping_method: &'a str,
    shipping_cost: &'a str,
    total: &'a str,
    full_name: &'a str,
    street: &'a str,
    city: &'a str,
    state: &'a str,
    zip: &'a str,
    status: &'a str,
}

/// HTML template for the shipment notice email.
#[derive(Template)]
#[template(path = "email/shipment_notice.html")]
struct ShipmentNoticeHtml<'a> {
    order_id: i32,
    shipped_on: &'a str,
    lines: &'a [EmailLine],
    total: &'a str,
    full_name: &'a str,
    street: &'a str,
    city: &'a str,
    state: &'a str,
    zip: &'a str,
    tracking_number: Option<&'a str>,
}

/// Plain text template for the shipment notice email.
#[derive(Template)]
#[template(path = "email/shipment_notice.txt")]
struct ShipmentNoticeText<'a> {
    order_id: i32,
    shipped_on: &'a str,
    lines: &'a [EmailLine],
    total: &'a str,
    full_name: &'a str,
    street: &'a str,
    city: &'a str,
    state: &'a str,
    zip: &'a str,
    tracking_number: Option<&'a str>,
}

/// HTML template for the contact-form relay email.
#[derive(Template)]
#[template(path = "email/contact_message.html")]
struct ContactMessageHtml<'a> {
    name: &'a str,
    email: &'a str,
    message: &'a str,
}

/// Plain text template for the contact-form relay email.
#[derive(Template)]
#[template(path = "email/contact_message.txt")]
struct ContactMessageText<'a> {
    name: &'a str,
    email: &'a str,
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

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    order_reply_to: Option<String>,
    order_bcc: Option<String>,
    contact_inbox: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay configuration is invalid.
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
            order_reply_to: config.order_reply_to.clone(),
            order_bcc: config.order_bcc.clone(),
            contact_inbox: config.contact_inbox.clone(),
        })
    }

    /// Send the order confirmation email after a committed checkout.
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to send or a template fails to render.
    pub async fn send_order_confirmation(
        &self,
        to: &str,
        details: &OrderWithDetails,
    ) -> Result<(), EmailError> {
        let lines = email_lines(details);
        let date = details
            .order
            .created_at
            .format("%B %-d, %Y %H:%M UTC")
            .to_string();
        let shipping_method = details.order.shipping_method.as_deref().unwrap_or("N/A");
        let shipping_cost = money(details.order.shipping_cost);
        let total = money(details.total());
        let status = details.order.status.as_str();
        let shipping = &details.shipping;

        let html = OrderConfirmationHtml {
            order_id: details.order.id.as_i32(),
            date: &date,
            lines: &lines,
            shipping_method,
            shipping_cost: &shipping_cost,
            total: &total,
            full_name: &shipping.full_name,
            street: &shipping.street,
            city: &shipping.city,
            state: &shipping.state,
            zip: &shipping.zip,
            status,
        }
        .render()?;
        let text = OrderConfirmationText {
            order_id: details.order.id.as_i32(),
            date: &date,
            lines: &lines,
            shipping_method,
            shipping_cost: &shipping_cost,
            total: &total,
            full_name: &shipping.full_name,
            street: &shipping.street,
            city: &shipping.city,
            state: &shipping.state,
            zip: &shipping.zip,
            status,
        }
        .render()?;

        self.send_multipart_email(
            to,
            &format!("Your Farmstand Order #{}", details.order.id),
            &text,
            &html,
            true,
        )
        .await
    }

    /// Send the shipment notice for an order entering the shipped state.
    ///
    /// The body reflects the triggering save only: the tracking number is the
    /// one just submitted, not whatever the row held before.
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to send or a template fails to render.
    pub async fn send_shipment_notice(
        &self,
        to: &str,
        details: &OrderWithDetails,
        tracking_number: Option<&str>,
    ) -> Result<(), EmailError> {
        let lines = email_lines(details);
        let shipped_on = Utc::now().format("%B %-d, %Y %H:%M UTC").to_string();
        let total = money(details.total());
        let shipping = &details.shipping;

        let html = ShipmentNoticeHtml {
            order_id: details.order.id.as_i32(),
            shipped_on: &shipped_on,
            lines: &lines,
            total: &total,
            full_name: &shipping.full_name,
            street: &shipping.street,
            city: &shipping.city,
            state: &shipping.state,
            zip: &shipping.zip,
            tracking_number,
        }
        .render()?;
        let text = ShipmentNoticeText {
            order_id: details.order.id.as_i32(),
            shipped_on: &shipped_on,
            lines: &lines,
            total: &total,
            full_name: &shipping.full_name,
            street: &shipping.street,
            city: &shipping.city,
            state: &shipping.state,
            zip: &shipping.zip,
            tracking_number,
        }
        .render()?;

        self.send_multipart_email(
            to,
            &format!("Your Farmstand Order #{} Has Shipped", details.order.id),
            &text,
            &html,
            true,
        )
        .await
    }

    /// Relay a contact-form submission to the business inbox.
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to send or a template fails to render.
    pub async fn send_contact_message(
        &self,
        name: &str,
        email: &str,
        message: &str,
    ) -> Result<(), EmailError> {
        let html = ContactMessageHtml {
            name,
            email,
            message,
        }
        .render()?;
        let text = ContactMessageText {
            name,
            email,
            message,
        }
        .render()?;

        let to = self.contact_inbox.clone();
        self.send_multipart_email(&to, &format!("New contact message from {name}"), &text, &html, false)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    ///
    /// `order_headers` attaches the configured Reply-To and BCC mailboxes
    /// used on customer-facing order mail.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
        order_headers: bool,
    ) -> Result<(), EmailError> {
        let mut builder = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject);

        if order_headers {
            builder = self.with_order_headers(builder)?;
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

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }

    /// Attach the optional Reply-To and BCC mailboxes for order mail.
    fn with_order_headers(&self, mut builder: MessageBuilder) -> Result<MessageBuilder, EmailError> {
        if let Some(reply_to) = &self.order_reply_to {
            builder = builder.reply_to(
                reply_to
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(reply_to.clone()))?,
            );
        }
        if let Some(bcc) = &self.order_bcc {
            builder = builder.bcc(
                bcc.parse()
                    .map_err(|_| EmailError::InvalidAddress(bcc.clone()))?,
            );
        }
        Ok(builder)
    }
}

/// Render the order lines into template rows.
fn email_lines(details: &OrderWithDetails) -> Vec<EmailLine> {
    details
        .lines
        .iter()
        .map(|l| EmailLine {
            quantity: l.line.quantity,
            name: l.product_name.clone(),
            unit_price: money(l.line.unit_price),
        })
        .collect()
}

/// Format a decimal amount as dollars.
fn money(amount: Decimal) -> String {
    format!("${amount:.2}")
}
