use async_trait::async_trait;
use lettre::message::{header, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};

use crate::config::SmtpConfig;
use crate::error::{AppError, Result};
use crate::models::TrackedItem;

/// Structured price-drop event handed to a notifier. Built once from
/// the compared prices so every delivery channel reports the same math.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceDropEvent {
    pub email: String,
    pub url: String,
    pub old_price: f64,
    pub new_price: f64,
    pub savings: f64,
    /// Percentage savings, rounded to 1 decimal.
    pub savings_percent: f64,
}

impl PriceDropEvent {
    pub fn new(item: &TrackedItem, old_price: f64, new_price: f64) -> Self {
        let savings = old_price - new_price;
        let savings_percent = ((savings / old_price) * 1000.0).round() / 10.0;

        Self {
            email: item.email.clone(),
            url: item.url.clone(),
            old_price,
            new_price,
            savings,
            savings_percent,
        }
    }
}

/// Delivery capability for price-drop events. The orchestrator persists
/// the alerted state only after `notify` returns Ok, so implementations
/// must not report success for an undelivered message.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &PriceDropEvent) -> Result<()>;
}

pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    from_name: String,
}

impl EmailNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let mut builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| AppError::Notify(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        }
        .port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from_address: config.from_address.clone(),
            from_name: config.from_name.clone(),
        })
    }

    fn format_subject(&self, event: &PriceDropEvent) -> String {
        format!(
            "🔻 Price Dropped! Save {:.2} on your tracked product",
            event.savings
        )
    }

    fn format_html_body(&self, event: &PriceDropEvent) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Price Drop Alert</title>
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .header {{ background: #4F46E5; color: white; padding: 20px; text-align: center; border-radius: 8px 8px 0 0; }}
        .content {{ background: #f9fafb; padding: 20px; border-radius: 0 0 8px 8px; }}
        .price-info {{ background: white; padding: 15px; border-radius: 8px; margin: 15px 0; }}
        .old-price {{ text-decoration: line-through; color: #6b7280; }}
        .new-price {{ color: #059669; font-size: 24px; font-weight: bold; }}
        .savings {{ color: #059669; font-weight: bold; }}
        .cta-button {{ display: inline-block; background: #4F46E5; color: white; padding: 12px 24px; text-decoration: none; border-radius: 6px; margin: 15px 0; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>🔻 Price Drop Alert!</h1>
        </div>
        <div class="content">
            <h2>Great news! The price has dropped on a product you're tracking.</h2>
            <div class="price-info">
                <p><strong>Old Price:</strong> <span class="old-price">{old:.2}</span></p>
                <p><strong>New Price:</strong> <span class="new-price">{new:.2}</span></p>
                <p><strong>You Save:</strong> <span class="savings">{savings:.2} ({percent}%)</span></p>
            </div>
            <a href="{url}" class="cta-button" target="_blank">View Product</a>
            <p><small>This alert was sent automatically by your price tracker. You won't
            receive more alerts for this product unless you track it again.</small></p>
        </div>
    </div>
</body>
</html>"#,
            old = event.old_price,
            new = event.new_price,
            savings = event.savings,
            percent = event.savings_percent,
            url = event.url,
        )
    }

    fn format_text_body(&self, event: &PriceDropEvent) -> String {
        format!(
            "🔻 Price Drop Alert!\n\n\
             Great news! The price has dropped on a product you're tracking.\n\n\
             Old Price: {old:.2}\n\
             New Price: {new:.2}\n\
             You Save: {savings:.2} ({percent}%)\n\n\
             View Product: {url}\n\n\
             This alert was sent automatically by your price tracker. You won't\n\
             receive more alerts for this product unless you track it again.\n",
            old = event.old_price,
            new = event.new_price,
            savings = event.savings,
            percent = event.savings_percent,
            url = event.url,
        )
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, event: &PriceDropEvent) -> Result<()> {
        let message = Message::builder()
            .from(
                format!("{} <{}>", self.from_name, self.from_address)
                    .parse()
                    .map_err(|e| AppError::Notify(format!("invalid from address: {}", e)))?,
            )
            .to(event
                .email
                .parse()
                .map_err(|e| AppError::Notify(format!("invalid recipient: {}", e)))?)
            .subject(self.format_subject(event))
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(self.format_text_body(event)),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(self.format_html_body(event)),
                    ),
            )
            .map_err(|e| AppError::Notify(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Notify(e.to_string()))?;

        tracing::info!(
            recipient = %event.email,
            url = %event.url,
            old_price = event.old_price,
            new_price = event.new_price,
            "Price drop alert sent"
        );
        Ok(())
    }
}
