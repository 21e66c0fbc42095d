//! Resend email implementation of NotificationSender.
//!
//! Sends lifecycle emails through the Resend REST API. Delivery is
//! optional: when no API key is configured the sender logs and reports
//! success so subscription processing never depends on email.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use crate::ports::{NotificationError, NotificationKind, NotificationSender};

/// Timeout for Resend API calls. Email is best-effort, so a slow provider
/// should fail fast rather than hold up webhook acknowledgement.
const RESEND_API_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the Resend email sender.
#[derive(Clone)]
pub struct ResendConfig {
    /// Resend API key. None disables delivery entirely.
    pub api_key: Option<SecretString>,
    /// Base URL for the Resend API.
    pub api_base_url: String,
    /// From address shown to recipients.
    pub from_address: String,
    /// Dashboard URL linked from email bodies.
    pub dashboard_url: String,
}

impl ResendConfig {
    /// Create a new Resend configuration.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.map(SecretString::new),
            api_base_url: "https://api.resend.com".to_string(),
            from_address: "JobSheet Pro <noreply@jobsheet.pro>".to_string(),
            dashboard_url: "https://app.jobsheet.pro".to_string(),
        }
    }

    /// Override the API base URL (used in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into();
        self
    }

    /// Override the dashboard URL linked from email bodies.
    pub fn with_dashboard_url(mut self, url: impl Into<String>) -> Self {
        self.dashboard_url = url.into();
        self
    }

    /// Override the from address shown to recipients.
    pub fn with_from_address(mut self, address: impl Into<String>) -> Self {
        self.from_address = address.into();
        self
    }
}

/// Resend implementation of the NotificationSender port.
pub struct ResendSender {
    config: ResendConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

impl ResendSender {
    /// Create a new Resend sender with the given configuration.
    pub fn new(config: ResendConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(RESEND_API_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            http_client,
        }
    }

    /// Whether a key is configured and emails will actually be sent.
    pub fn is_enabled(&self) -> bool {
        self.config.api_key.is_some()
    }
}

/// Greeting name shown in email bodies, taken from the address local part.
fn greeting_name(recipient: &str) -> &str {
    match recipient.split('@').next() {
        Some(name) if !name.is_empty() => name,
        _ => "there",
    }
}

/// Renders the subject and HTML body for a notification kind.
fn render_template(
    kind: NotificationKind,
    name: &str,
    dashboard_url: &str,
) -> (&'static str, String) {
    match kind {
        NotificationKind::SubscriptionStarted => (
            "🎉 Welcome to JobSheet Pro!",
            format!(
                r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #51cf66;">Thanks for subscribing!</h2>
  <p>Hi {name},</p>
  <p>Thank you for subscribing to JobSheet Pro! Your payment has been processed successfully.</p>
  <p><strong>Subscription Details:</strong></p>
  <ul style="color: #666;">
    <li>Plan: JobSheet Pro Monthly</li>
    <li>Price: £9.99/month</li>
    <li>Status: Active</li>
  </ul>
  <p><a href="{dashboard_url}" style="color: #667eea; font-weight: bold;">Start Generating Reports</a></p>
  <p style="color: #666; font-size: 14px;">You now have unlimited access to AI-powered job report generation!</p>
  <hr style="border: none; border-top: 1px solid #eee;">
  <p style="color: #999; font-size: 12px;">JobSheet Pro - Professional job reports, simplified</p>
</div>"#,
            ),
        ),
        NotificationKind::SubscriptionCanceled => (
            "Your JobSheet Pro subscription has been canceled",
            format!(
                r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #ff6b6b;">Subscription Canceled</h2>
  <p>Hi {name},</p>
  <p>Your JobSheet Pro subscription has been canceled.</p>
  <p>You'll continue to have access until the end of your current billing period.</p>
  <p>We're sorry to see you go! If you change your mind, you can resubscribe anytime.</p>
  <p><a href="{dashboard_url}" style="color: #667eea; font-weight: bold;">Resubscribe</a></p>
  <p style="color: #666; font-size: 14px;">Have feedback? We'd love to hear from you. Just reply to this email.</p>
  <hr style="border: none; border-top: 1px solid #eee;">
  <p style="color: #999; font-size: 12px;">JobSheet Pro - Professional job reports, simplified</p>
</div>"#,
            ),
        ),
    }
}

#[async_trait]
impl NotificationSender for ResendSender {
    async fn notify(
        &self,
        recipient: &str,
        kind: NotificationKind,
    ) -> Result<(), NotificationError> {
        let Some(api_key) = &self.config.api_key else {
            tracing::warn!(?kind, "Email delivery disabled, no API key configured");
            return Ok(());
        };

        let name = greeting_name(recipient);
        let (subject, html) = render_template(kind, name, &self.config.dashboard_url);

        let response = self
            .http_client
            .post(format!("{}/emails", self.config.api_base_url))
            .bearer_auth(api_key.expose_secret())
            .json(&json!({
                "from": self.config.from_address,
                "to": [recipient],
                "subject": subject,
                "html": html,
            }))
            .send()
            .await
            .map_err(|e| NotificationError::Delivery(format!("Resend request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = %status,
                error = %error_text,
                "Resend API rejected email"
            );
            return Err(NotificationError::Delivery(format!(
                "Resend API error ({}): {}",
                status, error_text
            )));
        }

        let sent: SendEmailResponse = response
            .json()
            .await
            .map_err(|e| NotificationError::Delivery(format!("Invalid Resend response: {}", e)))?;

        tracing::info!(email_id = %sent.id, ?kind, "Notification email sent");
        Ok(())
    }
}
