//! Email configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Email configuration (Resend)
///
/// The API key is optional: without one, lifecycle emails are skipped and
/// subscription processing carries on.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Resend API key. Leave unset to disable email delivery.
    pub resend_api_key: Option<String>,

    /// From email address
    #[serde(default = "default_from_email")]
    pub from_email: String,

    /// From name
    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// Dashboard URL linked from email bodies
    #[serde(default = "default_dashboard_url")]
    pub dashboard_url: String,
}

impl EmailConfig {
    /// Get formatted "From" header value
    pub fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }

    /// Check if email delivery is enabled
    pub fn is_enabled(&self) -> bool {
        self.resend_api_key.is_some()
    }

    /// Validate email configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(key) = &self.resend_api_key {
            if !key.starts_with("re_") {
                return Err(ValidationError::InvalidResendKey);
            }
        }
        if !self.from_email.contains('@') {
            return Err(ValidationError::InvalidFromEmail);
        }
        Ok(())
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            resend_api_key: None,
            from_email: default_from_email(),
            from_name: default_from_name(),
            dashboard_url: default_dashboard_url(),
        }
    }
}

fn default_from_email() -> String {
    "noreply@jobsheet.pro".to_string()
}

fn default_from_name() -> String {
    "JobSheet Pro".to_string()
}

fn default_dashboard_url() -> String {
    "https://app.jobsheet.pro".to_string()
}
