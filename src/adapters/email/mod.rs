//! Email adapters - NotificationSender implementations.
//!
//! This module provides adapters for transactional email delivery:
//! - `ResendSender` - Sends lifecycle emails through the Resend API

mod resend_sender;

pub use resend_sender::{ResendConfig, ResendSender};
