//! JobSheet Pro backend - Subscription Entitlement & Billing Reconciliation
//!
//! This crate decides whether an account may use paid features at any given
//! instant, and keeps that decision consistent with the billing provider's
//! asynchronous event stream.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
