//! Ports - trait contracts the adapters implement.
//!
//! Everything the core needs from the outside world is expressed here as
//! an async trait, so handlers stay testable against in-memory fakes.
//!
//! ## Persistence
//!
//! - `EntitlementStore` - Conditional writes and lookups for entitlement records
//!
//! ## External Services
//!
//! - `BillingProvider` - Checkout/portal sessions and webhook verification
//! - `NotificationSender` - Lifecycle email delivery
//! - `AccountDirectory` - Identity lookups (email resolution)

mod account_directory;
mod billing_provider;
mod entitlement_store;
mod notification_sender;

pub use account_directory::{AccountDirectory, DirectoryError};
pub use billing_provider::{
    BillingError, BillingErrorCode, BillingEvent, BillingEventData, BillingEventKind,
    BillingProvider, CheckoutSession, CheckoutSessionDetails, CreateCheckoutRequest,
    PortalSession, ProviderStatus,
};
pub use entitlement_store::{EntitlementStore, StoreError};
pub use notification_sender::{NotificationError, NotificationKind, NotificationSender};
