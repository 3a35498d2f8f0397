//! Domain Provisioner Core Library
//!
//! Business logic for bringing a new customer domain online:
//! - DNS record reconciliation (`DnsReconciler`)
//! - Email domain authentication (`DomainAuthService`)
//! - Website CNAMEs (`WebDnsService`)
//! - Bot-protection widgets (`WidgetService`)
//! - Chat login signature check and bot identity cache
//!
//! Every operation returns an outcome carrying a structured step log instead of an
//! error, so a caller can always show what happened. Provider clients come from
//! `domain-provisioner-provider` and are injected through [`ServiceContext`].

pub mod config;
pub mod error;
pub mod services;
pub mod traits;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use config::{Backoff, ProvisionerConfig, RetryPolicy, SenderTemplate, WidgetSettings};
pub use error::{CoreError, CoreResult};
pub use services::{
    verify_login_widget, BotIdentityCache, DnsReconciler, DomainAuthService, ServiceContext,
    WebDnsService, WidgetService,
};
pub use traits::{EmailProviderFactory, SendgridProviderFactory};
pub use types::{DomainAuthOutcome, ProvisioningLog, WebDnsOutcome, WidgetOutcome};
