//! # domain-provisioner-provider
//!
//! Thin, typed HTTP clients for the upstream services a domain provisioning run talks to.
//!
//! ## Supported Providers
//!
//! | Provider | Feature Flag | Capability | Auth Method |
//! |----------|-------------|------------|-------------|
//! | [Cloudflare](https://www.cloudflare.com/) | `cloudflare` | [`DnsProvider`], [`WidgetProvider`] | Global key headers or Bearer Token |
//! | [SendGrid](https://sendgrid.com/) | `sendgrid` | [`EmailDomainProvider`] | Bearer API key |
//! | [Telegram](https://core.telegram.org/bots/api) | `telegram` | [`BotDirectory`] | Token in URL path |
//!
//! ## Feature Flags
//!
//! - **`all-providers`** *(default)*: Enable all providers listed above.
//! - **`cloudflare`**, **`sendgrid`**, **`telegram`**: Enable a single provider.
//! - **`native-tls`** *(default)* / **`rustls`**: TLS backend for reqwest.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use domain_provisioner_provider::{
//!     create_dns_provider, DesiredRecord, ProviderCredentials,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dns = create_dns_provider(ProviderCredentials::CloudflareToken {
//!         api_token: "your-token".to_string(),
//!     })?;
//!
//!     let zone = dns.find_zone("example.com").await?.ok_or("zone not found")?;
//!     for record in dns.list_records(&zone.id).await? {
//!         println!("{} {} -> {}", record.name, record.record_type, record.content);
//!     }
//!
//!     let www = DesiredRecord::cname("www.example.com", "app.example-host.com", true);
//!     dns.create_record(&zone.id, &www).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All provider operations return [`Result<T, ProviderError>`](ProviderError).
//! [`ProviderError::AlreadyExists`] is how callers detect idempotent duplicates
//! (verified senders, records). Transient errors (`NetworkError`, `Timeout`,
//! `RateLimited`) are retried with exponential backoff for idempotent requests only;
//! creates are sent once.

mod error;
mod factory;
mod http_client;
mod providers;
mod traits;
mod types;
mod utils;

pub use error::{ProviderError, Result};

pub use factory::{
    create_bot_directory, create_dns_provider, create_email_provider, create_widget_provider,
};

// Capability traits only (error mapping stays internal)
pub use traits::{BotDirectory, DnsProvider, EmailDomainProvider, WidgetProvider};

pub use types::{
    AuthDnsRecord, BotIdentity, CredentialValidationError, DesiredRecord, DnsRecordType,
    DomainAuth, DomainAuthDns, DomainValidation, ExistingRecord, ProviderCredentials,
    ProviderType, VerifiedSenderRequest, Widget, WidgetMode, WidgetRequest, Zone,
};

pub use providers::common::{normalize_domain_name, same_host};
pub use utils::log_sanitizer::{mask_secret, truncate_for_log};

#[cfg(feature = "cloudflare")]
pub use providers::CloudflareProvider;

#[cfg(feature = "sendgrid")]
pub use providers::SendgridProvider;

#[cfg(feature = "telegram")]
pub use providers::TelegramProvider;
