//! Provider client implementations

/// Shared utilities used by provider implementations.
pub mod common;

#[cfg(feature = "cloudflare")]
mod cloudflare;
#[cfg(feature = "sendgrid")]
mod sendgrid;
#[cfg(feature = "telegram")]
mod telegram;

#[cfg(feature = "cloudflare")]
pub use cloudflare::CloudflareProvider;
#[cfg(feature = "sendgrid")]
pub use sendgrid::SendgridProvider;
#[cfg(feature = "telegram")]
pub use telegram::TelegramProvider;
