//! Provider factory functions.
//!
//! Each factory picks the concrete client from the [`ProviderCredentials`] variant and
//! hands it back behind the capability trait, wrapped in `Arc` for sharing across tasks.
//! Credentials for a different capability are rejected with
//! [`ProviderError::InvalidParameter`].

use std::sync::Arc;

use crate::error::{ProviderError, Result};
use crate::traits::{BotDirectory, DnsProvider, EmailDomainProvider, WidgetProvider};
use crate::types::ProviderCredentials;

#[cfg(feature = "cloudflare")]
use crate::providers::CloudflareProvider;
#[cfg(feature = "sendgrid")]
use crate::providers::SendgridProvider;
#[cfg(feature = "telegram")]
use crate::providers::TelegramProvider;

fn unsupported(capability: &str, credentials: &ProviderCredentials) -> ProviderError {
    ProviderError::InvalidParameter {
        provider: credentials.provider_type().to_string(),
        param: "credentials".to_string(),
        detail: format!("{} cannot act as {capability}", credentials.provider_type()),
    }
}

/// Creates a [`DnsProvider`] from the given credentials.
///
/// # Examples
///
/// ```rust,no_run
/// use domain_provisioner_provider::{create_dns_provider, ProviderCredentials};
///
/// let dns = create_dns_provider(ProviderCredentials::CloudflareToken {
///     api_token: "your-token".to_string(),
/// }).unwrap();
/// ```
pub fn create_dns_provider(credentials: ProviderCredentials) -> Result<Arc<dyn DnsProvider>> {
    match credentials {
        #[cfg(feature = "cloudflare")]
        c @ (ProviderCredentials::Cloudflare { .. } | ProviderCredentials::CloudflareToken { .. }) => {
            Ok(Arc::new(CloudflareProvider::from_credentials(c)?))
        }
        #[allow(unreachable_patterns)]
        other => Err(unsupported("a DNS provider", &other)),
    }
}

/// Creates a [`WidgetProvider`] (bot-protection widgets) from the given credentials.
pub fn create_widget_provider(credentials: ProviderCredentials) -> Result<Arc<dyn WidgetProvider>> {
    match credentials {
        #[cfg(feature = "cloudflare")]
        c @ (ProviderCredentials::Cloudflare { .. } | ProviderCredentials::CloudflareToken { .. }) => {
            Ok(Arc::new(CloudflareProvider::from_credentials(c)?))
        }
        #[allow(unreachable_patterns)]
        other => Err(unsupported("a widget provider", &other)),
    }
}

/// Creates an [`EmailDomainProvider`] from the given credentials.
pub fn create_email_provider(
    credentials: ProviderCredentials,
) -> Result<Arc<dyn EmailDomainProvider>> {
    match credentials {
        #[cfg(feature = "sendgrid")]
        ProviderCredentials::Sendgrid { api_key } => Ok(Arc::new(SendgridProvider::new(api_key)?)),
        #[allow(unreachable_patterns)]
        other => Err(unsupported("an email provider", &other)),
    }
}

/// Creates a [`BotDirectory`] from the given credentials.
pub fn create_bot_directory(credentials: ProviderCredentials) -> Result<Arc<dyn BotDirectory>> {
    match credentials {
        #[cfg(feature = "telegram")]
        ProviderCredentials::Telegram { bot_token } => {
            Ok(Arc::new(TelegramProvider::new(bot_token)?))
        }
        #[allow(unreachable_patterns)]
        other => Err(unsupported("a bot directory", &other)),
    }
}
