//! Email provider factory abstract Trait

use std::sync::Arc;

use domain_provisioner_provider::{
    create_email_provider, mask_secret, EmailDomainProvider, ProviderCredentials,
};

use crate::error::CoreResult;

/// Builds an email-delivery client from the API key a caller passes in.
///
/// The key arrives per invocation, so the client cannot be built up front like the
/// DNS provider.
pub trait EmailProviderFactory: Send + Sync {
    fn create(&self, api_key: &str) -> CoreResult<Arc<dyn EmailDomainProvider>>;
}

/// Default factory backed by the SendGrid client.
#[derive(Debug, Clone, Default)]
pub struct SendgridProviderFactory {
    base_url: Option<String>,
}

impl SendgridProviderFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Point every created client at another API root.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
        }
    }
}

impl EmailProviderFactory for SendgridProviderFactory {
    fn create(&self, api_key: &str) -> CoreResult<Arc<dyn EmailDomainProvider>> {
        let api_key = api_key.trim().to_string();
        log::debug!("Creating email provider client (key {})", mask_secret(&api_key));
        if let Some(base_url) = &self.base_url {
            let provider =
                domain_provisioner_provider::SendgridProvider::new(api_key)?.with_base_url(base_url);
            return Ok(Arc::new(provider));
        }
        Ok(create_email_provider(ProviderCredentials::Sendgrid { api_key })?)
    }
}
