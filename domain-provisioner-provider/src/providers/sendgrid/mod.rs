//! SendGrid Provider (domain authentication + verified senders)

mod error;
mod http;
mod provider;
mod types;

use reqwest::Client;

use crate::error::{ProviderError, Result};
use crate::providers::common::{create_http_client, normalize_base_url};
use crate::types::ProviderCredentials;

pub(crate) use types::{
    SendgridCreateDomainBody, SendgridDomain, SendgridErrorBody, SendgridValidation,
};

pub(crate) const SG_API_BASE: &str = "https://api.sendgrid.com/v3";
/// 幂等请求（GET）的最大重试次数
pub(crate) const MAX_RETRIES: u32 = 2;

/// SendGrid Provider
pub struct SendgridProvider {
    pub(crate) client: Client,
    pub(crate) api_key: String,
    pub(crate) base_url: String,
}

// Secrets stay out of debug output
impl std::fmt::Debug for SendgridProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendgridProvider")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SendgridProvider {
    pub fn new(api_key: String) -> Result<Self> {
        Ok(Self {
            client: create_http_client("sendgrid")?,
            api_key,
            base_url: SG_API_BASE.to_string(),
        })
    }

    /// Build from generic credentials; anything but SendGrid credentials is rejected.
    pub fn from_credentials(credentials: ProviderCredentials) -> Result<Self> {
        match credentials {
            ProviderCredentials::Sendgrid { api_key } => Self::new(api_key),
            #[allow(unreachable_patterns)]
            other => Err(ProviderError::InvalidParameter {
                provider: "sendgrid".to_string(),
                param: "credentials".to_string(),
                detail: format!("expected SendGrid credentials, got {}", other.provider_type()),
            }),
        }
    }

    /// Point the client at another API root (mock servers, API gateways).
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }
}
