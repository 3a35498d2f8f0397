//! Cloudflare Provider (DNS + Turnstile)

mod error;
mod http;
mod provider;
mod types;
mod widgets;

use reqwest::Client;

use crate::error::{ProviderError, Result};
use crate::providers::common::{create_http_client, normalize_base_url};
use crate::types::ProviderCredentials;

pub(crate) use types::{
    CloudflareDnsRecord, CloudflareRecordBody, CloudflareResponse, CloudflareWidget,
    CloudflareWidgetBody, CloudflareZone,
};

pub(crate) const CF_API_BASE: &str = "https://api.cloudflare.com/client/v4";
/// Cloudflare DNS Records API 单页最大记录数
pub(crate) const MAX_PAGE_SIZE_RECORDS: u32 = 100;
/// 幂等请求（GET/PUT）的最大重试次数
pub(crate) const MAX_RETRIES: u32 = 2;

/// Cloudflare 认证方式
#[derive(Clone)]
pub(crate) enum CloudflareAuth {
    /// `X-Auth-Email` + `X-Auth-Key`
    GlobalKey { email: String, api_key: String },
    /// `Authorization: Bearer`
    Token(String),
}

/// Cloudflare Provider
pub struct CloudflareProvider {
    pub(crate) client: Client,
    pub(crate) auth: CloudflareAuth,
    pub(crate) base_url: String,
}

// Secrets stay out of debug output
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("auth", &"***")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl CloudflareProvider {
    /// Global API key authentication (two static headers).
    pub fn with_global_key(email: String, api_key: String) -> Result<Self> {
        Self::build(CloudflareAuth::GlobalKey { email, api_key })
    }

    /// Scoped API token authentication.
    pub fn with_api_token(api_token: String) -> Result<Self> {
        Self::build(CloudflareAuth::Token(api_token))
    }

    /// Build from generic credentials; anything but Cloudflare credentials is rejected.
    pub fn from_credentials(credentials: ProviderCredentials) -> Result<Self> {
        match credentials {
            ProviderCredentials::Cloudflare { email, api_key } => {
                Self::with_global_key(email, api_key)
            }
            ProviderCredentials::CloudflareToken { api_token } => Self::with_api_token(api_token),
            #[allow(unreachable_patterns)]
            other => Err(ProviderError::InvalidParameter {
                provider: "cloudflare".to_string(),
                param: "credentials".to_string(),
                detail: format!("expected Cloudflare credentials, got {}", other.provider_type()),
            }),
        }
    }

    /// Point the client at another API root (mock servers, API gateways).
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }

    fn build(auth: CloudflareAuth) -> Result<Self> {
        Ok(Self {
            client: create_http_client("cloudflare")?,
            auth,
            base_url: CF_API_BASE.to_string(),
        })
    }
}
