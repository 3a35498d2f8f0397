//! Provisioning configuration
//!
//! Credentials are read from the environment by the embedding application and handed in;
//! nothing here is persisted.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use domain_provisioner_provider::{ProviderCredentials, ProviderType, VerifiedSenderRequest, WidgetMode};

/// Global key authentication: account e-mail
pub const ENV_CLOUDFLARE_EMAIL: &str = "CLOUDFLARE_EMAIL";
/// Global key authentication: API key
pub const ENV_CLOUDFLARE_API_KEY: &str = "CLOUDFLARE_API_KEY";
/// Scoped token authentication
pub const ENV_CLOUDFLARE_API_TOKEN: &str = "CLOUDFLARE_API_TOKEN";

/// 退避方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    /// 每次等待相同时长
    #[default]
    Fixed,
    /// 每次等待时长翻倍，不超过 `max_delay_ms`
    Exponential,
}

/// 域名验证轮询策略
///
/// Always [`MAX_ATTEMPTS`](Self::MAX_ATTEMPTS) attempts; only the delays are
/// configurable. A delay is slept before every attempt, the first one included, so
/// the worst case blocks for the sum of all delays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryPolicy {
    pub delay_ms: u64,
    pub backoff: Backoff,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay_ms: 5_000,
            backoff: Backoff::Fixed,
            max_delay_ms: 60_000,
        }
    }
}

impl RetryPolicy {
    /// 验证次数上限，不可配置
    pub const MAX_ATTEMPTS: u32 = 3;

    /// Delay slept before `attempt` (1-based).
    pub fn delay_before(&self, attempt: u32) -> Duration {
        let base = Duration::from_millis(self.delay_ms);
        match self.backoff {
            Backoff::Fixed => base,
            Backoff::Exponential => {
                let shift = attempt.saturating_sub(1).min(20);
                let ms = self.delay_ms.saturating_mul(1_u64 << shift);
                Duration::from_millis(ms.min(self.max_delay_ms.max(self.delay_ms)))
            }
        }
    }
}

/// 已验证发件人模板（地址字段为邮件服务商要求的实体地址）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SenderTemplate {
    /// Local part of the sending address, `<local>@<domain>`
    pub local_part: String,
    pub display_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

impl Default for SenderTemplate {
    fn default() -> Self {
        Self {
            local_part: "noreply".to_string(),
            display_name: "Gerald Dashboard".to_string(),
            address: "123 Main St".to_string(),
            city: "Edmonton".to_string(),
            state: "AB".to_string(),
            zip: "T5A0A1".to_string(),
            country: "CA".to_string(),
        }
    }
}

impl SenderTemplate {
    pub fn sender_email(&self, domain: &str) -> String {
        format!("{}@{domain}", self.local_part)
    }

    /// Registration payload for `domain`; reply-to is the sender itself.
    pub fn request_for(&self, domain: &str) -> VerifiedSenderRequest {
        let email = self.sender_email(domain);
        VerifiedSenderRequest {
            nickname: self.display_name.clone(),
            from_email: email.clone(),
            from_name: self.display_name.clone(),
            reply_to: email,
            reply_to_name: self.display_name.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip: self.zip.clone(),
            country: self.country.clone(),
        }
    }
}

/// 人机验证组件设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WidgetSettings {
    /// Subdomain labels allowed next to the apex
    pub subdomains: Vec<String>,
    pub mode: WidgetMode,
    pub bot_fight_mode: bool,
    /// Appended to the domain to form the widget name
    pub name_suffix: String,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            subdomains: vec!["dev".to_string(), "gerald".to_string()],
            mode: WidgetMode::Managed,
            bot_fight_mode: false,
            name_suffix: " Contact Form".to_string(),
        }
    }
}

impl WidgetSettings {
    pub fn widget_name(&self, domain: &str) -> String {
        format!("{domain}{}", self.name_suffix)
    }

    /// Apex first, then `<label>.<domain>` for every configured label.
    pub fn widget_domains(&self, domain: &str) -> Vec<String> {
        std::iter::once(domain.to_string())
            .chain(self.subdomains.iter().map(|label| format!("{label}.{domain}")))
            .collect()
    }
}

fn default_web_subdomains() -> Vec<String> {
    ["www", "dev", "gerald"].iter().map(ToString::to_string).collect()
}

/// 编排器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProvisionerConfig {
    /// DNS provider credentials; also used for widgets
    pub cloudflare: Option<ProviderCredentials>,
    /// Validation polling
    pub validation: RetryPolicy,
    pub sender: SenderTemplate,
    pub widget: WidgetSettings,
    /// Subdomain labels that get a CNAME to the hosting target
    pub web_subdomains: Vec<String>,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            cloudflare: None,
            validation: RetryPolicy::default(),
            sender: SenderTemplate::default(),
            widget: WidgetSettings::default(),
            web_subdomains: default_web_subdomains(),
        }
    }
}

impl ProvisionerConfig {
    /// Defaults plus Cloudflare credentials from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    ///
    /// Blank values count as absent. A token wins over the global key. A global key
    /// with only one of its two halves set leaves Cloudflare unconfigured, so every
    /// operation fails its preflight instead of the whole load failing.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut fields = HashMap::new();
        for (env_key, field) in [
            (ENV_CLOUDFLARE_API_TOKEN, "apiToken"),
            (ENV_CLOUDFLARE_EMAIL, "email"),
            (ENV_CLOUDFLARE_API_KEY, "apiKey"),
        ] {
            if let Some(value) = lookup(env_key).filter(|v| !v.trim().is_empty()) {
                fields.insert(field.to_string(), value);
            }
        }

        let cloudflare = if fields.is_empty() {
            log::debug!("No Cloudflare credentials in environment");
            None
        } else {
            match ProviderCredentials::from_map(&ProviderType::Cloudflare, &fields) {
                Ok(credentials) => Some(credentials),
                Err(e) => {
                    log::warn!("Ignoring incomplete Cloudflare credentials: {e}");
                    None
                }
            }
        };

        Self {
            cloudflare,
            ..Self::default()
        }
    }
}
