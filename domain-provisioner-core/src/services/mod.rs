//! 业务逻辑服务层

mod chat_auth;
mod dns_reconciler;
mod domain_auth_service;
mod web_dns_service;
mod widget_service;

pub use chat_auth::{verify_login_widget, BotIdentityCache};
pub use dns_reconciler::DnsReconciler;
pub use domain_auth_service::DomainAuthService;
pub use web_dns_service::WebDnsService;
pub use widget_service::WidgetService;

use std::sync::Arc;

use domain_provisioner_provider::{
    create_dns_provider, create_widget_provider, DnsProvider, WidgetProvider, Zone,
};

use crate::config::ProvisionerConfig;
use crate::error::{CoreError, CoreResult};
use crate::traits::{EmailProviderFactory, SendgridProviderFactory};
use crate::utils::domain_locks::DomainLocks;

/// 服务上下文 - 持有所有依赖
///
/// Providers are optional: a missing DNS provider is reported by each operation's
/// preflight instead of failing construction.
pub struct ServiceContext {
    config: ProvisionerConfig,
    dns_provider: Option<Arc<dyn DnsProvider>>,
    widget_provider: Option<Arc<dyn WidgetProvider>>,
    email_factory: Arc<dyn EmailProviderFactory>,
    locks: DomainLocks,
}

impl ServiceContext {
    /// 创建服务上下文
    #[must_use]
    pub fn new(
        config: ProvisionerConfig,
        dns_provider: Option<Arc<dyn DnsProvider>>,
        widget_provider: Option<Arc<dyn WidgetProvider>>,
        email_factory: Arc<dyn EmailProviderFactory>,
    ) -> Self {
        Self {
            config,
            dns_provider,
            widget_provider,
            email_factory,
            locks: DomainLocks::new(),
        }
    }

    /// Builds the real provider clients from the configured credentials.
    pub fn from_config(config: ProvisionerConfig) -> CoreResult<Self> {
        let (dns, widgets) = match &config.cloudflare {
            Some(credentials) => (
                Some(create_dns_provider(credentials.clone())?),
                Some(create_widget_provider(credentials.clone())?),
            ),
            None => (None, None),
        };
        Ok(Self::new(
            config,
            dns,
            widgets,
            Arc::new(SendgridProviderFactory::new()),
        ))
    }

    pub fn config(&self) -> &ProvisionerConfig {
        &self.config
    }

    /// 获取 DNS Provider 实例
    pub fn dns_provider(&self) -> CoreResult<Arc<dyn DnsProvider>> {
        self.dns_provider
            .clone()
            .ok_or_else(|| CoreError::ConfigurationError("Cloudflare credentials not available".to_string()))
    }

    /// 获取 Widget Provider 实例
    pub fn widget_provider(&self) -> CoreResult<Arc<dyn WidgetProvider>> {
        self.widget_provider
            .clone()
            .ok_or_else(|| CoreError::ConfigurationError("Cloudflare credentials not available".to_string()))
    }

    pub fn email_factory(&self) -> &dyn EmailProviderFactory {
        self.email_factory.as_ref()
    }

    pub fn locks(&self) -> &DomainLocks {
        &self.locks
    }
}

/// Zone hosting `domain`; a missing zone is [`CoreError::NotFound`].
pub(crate) async fn find_zone(dns: &dyn DnsProvider, domain: &str) -> CoreResult<Zone> {
    dns.find_zone(domain)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("zone {domain}")))
}
