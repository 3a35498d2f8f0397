//! 测试辅助模块
//!
//! 提供 mock 实现和便捷的测试工厂方法。

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use domain_provisioner_provider::{
    AuthDnsRecord, BotDirectory, BotIdentity, DesiredRecord, DnsProvider, DnsRecordType,
    DomainAuth, DomainAuthDns, DomainValidation, EmailDomainProvider, ExistingRecord,
    ProviderError, Result, VerifiedSenderRequest, Widget, WidgetProvider, WidgetRequest, Zone,
};
use tokio::sync::RwLock;

use crate::config::ProvisionerConfig;
use crate::error::CoreResult;
use crate::services::ServiceContext;
use crate::traits::EmailProviderFactory;
use crate::utils::domain::same_host;

fn bump(counter: &AtomicUsize) -> usize {
    counter.fetch_add(1, Ordering::SeqCst) + 1
}

pub fn existing_cname(id: &str, name: &str, content: &str) -> ExistingRecord {
    ExistingRecord {
        id: id.to_string(),
        name: name.to_string(),
        record_type: "CNAME".to_string(),
        content: content.to_string(),
        proxied: Some(false),
        ttl: Some(1),
        updated_at: None,
    }
}

// ===== MockDnsProvider =====

#[derive(Default)]
pub struct MockDnsProvider {
    zones: RwLock<HashMap<String, Zone>>,
    records: RwLock<HashMap<String, Vec<ExistingRecord>>>,
    /// 如果 Some，find_zone 返回此错误
    zone_error: RwLock<Option<ProviderError>>,
    /// 如果 Some，list_records 返回此错误
    list_error: RwLock<Option<ProviderError>>,
    /// 按记录名注入写入错误
    write_errors: RwLock<HashMap<String, ProviderError>>,
    find_zone_calls: AtomicUsize,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// One zone owned by account `acct-1`.
    pub fn with_zone(zone_id: &str, name: &str) -> Self {
        let zone = Zone {
            id: zone_id.to_string(),
            name: name.to_string(),
            account_id: Some("acct-1".to_string()),
        };
        Self {
            zones: RwLock::new(HashMap::from([(zone_id.to_string(), zone)])),
            ..Self::default()
        }
    }

    pub async fn insert_record(&self, zone_id: &str, record: ExistingRecord) {
        self.records
            .write()
            .await
            .entry(zone_id.to_string())
            .or_default()
            .push(record);
    }

    pub async fn records(&self, zone_id: &str) -> Vec<ExistingRecord> {
        self.records
            .read()
            .await
            .get(zone_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn fail_find_zone(&self, err: ProviderError) {
        *self.zone_error.write().await = Some(err);
    }

    pub async fn fail_list(&self, err: ProviderError) {
        *self.list_error.write().await = Some(err);
    }

    pub async fn fail_writes_for(&self, name: &str, err: ProviderError) {
        self.write_errors.write().await.insert(name.to_string(), err);
    }

    pub fn find_zone_calls(&self) -> usize {
        self.find_zone_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.find_zone_calls() + self.list_calls() + self.create_calls() + self.update_calls()
    }

    async fn write_error(&self, name: &str) -> Option<ProviderError> {
        self.write_errors.read().await.get(name).cloned()
    }
}

#[async_trait]
impl DnsProvider for MockDnsProvider {
    fn id(&self) -> &'static str {
        "mock-dns"
    }

    async fn find_zone(&self, name: &str) -> Result<Option<Zone>> {
        bump(&self.find_zone_calls);
        if let Some(err) = self.zone_error.read().await.clone() {
            return Err(err);
        }
        Ok(self
            .zones
            .read()
            .await
            .values()
            .find(|z| same_host(&z.name, name))
            .cloned())
    }

    async fn get_zone(&self, zone_id: &str) -> Result<Zone> {
        self.zones
            .read()
            .await
            .get(zone_id)
            .cloned()
            .ok_or_else(|| ProviderError::DomainNotFound {
                provider: "mock-dns".to_string(),
                domain: zone_id.to_string(),
                raw_message: None,
            })
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<ExistingRecord>> {
        bump(&self.list_calls);
        if let Some(err) = self.list_error.read().await.clone() {
            return Err(err);
        }
        Ok(self.records(zone_id).await)
    }

    async fn create_record(&self, zone_id: &str, record: &DesiredRecord) -> Result<ExistingRecord> {
        let n = bump(&self.create_calls);
        if let Some(err) = self.write_error(&record.name).await {
            return Err(err);
        }
        let created = ExistingRecord {
            id: format!("rec-{n}"),
            name: record.name.clone(),
            record_type: record.record_type.as_str().to_string(),
            content: record.content.clone(),
            proxied: Some(record.proxied),
            ttl: Some(1),
            updated_at: None,
        };
        self.insert_record(zone_id, created.clone()).await;
        Ok(created)
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &DesiredRecord,
    ) -> Result<ExistingRecord> {
        bump(&self.update_calls);
        if let Some(err) = self.write_error(&record.name).await {
            return Err(err);
        }
        let mut records = self.records.write().await;
        let existing = records
            .get_mut(zone_id)
            .and_then(|rs| rs.iter_mut().find(|r| r.id == record_id))
            .ok_or_else(|| ProviderError::RecordNotFound {
                provider: "mock-dns".to_string(),
                record_id: record_id.to_string(),
                raw_message: None,
            })?;
        existing.name = record.name.clone();
        existing.record_type = record.record_type.as_str().to_string();
        existing.content = record.content.clone();
        existing.proxied = Some(record.proxied);
        Ok(existing.clone())
    }
}

// ===== MockWidgetProvider =====

#[derive(Default)]
pub struct MockWidgetProvider {
    /// zone_id -> account_id
    accounts: RwLock<HashMap<String, String>>,
    /// 含 secret 的完整组件
    widgets: RwLock<Vec<Widget>>,
    create_error: RwLock<Option<ProviderError>>,
    list_calls: AtomicUsize,
    get_calls: AtomicUsize,
    create_calls: AtomicUsize,
}

impl MockWidgetProvider {
    pub fn with_account(zone_id: &str, account_id: &str) -> Self {
        Self {
            accounts: RwLock::new(HashMap::from([(
                zone_id.to_string(),
                account_id.to_string(),
            )])),
            ..Self::default()
        }
    }

    pub async fn insert_widget(&self, widget: Widget) {
        self.widgets.write().await.push(widget);
    }

    pub async fn fail_create(&self, err: ProviderError) {
        *self.create_error.write().await = Some(err);
    }

    pub async fn widget_count(&self) -> usize {
        self.widgets.read().await.len()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WidgetProvider for MockWidgetProvider {
    fn id(&self) -> &'static str {
        "mock-widgets"
    }

    async fn account_id_for_zone(&self, zone_id: &str) -> Result<Option<String>> {
        Ok(self.accounts.read().await.get(zone_id).cloned())
    }

    async fn list_widgets(&self, _account_id: &str) -> Result<Vec<Widget>> {
        bump(&self.list_calls);
        Ok(self
            .widgets
            .read()
            .await
            .iter()
            .map(|w| Widget {
                secret: None,
                ..w.clone()
            })
            .collect())
    }

    async fn get_widget(&self, _account_id: &str, site_key: &str) -> Result<Widget> {
        bump(&self.get_calls);
        self.widgets
            .read()
            .await
            .iter()
            .find(|w| w.site_key == site_key)
            .cloned()
            .ok_or_else(|| ProviderError::Unknown {
                provider: "mock-widgets".to_string(),
                raw_code: None,
                raw_message: format!("widget {site_key} not found"),
            })
    }

    async fn create_widget(&self, _account_id: &str, request: &WidgetRequest) -> Result<Widget> {
        let n = bump(&self.create_calls);
        if let Some(err) = self.create_error.read().await.clone() {
            return Err(err);
        }
        let widget = Widget {
            site_key: format!("0x4AAA{n}"),
            secret: Some(format!("0x4AAA{n}-secret")),
            name: request.name.clone(),
            domains: request.domains.clone(),
        };
        self.insert_widget(widget.clone()).await;
        Ok(widget)
    }
}

// ===== MockEmailProvider =====

fn auth_record(host: String, data: String) -> Option<AuthDnsRecord> {
    Some(AuthDnsRecord {
        host,
        record_type: DnsRecordType::Cname,
        data,
    })
}

/// Domain authentication with all three CNAMEs, as the email provider returns it.
pub fn domain_auth(id: &str, domain: &str) -> DomainAuth {
    DomainAuth {
        id: id.to_string(),
        domain: domain.to_string(),
        valid: false,
        dns: DomainAuthDns {
            mail_cname: auth_record(format!("em1.{domain}"), "u1.wl.sendgrid.net".to_string()),
            dkim1: auth_record(
                format!("s1._domainkey.{domain}"),
                "s1.domainkey.u1.wl.sendgrid.net".to_string(),
            ),
            dkim2: auth_record(
                format!("s2._domainkey.{domain}"),
                "s2.domainkey.u1.wl.sendgrid.net".to_string(),
            ),
        },
    }
}

#[derive(Default)]
pub struct MockEmailProvider {
    auths: RwLock<Vec<DomainAuth>>,
    /// 按顺序消费；耗尽后返回 valid=false
    validations: RwLock<VecDeque<Result<DomainValidation>>>,
    list_error: RwLock<Option<ProviderError>>,
    create_error: RwLock<Option<ProviderError>>,
    sender_error: RwLock<Option<ProviderError>>,
    senders: RwLock<Vec<VerifiedSenderRequest>>,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    validate_calls: AtomicUsize,
    sender_calls: AtomicUsize,
}

impl MockEmailProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_auth(&self, auth: DomainAuth) {
        self.auths.write().await.push(auth);
    }

    pub async fn push_validation(&self, result: Result<DomainValidation>) {
        self.validations.write().await.push_back(result);
    }

    pub async fn fail_list(&self, err: ProviderError) {
        *self.list_error.write().await = Some(err);
    }

    pub async fn fail_create(&self, err: ProviderError) {
        *self.create_error.write().await = Some(err);
    }

    pub async fn fail_sender(&self, err: ProviderError) {
        *self.sender_error.write().await = Some(err);
    }

    pub async fn senders(&self) -> Vec<VerifiedSenderRequest> {
        self.senders.read().await.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn validate_calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }

    pub fn sender_calls(&self) -> usize {
        self.sender_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmailDomainProvider for MockEmailProvider {
    fn id(&self) -> &'static str {
        "mock-email"
    }

    async fn list_domain_auths(&self) -> Result<Vec<DomainAuth>> {
        bump(&self.list_calls);
        if let Some(err) = self.list_error.read().await.clone() {
            return Err(err);
        }
        Ok(self.auths.read().await.clone())
    }

    async fn create_domain_auth(&self, domain: &str) -> Result<DomainAuth> {
        let n = bump(&self.create_calls);
        if let Some(err) = self.create_error.read().await.clone() {
            return Err(err);
        }
        let auth = domain_auth(&format!("auth-{n}"), domain);
        self.insert_auth(auth.clone()).await;
        Ok(auth)
    }

    async fn validate_domain_auth(&self, _domain_auth_id: &str) -> Result<DomainValidation> {
        bump(&self.validate_calls);
        self.validations
            .write()
            .await
            .pop_front()
            .unwrap_or(Ok(DomainValidation {
                valid: false,
                validation_results: None,
            }))
    }

    async fn create_verified_sender(&self, sender: &VerifiedSenderRequest) -> Result<()> {
        bump(&self.sender_calls);
        if let Some(err) = self.sender_error.read().await.clone() {
            return Err(err);
        }
        self.senders.write().await.push(sender.clone());
        Ok(())
    }
}

/// Hands out the same mock for every key and records the keys it saw.
pub struct MockEmailFactory {
    provider: Arc<MockEmailProvider>,
    keys: std::sync::Mutex<Vec<String>>,
}

impl MockEmailFactory {
    pub fn new(provider: Arc<MockEmailProvider>) -> Self {
        Self {
            provider,
            keys: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().map(|k| k.clone()).unwrap_or_default()
    }
}

impl EmailProviderFactory for MockEmailFactory {
    fn create(&self, api_key: &str) -> CoreResult<Arc<dyn EmailDomainProvider>> {
        if let Ok(mut keys) = self.keys.lock() {
            keys.push(api_key.to_string());
        }
        Ok(self.provider.clone())
    }
}

// ===== MockBotDirectory =====

/// Fails the first `failures` calls, then answers.
pub struct MockBotDirectory {
    failures: AtomicUsize,
    calls: AtomicUsize,
}

impl MockBotDirectory {
    pub fn new(failures: usize) -> Self {
        Self {
            failures: AtomicUsize::new(failures),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BotDirectory for MockBotDirectory {
    async fn get_me(&self) -> Result<BotIdentity> {
        bump(&self.calls);
        // 让并发调用方有机会排队
        tokio::task::yield_now().await;
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ProviderError::NetworkError {
                provider: "mock-bot".to_string(),
                detail: "connection reset".to_string(),
            });
        }
        Ok(BotIdentity {
            id: "42".to_string(),
            username: "gerald_bot".to_string(),
        })
    }
}

// ===== 工厂方法 =====

pub struct TestContext {
    pub ctx: Arc<ServiceContext>,
    pub dns: Arc<MockDnsProvider>,
    pub widgets: Arc<MockWidgetProvider>,
    pub email: Arc<MockEmailProvider>,
    pub email_factory: Arc<MockEmailFactory>,
}

/// 创建测试用 `ServiceContext`：zone `Z1` = `example.com`，账户 `acct-1`
pub fn create_test_context() -> TestContext {
    create_test_context_with(ProvisionerConfig::default(), true)
}

/// `with_dns == false` simulates missing Cloudflare credentials.
pub fn create_test_context_with(config: ProvisionerConfig, with_dns: bool) -> TestContext {
    let dns = Arc::new(MockDnsProvider::with_zone("Z1", "example.com"));
    let widgets = Arc::new(MockWidgetProvider::with_account("Z1", "acct-1"));
    let email = Arc::new(MockEmailProvider::new());
    let email_factory = Arc::new(MockEmailFactory::new(email.clone()));

    let (dns_provider, widget_provider): (Option<Arc<dyn DnsProvider>>, Option<Arc<dyn WidgetProvider>>) =
        if with_dns {
            (Some(dns.clone()), Some(widgets.clone()))
        } else {
            (None, None)
        };

    let ctx = Arc::new(ServiceContext::new(
        config,
        dns_provider,
        widget_provider,
        email_factory.clone(),
    ));

    TestContext {
        ctx,
        dns,
        widgets,
        email,
        email_factory,
    }
}
