use async_trait::async_trait;

use crate::error::{ProviderError, Result};
use crate::types::{
    BotIdentity, DesiredRecord, DomainAuth, DomainValidation, ExistingRecord,
    VerifiedSenderRequest, Widget, WidgetRequest, Zone,
};

/// 原始 API 错误（内部使用）
#[derive(Debug, Clone)]
pub(crate) struct RawApiError {
    /// 错误码（各 Provider 格式不同）
    pub code: Option<String>,
    /// 原始错误消息
    pub message: String,
    /// HTTP 状态码
    pub status: Option<u16>,
}

impl RawApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
            status: None,
        }
    }

    #[must_use]
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// 错误上下文信息（内部使用）
/// 用于在映射错误时提供额外信息
#[derive(Debug, Clone, Default)]
pub(crate) struct ErrorContext {
    /// 资源名称（记录名、发件人地址等，用于 `AlreadyExists`）
    pub resource: Option<String>,
    /// 记录 ID（用于 `RecordNotFound`）
    pub record_id: Option<String>,
    /// 域名或 zone（用于 `DomainNotFound`）
    pub domain: Option<String>,
}

impl ErrorContext {
    pub fn resource(name: impl Into<String>) -> Self {
        Self {
            resource: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn domain(domain: impl Into<String>) -> Self {
        Self {
            domain: Some(domain.into()),
            ..Self::default()
        }
    }
}

/// Provider 错误映射 Trait（内部使用）
/// 各 Provider 实现此 trait 以将原始 API 错误映射到统一错误类型
pub(crate) trait ProviderErrorMapper {
    /// 返回 Provider 标识符
    fn provider_name(&self) -> &'static str;

    /// 将原始 API 错误映射到统一错误类型
    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError;

    /// 快捷方法：解析错误
    fn parse_error(&self, detail: impl ToString) -> ProviderError {
        ProviderError::ParseError {
            provider: self.provider_name().to_string(),
            detail: detail.to_string(),
        }
    }

    /// 快捷方法：未知错误（fallback）
    fn unknown_error(&self, raw: RawApiError) -> ProviderError {
        ProviderError::Unknown {
            provider: self.provider_name().to_string(),
            raw_code: raw.code,
            raw_message: raw.message,
        }
    }
}

/// DNS 提供商 Trait
///
/// Zone lookup plus the record operations the reconciler needs. Record names are
/// always fully qualified.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// 提供商标识符
    fn id(&self) -> &'static str;

    /// 按域名精确查找 zone，不存在时返回 `None`
    async fn find_zone(&self, name: &str) -> Result<Option<Zone>>;

    /// 获取 zone 详情（含所属账户）
    async fn get_zone(&self, zone_id: &str) -> Result<Zone>;

    /// 获取 zone 下全部 DNS 记录（自动翻页）
    async fn list_records(&self, zone_id: &str) -> Result<Vec<ExistingRecord>>;

    /// 创建 DNS 记录
    async fn create_record(&self, zone_id: &str, record: &DesiredRecord)
    -> Result<ExistingRecord>;

    /// 覆盖更新 DNS 记录（type/name/content/proxied 全量写入）
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &DesiredRecord,
    ) -> Result<ExistingRecord>;
}

/// 邮件投递提供商 Trait（域名认证 + 发件人）
#[async_trait]
pub trait EmailDomainProvider: Send + Sync {
    /// 提供商标识符
    fn id(&self) -> &'static str;

    /// 列出全部域名认证
    async fn list_domain_auths(&self) -> Result<Vec<DomainAuth>>;

    /// 为域名创建认证（启用自动安全，设为默认）
    async fn create_domain_auth(&self, domain: &str) -> Result<DomainAuth>;

    /// 请求一次验证
    async fn validate_domain_auth(&self, domain_auth_id: &str) -> Result<DomainValidation>;

    /// 注册已验证发件人
    ///
    /// 发件人已存在时返回 [`ProviderError::AlreadyExists`]。
    async fn create_verified_sender(&self, sender: &VerifiedSenderRequest) -> Result<()>;
}

/// 人机验证组件提供商 Trait
#[async_trait]
pub trait WidgetProvider: Send + Sync {
    /// 提供商标识符
    fn id(&self) -> &'static str;

    /// 由 zone 解析其所属账户 ID
    async fn account_id_for_zone(&self, zone_id: &str) -> Result<Option<String>>;

    /// 列出账户下全部组件（不含 secret）
    async fn list_widgets(&self, account_id: &str) -> Result<Vec<Widget>>;

    /// 获取组件详情（含 secret）
    async fn get_widget(&self, account_id: &str, site_key: &str) -> Result<Widget>;

    /// 创建组件
    async fn create_widget(&self, account_id: &str, request: &WidgetRequest) -> Result<Widget>;
}

/// 聊天机器人目录 Trait
#[async_trait]
pub trait BotDirectory: Send + Sync {
    /// 查询机器人自身身份
    async fn get_me(&self) -> Result<BotIdentity>;
}
