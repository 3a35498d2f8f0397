//! SendGrid API 类型定义

use serde::{Deserialize, Serialize};

/// 域名认证（whitelabel domain）
#[derive(Debug, Deserialize)]
pub struct SendgridDomain {
    pub id: u64,
    pub domain: String,
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub dns: SendgridDomainDns,
}

/// 域名认证所需的 DNS 记录
#[derive(Debug, Default, Deserialize)]
pub struct SendgridDomainDns {
    pub mail_cname: Option<SendgridDnsRecord>,
    pub dkim1: Option<SendgridDnsRecord>,
    pub dkim2: Option<SendgridDnsRecord>,
}

#[derive(Debug, Deserialize)]
pub struct SendgridDnsRecord {
    pub host: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub data: String,
}

/// 创建域名认证请求体
#[derive(Debug, Serialize)]
pub struct SendgridCreateDomainBody<'a> {
    pub domain: &'a str,
    pub automatic_security: bool,
    pub default: bool,
}

/// 验证结果
#[derive(Debug, Deserialize)]
pub struct SendgridValidation {
    #[serde(default)]
    pub valid: bool,
    pub validation_results: Option<serde_json::Value>,
}

/// 错误响应 `{"errors":[{"field":..,"message":..}]}`
#[derive(Debug, Default, Deserialize)]
pub struct SendgridErrorBody {
    #[serde(default)]
    pub errors: Vec<SendgridErrorItem>,
}

#[derive(Debug, Deserialize)]
pub struct SendgridErrorItem {
    pub field: Option<String>,
    pub message: String,
}
