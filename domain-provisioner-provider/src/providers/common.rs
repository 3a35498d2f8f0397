//! Provider 公共工具函数

use std::time::Duration;

use reqwest::Client;

use crate::error::{ProviderError, Result};
use crate::types::DnsRecordType;

// ============ HTTP Client ============

/// 默认连接超时（秒）
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// 默认请求超时（秒）
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// 创建带超时配置的 HTTP Client
pub fn create_http_client(provider: &str) -> Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| ProviderError::NetworkError {
            provider: provider.to_string(),
            detail: format!("Failed to create HTTP client: {e}"),
        })
}

/// 去掉 base URL 末尾的斜杠
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

// ============ 记录类型转换 ============

/// 将字符串转换为 `DnsRecordType`（大小写不敏感）
pub fn parse_record_type(record_type: &str, provider: &str) -> Result<DnsRecordType> {
    match record_type.to_uppercase().as_str() {
        "A" => Ok(DnsRecordType::A),
        "AAAA" => Ok(DnsRecordType::Aaaa),
        "CNAME" => Ok(DnsRecordType::Cname),
        "MX" => Ok(DnsRecordType::Mx),
        "TXT" => Ok(DnsRecordType::Txt),
        _ => Err(ProviderError::InvalidParameter {
            provider: provider.to_string(),
            param: "record_type".to_string(),
            detail: format!("Unsupported record type: {record_type}"),
        }),
    }
}

// ============ 域名名称处理 ============

/// 去掉域名末尾的点并转为小写
pub fn normalize_domain_name(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// 两个主机名是否指向同一名称
pub fn same_host(a: &str, b: &str) -> bool {
    normalize_domain_name(a) == normalize_domain_name(b)
}
