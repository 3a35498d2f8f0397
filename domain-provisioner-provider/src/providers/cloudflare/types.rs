//! Cloudflare API 类型定义

use serde::{Deserialize, Serialize};

use crate::types::{WidgetMode, WidgetRequest};

/// Cloudflare API 通用响应
#[derive(Debug, Deserialize)]
pub struct CloudflareResponse<T> {
    pub success: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub errors: Vec<CloudflareError>,
    pub result_info: Option<CloudflareResultInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudflareError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CloudflareResultInfo {
    #[allow(dead_code)]
    pub page: u32,
    #[allow(dead_code)]
    pub per_page: u32,
    pub total_count: u32,
}

/// Zone 所属账户
#[derive(Debug, Deserialize)]
pub struct CloudflareAccountRef {
    pub id: String,
}

/// Cloudflare Zone 结构
#[derive(Debug, Deserialize)]
pub struct CloudflareZone {
    pub id: String,
    pub name: String,
    pub account: Option<CloudflareAccountRef>,
}

/// Cloudflare DNS Record 结构（响应）
#[derive(Debug, Deserialize)]
pub struct CloudflareDnsRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub ttl: Option<u32>,
    pub proxied: Option<bool>,
    #[serde(default, with = "crate::utils::datetime")]
    pub modified_on: Option<chrono::DateTime<chrono::Utc>>,
}

/// 创建/更新 DNS 记录的请求体
#[derive(Debug, Serialize)]
pub struct CloudflareRecordBody<'a> {
    #[serde(rename = "type")]
    pub record_type: &'a str,
    pub name: &'a str,
    pub content: &'a str,
    pub proxied: bool,
    /// 1 表示自动
    pub ttl: u32,
}

/// Turnstile 组件（响应）
#[derive(Debug, Deserialize)]
pub struct CloudflareWidget {
    pub sitekey: String,
    pub secret: Option<String>,
    pub name: String,
    #[serde(default)]
    pub domains: Vec<String>,
}

/// 创建 Turnstile 组件的请求体
#[derive(Debug, Serialize)]
pub struct CloudflareWidgetBody<'a> {
    pub name: &'a str,
    pub domains: &'a [String],
    pub mode: WidgetMode,
    pub bot_fight_mode: bool,
}

impl<'a> From<&'a WidgetRequest> for CloudflareWidgetBody<'a> {
    fn from(req: &'a WidgetRequest) -> Self {
        Self {
            name: &req.name,
            domains: &req.domains,
            mode: req.mode,
            bot_fight_mode: req.bot_fight_mode,
        }
    }
}
