//! Telegram Bot API client (bot identity only)

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{ProviderError, Result};
use crate::http_client::HttpUtils;
use crate::providers::common::{create_http_client, normalize_base_url};
use crate::traits::{BotDirectory, ErrorContext, ProviderErrorMapper, RawApiError};
use crate::types::{BotIdentity, ProviderCredentials};

const TG_API_BASE: &str = "https://api.telegram.org";
const MAX_RETRIES: u32 = 2;

/// Bot API 响应信封
#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    error_code: Option<i64>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramUser {
    id: i64,
    username: Option<String>,
}

/// Telegram Provider
pub struct TelegramProvider {
    client: Client,
    bot_token: String,
    base_url: String,
}

impl TelegramProvider {
    pub fn new(bot_token: String) -> Result<Self> {
        Ok(Self {
            client: create_http_client("telegram")?,
            bot_token,
            base_url: TG_API_BASE.to_string(),
        })
    }

    pub fn from_credentials(credentials: ProviderCredentials) -> Result<Self> {
        match credentials {
            ProviderCredentials::Telegram { bot_token } => Self::new(bot_token),
            #[allow(unreachable_patterns)]
            other => Err(ProviderError::InvalidParameter {
                provider: "telegram".to_string(),
                param: "credentials".to_string(),
                detail: format!("expected Telegram credentials, got {}", other.provider_type()),
            }),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }
}

impl ProviderErrorMapper for TelegramProvider {
    fn provider_name(&self) -> &'static str {
        "telegram"
    }

    fn map_error(&self, raw: RawApiError, _context: ErrorContext) -> ProviderError {
        let provider = self.provider_name().to_string();
        // Bot API 的 error_code 即 HTTP 状态码
        match raw.code.as_deref() {
            Some("401" | "404") => ProviderError::InvalidCredentials {
                provider,
                raw_message: Some(raw.message),
            },
            Some("403") => ProviderError::PermissionDenied {
                provider,
                raw_message: Some(raw.message),
            },
            _ => self.unknown_error(raw),
        }
    }
}

#[async_trait]
impl BotDirectory for TelegramProvider {
    async fn get_me(&self) -> Result<BotIdentity> {
        let url = format!("{}/bot{}/getMe", self.base_url, self.bot_token);
        // URL 中含 token，日志只写方法名
        let (status, text) = HttpUtils::execute_request_with_retry(
            self.client.get(&url),
            self.provider_name(),
            "GET",
            "getMe",
            MAX_RETRIES,
        )
        .await?;

        let response: TelegramResponse<TelegramUser> =
            match HttpUtils::parse_json(&text, self.provider_name()) {
                Ok(parsed) => parsed,
                Err(_) if !(200..300).contains(&status) => {
                    return Err(self.map_error(
                        RawApiError::with_code(status.to_string(), "non-JSON error response"),
                        ErrorContext::default(),
                    ));
                }
                Err(e) => return Err(e),
            };

        if !response.ok {
            let code = response.error_code.unwrap_or(i64::from(status));
            let err = self.map_error(
                RawApiError::with_code(
                    code.to_string(),
                    response.description.unwrap_or_else(|| "Unknown error".to_string()),
                )
                .status(status),
                ErrorContext::default(),
            );
            log::warn!("API 错误: {err}");
            return Err(err);
        }

        let user = response
            .result
            .ok_or_else(|| self.parse_error("响应中缺少 result 字段"))?;
        let username = user
            .username
            .ok_or_else(|| self.parse_error("bot has no username"))?;

        Ok(BotIdentity {
            id: user.id.to_string(),
            username,
        })
    }
}
