//! SendGrid HTTP 请求方法

use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ProviderError, Result};
use crate::http_client::HttpUtils;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};
use crate::utils::log_sanitizer::truncate_for_log;

use super::{MAX_RETRIES, SendgridErrorBody, SendgridProvider};

impl SendgridProvider {
    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.api_key)
    }

    /// 发送请求，非 2xx 时解析 `errors` 数组并映射
    ///
    /// 返回原始响应体；POST 不重试。
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        context: ErrorContext,
    ) -> Result<String> {
        let url = format!("{}{path}", self.base_url);
        let method_name = method.as_str().to_string();
        let retries = if method == Method::POST {
            0
        } else {
            MAX_RETRIES
        };

        let mut builder = self.authorize(self.client.request(method, &url));
        if let Some(body) = &body {
            log::debug!("Request Body: {}", truncate_for_log(&body.to_string()));
            builder = builder.json(body);
        }

        let (status, response_text) = HttpUtils::execute_request_with_retry(
            builder,
            self.provider_name(),
            &method_name,
            &url,
            retries,
        )
        .await?;

        if (200..300).contains(&status) {
            return Ok(response_text);
        }

        let raw = match serde_json::from_str::<SendgridErrorBody>(&response_text) {
            Ok(parsed) if !parsed.errors.is_empty() => RawApiError {
                code: parsed.errors.iter().find_map(|e| e.field.clone()),
                message: parsed
                    .errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
                status: Some(status),
            },
            _ => RawApiError::new(truncate_for_log(&response_text)).status(status),
        };

        let err = self.map_error(raw, context);
        if err.is_expected() {
            log::warn!("API 错误: {err}");
        } else {
            log::error!("API 错误: {err}");
        }
        Err(err)
    }

    pub(crate) fn to_body(&self, body: &impl Serialize) -> Result<serde_json::Value> {
        serde_json::to_value(body).map_err(|e| ProviderError::SerializationError {
            provider: self.provider_name().to_string(),
            detail: e.to_string(),
        })
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        context: ErrorContext,
    ) -> Result<T> {
        let text = self.send(Method::GET, path, None, context).await?;
        HttpUtils::parse_json(&text, self.provider_name())
    }

    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<serde_json::Value>,
        context: ErrorContext,
    ) -> Result<T> {
        let text = self.send(Method::POST, path, body, context).await?;
        HttpUtils::parse_json(&text, self.provider_name())
    }

    /// POST 且忽略响应体
    pub(crate) async fn post_no_content(
        &self,
        path: &str,
        body: &impl Serialize,
        context: ErrorContext,
    ) -> Result<()> {
        let body = self.to_body(body)?;
        self.send(Method::POST, path, Some(body), context).await?;
        Ok(())
    }
}
