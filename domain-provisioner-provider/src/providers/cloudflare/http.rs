//! Cloudflare HTTP 请求方法

use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ProviderError, Result};
use crate::http_client::HttpUtils;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};
use crate::utils::log_sanitizer::truncate_for_log;

use super::{CloudflareAuth, CloudflareProvider, CloudflareResponse, MAX_RETRIES};

impl CloudflareProvider {
    /// 附加认证头
    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            CloudflareAuth::GlobalKey { email, api_key } => builder
                .header("X-Auth-Email", email)
                .header("X-Auth-Key", api_key),
            CloudflareAuth::Token(token) => builder.bearer_auth(token),
        }
    }

    /// 发送请求并解包 Cloudflare 响应信封
    ///
    /// `success: false` 会经过错误映射；非 2xx 且响应体不是 JSON 时按 HTTP 状态码映射。
    /// POST 不重试（创建操作非幂等）。
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        context: ErrorContext,
    ) -> Result<CloudflareResponse<T>> {
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

        let cf_response: CloudflareResponse<T> =
            match HttpUtils::parse_json(&response_text, self.provider_name()) {
                Ok(parsed) => parsed,
                Err(_) if !(200..300).contains(&status) => {
                    return Err(self.map_error(
                        RawApiError::new(truncate_for_log(&response_text)).status(status),
                        context,
                    ));
                }
                Err(e) => return Err(e),
            };

        if !cf_response.success {
            let code = cf_response.errors.first().map(|e| e.code.to_string());
            let message = if cf_response.errors.is_empty() {
                "Unknown error".to_string()
            } else {
                cf_response
                    .errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ")
            };
            let raw = RawApiError {
                code,
                message,
                status: Some(status),
            };
            let err = self.map_error(raw, context);
            if err.is_expected() {
                log::warn!("API 错误: {err}");
            } else {
                log::error!("API 错误: {err}");
            }
            return Err(err);
        }

        Ok(cf_response)
    }

    fn to_body(&self, body: &impl Serialize) -> Result<serde_json::Value> {
        serde_json::to_value(body).map_err(|e| ProviderError::SerializationError {
            provider: self.provider_name().to_string(),
            detail: e.to_string(),
        })
    }

    /// 执行 GET 请求，要求响应包含 result
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        context: ErrorContext,
    ) -> Result<T> {
        self.send::<T>(Method::GET, path, None, context)
            .await?
            .result
            .ok_or_else(|| self.parse_error("响应中缺少 result 字段"))
    }

    /// 执行 GET 请求 (带分页信息)，返回当前页数据与总数
    pub(crate) async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        context: ErrorContext,
    ) -> Result<(Vec<T>, u32)> {
        let cf_response = self.send::<Vec<T>>(Method::GET, path, None, context).await?;
        let items = cf_response.result.unwrap_or_default();
        let total_count = cf_response
            .result_info
            .map_or(u32::try_from(items.len()).unwrap_or(u32::MAX), |i| {
                i.total_count
            });
        Ok((items, total_count))
    }

    /// 执行 POST 请求
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
        context: ErrorContext,
    ) -> Result<T> {
        let body = self.to_body(body)?;
        self.send::<T>(Method::POST, path, Some(body), context)
            .await?
            .result
            .ok_or_else(|| self.parse_error("响应中缺少 result 字段"))
    }

    /// 执行 PUT 请求（全量覆盖）
    pub(crate) async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
        context: ErrorContext,
    ) -> Result<T> {
        let body = self.to_body(body)?;
        self.send::<T>(Method::PUT, path, Some(body), context)
            .await?
            .result
            .ok_or_else(|| self.parse_error("响应中缺少 result 字段"))
    }
}
