//! Shared HTTP execution for every provider client
//!
//! Each provider builds its own `RequestBuilder` (URL, auth headers, body) and hands it
//! here for sending, logging and transport-level error mapping. Response envelopes differ
//! too much between Cloudflare, SendGrid and Telegram to be decoded here; callers get the
//! status code and raw body back and decode them themselves.

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::ProviderError;
use crate::utils::log_sanitizer::truncate_for_log;

/// HTTP tool function set
pub struct HttpUtils;

impl HttpUtils {
    /// Sends a request and returns `(status_code, response_text)`.
    ///
    /// Transport failures become [`ProviderError::Timeout`] or
    /// [`ProviderError::NetworkError`], HTTP 429 becomes [`ProviderError::RateLimited`]
    /// and 502..=504 become [`ProviderError::NetworkError`]. Every other status is
    /// returned to the caller untouched, including 4xx.
    pub async fn execute_request(
        request_builder: RequestBuilder,
        provider_name: &str,
        method_name: &str,
        url_or_action: &str,
    ) -> Result<(u16, String), ProviderError> {
        log::debug!("[{provider_name}] {method_name} {url_or_action}");

        let response = request_builder
            .send()
            .await
            .map_err(|e| transport_error(provider_name, &e))?;

        let status_code = response.status().as_u16();
        log::debug!("[{provider_name}] Response Status: {status_code}");

        // Read Retry-After before the body consumes the response
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        if status_code == 429 {
            let body = response.text().await.unwrap_or_default();
            log::warn!("[{provider_name}] Rate limited (HTTP 429), retry_after={retry_after:?}");
            return Err(ProviderError::RateLimited {
                provider: provider_name.to_string(),
                retry_after,
                raw_message: Some(body),
            });
        }

        if matches!(status_code, 502..=504) {
            let body = response.text().await.unwrap_or_default();
            log::warn!("[{provider_name}] Server error (HTTP {status_code})");
            return Err(ProviderError::NetworkError {
                provider: provider_name.to_string(),
                detail: format!("HTTP {status_code}: {}", truncate_for_log(&body)),
            });
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| ProviderError::NetworkError {
                provider: provider_name.to_string(),
                detail: format!("Failed to read response body: {e}"),
            })?;

        log::debug!(
            "[{provider_name}] Response Body: {}",
            truncate_for_log(&response_text)
        );

        Ok((status_code, response_text))
    }

    /// Parses a JSON body, logging the (truncated) raw text on failure.
    pub fn parse_json<T>(response_text: &str, provider_name: &str) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(response_text).map_err(|e| {
            log::error!("[{provider_name}] JSON parse failed: {e}");
            log::error!(
                "[{provider_name}] Raw response: {}",
                truncate_for_log(response_text)
            );
            ProviderError::ParseError {
                provider: provider_name.to_string(),
                detail: e.to_string(),
            }
        })
    }

    /// Same as [`execute_request`](Self::execute_request), retrying transient failures.
    ///
    /// Only [`ProviderError::is_retryable`] errors are retried. The delay doubles from
    /// 100ms up to 10s, or follows `Retry-After` (capped at 30s) when the provider sent one.
    /// `max_retries == 0` sends exactly once.
    pub async fn execute_request_with_retry(
        request_builder: RequestBuilder,
        provider_name: &str,
        method_name: &str,
        url_or_action: &str,
        max_retries: u32,
    ) -> Result<(u16, String), ProviderError> {
        let mut attempt = 0;
        loop {
            // RequestBuilder 只能发送一次；带流式 body 的请求无法克隆，只发一次
            let Some(req) = request_builder.try_clone().filter(|_| attempt < max_retries) else {
                return Self::execute_request(
                    request_builder,
                    provider_name,
                    method_name,
                    url_or_action,
                )
                .await;
            };

            match Self::execute_request(req, provider_name, method_name, url_or_action).await {
                Err(e) if e.is_retryable() => {
                    let delay = retry_delay(&e, attempt);
                    attempt += 1;
                    log::warn!(
                        "[{provider_name}] {method_name} {url_or_action} failed (attempt {attempt}/{}), retrying in {:.1}s: {e}",
                        max_retries + 1,
                        delay.as_secs_f32(),
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }
}

fn transport_error(provider_name: &str, e: &reqwest::Error) -> ProviderError {
    let provider = provider_name.to_string();
    let detail = e.to_string();
    if e.is_timeout() {
        ProviderError::Timeout { provider, detail }
    } else {
        ProviderError::NetworkError { provider, detail }
    }
}

/// `Retry-After` wins when present (capped at 30s), otherwise exponential backoff.
fn retry_delay(error: &ProviderError, attempt: u32) -> Duration {
    if let ProviderError::RateLimited {
        retry_after: Some(secs),
        ..
    } = error
    {
        Duration::from_secs((*secs).min(30))
    } else {
        backoff_delay(attempt)
    }
}

/// 100ms, 200ms, 400ms, ... capped at 10s
fn backoff_delay(attempt: u32) -> Duration {
    let capped_attempt = attempt.min(20);
    let delay_ms = 100_u64.saturating_mul(1_u64 << capped_attempt);
    Duration::from_millis(delay_ms.min(10_000))
}
