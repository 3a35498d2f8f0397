//! Cloudflare error mapping

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::CloudflareProvider;

/// Cloudflare error code mapping
/// Reference: <https://developers.cloudflare.com/fundamentals/api/reference/errors/>
impl ProviderErrorMapper for CloudflareProvider {
    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        let provider = self.provider_name().to_string();
        match raw.code.as_deref() {
            // 6003: Invalid request headers
            // 6103: Invalid format for X-Auth-Key header
            // 6111: Invalid format for Authorization header
            // 9103: Unknown X-Auth-Key or X-Auth-Email
            // 9109: Unauthorized to access requested resource
            // 10000: Authentication error
            Some("6003" | "6103" | "6111" | "9103" | "9109" | "10000") => {
                ProviderError::InvalidCredentials {
                    provider,
                    raw_message: Some(raw.message),
                }
            }

            // 1004: DNS Validation Error
            // 9000: Invalid or missing name
            // 9007: Content for CNAME record is invalid
            // 9041: This DNS record cannot be proxied
            Some(code @ ("1004" | "9000" | "9007" | "9041")) => {
                let param = match code {
                    "9000" => "name",
                    "9007" => "content",
                    "9041" => "proxied",
                    _ => "general",
                };
                ProviderError::InvalidParameter {
                    provider,
                    param: param.to_string(),
                    detail: raw.message,
                }
            }

            // 81053: An A, AAAA or CNAME record already exists with that host
            // 81054: A CNAME record with that host already exists
            // 81057: The record already exists
            // 81058: A record with those settings already exists
            Some("81053" | "81054" | "81057" | "81058") => ProviderError::AlreadyExists {
                provider,
                resource: context
                    .resource
                    .unwrap_or_else(|| "<unknown>".to_string()),
                raw_message: Some(raw.message),
            },

            // 81044: Record does not exist
            Some("81044") => ProviderError::RecordNotFound {
                provider,
                record_id: context.record_id.unwrap_or_else(|| "<unknown>".to_string()),
                raw_message: Some(raw.message),
            },

            // 81045: The record quota has been exceeded
            Some("81045") => ProviderError::QuotaExceeded {
                provider,
                raw_message: Some(raw.message),
            },

            // 7000: No route for that URI
            // 7003: Could not route to /path. perhaps your object identifier is invalid?
            Some("7000" | "7003") => ProviderError::DomainNotFound {
                provider,
                domain: context.domain.unwrap_or_else(|| "<unknown>".to_string()),
                raw_message: Some(raw.message),
            },

            // 无错误码时按 HTTP 状态兜底
            None => match raw.status {
                Some(401) => ProviderError::InvalidCredentials {
                    provider,
                    raw_message: Some(raw.message),
                },
                Some(403) => ProviderError::PermissionDenied {
                    provider,
                    raw_message: Some(raw.message),
                },
                _ => self.unknown_error(raw),
            },

            _ => self.unknown_error(raw),
        }
    }
}
