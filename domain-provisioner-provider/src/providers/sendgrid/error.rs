//! SendGrid error mapping
//!
//! SendGrid has no numeric error codes; errors come back as
//! `{"errors":[{"field":..,"message":..}]}` with a meaningful HTTP status.

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::SendgridProvider;

/// Duplicate detection fallback: SendGrid reports duplicates as plain 400s.
fn is_duplicate_message(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("already exists") || lower.contains("duplicate")
}

impl ProviderErrorMapper for SendgridProvider {
    fn provider_name(&self) -> &'static str {
        "sendgrid"
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        let provider = self.provider_name().to_string();

        if is_duplicate_message(&raw.message) {
            return ProviderError::AlreadyExists {
                provider,
                resource: context
                    .resource
                    .unwrap_or_else(|| "<unknown>".to_string()),
                raw_message: Some(raw.message),
            };
        }

        match raw.status {
            Some(401) => ProviderError::InvalidCredentials {
                provider,
                raw_message: Some(raw.message),
            },
            Some(403) => ProviderError::PermissionDenied {
                provider,
                raw_message: Some(raw.message),
            },
            Some(404) => ProviderError::DomainNotFound {
                provider,
                domain: context.domain.unwrap_or_else(|| "<unknown>".to_string()),
                raw_message: Some(raw.message),
            },
            // field 名作为 code 传入
            Some(400 | 422) => ProviderError::InvalidParameter {
                provider,
                param: raw.code.unwrap_or_else(|| "general".to_string()),
                detail: raw.message,
            },
            _ => self.unknown_error(raw),
        }
    }
}
