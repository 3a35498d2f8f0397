use std::fmt;

use serde::{Deserialize, Serialize};

/// Error of any upstream call: DNS zone and record management, email domain
/// authentication, bot-protection widgets, bot identity lookup.
///
/// Every variant names the `provider` that produced it. `raw_message` keeps the
/// upstream wording so a step log can show it verbatim.
///
/// Transient variants (`NetworkError`, `Timeout`, `RateLimited`) are retried by the
/// HTTP client for idempotent requests; see [`is_retryable`](Self::is_retryable).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum ProviderError {
    /// Connection failure or 5xx gateway response.
    NetworkError { provider: String, detail: String },

    /// 请求超时
    Timeout { provider: String, detail: String },

    /// HTTP 429 or a provider-specific throttling code.
    RateLimited {
        provider: String,
        /// Seconds to wait, from `Retry-After` when present
        retry_after: Option<u64>,
        raw_message: Option<String>,
    },

    /// API token, global key or bot token rejected.
    InvalidCredentials {
        provider: String,
        raw_message: Option<String>,
    },

    /// Credentials valid but missing a scope (e.g. a token without Turnstile access).
    PermissionDenied {
        provider: String,
        raw_message: Option<String>,
    },

    /// Create rejected because the resource is already there. Callers that provision
    /// idempotently treat this as success.
    AlreadyExists {
        provider: String,
        /// Record name, sender address or widget name
        resource: String,
        raw_message: Option<String>,
    },

    RecordNotFound {
        provider: String,
        record_id: String,
        raw_message: Option<String>,
    },

    /// Zone, domain authentication entry or account not found.
    DomainNotFound {
        provider: String,
        /// Domain name or provider id
        domain: String,
        raw_message: Option<String>,
    },

    /// Request rejected for one field (record content, sender address, ...).
    InvalidParameter {
        provider: String,
        param: String,
        detail: String,
    },

    /// Account limit reached (records per zone, widgets per account). Not transient.
    QuotaExceeded {
        provider: String,
        raw_message: Option<String>,
    },

    /// Response body did not have the expected shape.
    ParseError { provider: String, detail: String },

    /// HTTP client construction or request body encoding failed.
    SerializationError { provider: String, detail: String },

    /// Upstream error with no specific mapping.
    Unknown {
        provider: String,
        raw_code: Option<String>,
        raw_message: String,
    },
}

impl ProviderError {
    /// 是否为预期行为（用户输入、资源不存在等），用于日志分级。
    ///
    /// 返回 `true` 时应使用 `warn` 级别，`false` 时使用 `error` 级别。
    /// **新增变体时请同步更新此方法。**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials { .. }
                | Self::PermissionDenied { .. }
                | Self::AlreadyExists { .. }
                | Self::RecordNotFound { .. }
                | Self::DomainNotFound { .. }
                | Self::InvalidParameter { .. }
                | Self::QuotaExceeded { .. }
        )
    }

    /// Whether a retry of the same request can reasonably succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError { .. } | Self::Timeout { .. } | Self::RateLimited { .. }
        )
    }

    /// Identifier of the provider that produced this error.
    #[must_use]
    pub fn provider(&self) -> &str {
        match self {
            Self::NetworkError { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::RateLimited { provider, .. }
            | Self::InvalidCredentials { provider, .. }
            | Self::PermissionDenied { provider, .. }
            | Self::AlreadyExists { provider, .. }
            | Self::RecordNotFound { provider, .. }
            | Self::DomainNotFound { provider, .. }
            | Self::InvalidParameter { provider, .. }
            | Self::QuotaExceeded { provider, .. }
            | Self::ParseError { provider, .. }
            | Self::SerializationError { provider, .. }
            | Self::Unknown { provider, .. } => provider,
        }
    }
}

/// `"{what}: {raw}"`, or just `what` without an upstream message
fn with_raw(f: &mut fmt::Formatter<'_>, what: fmt::Arguments<'_>, raw: Option<&String>) -> fmt::Result {
    match raw {
        Some(msg) => write!(f, "{what}: {msg}"),
        None => write!(f, "{what}"),
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.provider())?;
        match self {
            Self::NetworkError { detail, .. } => write!(f, "Network error: {detail}"),
            Self::Timeout { detail, .. } => write!(f, "Request timeout: {detail}"),
            Self::RateLimited {
                retry_after: Some(secs),
                ..
            } => write!(f, "Rate limited (retry after {secs}s)"),
            Self::RateLimited { .. } => write!(f, "Rate limited"),
            Self::InvalidCredentials { raw_message, .. } => {
                with_raw(f, format_args!("Invalid credentials"), raw_message.as_ref())
            }
            Self::PermissionDenied { raw_message, .. } => {
                with_raw(f, format_args!("Permission denied"), raw_message.as_ref())
            }
            Self::AlreadyExists {
                resource,
                raw_message,
                ..
            } => with_raw(
                f,
                format_args!("'{resource}' already exists"),
                raw_message.as_ref(),
            ),
            Self::RecordNotFound { record_id, .. } => write!(f, "Record '{record_id}' not found"),
            Self::DomainNotFound {
                domain,
                raw_message,
                ..
            } => with_raw(
                f,
                format_args!("Domain '{domain}' not found"),
                raw_message.as_ref(),
            ),
            Self::InvalidParameter { param, detail, .. } => {
                write!(f, "Invalid parameter '{param}': {detail}")
            }
            Self::QuotaExceeded { raw_message, .. } => {
                with_raw(f, format_args!("Quota exceeded"), raw_message.as_ref())
            }
            Self::ParseError { detail, .. } => write!(f, "Parse error: {detail}"),
            Self::SerializationError { detail, .. } => write!(f, "Serialization error: {detail}"),
            Self::Unknown {
                raw_code: Some(code),
                raw_message,
                ..
            } => write!(f, "{raw_message} (code {code})"),
            Self::Unknown { raw_message, .. } => write!(f, "{raw_message}"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Convenience type alias for `Result<T, ProviderError>`.
pub type Result<T> = std::result::Result<T, ProviderError>;
