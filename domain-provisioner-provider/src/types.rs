use serde::{Deserialize, Serialize};

// ============ Provider Types ============

/// Identifies which upstream provider a client or credential belongs to.
///
/// Each variant is gated behind its corresponding feature flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// Cloudflare (DNS zones/records and Turnstile widgets). Requires feature `cloudflare`.
    #[cfg(feature = "cloudflare")]
    Cloudflare,
    /// SendGrid (domain authentication and verified senders). Requires feature `sendgrid`.
    #[cfg(feature = "sendgrid")]
    Sendgrid,
    /// Telegram Bot API (bot identity). Requires feature `telegram`.
    #[cfg(feature = "telegram")]
    Telegram,
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "cloudflare")]
            Self::Cloudflare => write!(f, "cloudflare"),
            #[cfg(feature = "sendgrid")]
            Self::Sendgrid => write!(f, "sendgrid"),
            #[cfg(feature = "telegram")]
            Self::Telegram => write!(f, "telegram"),
        }
    }
}

// ============ DNS Types ============

/// A DNS zone (apex domain container) at the DNS provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    /// Provider-specific zone identifier.
    pub id: String,
    /// Apex domain name (e.g., `"example.com"`).
    pub name: String,
    /// Account that owns the zone, when the provider reported it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

/// DNS record type of a record this crate writes.
///
/// Serialized as uppercase strings (`"A"`, `"AAAA"`, `"CNAME"`, etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DnsRecordType {
    /// IPv4 address record.
    A,
    /// IPv6 address record.
    Aaaa,
    /// Canonical name (alias) record.
    Cname,
    /// Mail exchange record.
    Mx,
    /// Text record.
    Txt,
}

impl DnsRecordType {
    /// Uppercase wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Cname => "CNAME",
            Self::Mx => "MX",
            Self::Txt => "TXT",
        }
    }
}

impl std::fmt::Display for DnsRecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record that should exist in a zone.
///
/// `name` is fully qualified (apex or subdomain). `(name, record_type)` is the
/// identity used when matching against [`ExistingRecord`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredRecord {
    /// Fully-qualified host name.
    pub name: String,
    /// Record type.
    pub record_type: DnsRecordType,
    /// Record content (CNAME target, address, text).
    pub content: String,
    /// Whether the provider's CDN proxy should front this record.
    pub proxied: bool,
}

impl DesiredRecord {
    /// Shorthand for a CNAME record.
    pub fn cname(name: impl Into<String>, target: impl Into<String>, proxied: bool) -> Self {
        Self {
            name: name.into(),
            record_type: DnsRecordType::Cname,
            content: target.into(),
            proxied,
        }
    }
}

/// A record as reported by the DNS provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingRecord {
    /// Provider-specific record identifier.
    pub id: String,
    /// Fully-qualified host name.
    pub name: String,
    /// Record type exactly as the provider reported it (may be a type this crate never writes).
    pub record_type: String,
    /// Record content.
    pub content: String,
    /// Proxy flag, when the provider supports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxied: Option<bool>,
    /// Time to live in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    /// When the record was last modified, if known.
    #[serde(with = "crate::utils::datetime")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl ExistingRecord {
    /// Whether this record has the same `(name, type)` identity as `desired`.
    ///
    /// Names are compared case-insensitively and without a trailing dot; types
    /// case-insensitively.
    pub fn matches(&self, desired: &DesiredRecord) -> bool {
        self.record_type
            .eq_ignore_ascii_case(desired.record_type.as_str())
            && crate::providers::common::same_host(&self.name, &desired.name)
    }
}

// ============ Email Domain Authentication Types ============

/// One DNS sub-record the email provider requires for domain authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthDnsRecord {
    /// Fully-qualified host the record lives at.
    pub host: String,
    /// Record type.
    pub record_type: DnsRecordType,
    /// Record content (usually a CNAME target).
    pub data: String,
}

/// The fixed set of named records returned with a domain authentication.
///
/// Any of them may be absent when the provider did not supply it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainAuthDns {
    /// Mail-routing CNAME.
    pub mail_cname: Option<AuthDnsRecord>,
    /// First DKIM signing CNAME.
    pub dkim1: Option<AuthDnsRecord>,
    /// Second DKIM signing CNAME.
    pub dkim2: Option<AuthDnsRecord>,
}

impl DomainAuthDns {
    /// The sub-records in their canonical order, keyed by name.
    pub fn named_records(&self) -> [(&'static str, Option<&AuthDnsRecord>); 3] {
        [
            ("mail_cname", self.mail_cname.as_ref()),
            ("dkim1", self.dkim1.as_ref()),
            ("dkim2", self.dkim2.as_ref()),
        ]
    }
}

/// A domain authentication entry at the email provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainAuth {
    /// Provider-side identifier.
    pub id: String,
    /// Authenticated sending domain.
    pub domain: String,
    /// Whether the provider currently considers the domain validated.
    pub valid: bool,
    /// DNS records that prove ownership.
    pub dns: DomainAuthDns,
}

/// Outcome of a single validation request against the email provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainValidation {
    /// Whether every required record validated.
    pub valid: bool,
    /// Per-record diagnostics as reported by the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_results: Option<serde_json::Value>,
}

/// Verified-sender registration payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedSenderRequest {
    /// Display nickname inside the provider's dashboard.
    pub nickname: String,
    /// Sending address.
    pub from_email: String,
    /// Sender display name.
    pub from_name: String,
    /// Reply-to address.
    pub reply_to: String,
    /// Reply-to display name.
    pub reply_to_name: String,
    /// Postal address line.
    pub address: String,
    /// City.
    pub city: String,
    /// State or province.
    pub state: String,
    /// Postal code.
    pub zip: String,
    /// Country code.
    pub country: String,
}

// ============ Bot Protection Types ============

/// Challenge mode of a bot-protection widget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetMode {
    /// Provider decides whether to show an interactive challenge.
    #[default]
    Managed,
    /// Never interactive, but visible.
    NonInteractive,
    /// Never visible.
    Invisible,
}

/// Request to create a bot-protection widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetRequest {
    /// Widget display name.
    pub name: String,
    /// Host names the widget may be embedded on.
    pub domains: Vec<String>,
    /// Challenge mode.
    pub mode: WidgetMode,
    /// Whether the provider's bot-fight mode is enabled for the widget.
    pub bot_fight_mode: bool,
}

/// A bot-protection widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    /// Public site key.
    pub site_key: String,
    /// Server-side secret; only present on create and detail responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    /// Widget display name.
    pub name: String,
    /// Host names the widget may be embedded on.
    pub domains: Vec<String>,
}

// ============ Chat Bot Types ============

/// Identity of a chat bot, as reported by the bot API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotIdentity {
    /// Numeric bot id rendered as a string.
    pub id: String,
    /// Bot username without the leading `@`.
    pub username: String,
}

// ============ Credential Types ============

/// Validation error for provider credentials.
///
/// Returned when credential fields are missing or blank.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CredentialValidationError {
    /// A required credential field is missing entirely.
    MissingField {
        /// Which provider the error relates to.
        provider: ProviderType,
        /// Machine-readable field key.
        field: String,
        /// Human-readable field label.
        label: String,
    },
    /// A credential field is present but empty/whitespace-only.
    EmptyField {
        /// Which provider the error relates to.
        provider: ProviderType,
        /// Machine-readable field key.
        field: String,
        /// Human-readable field label.
        label: String,
    },
}

impl std::fmt::Display for CredentialValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField {
                provider, label, ..
            } => write!(f, "[{provider}] Missing required field: {label}"),
            Self::EmptyField {
                provider, label, ..
            } => write!(f, "[{provider}] Field must not be empty: {label}"),
        }
    }
}

impl std::error::Error for CredentialValidationError {}

/// Type-safe credential container for every supported provider.
///
/// Credentials are read from the environment or configuration by the caller and
/// never persisted by this crate.
///
/// # Serialization
///
/// Serialized as a tagged enum with `"provider"` as the tag and `"credentials"` as the content:
///
/// ```json
/// { "provider": "sendgrid", "credentials": { "api_key": "..." } }
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "provider", content = "credentials")]
pub enum ProviderCredentials {
    /// Cloudflare global API key, sent as `X-Auth-Email` + `X-Auth-Key`.
    #[cfg(feature = "cloudflare")]
    #[serde(rename = "cloudflare")]
    Cloudflare {
        /// Account e-mail address.
        email: String,
        /// Global API key.
        api_key: String,
    },

    /// Cloudflare scoped API token, sent as a bearer token.
    #[cfg(feature = "cloudflare")]
    #[serde(rename = "cloudflare_token")]
    CloudflareToken {
        /// Scoped API token.
        api_token: String,
    },

    /// SendGrid API key.
    #[cfg(feature = "sendgrid")]
    #[serde(rename = "sendgrid")]
    Sendgrid {
        /// API key.
        api_key: String,
    },

    /// Telegram bot token.
    #[cfg(feature = "telegram")]
    #[serde(rename = "telegram")]
    Telegram {
        /// Bot token as issued by `@BotFather`.
        bot_token: String,
    },
}

// Secrets stay out of debug output
impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "cloudflare")]
            Self::Cloudflare { email, .. } => f
                .debug_struct("Cloudflare")
                .field("email", email)
                .field("api_key", &"***")
                .finish(),
            #[cfg(feature = "cloudflare")]
            Self::CloudflareToken { .. } => f
                .debug_struct("CloudflareToken")
                .field("api_token", &"***")
                .finish(),
            #[cfg(feature = "sendgrid")]
            Self::Sendgrid { .. } => f.debug_struct("Sendgrid").field("api_key", &"***").finish(),
            #[cfg(feature = "telegram")]
            Self::Telegram { .. } => f
                .debug_struct("Telegram")
                .field("bot_token", &"***")
                .finish(),
        }
    }
}

impl ProviderCredentials {
    /// Construct credentials from a flat key/value map, validating required fields.
    ///
    /// Cloudflare accepts either `apiToken`, or `email` + `apiKey`; the token wins when
    /// both are present. Values are trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialValidationError`] if a required field is missing or blank.
    pub fn from_map(
        provider: &ProviderType,
        map: &std::collections::HashMap<String, String>,
    ) -> Result<Self, CredentialValidationError> {
        match provider {
            #[cfg(feature = "cloudflare")]
            ProviderType::Cloudflare => {
                if let Ok(api_token) = Self::get_required_field(provider, map, "apiToken", "API Token")
                {
                    return Ok(Self::CloudflareToken { api_token });
                }
                Ok(Self::Cloudflare {
                    email: Self::get_required_field(provider, map, "email", "Account Email")?,
                    api_key: Self::get_required_field(provider, map, "apiKey", "Global API Key")?,
                })
            }
            #[cfg(feature = "sendgrid")]
            ProviderType::Sendgrid => Ok(Self::Sendgrid {
                api_key: Self::get_required_field(provider, map, "apiKey", "API Key")?,
            }),
            #[cfg(feature = "telegram")]
            ProviderType::Telegram => Ok(Self::Telegram {
                bot_token: Self::get_required_field(provider, map, "botToken", "Bot Token")?,
            }),
        }
    }

    /// Obtain a required field from the map and verify that it is not blank.
    fn get_required_field(
        provider: &ProviderType,
        map: &std::collections::HashMap<String, String>,
        key: &str,
        label: &str,
    ) -> Result<String, CredentialValidationError> {
        match map.get(key) {
            None => Err(CredentialValidationError::MissingField {
                provider: provider.clone(),
                field: key.to_string(),
                label: label.to_string(),
            }),
            Some(v) if v.trim().is_empty() => Err(CredentialValidationError::EmptyField {
                provider: provider.clone(),
                field: key.to_string(),
                label: label.to_string(),
            }),
            Some(v) => Ok(v.trim().to_string()),
        }
    }

    /// The provider these credentials authenticate against.
    pub fn provider_type(&self) -> ProviderType {
        match self {
            #[cfg(feature = "cloudflare")]
            Self::Cloudflare { .. } | Self::CloudflareToken { .. } => ProviderType::Cloudflare,
            #[cfg(feature = "sendgrid")]
            Self::Sendgrid { .. } => ProviderType::Sendgrid,
            #[cfg(feature = "telegram")]
            Self::Telegram { .. } => ProviderType::Telegram,
        }
    }
}
