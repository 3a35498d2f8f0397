//! Results returned by the top-level provisioning operations

use serde::Serialize;

use domain_provisioner_provider::{DnsRecordType, ProviderError};

use super::ProvisioningLog;

/// What the reconciler did for one desired record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordAction {
    Created,
    Updated,
}

impl std::fmt::Display for RecordAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Updated => write!(f, "Updated"),
        }
    }
}

/// Per-record reconciliation result
///
/// Renders as `Created www.example.com → app.example-host.com (OK)`, or with the
/// provider error in place of `OK`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordOutcome {
    pub name: String,
    pub record_type: DnsRecordType,
    pub content: String,
    pub action: RecordAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProviderError>,
}

impl RecordOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl std::fmt::Display for RecordOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} → {} (", self.action, self.name, self.content)?;
        match &self.error {
            None => write!(f, "OK)"),
            Some(err) => write!(f, "{err})"),
        }
    }
}

/// Result of email domain authentication.
///
/// `ok` means the sequence completed, not that every step succeeded; inspect
/// `validated` and the log for follow-up work.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainAuthOutcome {
    pub ok: bool,
    pub validated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_auth_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
    pub log: ProvisioningLog,
}

impl DomainAuthOutcome {
    pub(crate) fn failed(log: ProvisioningLog) -> Self {
        Self {
            ok: false,
            validated: false,
            domain_auth_id: None,
            zone_id: None,
            log,
        }
    }

    pub fn output(&self) -> String {
        self.log.output()
    }
}

/// Result of bot-protection widget provisioning.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    /// An existing widget was returned instead of creating one
    pub reused: bool,
    pub log: ProvisioningLog,
}

impl WidgetOutcome {
    pub(crate) fn failed(log: ProvisioningLog) -> Self {
        Self {
            ok: false,
            site_key: None,
            secret_key: None,
            reused: false,
            log,
        }
    }

    pub fn output(&self) -> String {
        self.log.output()
    }
}

/// Result of web DNS setup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebDnsOutcome {
    pub ok: bool,
    /// Zone of the apex, for widget creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
    pub records: Vec<RecordOutcome>,
    pub log: ProvisioningLog,
}

impl WebDnsOutcome {
    pub(crate) fn failed(log: ProvisioningLog) -> Self {
        Self {
            ok: false,
            zone_id: None,
            records: Vec::new(),
            log,
        }
    }

    pub fn output(&self) -> String {
        self.log.output()
    }
}
