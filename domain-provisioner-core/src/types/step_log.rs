//! Structured, append-only provisioning log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome class of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Step succeeded
    Ok,
    /// Progress note, nothing succeeded or failed yet
    Info,
    /// Non-fatal problem; manual follow-up may be needed
    Warning,
    /// Step intentionally not performed
    Skipped,
    /// Step failed
    Failed,
}

/// One entry of a [`ProvisioningLog`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    /// Machine-readable step name, e.g. `zone_lookup`
    pub step: String,
    pub status: StepStatus,
    /// Human-readable description
    pub detail: String,
    pub at: DateTime<Utc>,
}

/// Ordered trail of everything a provisioning run did.
///
/// Every pushed record is also emitted through `log`, tagged with the run id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningLog {
    pub run_id: Uuid,
    /// Prefix of every rendered line, e.g. `domain-auth`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    pub records: Vec<StepRecord>,
}

impl ProvisioningLog {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            prefix: None,
            records: Vec::new(),
        }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..Self::new()
        }
    }

    pub fn push(&mut self, step: &str, status: StepStatus, detail: impl Into<String>) {
        let detail = detail.into();
        let run = self.run_id;
        match status {
            StepStatus::Ok | StepStatus::Info => log::info!("[{run}] {step}: {detail}"),
            StepStatus::Warning | StepStatus::Skipped => log::warn!("[{run}] {step}: {detail}"),
            StepStatus::Failed => log::error!("[{run}] {step}: {detail}"),
        }
        self.records.push(StepRecord {
            step: step.to_string(),
            status,
            detail,
            at: Utc::now(),
        });
    }

    pub fn ok(&mut self, step: &str, detail: impl Into<String>) {
        self.push(step, StepStatus::Ok, detail);
    }

    pub fn info(&mut self, step: &str, detail: impl Into<String>) {
        self.push(step, StepStatus::Info, detail);
    }

    pub fn warning(&mut self, step: &str, detail: impl Into<String>) {
        self.push(step, StepStatus::Warning, detail);
    }

    pub fn skipped(&mut self, step: &str, detail: impl Into<String>) {
        self.push(step, StepStatus::Skipped, detail);
    }

    pub fn failed(&mut self, step: &str, detail: impl Into<String>) {
        self.push(step, StepStatus::Failed, detail);
    }

    /// Whether any step ended in `status`.
    pub fn has(&self, status: StepStatus) -> bool {
        self.records.iter().any(|r| r.status == status)
    }

    /// Records of one step, in order.
    pub fn step<'a>(&'a self, step: &'a str) -> impl Iterator<Item = &'a StepRecord> + 'a {
        self.records.iter().filter(move |r| r.step == step)
    }

    /// Text rendering, one line per record.
    pub fn output(&self) -> String {
        let mut out = String::new();
        for record in &self.records {
            if let Some(prefix) = &self.prefix {
                out.push('[');
                out.push_str(prefix);
                out.push_str("] ");
            }
            out.push_str(&record.detail);
            out.push('\n');
        }
        out
    }
}

impl Default for ProvisioningLog {
    fn default() -> Self {
        Self::new()
    }
}
