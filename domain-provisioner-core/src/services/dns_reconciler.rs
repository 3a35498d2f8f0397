//! DNS 记录调和
//!
//! Makes a zone contain a set of desired records. Each record is keyed by
//! `(name, type)`: a match is overwritten, anything else is created. Existing values
//! are never compared, so a rerun converges even when provider-side state drifted.

use std::collections::HashSet;
use std::sync::Arc;

use domain_provisioner_provider::{DesiredRecord, DnsProvider, ExistingRecord};

use crate::error::{CoreError, CoreResult};
use crate::types::{RecordAction, RecordOutcome};
use crate::utils::domain::normalize_domain_name;

/// DNS 记录调和器
pub struct DnsReconciler {
    provider: Arc<dyn DnsProvider>,
}

impl DnsReconciler {
    #[must_use]
    pub fn new(provider: Arc<dyn DnsProvider>) -> Self {
        Self { provider }
    }

    /// Applies `desired` to `zone_id`, one record at a time in input order.
    ///
    /// The zone's records are listed once up front; a failure there is returned as an
    /// error. Per-record failures are captured in the matching [`RecordOutcome`] and do
    /// not stop the remaining records.
    pub async fn reconcile(
        &self,
        zone_id: &str,
        desired: &[DesiredRecord],
    ) -> CoreResult<Vec<RecordOutcome>> {
        if zone_id.trim().is_empty() {
            return Err(CoreError::ValidationError("zone id is empty".to_string()));
        }
        validate_desired(desired)?;

        let existing = self.provider.list_records(zone_id).await?;
        log::debug!(
            "Reconciling {} desired records against {} existing in zone {zone_id}",
            desired.len(),
            existing.len()
        );

        let mut outcomes = Vec::with_capacity(desired.len());
        for record in desired {
            outcomes.push(self.apply(zone_id, record, &existing).await);
        }
        Ok(outcomes)
    }

    async fn apply(
        &self,
        zone_id: &str,
        record: &DesiredRecord,
        existing: &[ExistingRecord],
    ) -> RecordOutcome {
        // 首个匹配优先
        let (action, result) = match existing.iter().find(|e| e.matches(record)) {
            Some(current) => (
                RecordAction::Updated,
                self.provider
                    .update_record(zone_id, &current.id, record)
                    .await,
            ),
            None => (
                RecordAction::Created,
                self.provider.create_record(zone_id, record).await,
            ),
        };

        let outcome = RecordOutcome {
            name: record.name.clone(),
            record_type: record.record_type,
            content: record.content.clone(),
            action,
            error: result.err(),
        };
        if let Some(err) = &outcome.error {
            if err.is_expected() {
                log::warn!("{outcome}");
            } else {
                log::error!("{outcome}");
            }
        } else {
            log::info!("{outcome}");
        }
        outcome
    }
}

/// Non-empty, and `(name, type)` unique after name normalization.
fn validate_desired(desired: &[DesiredRecord]) -> CoreResult<()> {
    if desired.is_empty() {
        return Err(CoreError::ValidationError(
            "no desired records to reconcile".to_string(),
        ));
    }
    let mut seen = HashSet::with_capacity(desired.len());
    for record in desired {
        if record.name.trim().is_empty() || record.content.trim().is_empty() {
            return Err(CoreError::ValidationError(format!(
                "record {} {} has an empty name or content",
                record.record_type, record.name
            )));
        }
        if !seen.insert((normalize_domain_name(&record.name), record.record_type)) {
            return Err(CoreError::ValidationError(format!(
                "duplicate desired record {} {}",
                record.record_type, record.name
            )));
        }
    }
    Ok(())
}
