//! 网站 DNS 设置
//!
//! Points the apex and the configured web subdomains at the hosting target with
//! proxied CNAMEs.

use std::sync::Arc;

use domain_provisioner_provider::DesiredRecord;

use crate::error::CoreError;
use crate::services::{find_zone, DnsReconciler, ServiceContext};
use crate::types::{ProvisioningLog, WebDnsOutcome};
use crate::utils::domain::{apex_domain, normalize_domain_name};

const STEP_PREFLIGHT: &str = "preflight";
const STEP_ZONE: &str = "zone_lookup";
const STEP_DNS: &str = "dns_records";

/// 网站 DNS 服务
pub struct WebDnsService {
    ctx: Arc<ServiceContext>,
}

impl WebDnsService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Creates or overwrites `<apex>` and `<label>.<apex>` CNAMEs targeting `hosting_target`.
    ///
    /// `domain` may carry a leading `www.`; records are always created on the apex.
    pub async fn setup_web_dns(&self, domain: &str, hosting_target: &str) -> WebDnsOutcome {
        let mut log = ProvisioningLog::with_prefix("web-dns");

        let dns = match self.ctx.dns_provider() {
            Ok(dns) => dns,
            Err(e) => {
                log.failed(STEP_PREFLIGHT, e.to_string());
                return WebDnsOutcome::failed(log);
            }
        };
        let target = normalize_domain_name(hosting_target);
        if target.is_empty() {
            log.failed(STEP_PREFLIGHT, "Hosting target is empty");
            return WebDnsOutcome::failed(log);
        }

        let requested = normalize_domain_name(domain);
        let apex = apex_domain(&requested);
        if apex.is_empty() {
            log.failed(STEP_PREFLIGHT, "Domain is empty");
            return WebDnsOutcome::failed(log);
        }
        if apex != requested {
            log.info(
                STEP_PREFLIGHT,
                format!("Normalized domain: {requested} → {apex} (for subdomain creation)"),
            );
        }

        let _guard = self.ctx.locks().acquire(&apex).await;

        let zone = match find_zone(dns.as_ref(), &apex).await {
            Ok(zone) => zone,
            Err(CoreError::NotFound(_)) => {
                log.failed(
                    STEP_ZONE,
                    format!(
                        "Domain {apex} not found in DNS provider account. Add it to the DNS provider first."
                    ),
                );
                return WebDnsOutcome::failed(log);
            }
            Err(e) => {
                log.failed(STEP_ZONE, format!("DNS provider API error: {e}"));
                return WebDnsOutcome::failed(log);
            }
        };
        log.ok(STEP_ZONE, format!("Zone found: {}", zone.id));

        let desired: Vec<DesiredRecord> = std::iter::once(apex.clone())
            .chain(
                self.ctx
                    .config()
                    .web_subdomains
                    .iter()
                    .map(|label| format!("{label}.{apex}")),
            )
            .map(|name| DesiredRecord::cname(name, target.clone(), true))
            .collect();

        let records = match DnsReconciler::new(dns).reconcile(&zone.id, &desired).await {
            Ok(records) => records,
            Err(e) => {
                log.failed(STEP_DNS, format!("Failed to reconcile DNS records: {e}"));
                return WebDnsOutcome {
                    zone_id: Some(zone.id),
                    ..WebDnsOutcome::failed(log)
                };
            }
        };

        for outcome in &records {
            if outcome.is_ok() {
                log.ok(STEP_DNS, outcome.to_string());
            } else {
                log.warning(STEP_DNS, outcome.to_string());
            }
        }

        WebDnsOutcome {
            ok: true,
            zone_id: Some(zone.id),
            records,
            log,
        }
    }
}
