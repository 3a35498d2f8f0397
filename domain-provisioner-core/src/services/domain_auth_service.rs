//! 邮件域名认证编排
//!
//! Linear sequence: preflight, find-or-create domain authentication, zone lookup,
//! DNS reconciliation, validation polling, verified sender. Only the first three can
//! end the run with `ok = false`; everything after is recorded and the run goes on.

use std::sync::Arc;

use domain_provisioner_provider::{
    DesiredRecord, DnsProvider, DomainAuth, EmailDomainProvider, ProviderError,
};

use crate::config::RetryPolicy;
use crate::error::CoreError;
use crate::services::{find_zone, DnsReconciler, ServiceContext};
use crate::types::{DomainAuthOutcome, ProvisioningLog};
use crate::utils::domain::{normalize_domain_name, same_host};

const STEP_PREFLIGHT: &str = "preflight";
const STEP_DOMAIN_AUTH: &str = "domain_auth";
const STEP_ZONE: &str = "zone_lookup";
const STEP_DNS: &str = "dns_records";
const STEP_VALIDATION: &str = "validation";
const STEP_SENDER: &str = "verified_sender";

/// 邮件域名认证服务
pub struct DomainAuthService {
    ctx: Arc<ServiceContext>,
}

impl DomainAuthService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Authenticates `domain` with the email provider and publishes its DNS records.
    ///
    /// Never returns an error: failures end up in the outcome's log. Runs for the same
    /// domain are serialized.
    pub async fn provision_domain_auth(&self, domain: &str, email_api_key: &str) -> DomainAuthOutcome {
        let mut log = ProvisioningLog::with_prefix("domain-auth");
        let domain = normalize_domain_name(domain);

        // 1. Preflight：不发起任何网络请求
        let Some((dns, email)) = self.preflight(&domain, email_api_key, &mut log) else {
            return DomainAuthOutcome::failed(log);
        };

        let _guard = self.ctx.locks().acquire(&domain).await;

        // 2. 查找或创建域名认证
        let Some(auth) = find_or_create_auth(email.as_ref(), &domain, &mut log).await else {
            return DomainAuthOutcome::failed(log);
        };

        // 3. Zone 查找
        log.info(STEP_ZONE, format!("Looking up DNS zone for {domain}..."));
        let zone = match find_zone(dns.as_ref(), &domain).await {
            Ok(zone) => zone,
            Err(e) => {
                let detail = match e {
                    CoreError::NotFound(_) => {
                        format!("Domain {domain} not found in DNS provider account")
                    }
                    other => format!("DNS provider API error: {other}"),
                };
                log.failed(STEP_ZONE, detail);
                return DomainAuthOutcome {
                    domain_auth_id: Some(auth.id),
                    ..DomainAuthOutcome::failed(log)
                };
            }
        };
        log.ok(STEP_ZONE, format!("DNS zone found: {}", zone.id));

        // 4. DNS 记录
        if !publish_records(dns, &zone.id, &auth, &mut log).await {
            return DomainAuthOutcome {
                domain_auth_id: Some(auth.id),
                zone_id: Some(zone.id),
                ..DomainAuthOutcome::failed(log)
            };
        }

        // 5. 验证轮询
        let validated = self.poll_validation(email.as_ref(), &auth.id, &mut log).await;

        // 6. 发件人
        self.register_sender(email.as_ref(), &domain, &mut log).await;

        DomainAuthOutcome {
            ok: true,
            validated,
            domain_auth_id: Some(auth.id),
            zone_id: Some(zone.id),
            log,
        }
    }

    fn preflight(
        &self,
        domain: &str,
        email_api_key: &str,
        log: &mut ProvisioningLog,
    ) -> Option<(Arc<dyn DnsProvider>, Arc<dyn EmailDomainProvider>)> {
        if domain.is_empty() {
            log.failed(STEP_PREFLIGHT, "Domain is empty");
            return None;
        }
        let dns = match self.ctx.dns_provider() {
            Ok(dns) => dns,
            Err(e) => {
                log.failed(STEP_PREFLIGHT, e.to_string());
                return None;
            }
        };
        if email_api_key.trim().is_empty() {
            log.failed(STEP_PREFLIGHT, "Email provider API key not available");
            return None;
        }
        match self.ctx.email_factory().create(email_api_key) {
            Ok(email) => Some((dns, email)),
            Err(e) => {
                log.failed(STEP_PREFLIGHT, format!("Could not create email provider client: {e}"));
                None
            }
        }
    }

    async fn poll_validation(
        &self,
        email: &dyn EmailDomainProvider,
        domain_auth_id: &str,
        log: &mut ProvisioningLog,
    ) -> bool {
        let policy = &self.ctx.config().validation;
        log.info(STEP_VALIDATION, "Waiting for DNS propagation...");

        for attempt in 1..=RetryPolicy::MAX_ATTEMPTS {
            tokio::time::sleep(policy.delay_before(attempt)).await;
            log.info(
                STEP_VALIDATION,
                format!("Validation attempt {attempt}/{}...", RetryPolicy::MAX_ATTEMPTS),
            );

            match email.validate_domain_auth(domain_auth_id).await {
                Ok(result) if result.valid => {
                    log.ok(STEP_VALIDATION, "Domain validation successful");
                    return true;
                }
                Ok(result) => {
                    log.info(
                        STEP_VALIDATION,
                        "Validation pending (DNS may need more time to propagate)",
                    );
                    if let Some(details) = result.validation_results {
                        log.info(STEP_VALIDATION, format!("Details: {details}"));
                    }
                }
                Err(e) => log.warning(STEP_VALIDATION, format!("Validation API error: {e}")),
            }
        }

        log.warning(
            STEP_VALIDATION,
            "Domain not yet validated - DNS records created but may need more time to propagate",
        );
        false
    }

    async fn register_sender(
        &self,
        email: &dyn EmailDomainProvider,
        domain: &str,
        log: &mut ProvisioningLog,
    ) {
        let request = self.ctx.config().sender.request_for(domain);
        log.info(STEP_SENDER, "Registering verified sender...");

        match email.create_verified_sender(&request).await {
            Ok(()) => log.ok(
                STEP_SENDER,
                format!("Verified sender registered: {}", request.from_email),
            ),
            Err(ProviderError::AlreadyExists { .. }) => log.ok(
                STEP_SENDER,
                format!("Verified sender already exists: {}", request.from_email),
            ),
            Err(e) => log.warning(
                STEP_SENDER,
                format!("Failed to register verified sender: {e}"),
            ),
        }
    }
}

/// Reuses the entry whose domain matches exactly, else creates one.
async fn find_or_create_auth(
    email: &dyn EmailDomainProvider,
    domain: &str,
    log: &mut ProvisioningLog,
) -> Option<DomainAuth> {
    log.info(STEP_DOMAIN_AUTH, "Checking for existing domain authentication...");
    let existing = match email.list_domain_auths().await {
        Ok(auths) => auths,
        Err(e) => {
            log.failed(STEP_DOMAIN_AUTH, format!("Email provider API error: {e}"));
            return None;
        }
    };

    if let Some(auth) = existing.into_iter().find(|a| same_host(&a.domain, domain)) {
        log.ok(
            STEP_DOMAIN_AUTH,
            format!("Found existing domain auth (ID: {})", auth.id),
        );
        return Some(auth);
    }

    log.info(
        STEP_DOMAIN_AUTH,
        format!("Creating domain authentication for {domain}..."),
    );
    match email.create_domain_auth(domain).await {
        Ok(auth) => {
            log.ok(
                STEP_DOMAIN_AUTH,
                format!("Domain auth created (ID: {})", auth.id),
            );
            Some(auth)
        }
        Err(e) => {
            log.failed(
                STEP_DOMAIN_AUTH,
                format!("Failed to create domain authentication: {e}"),
            );
            None
        }
    }
}

/// Reconciles the authentication's CNAMEs. `false` only when the zone's records
/// could not be read.
async fn publish_records(
    dns: Arc<dyn DnsProvider>,
    zone_id: &str,
    auth: &DomainAuth,
    log: &mut ProvisioningLog,
) -> bool {
    let mut keys = Vec::new();
    let mut desired = Vec::new();
    for (key, record) in auth.dns.named_records() {
        match record {
            // 认证记录不能走代理
            Some(r) => {
                keys.push(key);
                desired.push(DesiredRecord {
                    name: r.host.clone(),
                    record_type: r.record_type,
                    content: r.data.clone(),
                    proxied: false,
                });
            }
            None => log.warning(
                STEP_DNS,
                format!("Warning: {key} record not provided by email provider"),
            ),
        }
    }

    if desired.is_empty() {
        log.skipped(STEP_DNS, "No DNS records to publish");
        return true;
    }

    match DnsReconciler::new(dns).reconcile(zone_id, &desired).await {
        Ok(outcomes) => {
            for (key, outcome) in keys.iter().zip(&outcomes) {
                let line = format!("{key}: {outcome}");
                if outcome.is_ok() {
                    log.ok(STEP_DNS, line);
                } else {
                    log.warning(STEP_DNS, line);
                }
            }
            true
        }
        Err(e) => {
            log.failed(STEP_DNS, format!("Failed to fetch DNS records: {e}"));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Backoff, ProvisionerConfig};
    use crate::test_utils::{
        create_test_context, create_test_context_with, domain_auth, existing_cname,
    };
    use crate::types::StepStatus;
    use domain_provisioner_provider::DomainValidation;
    use std::time::Duration;
    use tokio::time::Instant;

    const KEY: &str = "SG.test-key";

    fn pending() -> domain_provisioner_provider::Result<DomainValidation> {
        Ok(DomainValidation {
            valid: false,
            validation_results: Some(serde_json::json!({"mail_cname": {"valid": false}})),
        })
    }

    fn valid() -> domain_provisioner_provider::Result<DomainValidation> {
        Ok(DomainValidation {
            valid: true,
            validation_results: None,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn creates_auth_and_publishes_records() {
        let t = create_test_context();
        t.email.push_validation(valid()).await;
        let service = DomainAuthService::new(t.ctx.clone());

        let outcome = service.provision_domain_auth("example.com", KEY).await;

        assert!(outcome.ok, "{}", outcome.output());
        assert!(outcome.validated);
        assert_eq!(outcome.domain_auth_id.as_deref(), Some("auth-1"));
        assert_eq!(outcome.zone_id.as_deref(), Some("Z1"));
        assert_eq!(t.email.create_calls(), 1);
        assert_eq!(t.dns.create_calls(), 3);
        assert_eq!(t.email_factory.keys(), [KEY]);

        let records = t.dns.records("Z1").await;
        assert!(records.iter().all(|r| r.proxied == Some(false)));
        assert!(records
            .iter()
            .any(|r| r.name == "s1._domainkey.example.com"
                && r.content == "s1.domainkey.u1.wl.sendgrid.net"));

        let output = outcome.output();
        assert!(output.contains("Domain auth created (ID: auth-1)"));
        assert!(output.contains(
            "dkim1: Created s1._domainkey.example.com → s1.domainkey.u1.wl.sendgrid.net (OK)"
        ));
        assert!(output.contains("Verified sender registered: noreply@example.com"));
    }

    #[tokio::test(start_paused = true)]
    async fn reuses_existing_domain_auth() {
        let t = create_test_context();
        t.email.insert_auth(domain_auth("77", "example.com")).await;
        let service = DomainAuthService::new(t.ctx.clone());

        let outcome = service.provision_domain_auth("example.com", KEY).await;

        assert!(outcome.ok);
        assert_eq!(t.email.create_calls(), 0);
        assert_eq!(outcome.domain_auth_id.as_deref(), Some("77"));
        assert!(outcome.output().contains("Found existing domain auth (ID: 77)"));
    }

    #[tokio::test(start_paused = true)]
    async fn rerun_converges_without_duplicates() {
        let t = create_test_context();
        let service = DomainAuthService::new(t.ctx.clone());

        let first = service.provision_domain_auth("example.com", KEY).await;
        let after_first = t.dns.records("Z1").await;
        let second = service.provision_domain_auth("example.com", KEY).await;
        let after_second = t.dns.records("Z1").await;

        assert!(first.ok && second.ok);
        assert_eq!(t.email.create_calls(), 1);
        assert_eq!(t.dns.create_calls(), 3);
        assert_eq!(t.dns.update_calls(), 3);
        assert_eq!(after_first.len(), after_second.len());
        for record in &after_first {
            let again = after_second.iter().find(|r| r.id == record.id).unwrap();
            assert_eq!(again.content, record.content);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn drifted_record_is_updated() {
        let t = create_test_context();
        t.email.insert_auth(domain_auth("77", "example.com")).await;
        t.dns
            .insert_record("Z1", existing_cname("rec-dkim1", "s1._domainkey.example.com", "stale.example.net"))
            .await;
        let service = DomainAuthService::new(t.ctx.clone());

        service.provision_domain_auth("example.com", KEY).await;

        let records = t.dns.records("Z1").await;
        let dkim1 = records.iter().find(|r| r.id == "rec-dkim1").unwrap();
        assert_eq!(dkim1.content, "s1.domainkey.u1.wl.sendgrid.net");
        assert_eq!(t.dns.update_calls(), 1);
        assert_eq!(t.dns.create_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_dns_credentials_fail_without_calls() {
        let t = create_test_context_with(ProvisionerConfig::default(), false);
        let service = DomainAuthService::new(t.ctx.clone());

        let outcome = service.provision_domain_auth("example.com", KEY).await;

        assert!(!outcome.ok);
        assert!(outcome.output().contains("Cloudflare credentials not available"));
        assert_eq!(t.email.list_calls(), 0);
        assert_eq!(t.dns.total_calls(), 0);
        assert!(t.email_factory.keys().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_email_key_fails_without_calls() {
        let t = create_test_context();
        let service = DomainAuthService::new(t.ctx.clone());

        let outcome = service.provision_domain_auth("example.com", "  ").await;

        assert!(!outcome.ok);
        assert!(outcome.log.has(StepStatus::Failed));
        assert_eq!(t.email.list_calls(), 0);
        assert_eq!(t.dns.total_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn polls_three_times_then_reports_unvalidated() {
        let t = create_test_context();
        for _ in 0..3 {
            t.email.push_validation(pending()).await;
        }
        let service = DomainAuthService::new(t.ctx.clone());

        let started = Instant::now();
        let outcome = service.provision_domain_auth("example.com", KEY).await;

        assert!(started.elapsed() >= Duration::from_secs(15));
        assert!(outcome.ok);
        assert!(!outcome.validated);
        assert_eq!(t.email.validate_calls(), 3);
        let output = outcome.output();
        assert!(output.contains("Validation attempt 3/3..."));
        assert!(output.contains("Details: "));
        assert!(output.contains("Domain not yet validated"));
        // 验证失败不影响发件人注册
        assert_eq!(t.email.sender_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_polling_on_first_valid() {
        let t = create_test_context();
        t.email.push_validation(pending()).await;
        t.email.push_validation(valid()).await;
        let service = DomainAuthService::new(t.ctx.clone());

        let started = Instant::now();
        let outcome = service.provision_domain_auth("example.com", KEY).await;

        assert!(outcome.validated);
        assert_eq!(t.email.validate_calls(), 2);
        assert!(started.elapsed() >= Duration::from_secs(10));
        assert!(started.elapsed() < Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn validation_errors_are_not_fatal() {
        let t = create_test_context();
        t.email
            .push_validation(Err(ProviderError::NetworkError {
                provider: "sendgrid".to_string(),
                detail: "connection reset".to_string(),
            }))
            .await;
        t.email.push_validation(valid()).await;
        let service = DomainAuthService::new(t.ctx.clone());

        let outcome = service.provision_domain_auth("example.com", KEY).await;

        assert!(outcome.ok && outcome.validated);
        assert!(outcome.output().contains("Validation API error"));
    }

    #[tokio::test(start_paused = true)]
    async fn exponential_policy_keeps_attempt_bound() {
        let config = ProvisionerConfig {
            validation: RetryPolicy {
                backoff: Backoff::Exponential,
                delay_ms: 1_000,
                ..RetryPolicy::default()
            },
            ..ProvisionerConfig::default()
        };
        let t = create_test_context_with(config, true);
        let service = DomainAuthService::new(t.ctx.clone());

        let started = Instant::now();
        let outcome = service.provision_domain_auth("example.com", KEY).await;

        assert!(!outcome.validated);
        assert_eq!(t.email.validate_calls(), 3);
        // 1s + 2s + 4s
        assert!(started.elapsed() >= Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn configured_attempt_count_is_ignored() {
        for json in [
            r#"{"validation":{"maxAttempts":10}}"#,
            r#"{"validation":{"maxAttempts":0}}"#,
        ] {
            let config: ProvisionerConfig = serde_json::from_str(json).unwrap();
            let t = create_test_context_with(config, true);
            let service = DomainAuthService::new(t.ctx.clone());

            let outcome = service.provision_domain_auth("example.com", KEY).await;

            assert!(!outcome.validated);
            assert_eq!(t.email.validate_calls(), 3, "{json}");
            assert!(outcome.output().contains("Validation attempt 3/3..."));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn incomplete_env_credentials_fail_in_preflight() {
        let config = ProvisionerConfig::from_lookup(|key: &str| {
            (key == "CLOUDFLARE_API_KEY").then(|| "global-key".to_string())
        });
        let ctx = Arc::new(ServiceContext::from_config(config).unwrap());

        let outcome = DomainAuthService::new(ctx).provision_domain_auth("example.com", KEY).await;

        assert!(!outcome.ok);
        assert!(outcome.domain_auth_id.is_none());
        assert_eq!(outcome.log.records.len(), 1);
        assert!(outcome.output().contains("Cloudflare credentials not available"));
    }

    #[tokio::test(start_paused = true)]
    async fn existing_sender_counts_as_registered() {
        let t = create_test_context();
        t.email
            .fail_sender(ProviderError::AlreadyExists {
                provider: "sendgrid".to_string(),
                resource: "noreply@example.com".to_string(),
                raw_message: Some("already exists".to_string()),
            })
            .await;
        let service = DomainAuthService::new(t.ctx.clone());

        let outcome = service.provision_domain_auth("example.com", KEY).await;

        assert!(outcome.ok);
        let sender_steps: Vec<_> = outcome.log.step(STEP_SENDER).collect();
        assert_eq!(sender_steps.last().unwrap().status, StepStatus::Ok);
        assert!(outcome
            .output()
            .contains("Verified sender already exists: noreply@example.com"));
    }

    #[tokio::test(start_paused = true)]
    async fn other_sender_failures_are_warnings() {
        let t = create_test_context();
        t.email
            .fail_sender(ProviderError::InvalidParameter {
                provider: "sendgrid".to_string(),
                param: "from_email".to_string(),
                detail: "invalid address".to_string(),
            })
            .await;
        let service = DomainAuthService::new(t.ctx.clone());

        let outcome = service.provision_domain_auth("example.com", KEY).await;

        assert!(outcome.ok);
        assert!(outcome.log.has(StepStatus::Warning));
        assert!(outcome.output().contains("Failed to register verified sender"));
    }

    #[tokio::test(start_paused = true)]
    async fn zone_not_found_is_terminal() {
        let t = create_test_context();
        let service = DomainAuthService::new(t.ctx.clone());

        let outcome = service.provision_domain_auth("unknown.org", KEY).await;

        assert!(!outcome.ok);
        assert!(outcome
            .output()
            .contains("Domain unknown.org not found in DNS provider account"));
        assert_eq!(t.dns.list_calls(), 0);
        assert_eq!(t.email.validate_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_domain_creation_is_terminal() {
        let t = create_test_context();
        t.email
            .fail_create(ProviderError::InvalidParameter {
                provider: "sendgrid".to_string(),
                param: "domain".to_string(),
                detail: "domain is invalid".to_string(),
            })
            .await;
        let service = DomainAuthService::new(t.ctx.clone());

        let outcome = service.provision_domain_auth("example.com", KEY).await;

        assert!(!outcome.ok);
        assert!(outcome.domain_auth_id.is_none());
        assert_eq!(t.dns.find_zone_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn list_failure_is_terminal() {
        let t = create_test_context();
        t.email
            .fail_list(ProviderError::InvalidCredentials {
                provider: "sendgrid".to_string(),
                raw_message: Some("authorization required".to_string()),
            })
            .await;
        let service = DomainAuthService::new(t.ctx.clone());

        let outcome = service.provision_domain_auth("example.com", KEY).await;

        assert!(!outcome.ok);
        assert!(outcome.output().contains("Email provider API error"));
        assert_eq!(t.email.create_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_sub_record_is_a_warning() {
        let t = create_test_context();
        let mut auth = domain_auth("77", "example.com");
        auth.dns.dkim2 = None;
        t.email.insert_auth(auth).await;
        let service = DomainAuthService::new(t.ctx.clone());

        let outcome = service.provision_domain_auth("example.com", KEY).await;

        assert!(outcome.ok);
        assert_eq!(t.dns.create_calls(), 2);
        assert!(outcome
            .output()
            .contains("Warning: dkim2 record not provided by email provider"));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_record_write_is_not_fatal() {
        let t = create_test_context();
        t.dns
            .fail_writes_for(
                "em1.example.com",
                ProviderError::QuotaExceeded {
                    provider: "cloudflare".to_string(),
                    raw_message: None,
                },
            )
            .await;
        let service = DomainAuthService::new(t.ctx.clone());

        let outcome = service.provision_domain_auth("example.com", KEY).await;

        assert!(outcome.ok);
        assert_eq!(t.dns.create_calls(), 3);
        assert!(outcome.output().contains("Quota exceeded"));
        assert_eq!(t.email.validate_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn record_list_failure_is_terminal() {
        let t = create_test_context();
        t.dns
            .fail_list(ProviderError::NetworkError {
                provider: "cloudflare".to_string(),
                detail: "connection reset".to_string(),
            })
            .await;
        let service = DomainAuthService::new(t.ctx.clone());

        let outcome = service.provision_domain_auth("example.com", KEY).await;

        assert!(!outcome.ok);
        assert!(outcome.output().contains("Failed to fetch DNS records"));
        assert_eq!(t.email.validate_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_runs_for_one_domain_do_not_duplicate() {
        let t = create_test_context();
        let service = Arc::new(DomainAuthService::new(t.ctx.clone()));

        let a = {
            let s = service.clone();
            tokio::spawn(async move { s.provision_domain_auth("example.com", KEY).await })
        };
        let b = {
            let s = service.clone();
            tokio::spawn(async move { s.provision_domain_auth("EXAMPLE.com", KEY).await })
        };
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        assert!(a.ok && b.ok);
        assert_eq!(t.email.create_calls(), 1);
        assert_eq!(t.dns.create_calls(), 3);
        assert_eq!(t.dns.records("Z1").await.len(), 3);
    }
}
