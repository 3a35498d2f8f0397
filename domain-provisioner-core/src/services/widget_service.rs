//! 人机验证组件
//!
//! Looks the widget up by name before creating it, so a rerun returns the existing
//! site key and secret instead of a duplicate widget.

use std::sync::Arc;

use domain_provisioner_provider::{WidgetProvider, WidgetRequest};

use crate::services::ServiceContext;
use crate::types::{ProvisioningLog, WidgetOutcome};
use crate::utils::domain::normalize_domain_name;

const STEP_PREFLIGHT: &str = "preflight";
const STEP_ACCOUNT: &str = "account_lookup";
const STEP_WIDGET: &str = "widget";

/// 人机验证组件服务
pub struct WidgetService {
    ctx: Arc<ServiceContext>,
}

impl WidgetService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Provisions the contact-form widget for `domain` in the account owning `zone_id`.
    pub async fn create_widget(&self, domain: &str, zone_id: &str) -> WidgetOutcome {
        let mut log = ProvisioningLog::new();
        let domain = normalize_domain_name(domain);

        let provider = match self.ctx.widget_provider() {
            Ok(p) => p,
            Err(e) => {
                log.failed(STEP_PREFLIGHT, e.to_string());
                return WidgetOutcome::failed(log);
            }
        };
        if domain.is_empty() || zone_id.trim().is_empty() {
            log.failed(STEP_PREFLIGHT, "Domain and zone id are required");
            return WidgetOutcome::failed(log);
        }

        let _guard = self.ctx.locks().acquire(&domain).await;

        let account_id = match provider.account_id_for_zone(zone_id).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                log.failed(STEP_ACCOUNT, "Could not determine DNS provider account ID");
                return WidgetOutcome::failed(log);
            }
            Err(e) => {
                log.failed(
                    STEP_ACCOUNT,
                    format!("Could not determine DNS provider account ID: {e}"),
                );
                return WidgetOutcome::failed(log);
            }
        };

        let settings = &self.ctx.config().widget;
        let request = WidgetRequest {
            name: settings.widget_name(&domain),
            domains: settings.widget_domains(&domain),
            mode: settings.mode,
            bot_fight_mode: settings.bot_fight_mode,
        };

        if let Some((site_key, secret)) =
            find_existing(provider.as_ref(), &account_id, &request, &mut log).await
        {
            log.ok(
                STEP_WIDGET,
                format!("Reusing existing Turnstile widget: {site_key}"),
            );
            return WidgetOutcome {
                ok: true,
                site_key: Some(site_key),
                secret_key: secret,
                reused: true,
                log,
            };
        }

        match provider.create_widget(&account_id, &request).await {
            Ok(widget) => {
                log.ok(
                    STEP_WIDGET,
                    format!("Turnstile widget created: {}", widget.site_key),
                );
                WidgetOutcome {
                    ok: true,
                    site_key: Some(widget.site_key),
                    secret_key: widget.secret,
                    reused: false,
                    log,
                }
            }
            Err(e) => {
                log.failed(STEP_WIDGET, format!("Turnstile creation failed: {e}"));
                WidgetOutcome::failed(log)
            }
        }
    }
}

/// Site key and secret of the widget named like `request`. A failed lookup falls
/// through to creation.
async fn find_existing(
    provider: &dyn WidgetProvider,
    account_id: &str,
    request: &WidgetRequest,
    log: &mut ProvisioningLog,
) -> Option<(String, Option<String>)> {
    let existing = match provider.list_widgets(account_id).await {
        Ok(widgets) => widgets.into_iter().find(|w| w.name == request.name)?,
        Err(e) => {
            log.warning(STEP_WIDGET, format!("Could not list existing widgets: {e}"));
            return None;
        }
    };

    // 列表接口不返回 secret
    let secret = match provider.get_widget(account_id, &existing.site_key).await {
        Ok(detail) => detail.secret,
        Err(e) => {
            log.warning(
                STEP_WIDGET,
                format!("Could not fetch secret of widget {}: {e}", existing.site_key),
            );
            None
        }
    };
    Some((existing.site_key, secret))
}
