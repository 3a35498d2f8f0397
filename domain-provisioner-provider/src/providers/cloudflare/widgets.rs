//! Cloudflare Turnstile（WidgetProvider trait 实现）

use async_trait::async_trait;

use crate::error::{ProviderError, Result};
use crate::traits::{DnsProvider, ErrorContext, WidgetProvider};
use crate::types::{Widget, WidgetRequest};

use super::{CloudflareProvider, CloudflareWidget, CloudflareWidgetBody};

/// Turnstile 列表 API 单页最大数量
const MAX_PAGE_SIZE_WIDGETS: u32 = 50;

impl CloudflareProvider {
    fn widget_from_cf(widget: CloudflareWidget) -> Widget {
        Widget {
            site_key: widget.sitekey,
            secret: widget.secret,
            name: widget.name,
            domains: widget.domains,
        }
    }
}

#[async_trait]
impl WidgetProvider for CloudflareProvider {
    fn id(&self) -> &'static str {
        "cloudflare"
    }

    async fn account_id_for_zone(&self, zone_id: &str) -> Result<Option<String>> {
        match self.get_zone(zone_id).await {
            Ok(zone) => Ok(zone.account_id),
            Err(ProviderError::DomainNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list_widgets(&self, account_id: &str) -> Result<Vec<Widget>> {
        let mut widgets = Vec::new();
        let mut page = 1_u32;

        loop {
            let path = format!(
                "/accounts/{account_id}/challenges/widgets?page={page}&per_page={MAX_PAGE_SIZE_WIDGETS}"
            );
            let (batch, total_count): (Vec<CloudflareWidget>, u32) =
                self.get_page(&path, ErrorContext::default()).await?;
            let fetched = batch.len();
            widgets.extend(batch.into_iter().map(Self::widget_from_cf));

            if fetched == 0 || widgets.len() >= total_count as usize {
                break;
            }
            page += 1;
        }

        Ok(widgets)
    }

    async fn get_widget(&self, account_id: &str, site_key: &str) -> Result<Widget> {
        let widget: CloudflareWidget = self
            .get(
                &format!("/accounts/{account_id}/challenges/widgets/{site_key}"),
                ErrorContext::resource(site_key),
            )
            .await?;
        Ok(Self::widget_from_cf(widget))
    }

    async fn create_widget(&self, account_id: &str, request: &WidgetRequest) -> Result<Widget> {
        let widget: CloudflareWidget = self
            .post(
                &format!("/accounts/{account_id}/challenges/widgets"),
                &CloudflareWidgetBody::from(request),
                ErrorContext::resource(&request.name),
            )
            .await?;
        Ok(Self::widget_from_cf(widget))
    }
}
