//! Cloudflare DnsProvider trait 实现

use async_trait::async_trait;

use crate::error::Result;
use crate::traits::{DnsProvider, ErrorContext};
use crate::types::{DesiredRecord, ExistingRecord, Zone};

use super::{
    CloudflareDnsRecord, CloudflareProvider, CloudflareRecordBody, CloudflareZone,
    MAX_PAGE_SIZE_RECORDS,
};

/// Cloudflare 中 ttl=1 表示自动
const AUTOMATIC_TTL: u32 = 1;

impl CloudflareProvider {
    pub(crate) fn zone_from_cf(zone: CloudflareZone) -> Zone {
        Zone {
            id: zone.id,
            name: zone.name,
            account_id: zone.account.map(|a| a.id),
        }
    }

    pub(crate) fn record_from_cf(record: CloudflareDnsRecord) -> ExistingRecord {
        ExistingRecord {
            id: record.id,
            name: record.name,
            record_type: record.record_type,
            content: record.content,
            proxied: record.proxied,
            ttl: record.ttl,
            updated_at: record.modified_on,
        }
    }

    fn record_body(record: &DesiredRecord) -> CloudflareRecordBody<'_> {
        CloudflareRecordBody {
            record_type: record.record_type.as_str(),
            name: &record.name,
            content: &record.content,
            proxied: record.proxied,
            ttl: AUTOMATIC_TTL,
        }
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    fn id(&self) -> &'static str {
        "cloudflare"
    }

    async fn find_zone(&self, name: &str) -> Result<Option<Zone>> {
        let path = format!("/zones?name={}", urlencoding::encode(name));
        let (zones, _): (Vec<CloudflareZone>, u32) =
            self.get_page(&path, ErrorContext::domain(name)).await?;
        Ok(zones.into_iter().next().map(Self::zone_from_cf))
    }

    async fn get_zone(&self, zone_id: &str) -> Result<Zone> {
        let zone: CloudflareZone = self
            .get(&format!("/zones/{zone_id}"), ErrorContext::domain(zone_id))
            .await?;
        Ok(Self::zone_from_cf(zone))
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<ExistingRecord>> {
        let mut records = Vec::new();
        let mut page = 1_u32;

        loop {
            let path = format!(
                "/zones/{zone_id}/dns_records?page={page}&per_page={MAX_PAGE_SIZE_RECORDS}"
            );
            let (batch, total_count): (Vec<CloudflareDnsRecord>, u32) =
                self.get_page(&path, ErrorContext::domain(zone_id)).await?;
            let fetched = batch.len();
            records.extend(batch.into_iter().map(Self::record_from_cf));

            if fetched == 0 || records.len() >= total_count as usize {
                break;
            }
            page += 1;
        }

        log::debug!("Zone {zone_id}: {} existing records", records.len());
        Ok(records)
    }

    async fn create_record(&self, zone_id: &str, record: &DesiredRecord) -> Result<ExistingRecord> {
        let created: CloudflareDnsRecord = self
            .post(
                &format!("/zones/{zone_id}/dns_records"),
                &Self::record_body(record),
                ErrorContext::resource(&record.name),
            )
            .await?;
        Ok(Self::record_from_cf(created))
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &DesiredRecord,
    ) -> Result<ExistingRecord> {
        let context = ErrorContext {
            resource: Some(record.name.clone()),
            record_id: Some(record_id.to_string()),
            domain: Some(zone_id.to_string()),
        };
        let updated: CloudflareDnsRecord = self
            .put(
                &format!("/zones/{zone_id}/dns_records/{record_id}"),
                &Self::record_body(record),
                context,
            )
            .await?;
        Ok(Self::record_from_cf(updated))
    }
}
