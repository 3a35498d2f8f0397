//! SendGrid EmailDomainProvider trait 实现

use async_trait::async_trait;

use crate::error::Result;
use crate::providers::common::parse_record_type;
use crate::traits::{EmailDomainProvider, ErrorContext, ProviderErrorMapper};
use crate::types::{
    AuthDnsRecord, DomainAuth, DomainAuthDns, DomainValidation, VerifiedSenderRequest,
};

use super::types::SendgridDnsRecord;
use super::{SendgridCreateDomainBody, SendgridDomain, SendgridProvider, SendgridValidation};

impl SendgridProvider {
    fn auth_record(&self, record: Option<SendgridDnsRecord>) -> Result<Option<AuthDnsRecord>> {
        record
            .map(|r| {
                Ok(AuthDnsRecord {
                    record_type: parse_record_type(&r.record_type, self.provider_name())?,
                    host: r.host,
                    data: r.data,
                })
            })
            .transpose()
    }

    fn domain_from_sg(&self, domain: SendgridDomain) -> Result<DomainAuth> {
        Ok(DomainAuth {
            id: domain.id.to_string(),
            domain: domain.domain,
            valid: domain.valid,
            dns: DomainAuthDns {
                mail_cname: self.auth_record(domain.dns.mail_cname)?,
                dkim1: self.auth_record(domain.dns.dkim1)?,
                dkim2: self.auth_record(domain.dns.dkim2)?,
            },
        })
    }
}

#[async_trait]
impl EmailDomainProvider for SendgridProvider {
    fn id(&self) -> &'static str {
        "sendgrid"
    }

    async fn list_domain_auths(&self) -> Result<Vec<DomainAuth>> {
        let value: serde_json::Value = self
            .get("/whitelabel/domains", ErrorContext::default())
            .await?;
        if !value.is_array() {
            return Err(self.parse_error("unexpected response: domain list is not an array"));
        }
        let domains: Vec<SendgridDomain> =
            serde_json::from_value(value).map_err(|e| self.parse_error(e))?;
        domains
            .into_iter()
            .map(|d| self.domain_from_sg(d))
            .collect()
    }

    async fn create_domain_auth(&self, domain: &str) -> Result<DomainAuth> {
        let body = self.to_body(&SendgridCreateDomainBody {
            domain,
            automatic_security: true,
            default: true,
        })?;
        let created: SendgridDomain = self
            .post(
                "/whitelabel/domains",
                Some(body),
                ErrorContext {
                    resource: Some(domain.to_string()),
                    domain: Some(domain.to_string()),
                    ..ErrorContext::default()
                },
            )
            .await?;
        self.domain_from_sg(created)
    }

    async fn validate_domain_auth(&self, domain_auth_id: &str) -> Result<DomainValidation> {
        let validation: SendgridValidation = self
            .post(
                &format!("/whitelabel/domains/{domain_auth_id}/validate"),
                None,
                ErrorContext::domain(domain_auth_id),
            )
            .await?;
        Ok(DomainValidation {
            valid: validation.valid,
            validation_results: validation.validation_results,
        })
    }

    async fn create_verified_sender(&self, sender: &VerifiedSenderRequest) -> Result<()> {
        self.post_no_content(
            "/verified_senders",
            sender,
            ErrorContext::resource(&sender.from_email),
        )
        .await
    }
}
