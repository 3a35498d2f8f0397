//! 类型定义模块

mod outcome;
mod step_log;

pub use outcome::{DomainAuthOutcome, RecordAction, RecordOutcome, WebDnsOutcome, WidgetOutcome};
pub use step_log::{ProvisioningLog, StepRecord, StepStatus};

// Re-export provider 库的公共类型
pub use domain_provisioner_provider::{
    AuthDnsRecord, BotIdentity, DesiredRecord, DnsRecordType, DomainAuth, DomainAuthDns,
    DomainValidation, ExistingRecord, ProviderCredentials, VerifiedSenderRequest, Widget,
    WidgetMode, WidgetRequest, Zone,
};
