//! Domain name helpers

pub use domain_provisioner_provider::{normalize_domain_name, same_host};

/// Strips one leading `www.` label; everything else is returned normalized.
pub fn apex_domain(domain: &str) -> String {
    let normalized = normalize_domain_name(domain);
    match normalized.strip_prefix("www.") {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => normalized,
    }
}
