//! 按域名互斥
//!
//! Two provisioning runs for the same domain would interleave create/update calls
//! against the same zone. Runs for different domains do not block each other.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use super::domain::apex_domain;

/// Held for the duration of one run; dropping it releases the domain.
pub type DomainGuard = OwnedMutexGuard<()>;

#[derive(Debug, Default)]
pub struct DomainLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DomainLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other run holds `domain`. `www.<apex>` and `<apex>` share a lock.
    pub async fn acquire(&self, domain: &str) -> DomainGuard {
        let key = apex_domain(domain);
        let lock = {
            let mut locks = self.locks.lock().await;
            // 清理无人持有的条目
            locks.retain(|_, l| Arc::strong_count(l) > 1);
            locks.entry(key.clone()).or_default().clone()
        };
        if lock.try_lock().is_err() {
            log::info!("Waiting for another provisioning run on {key}");
        }
        lock.lock_owned().await
    }
}
