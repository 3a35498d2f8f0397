//! 聊天登录校验
//!
//! Checks the signature the chat platform's login widget attaches to its callback,
//! and caches the bot identity the widget needs to render.

use std::collections::BTreeMap;
use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;

use domain_provisioner_provider::{
    create_bot_directory, BotDirectory, BotIdentity, ProviderCredentials,
};

use crate::error::CoreResult;

type HmacSha256 = Hmac<Sha256>;

const HASH_FIELD: &str = "hash";

/// Whether `fields` carry a valid login-widget signature for `bot_token`.
///
/// The data-check string is every field except `hash`, sorted by key, as `key=value`
/// lines joined by `\n`. The HMAC key is SHA-256 of the bot token. A missing or
/// non-hex `hash` is simply invalid.
pub fn verify_login_widget(fields: &BTreeMap<String, String>, bot_token: &str) -> bool {
    let Some(expected) = fields.get(HASH_FIELD) else {
        return false;
    };
    let Ok(signature) = hex::decode(expected) else {
        return false;
    };

    let data_check = fields
        .iter()
        .filter(|(key, _)| key.as_str() != HASH_FIELD)
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n");

    let secret = Sha256::digest(bot_token.as_bytes());
    let Ok(mut mac) = HmacSha256::new_from_slice(&secret) else {
        return false;
    };
    mac.update(data_check.as_bytes());
    // 常量时间比较
    mac.verify_slice(&signature).is_ok()
}

/// Lazily fetched bot identity.
///
/// The first successful lookup is kept for the lifetime of the cache; concurrent
/// callers share one request. A failed lookup is not remembered, so the next call
/// asks again.
pub struct BotIdentityCache {
    directory: Option<Arc<dyn BotDirectory>>,
    identity: OnceCell<BotIdentity>,
}

impl BotIdentityCache {
    #[must_use]
    pub fn new(directory: Option<Arc<dyn BotDirectory>>) -> Self {
        Self {
            directory,
            identity: OnceCell::new(),
        }
    }

    /// Cache backed by the real bot API; `None` or a blank token disables lookups.
    pub fn from_token(bot_token: Option<String>) -> CoreResult<Self> {
        let directory = match bot_token.filter(|t| !t.trim().is_empty()) {
            Some(bot_token) => Some(create_bot_directory(ProviderCredentials::Telegram {
                bot_token,
            })?),
            None => None,
        };
        Ok(Self::new(directory))
    }

    /// Bot identity, or `None` when no bot is configured or the lookup failed.
    pub async fn get(&self) -> Option<BotIdentity> {
        let directory = self.directory.as_ref()?;
        match self
            .identity
            .get_or_try_init(|| async { directory.get_me().await })
            .await
        {
            Ok(identity) => Some(identity.clone()),
            Err(e) => {
                log::error!("Failed to fetch bot identity: {e}");
                None
            }
        }
    }
}
