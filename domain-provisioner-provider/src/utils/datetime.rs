//! Serde helpers for optional provider timestamps
//!
//! Cloudflare reports `created_on`/`modified_on` as RFC3339 strings with fractional
//! seconds. Missing, `null` and unparseable values all decode to `None`, so a
//! malformed timestamp never fails a whole record listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Serialize `Option<DateTime<Utc>>` as an optional RFC3339 string
#[allow(clippy::ref_option)]
pub fn serialize<S>(dt: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match dt {
        Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
        None => serializer.serialize_none(),
    }
}

/// Deserialize an optional RFC3339 string, tolerating garbage
pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| match DateTime::parse_from_rfc3339(&s) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            log::debug!("Ignoring unparseable timestamp '{s}': {e}");
            None
        }
    }))
}
