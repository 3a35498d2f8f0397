//! Log sanitization utilities
//!
//! Response bodies can carry DKIM targets, widget secrets and provider diagnostics;
//! they are truncated before they reach debug/error logs. Credentials are masked.

/// Maximum number of bytes of a body included in log output.
const TRUNCATE_LIMIT: usize = 256;

/// Number of leading characters of a secret left visible by [`mask_secret`].
const SECRET_VISIBLE_PREFIX: usize = 4;

/// Largest char boundary `<= index`.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        s.len()
    } else {
        let mut i = index;
        while i > 0 && !s.is_char_boundary(i) {
            i -= 1;
        }
        i
    }
}

/// Truncate a string for safe logging.
///
/// Strings within the limit are returned unchanged; longer ones are cut at a char
/// boundary and suffixed with the original byte length.
pub fn truncate_for_log(s: &str) -> String {
    if s.len() <= TRUNCATE_LIMIT {
        s.to_string()
    } else {
        format!(
            "{}... [truncated, total {} bytes]",
            &s[..floor_char_boundary(s, TRUNCATE_LIMIT)],
            s.len()
        )
    }
}

/// Mask a credential, keeping only a short prefix (e.g. `SG.a***`).
///
/// Secrets shorter than twice the visible prefix are masked entirely.
pub fn mask_secret(secret: &str) -> String {
    if secret.chars().count() < SECRET_VISIBLE_PREFIX * 2 {
        return "***".to_string();
    }
    let prefix: String = secret.chars().take(SECRET_VISIBLE_PREFIX).collect();
    format!("{prefix}***")
}
