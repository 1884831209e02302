//! HMAC-SHA256 signing and wall-clock timestamps

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

/// Lowercase hex HMAC-SHA256 of `message` keyed with `secret`
///
/// An empty secret is accepted and yields the MAC under an empty key.
pub fn hmac_sha256_hex(secret: &[u8], message: &[u8]) -> String {
    // HMAC-SHA256 accepts keys of any size, this should never fail
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret) {
        Ok(m) => m,
        Err(e) => {
            tracing::error!("HMAC initialization failed: {}", e);
            return String::new();
        }
    };
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

/// Current Unix time in whole seconds
/// Returns 0 if system time is unavailable (extremely rare)
pub fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_else(|e| {
            tracing::error!("System time error: {}", e);
            0
        })
}

/// Current Unix time in milliseconds
/// Returns 0 if system time is unavailable (extremely rare)
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_else(|e| {
            tracing::error!("System time error: {}", e);
            0
        })
}
