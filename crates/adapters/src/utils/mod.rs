//! Shared plumbing for the exchange adapters
//!
//! - HMAC-SHA256 signing and clock helpers
//! - HTTP transport applying an [`ErrorPolicy`](crate::traits::ErrorPolicy)

pub mod http;
pub mod signing;

pub use http::{json_f64, RestTransport, DEFAULT_TIMEOUT};
pub use signing::{hmac_sha256_hex, unix_millis, unix_secs};
