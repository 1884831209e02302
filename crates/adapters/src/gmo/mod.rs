//! GMO Coin Exchange Adapter
//!
//! Market buys of BTC/JPY on GMO Coin spot.
//!
//! # Module Structure
//!
//! - [`account`] - Authentication, HTTP client, response envelope, converters
//! - [`spot`] - Ticker read and order submission
//!
//! # Authentication
//!
//! GMO Coin uses HMAC-SHA256 signatures:
//! - String to sign: `timestamp + method + path + query + body`
//! - Timestamp is Unix milliseconds
//! - Required headers: API-KEY, API-TIMESTAMP, API-SIGN
//!
//! # Failure Policy
//!
//! Network and protocol failures are logged and swallowed by default
//! ([`crate::traits::ErrorPolicy::ReturnSentinel`]). Ticker responses with a
//! non-zero or missing `status` are errors carrying the `messages` list.

pub mod account;
pub mod spot;

pub use spot::GmoSpotAdapter;
