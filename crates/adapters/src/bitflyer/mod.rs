//! bitFlyer Exchange Adapter
//!
//! Market buys of BTC/JPY on bitFlyer Lightning.
//!
//! # Module Structure
//!
//! - [`account`] - Authentication, HTTP client, and type converters
//! - [`spot`] - Ticker read and child order submission
//!
//! # Authentication
//!
//! bitFlyer uses HMAC-SHA256 signatures:
//! - String to sign: `timestamp + method + path + body`
//! - Timestamp is Unix seconds
//! - Required headers: ACCESS-KEY, ACCESS-TIMESTAMP, ACCESS-SIGN
//!
//! # Failure Policy
//!
//! Propagates every error by default. See [`crate::traits::ErrorPolicy`].
//!
//! # Key Differences from GMO Coin
//!
//! | Feature | bitFlyer | GMO Coin |
//! |---------|----------|----------|
//! | Timestamp unit | Seconds | Milliseconds |
//! | Header prefix | `ACCESS-` | `API-` |
//! | Ticker price | `ltp` | `data[0].last` |
//! | Status envelope | Errors only | Every response |
//! | Order size | JSON number | JSON string |
//! | Default policy | Propagate | ReturnSentinel |

pub mod account;
pub mod spot;

pub use spot::BitflyerSpotAdapter;
