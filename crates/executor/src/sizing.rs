//! Order sizing: how much BTC a JPY budget buys at the current price

use crate::{ExecutorError, Result};

/// Decimal places used when an amount is written to the log
pub const LOG_DECIMALS: usize = 8;

/// `budget_jpy / price`, unrounded
pub fn compute_order_size(budget_jpy: f64, price: f64) -> Result<f64> {
    if !price.is_finite() || price <= 0.0 {
        return Err(ExecutorError::InvalidPrice(price));
    }
    if !budget_jpy.is_finite() || budget_jpy <= 0.0 {
        return Err(ExecutorError::InvalidBudget(budget_jpy));
    }
    let size = budget_jpy / price;
    if !size.is_finite() || size <= 0.0 {
        return Err(ExecutorError::InvalidSize(size));
    }
    Ok(size)
}

/// Fixed-precision rendering for log lines only
pub fn format_size(size: f64) -> String {
    format!("{:.*}", LOG_DECIMALS, size)
}
