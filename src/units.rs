//! Native amount conversion and display helpers

use alloy_primitives::utils::{format_ether, parse_ether};
use alloy_primitives::{Address, U256};

use crate::error::{Error, Result};

/// Fractional digits kept when turning a user amount into wei.
///
/// Capped below the 18 decimals of the native unit.
pub const DEPOSIT_FRACTION_DIGITS: usize = 17;

/// Render a deposit amount with exactly [`DEPOSIT_FRACTION_DIGITS`] decimals
pub fn fixed_amount(amount: f64) -> Result<String> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount(format!(
            "{} (must be a positive number)",
            amount
        )));
    }
    Ok(format!("{:.*}", DEPOSIT_FRACTION_DIGITS, amount))
}

/// Parse a decimal native amount into wei
pub fn parse_native(text: &str) -> Result<U256> {
    parse_ether(text).map_err(|e| Error::InvalidAmount(format!("{}: {}", text, e)))
}

/// Format wei as a decimal native amount
pub fn format_native(wei: U256) -> String {
    format_ether(wei)
}

/// `0x12345...abcde` form of the checksummed address
pub fn short_address(address: &Address) -> String {
    let full = address.to_checksum(None);
    format!("{}...{}", &full[..7], &full[full.len() - 5..])
}
