//! Exact conversion between display amounts and smallest ledger units.
//!
//! Amounts travel through the flow as the user's decimal string and are
//! converted once, exactly, at transaction construction. Anything that
//! cannot be represented without loss is rejected instead of rounded;
//! floating point is never involved.

use ethers::types::U256;
use ethers::utils::parse_ether;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::core::errors::WalletError;

/// Wei per ether exponent.
pub const ETH_DECIMALS: u32 = 18;
/// Satoshi per bitcoin exponent.
pub const BTC_DECIMALS: u32 = 8;

const SAT_PER_BTC: u64 = 100_000_000;

fn parse_positive_decimal(raw: &str, max_scale: u32) -> Result<Decimal, WalletError> {
    let value = Decimal::from_str(raw.trim()).map_err(|e| {
        WalletError::InvalidAmount(format!("amount is not valid, amount={}: {}", raw, e))
    })?;
    if value <= Decimal::ZERO {
        return Err(WalletError::InvalidAmount(format!(
            "amount must be strictly positive, amount={}",
            raw
        )));
    }
    let value = value.normalize();
    if value.scale() > max_scale {
        return Err(WalletError::InvalidAmount(format!(
            "amount {} has more than {} decimal places and cannot be represented exactly",
            raw, max_scale
        )));
    }
    Ok(value)
}

/// Convert a decimal ether amount to wei, exactly.
///
/// `"1.5"` becomes `1_500_000_000_000_000_000`; more than 18 fractional
/// digits is an error, never a truncation.
pub fn eth_to_wei(raw: &str) -> Result<U256, WalletError> {
    let value = parse_positive_decimal(raw, ETH_DECIMALS)?;
    parse_ether(value.to_string()).map_err(|e| {
        WalletError::InvalidAmount(format!("amount is not valid, amount={}: {}", raw, e))
    })
}

/// Convert a decimal BTC amount to satoshi, exactly.
pub fn btc_to_sat(raw: &str) -> Result<u64, WalletError> {
    let value = parse_positive_decimal(raw, BTC_DECIMALS)?;
    // scale <= 8, so the product is integral by construction
    value
        .checked_mul(Decimal::from(SAT_PER_BTC))
        .and_then(|sat| sat.to_u64())
        .ok_or_else(|| {
            WalletError::InvalidAmount(format!("amount out of range, amount={}", raw))
        })
}

/// Render a satoshi amount as a decimal BTC value for logs and reports.
pub fn sat_to_btc(sat: u64) -> Decimal {
    Decimal::new(sat as i64, BTC_DECIMALS).normalize()
}
