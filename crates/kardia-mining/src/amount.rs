//! 256-bit token amounts and decimal unit conversion.

use crate::error::{ErrorCode, Result};
use regex::Regex;
use std::sync::OnceLock;

#[allow(clippy::assign_op_pattern, clippy::manual_div_ceil, clippy::ptr_offset_with_cast)]
mod uint_types {
    uint::construct_uint! {
        /// Unsigned 256-bit integer matching the EVM `uint256`.
        pub struct U256(4);
    }
}

pub use uint_types::U256;

fn decimal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d*)(?:\.(\d*))?$").expect("static pattern"))
}

/// Parse a human decimal string ("12.5") into base units with `decimals` places.
pub fn parse_units(value: &str, decimals: u32) -> Result<U256> {
    let trimmed = value.trim();
    let captures = decimal_pattern()
        .captures(trimmed)
        .ok_or_else(|| ErrorCode::InvalidAmount(value.to_string()))?;
    let whole = captures.get(1).map_or("", |m| m.as_str());
    let fraction = captures.get(2).map_or("", |m| m.as_str());
    if whole.is_empty() && fraction.is_empty() {
        return Err(ErrorCode::InvalidAmount(value.to_string()));
    }
    if fraction.len() > decimals as usize {
        return Err(ErrorCode::InvalidAmount(format!(
            "{} has more than {} decimals",
            value, decimals
        )));
    }

    let unit = U256::exp10(decimals as usize);
    let whole = if whole.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(whole).map_err(|_| ErrorCode::Overflow)?
    };
    let padded = format!("{:0<width$}", fraction, width = decimals as usize);
    let fraction = if padded.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(&padded).map_err(|_| ErrorCode::Overflow)?
    };

    whole
        .checked_mul(unit)
        .and_then(|w| w.checked_add(fraction))
        .ok_or(ErrorCode::Overflow)
}

/// Render base units as a decimal string, truncated (never rounded) to `precision` places.
pub fn format_units(value: U256, decimals: u32, precision: usize) -> String {
    let unit = U256::exp10(decimals as usize);
    let whole = value / unit;
    if precision == 0 || decimals == 0 {
        return whole.to_string();
    }
    let remainder = value % unit;
    let mut fraction = format!("{:0>width$}", remainder.to_string(), width = decimals as usize);
    fraction.truncate(precision.min(decimals as usize));
    format!("{}.{}", whole, fraction)
}

/// Serde adapter writing a `U256` as a decimal string.
pub mod u256_string {
    use super::U256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        U256::from_dec_str(&raw).map_err(|_| D::Error::custom(format!("invalid uint256 {}", raw)))
    }
}
