//! Scaling raw token amounts into exact decimal strings.

use crate::TokenError;
use alloy_primitives::U256;
use serde::{Serialize, Serializer};
use std::fmt;

/// Scale `raw` down by `10^decimals` into an exact decimal string.
///
/// Trailing fractional zeros are trimmed but at least one fractional digit is
/// kept, so `1_000_000` at 6 decimals formats as `"1.0"`.
pub fn format_units(raw: U256, decimals: u8) -> Result<String, TokenError> {
    let base = U256::from(10u8)
        .checked_pow(U256::from(decimals))
        .ok_or(TokenError::UnsupportedDecimals(decimals))?;

    let (integer, fraction) = raw.div_rem(base);
    if decimals == 0 {
        return Ok(format!("{integer}.0"));
    }

    let fraction = format!("{:0>width$}", fraction.to_string(), width = decimals as usize);
    let fraction = fraction.trim_end_matches('0');
    let fraction = if fraction.is_empty() { "0" } else { fraction };

    Ok(format!("{integer}.{fraction}"))
}

/// Allowance as shown to consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Allowance {
    /// Raw allowance equals `U256::MAX`.
    Unlimited,
    /// Exact decimal amount.
    Limited(String),
}

impl Allowance {
    pub fn from_raw(raw: U256, decimals: u8) -> Result<Self, TokenError> {
        if raw == U256::MAX {
            return Ok(Self::Unlimited);
        }
        format_units(raw, decimals).map(Self::Limited)
    }

    pub const fn is_unlimited(&self) -> bool {
        matches!(self, Self::Unlimited)
    }
}

impl fmt::Display for Allowance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited => f.write_str("Infinity"),
            Self::Limited(amount) => f.write_str(amount),
        }
    }
}

impl Serialize for Allowance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_amount_keeps_one_fraction_digit() {
        assert_eq!(format_units(U256::from(1_000_000u64), 6).unwrap(), "1.0");
    }

    #[test]
    fn test_fraction_trailing_zeros_trimmed() {
        assert_eq!(format_units(U256::from(1_234_500u64), 6).unwrap(), "1.2345");
    }

    #[test]
    fn test_leading_fraction_zeros_kept() {
        assert_eq!(
            format_units(U256::from(1u8), 18).unwrap(),
            "0.000000000000000001"
        );
    }

    #[test]
    fn test_zero() {
        assert_eq!(format_units(U256::ZERO, 18).unwrap(), "0.0");
    }

    #[test]
    fn test_zero_decimals() {
        assert_eq!(format_units(U256::from(5u8), 0).unwrap(), "5.0");
    }

    #[test]
    fn test_max_value_is_exact() {
        assert_eq!(
            format_units(U256::MAX, 0).unwrap(),
            format!("{}.0", U256::MAX)
        );
    }

    #[test]
    fn test_too_many_decimals() {
        assert_eq!(
            format_units(U256::from(1u8), 78),
            Err(TokenError::UnsupportedDecimals(78))
        );
        assert!(format_units(U256::from(1u8), 77).is_ok());
    }

    #[test]
    fn test_max_allowance_is_unlimited() {
        let allowance = Allowance::from_raw(U256::MAX, 6).unwrap();
        assert!(allowance.is_unlimited());
        assert_eq!(allowance.to_string(), "Infinity");
    }

    #[test]
    fn test_allowance_one_below_max_is_finite() {
        let allowance = Allowance::from_raw(U256::MAX - U256::from(1u8), 0).unwrap();
        assert!(!allowance.is_unlimited());
    }

    #[test]
    fn test_finite_allowance_is_scaled() {
        let allowance = Allowance::from_raw(U256::from(250_000u64), 6).unwrap();
        assert_eq!(allowance, Allowance::Limited("0.25".to_string()));
    }
}
