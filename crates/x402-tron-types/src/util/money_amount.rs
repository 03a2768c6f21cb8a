//! Human-readable price parsing.
//!
//! Prices such as `"0.0001"`, `"$1.50"` or `"1,000"` are parsed into a
//! [`MoneyAmount`] and then scaled to a token's smallest unit with
//! [`MoneyAmount::to_token_units`].
//!
//! ```rust
//! use x402_tron_types::util::money_amount::MoneyAmount;
//! use alloy_primitives::U256;
//!
//! let amount = MoneyAmount::parse("0.0001").unwrap();
//! assert_eq!(amount.scale(), 4);
//! assert_eq!(amount.to_token_units(6).unwrap(), U256::from(100u64));
//! ```

use alloy_primitives::U256;
use regex::Regex;
use rust_decimal::Decimal;
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::LazyLock;

/// A non-negative decimal amount that keeps the precision it was written with.
#[derive(Debug, Clone, PartialEq)]
pub struct MoneyAmount(pub Decimal);

impl MoneyAmount {
    /// Number of decimal places in the input.
    pub fn scale(&self) -> u32 {
        self.0.scale()
    }

    /// The value without its decimal point: `"12.34"` gives `1234`.
    pub fn mantissa(&self) -> u128 {
        self.0.mantissa().unsigned_abs()
    }

    /// Scales the amount to the smallest unit of a token with `decimals` places.
    ///
    /// Fails with [`MoneyAmountParseError::WrongPrecision`] when the amount has
    /// more decimal places than the token.
    pub fn to_token_units(&self, decimals: u8) -> Result<U256, MoneyAmountParseError> {
        let scale = self.scale();
        let token_scale = decimals as u32;
        if scale > token_scale {
            return Err(MoneyAmountParseError::WrongPrecision {
                money: scale,
                token: token_scale,
            });
        }
        let multiplier = U256::from(10).pow(U256::from(token_scale - scale));
        Ok(U256::from(self.mantissa()) * multiplier)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MoneyAmountParseError {
    #[error("Invalid number format")]
    InvalidFormat,
    #[error(
        "Amount must be between {} and {}",
        constants::MIN_STR,
        constants::MAX_STR
    )]
    OutOfRange,
    #[error("Negative value is not allowed")]
    Negative,
    /// The input has more decimal places than the token supports.
    #[error("Too big of a precision: {money} vs {token} on token")]
    WrongPrecision { money: u32, token: u32 },
}

mod constants {
    use super::*;

    pub const MIN_STR: &str = "0.000000000000000001";
    pub const MAX_STR: &str = "999999999";

    pub static MIN: LazyLock<Decimal> =
        LazyLock::new(|| Decimal::from_str(MIN_STR).expect("valid decimal"));
    pub static MAX: LazyLock<Decimal> =
        LazyLock::new(|| Decimal::from_str(MAX_STR).expect("valid decimal"));
    pub static NOISE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^\d\.\-]+").expect("valid regex"));
}

impl MoneyAmount {
    /// Parses a human-readable amount.
    ///
    /// Currency symbols, thousand separators and whitespace are stripped first.
    pub fn parse(input: &str) -> Result<Self, MoneyAmountParseError> {
        let cleaned = constants::NOISE.replace_all(input, "");
        let parsed =
            Decimal::from_str(&cleaned).map_err(|_| MoneyAmountParseError::InvalidFormat)?;

        if parsed.is_sign_negative() {
            return Err(MoneyAmountParseError::Negative);
        }

        if parsed < *constants::MIN || parsed > *constants::MAX {
            return Err(MoneyAmountParseError::OutOfRange);
        }

        Ok(MoneyAmount(parsed))
    }
}

impl FromStr for MoneyAmount {
    type Err = MoneyAmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MoneyAmount::parse(s)
    }
}

impl TryFrom<&str> for MoneyAmount {
    type Error = MoneyAmountParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        MoneyAmount::from_str(value)
    }
}

impl Display for MoneyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}
