//! Integer token amounts as carried on the wire.

use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An amount in a token's smallest unit.
///
/// Serialized as a decimal string (`"1000000"`) so that values beyond the
/// range of JSON numbers survive. Anything other than an unsigned decimal
/// integer is rejected.
///
/// ```
/// use x402_tron_types::util::TokenAmount;
///
/// let amount: TokenAmount = serde_json::from_str("\"1000000\"").unwrap();
/// assert_eq!(amount.to_string(), "1000000");
/// assert!(serde_json::from_str::<TokenAmount>("\"1.5\"").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TokenAmount(pub U256);

#[derive(Debug, thiserror::Error)]
#[error("Invalid token amount {0:?}: expected an unsigned decimal integer")]
pub struct TokenAmountParseError(String);

impl TokenAmount {
    pub fn inner(&self) -> U256 {
        self.0
    }

    /// Renders the amount in whole tokens, trimming trailing zeros.
    ///
    /// ```
    /// use x402_tron_types::util::TokenAmount;
    ///
    /// let amount: TokenAmount = "1500".parse().unwrap();
    /// assert_eq!(amount.format_units(6), "0.0015");
    /// ```
    pub fn format_units(&self, decimals: u8) -> String {
        let base = U256::from(10).pow(U256::from(decimals));
        let whole = self.0 / base;
        let frac = self.0 % base;
        if frac.is_zero() {
            return whole.to_string();
        }
        let frac = format!("{:0>width$}", frac.to_string(), width = decimals as usize);
        format!("{}.{}", whole, frac.trim_end_matches('0'))
    }
}

impl FromStr for TokenAmount {
    type Err = TokenAmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TokenAmountParseError(s.into()));
        }
        U256::from_str_radix(s, 10)
            .map(TokenAmount)
            .map_err(|_| TokenAmountParseError(s.into()))
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<U256> for TokenAmount {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<u64> for TokenAmount {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<TokenAmount> for U256 {
    fn from(value: TokenAmount) -> Self {
        value.0
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
