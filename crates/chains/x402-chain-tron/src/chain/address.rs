use alloy_primitives::{Address, hex};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Version byte every TRON mainnet-format address starts with.
pub const TRON_ADDRESS_PREFIX: u8 = 0x41;

/// A TRON account or contract address.
///
/// TRON addresses are the same 20-byte secp256k1 account hash as on EVM chains,
/// prefixed with `0x41` and written in base58check (`T...`). The 20-byte body
/// is what goes into EIP-712 typed data.
///
/// ```
/// use x402_chain_tron::chain::TronAddress;
///
/// let usdt: TronAddress = "TXYZopYRdj2D9XRtbG411XZZ3kM5VkAeBf".parse().unwrap();
/// assert_eq!(usdt.to_hex(), "41eca9bc828a3005b9a3b909f2cc5c2a54794de05f");
/// assert_eq!(usdt.to_string(), "TXYZopYRdj2D9XRtbG411XZZ3kM5VkAeBf");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TronAddress(Address);

impl TronAddress {
    pub const fn new(body: Address) -> Self {
        Self(body)
    }

    /// The 20-byte body, as used in EVM-style typed data.
    pub fn body(&self) -> Address {
        self.0
    }

    /// Hex with the `41` prefix and no `0x`, as TronGrid's non-visible mode expects.
    pub fn to_hex(&self) -> String {
        let mut bytes = [0u8; 21];
        bytes[0] = TRON_ADDRESS_PREFIX;
        bytes[1..].copy_from_slice(self.0.as_slice());
        hex::encode(bytes)
    }

    fn from_prefixed(bytes: &[u8], input: &str) -> Result<Self, TronAddressError> {
        match bytes {
            [TRON_ADDRESS_PREFIX, body @ ..] if body.len() == 20 => {
                Ok(Self(Address::from_slice(body)))
            }
            [prefix, ..] if bytes.len() == 21 => Err(TronAddressError::InvalidPrefix(*prefix)),
            _ => Err(TronAddressError::InvalidLength(input.to_string())),
        }
    }
}

impl From<Address> for TronAddress {
    fn from(value: Address) -> Self {
        Self(value)
    }
}

impl From<TronAddress> for Address {
    fn from(value: TronAddress) -> Self {
        value.0
    }
}

/// Accepts base58check (`T...`) and 21-byte hex (`41...`, with or without `0x`).
impl FromStr for TronAddress {
    type Err = TronAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with('T') {
            let bytes = bs58::decode(s)
                .with_check(None)
                .into_vec()
                .map_err(|e| TronAddressError::Base58(s.to_string(), e.to_string()))?;
            return Self::from_prefixed(&bytes, s);
        }
        let bytes = hex::decode(s).map_err(|_| TronAddressError::InvalidLength(s.to_string()))?;
        Self::from_prefixed(&bytes, s)
    }
}

impl Display for TronAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut bytes = [0u8; 21];
        bytes[0] = TRON_ADDRESS_PREFIX;
        bytes[1..].copy_from_slice(self.0.as_slice());
        f.write_str(&bs58::encode(bytes).with_check().into_string())
    }
}

impl Debug for TronAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "TronAddress({self})")
    }
}

impl Serialize for TronAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TronAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TronAddressError {
    #[error("Invalid base58check TRON address {0}: {1}")]
    Base58(String, String),
    #[error("TRON address must start with 0x41, got {0:#04x}")]
    InvalidPrefix(u8),
    #[error("Invalid TRON address {0}")]
    InvalidLength(String),
}
