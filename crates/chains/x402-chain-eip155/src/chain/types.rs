//! EVM addresses and chain references.

use alloy_primitives::{Address, hex};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use x402_tron_types::chain::ChainId;

/// An EVM address that serializes with its EIP-55 checksum.
///
/// ```
/// use x402_chain_eip155::chain::ChecksummedAddress;
///
/// let addr: ChecksummedAddress = "0x55d398326f99059ff775485246999027b3197955".parse().unwrap();
/// assert_eq!(addr.to_string(), "0x55d398326f99059fF775485246999027B3197955");
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ChecksummedAddress(pub Address);

impl FromStr for ChecksummedAddress {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Address::from_str(s)?))
    }
}

impl Display for ChecksummedAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_checksum(None))
    }
}

impl Serialize for ChecksummedAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_checksum(None))
    }
}

impl<'de> Deserialize<'de> for ChecksummedAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl From<ChecksummedAddress> for Address {
    fn from(value: ChecksummedAddress) -> Self {
        value.0
    }
}

impl From<Address> for ChecksummedAddress {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

/// The CAIP-2 namespace for EVM-compatible chains.
pub const EIP155_NAMESPACE: &str = "eip155";

/// Numeric chain id of an EVM network, as used in EIP-712 domains.
///
/// ```
/// use x402_chain_eip155::chain::Eip155ChainReference;
/// use x402_tron_types::chain::ChainId;
///
/// let bsc = Eip155ChainReference::try_from(&ChainId::new("eip155", "56")).unwrap();
/// assert_eq!(bsc.inner(), 56);
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Eip155ChainReference(u64);

impl Eip155ChainReference {
    pub fn new(chain_id: u64) -> Self {
        Self(chain_id)
    }

    pub fn inner(&self) -> u64 {
        self.0
    }

    pub fn as_chain_id(&self) -> ChainId {
        ChainId::new(EIP155_NAMESPACE, self.0.to_string())
    }
}

impl From<Eip155ChainReference> for ChainId {
    fn from(value: Eip155ChainReference) -> Self {
        value.as_chain_id()
    }
}

impl TryFrom<&ChainId> for Eip155ChainReference {
    type Error = Eip155ChainReferenceFormatError;

    fn try_from(value: &ChainId) -> Result<Self, Self::Error> {
        if value.namespace() != EIP155_NAMESPACE {
            return Err(Eip155ChainReferenceFormatError::InvalidNamespace(
                value.namespace().to_string(),
            ));
        }
        let chain_id: u64 = value.reference().parse().map_err(|_| {
            Eip155ChainReferenceFormatError::InvalidReference(value.reference().to_string())
        })?;
        Ok(Eip155ChainReference(chain_id))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Eip155ChainReferenceFormatError {
    #[error("Invalid namespace {0}, expected eip155")]
    InvalidNamespace(String),
    #[error("Invalid eip155 chain reference {0}")]
    InvalidReference(String),
}

impl Display for Eip155ChainReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_reference_rejects_other_namespaces() {
        let nile = ChainId::new("tron", "nile");
        assert!(matches!(
            Eip155ChainReference::try_from(&nile),
            Err(Eip155ChainReferenceFormatError::InvalidNamespace(_))
        ));
        let bogus = ChainId::new("eip155", "bsc");
        assert!(matches!(
            Eip155ChainReference::try_from(&bogus),
            Err(Eip155ChainReferenceFormatError::InvalidReference(_))
        ));
    }

    #[test]
    fn test_checksummed_address_serde() {
        let json = "\"0x8ac76a51cc950d9822d68b83fe1ad97b32cd580d\"";
        let addr: ChecksummedAddress = serde_json::from_str(json).unwrap();
        assert_eq!(
            serde_json::to_string(&addr).unwrap(),
            "\"0x8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d\""
        );
    }
}
