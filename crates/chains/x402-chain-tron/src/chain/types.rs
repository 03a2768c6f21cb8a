use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use x402_tron_types::chain::ChainId;

/// The CAIP-2 namespace for TRON networks.
pub const TRON_NAMESPACE: &str = "tron";

/// A TRON network, identified in CAIP-2 by name (`tron:nile`) rather than by
/// number.
///
/// EIP-712 domains still need a numeric chain id; see
/// [`TronChainReference::eip712_chain_id`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TronChainReference {
    Mainnet,
    Nile,
    Shasta,
}

impl TronChainReference {
    pub fn as_str(&self) -> &'static str {
        match self {
            TronChainReference::Mainnet => "mainnet",
            TronChainReference::Nile => "nile",
            TronChainReference::Shasta => "shasta",
        }
    }

    /// Numeric chain id signed into EIP-712 domains on this network.
    ///
    /// ```
    /// use x402_chain_tron::chain::TronChainReference;
    ///
    /// assert_eq!(TronChainReference::Nile.eip712_chain_id(), 3448148188);
    /// ```
    pub fn eip712_chain_id(&self) -> u64 {
        match self {
            TronChainReference::Mainnet => 728126428,
            TronChainReference::Nile => 3448148188,
            TronChainReference::Shasta => 2494104990,
        }
    }

    pub fn as_chain_id(&self) -> ChainId {
        ChainId::new(TRON_NAMESPACE, self.as_str())
    }
}

impl Display for TronChainReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TronChainReference {
    type Err = TronChainReferenceFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(TronChainReference::Mainnet),
            "nile" => Ok(TronChainReference::Nile),
            "shasta" => Ok(TronChainReference::Shasta),
            other => Err(TronChainReferenceFormatError::InvalidReference(other.to_string())),
        }
    }
}

impl Serialize for TronChainReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TronChainReference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl From<TronChainReference> for ChainId {
    fn from(value: TronChainReference) -> Self {
        value.as_chain_id()
    }
}

impl TryFrom<&ChainId> for TronChainReference {
    type Error = TronChainReferenceFormatError;

    fn try_from(value: &ChainId) -> Result<Self, Self::Error> {
        if value.namespace() != TRON_NAMESPACE {
            return Err(TronChainReferenceFormatError::InvalidNamespace(
                value.namespace().to_string(),
            ));
        }
        value.reference().parse()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TronChainReferenceFormatError {
    #[error("Invalid namespace {0}, expected tron")]
    InvalidNamespace(String),
    #[error("Unknown TRON network {0}")]
    InvalidReference(String),
}
