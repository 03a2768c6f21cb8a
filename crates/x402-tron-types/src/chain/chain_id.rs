//! CAIP-2 chain identifier types.
//!
//! A [CAIP-2](https://standards.chainagnostic.org/CAIPs/caip-2) chain ID is a
//! `namespace:reference` pair:
//!
//! - **Namespace**: the chain family (`tron` for TRON, `eip155` for EVM chains)
//! - **Reference**: the chain within the family (`nile`, `mainnet`, `56`)
//!
//! # Examples
//!
//! ```
//! use x402_tron_types::chain::ChainId;
//!
//! let nile = ChainId::new("tron", "nile");
//! assert_eq!(nile.to_string(), "tron:nile");
//!
//! let bsc: ChainId = "eip155:56".parse().unwrap();
//! assert_eq!(bsc.namespace, "eip155");
//! assert_eq!(bsc.reference, "56");
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::networks;

/// A CAIP-2 compliant blockchain identifier.
///
/// Serializes to and from a colon-separated string: `"tron:nile"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId {
    /// The chain family (`tron`, `eip155`).
    pub namespace: String,
    /// The chain within the family (`nile`, `56`).
    pub reference: String,
}

impl ChainId {
    /// Creates a new chain ID from namespace and reference components.
    pub fn new<N: Into<String>, R: Into<String>>(namespace: N, reference: R) -> Self {
        Self {
            namespace: namespace.into(),
            reference: reference.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Creates a chain ID from a well-known network name.
    ///
    /// ```
    /// use x402_tron_types::chain::ChainId;
    ///
    /// let nile = ChainId::from_network_name("tron-nile").unwrap();
    /// assert_eq!(nile.to_string(), "tron:nile");
    /// assert!(ChainId::from_network_name("unknown").is_none());
    /// ```
    pub fn from_network_name(network_name: &str) -> Option<Self> {
        networks::chain_id_by_network_name(network_name).cloned()
    }

    /// Returns the well-known network name for this chain ID, if any.
    pub fn as_network_name(&self) -> Option<&'static str> {
        networks::network_name_by_chain_id(self)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.reference)
    }
}

impl From<ChainId> for String {
    fn from(value: ChainId) -> Self {
        value.to_string()
    }
}

/// Error returned when parsing an invalid chain ID or chain ID pattern.
///
/// A valid chain ID is `namespace:reference` with both parts non-empty.
#[derive(Debug, thiserror::Error)]
#[error("Invalid chain id format {0}")]
pub struct ChainIdFormatError(String);

impl FromStr for ChainId {
    type Err = ChainIdFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((namespace, reference)) if !namespace.is_empty() && !reference.is_empty() => {
                Ok(ChainId::new(namespace, reference))
            }
            _ => Err(ChainIdFormatError(s.into())),
        }
    }
}

impl Serialize for ChainId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ChainId::from_str(&s).map_err(de::Error::custom)
    }
}

/// A pattern for matching chain IDs.
///
/// - **Wildcard**: any chain of a family (`tron:*`)
/// - **Exact**: one chain (`tron:nile`)
/// - **Set**: any chain from a set (`tron:{nile,shasta}`)
///
/// Patterns order by [`specificity`](ChainIdPattern::specificity): when several
/// registered patterns match one network, the most specific one wins.
///
/// ```
/// use x402_tron_types::chain::{ChainId, ChainIdPattern};
///
/// let all_tron = ChainIdPattern::wildcard("tron");
/// assert!(all_tron.matches(&ChainId::new("tron", "nile")));
/// assert!(!all_tron.matches(&ChainId::new("eip155", "56")));
///
/// let nile: ChainIdPattern = "tron:nile".parse().unwrap();
/// assert!(nile.specificity() > all_tron.specificity());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainIdPattern {
    /// Matches any chain within the namespace.
    Wildcard { namespace: String },
    /// Matches exactly one chain.
    Exact {
        namespace: String,
        reference: String,
    },
    /// Matches any chain from a set of references within the namespace.
    Set {
        namespace: String,
        references: BTreeSet<String>,
    },
}

impl ChainIdPattern {
    pub fn wildcard<S: Into<String>>(namespace: S) -> Self {
        Self::Wildcard {
            namespace: namespace.into(),
        }
    }

    pub fn exact<N: Into<String>, R: Into<String>>(namespace: N, reference: R) -> Self {
        Self::Exact {
            namespace: namespace.into(),
            reference: reference.into(),
        }
    }

    pub fn set<N: Into<String>, I, R>(namespace: N, references: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self::Set {
            namespace: namespace.into(),
            references: references.into_iter().map(Into::into).collect(),
        }
    }

    /// Check if a `ChainId` matches this pattern.
    pub fn matches(&self, chain_id: &ChainId) -> bool {
        match self {
            ChainIdPattern::Wildcard { namespace } => chain_id.namespace == *namespace,
            ChainIdPattern::Exact {
                namespace,
                reference,
            } => chain_id.namespace == *namespace && chain_id.reference == *reference,
            ChainIdPattern::Set {
                namespace,
                references,
            } => chain_id.namespace == *namespace && references.contains(&chain_id.reference),
        }
    }

    /// Ranks patterns for lookup: exact beats set, set beats wildcard.
    pub fn specificity(&self) -> u8 {
        match self {
            ChainIdPattern::Exact { .. } => 2,
            ChainIdPattern::Set { .. } => 1,
            ChainIdPattern::Wildcard { .. } => 0,
        }
    }

    pub fn namespace(&self) -> &str {
        match self {
            ChainIdPattern::Wildcard { namespace } => namespace,
            ChainIdPattern::Exact { namespace, .. } => namespace,
            ChainIdPattern::Set { namespace, .. } => namespace,
        }
    }
}

impl fmt::Display for ChainIdPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainIdPattern::Wildcard { namespace } => write!(f, "{namespace}:*"),
            ChainIdPattern::Exact {
                namespace,
                reference,
            } => write!(f, "{namespace}:{reference}"),
            ChainIdPattern::Set {
                namespace,
                references,
            } => {
                let refs: Vec<&str> = references.iter().map(|s| s.as_str()).collect();
                write!(f, "{}:{{{}}}", namespace, refs.join(","))
            }
        }
    }
}

impl FromStr for ChainIdPattern {
    type Err = ChainIdFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, rest) = s.split_once(':').ok_or(ChainIdFormatError(s.into()))?;

        if namespace.is_empty() {
            return Err(ChainIdFormatError(s.into()));
        }

        // Wildcard: tron:*
        if rest == "*" {
            return Ok(ChainIdPattern::wildcard(namespace));
        }

        // Set: tron:{nile,shasta}
        if let Some(inner) = rest.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
            let mut references = BTreeSet::new();
            for item in inner.split(',') {
                let item = item.trim();
                if item.is_empty() {
                    return Err(ChainIdFormatError(s.into()));
                }
                references.insert(item.to_string());
            }
            return Ok(ChainIdPattern::Set {
                namespace: namespace.into(),
                references,
            });
        }

        // Exact: tron:nile
        if rest.is_empty() {
            return Err(ChainIdFormatError(s.into()));
        }

        Ok(ChainIdPattern::exact(namespace, rest))
    }
}

impl Serialize for ChainIdPattern {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ChainIdPattern {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ChainIdPattern::from_str(&s).map_err(de::Error::custom)
    }
}

impl From<ChainId> for ChainIdPattern {
    fn from(chain_id: ChainId) -> Self {
        ChainIdPattern::exact(chain_id.namespace, chain_id.reference)
    }
}
