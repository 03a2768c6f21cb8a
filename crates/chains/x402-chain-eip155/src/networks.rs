use x402_tron_types::chain::ChainId;

use crate::chain::{EIP155_NAMESPACE, Eip155ChainReference};

/// Per-network instances for the EVM networks the client knows about.
///
/// ```
/// use x402_chain_eip155::KnownNetworkEip155;
/// use x402_tron_types::chain::ChainId;
///
/// assert_eq!(ChainId::bsc().to_string(), "eip155:56");
/// ```
pub trait KnownNetworkEip155<A> {
    /// BNB Smart Chain mainnet (eip155:56)
    fn bsc() -> A;
    /// BNB Smart Chain testnet (eip155:97)
    fn bsc_testnet() -> A;
}

impl KnownNetworkEip155<ChainId> for ChainId {
    fn bsc() -> ChainId {
        ChainId::new(EIP155_NAMESPACE, "56")
    }

    fn bsc_testnet() -> ChainId {
        ChainId::new(EIP155_NAMESPACE, "97")
    }
}

impl KnownNetworkEip155<Eip155ChainReference> for Eip155ChainReference {
    fn bsc() -> Eip155ChainReference {
        Eip155ChainReference::new(56)
    }

    fn bsc_testnet() -> Eip155ChainReference {
        Eip155ChainReference::new(97)
    }
}

/// Public JSON-RPC endpoint used when no RPC URL is configured for a chain.
pub fn default_rpc_url(chain: Eip155ChainReference) -> Option<&'static str> {
    match chain.inner() {
        56 => Some("https://bsc-dataseed.bnbchain.org"),
        97 => Some("https://data-seed-prebsc-1-s1.bnbchain.org:8545"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_networks_agree() {
        assert_eq!(Eip155ChainReference::bsc().as_chain_id(), ChainId::bsc());
        assert_eq!(Eip155ChainReference::bsc_testnet().as_chain_id(), ChainId::bsc_testnet());
        assert!(default_rpc_url(Eip155ChainReference::bsc()).is_some());
        assert!(default_rpc_url(Eip155ChainReference::new(1)).is_none());
    }
}
