use x402_tron_types::chain::ChainId;

use crate::chain::TronChainReference;

/// Per-network instances for the TRON networks the client knows about.
///
/// ```
/// use x402_chain_tron::KnownNetworkTron;
/// use x402_tron_types::chain::ChainId;
///
/// assert_eq!(ChainId::tron_nile().to_string(), "tron:nile");
/// ```
pub trait KnownNetworkTron<A> {
    fn tron() -> A;
    /// Nile testnet (tron:nile)
    fn tron_nile() -> A;
    /// Shasta testnet (tron:shasta)
    fn tron_shasta() -> A;
}

impl KnownNetworkTron<TronChainReference> for TronChainReference {
    fn tron() -> TronChainReference {
        TronChainReference::Mainnet
    }

    fn tron_nile() -> TronChainReference {
        TronChainReference::Nile
    }

    fn tron_shasta() -> TronChainReference {
        TronChainReference::Shasta
    }
}

impl KnownNetworkTron<ChainId> for ChainId {
    fn tron() -> ChainId {
        TronChainReference::Mainnet.as_chain_id()
    }

    fn tron_nile() -> ChainId {
        TronChainReference::Nile.as_chain_id()
    }

    fn tron_shasta() -> ChainId {
        TronChainReference::Shasta.as_chain_id()
    }
}

/// Public TronGrid endpoint of each network.
pub fn default_grid_url(chain: TronChainReference) -> &'static str {
    match chain {
        TronChainReference::Mainnet => "https://api.trongrid.io",
        TronChainReference::Nile => "https://nile.trongrid.io",
        TronChainReference::Shasta => "https://api.shasta.trongrid.io",
    }
}
