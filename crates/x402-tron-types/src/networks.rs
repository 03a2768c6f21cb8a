//! Well-known networks and their stablecoin deployments.
//!
//! x402 works with any CAIP-2 chain ID, but the networks this client is
//! usually pointed at are listed here so that amounts can be shown in whole
//! tokens and prices like `"0.0001 USDT"` can be turned into requirements.
//!
//! - [`KNOWN_NETWORKS`] - TRON mainnet, Nile and Shasta testnets, BSC and BSC testnet
//! - [`KNOWN_TOKENS`] - USDT and USDC deployments on those networks
//! - [`TokenRegistry`] - Lookups by address and symbol, price parsing, amount formatting
//!
//! ```
//! use x402_tron_types::chain::ChainId;
//! use x402_tron_types::networks::TokenRegistry;
//!
//! let nile = ChainId::new("tron", "nile");
//! let (amount, token) = TokenRegistry::parse_price("0.0001 USDT", &nile).unwrap();
//! assert_eq!(amount.to_string(), "100");
//! assert_eq!(token.address, "TXYZopYRdj2D9XRtbG411XZZ3kM5VkAeBf");
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::chain::ChainId;
use crate::proto::PaymentRequirements;
use crate::util::TokenAmount;
use crate::util::money_amount::{MoneyAmount, MoneyAmountParseError};

/// A known network with its human-readable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Human-readable network name (`tron-nile`, `bsc`).
    pub name: &'static str,
    /// CAIP-2 namespace (`tron`, `eip155`).
    pub namespace: &'static str,
    /// Chain reference (`nile`, `56`).
    pub reference: &'static str,
}

impl NetworkInfo {
    pub fn chain_id(&self) -> ChainId {
        ChainId::new(self.namespace, self.reference)
    }
}

pub static KNOWN_NETWORKS: &[NetworkInfo] = &[
    NetworkInfo {
        name: "tron-mainnet",
        namespace: "tron",
        reference: "mainnet",
    },
    NetworkInfo {
        name: "tron-nile",
        namespace: "tron",
        reference: "nile",
    },
    NetworkInfo {
        name: "tron-shasta",
        namespace: "tron",
        reference: "shasta",
    },
    NetworkInfo {
        name: "bsc",
        namespace: "eip155",
        reference: "56",
    },
    NetworkInfo {
        name: "bsc-testnet",
        namespace: "eip155",
        reference: "97",
    },
];

static NAME_TO_CHAIN_ID: LazyLock<HashMap<&'static str, ChainId>> = LazyLock::new(|| {
    KNOWN_NETWORKS
        .iter()
        .map(|n| (n.name, n.chain_id()))
        .collect()
});

static CHAIN_ID_TO_NAME: LazyLock<HashMap<ChainId, &'static str>> = LazyLock::new(|| {
    KNOWN_NETWORKS
        .iter()
        .map(|n| (n.chain_id(), n.name))
        .collect()
});

pub fn chain_id_by_network_name(name: &str) -> Option<&'static ChainId> {
    NAME_TO_CHAIN_ID.get(name)
}

pub fn network_name_by_chain_id(chain_id: &ChainId) -> Option<&'static str> {
    CHAIN_ID_TO_NAME.get(chain_id).copied()
}

/// A token deployed on a known network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    /// CAIP-2 namespace of the network.
    pub namespace: &'static str,
    /// Chain reference of the network.
    pub reference: &'static str,
    pub symbol: &'static str,
    /// Contract address in the chain's native format.
    pub address: &'static str,
    pub decimals: u8,
}

impl TokenInfo {
    pub fn chain_id(&self) -> ChainId {
        ChainId::new(self.namespace, self.reference)
    }

    fn is_on(&self, network: &ChainId) -> bool {
        self.namespace == network.namespace && self.reference == network.reference
    }
}

pub static KNOWN_TOKENS: &[TokenInfo] = &[
    TokenInfo {
        namespace: "tron",
        reference: "mainnet",
        symbol: "USDT",
        address: "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t",
        decimals: 6,
    },
    TokenInfo {
        namespace: "tron",
        reference: "nile",
        symbol: "USDT",
        address: "TXYZopYRdj2D9XRtbG411XZZ3kM5VkAeBf",
        decimals: 6,
    },
    TokenInfo {
        namespace: "tron",
        reference: "shasta",
        symbol: "USDT",
        address: "TG3XXyExBkPp9nzdajDZsozEu4BkaSJozs",
        decimals: 6,
    },
    TokenInfo {
        namespace: "eip155",
        reference: "56",
        symbol: "USDT",
        address: "0x55d398326f99059fF775485246999027B3197955",
        decimals: 18,
    },
    TokenInfo {
        namespace: "eip155",
        reference: "56",
        symbol: "USDC",
        address: "0x8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d",
        decimals: 18,
    },
    TokenInfo {
        namespace: "eip155",
        reference: "97",
        symbol: "USDT",
        address: "0x337610d27c682E347C9cD60BD4b3b107C9d34dDd",
        decimals: 18,
    },
];

/// Errors of [`TokenRegistry::parse_price`].
#[derive(Debug, thiserror::Error)]
pub enum PriceParseError {
    #[error("Price must look like \"<amount> <SYMBOL>\", got {0:?}")]
    InvalidFormat(String),
    #[error("Token {symbol} is not known on network {network}")]
    UnknownToken { symbol: String, network: ChainId },
    #[error(transparent)]
    Amount(#[from] MoneyAmountParseError),
}

/// Lookups over [`KNOWN_TOKENS`].
pub struct TokenRegistry;

impl TokenRegistry {
    /// Finds a token by contract address. EVM addresses compare case-insensitively.
    pub fn find_by_address(network: &ChainId, address: &str) -> Option<&'static TokenInfo> {
        KNOWN_TOKENS.iter().find(|t| {
            t.is_on(network)
                && if address.starts_with("0x") {
                    t.address.eq_ignore_ascii_case(address)
                } else {
                    t.address == address
                }
        })
    }

    pub fn find_by_symbol(network: &ChainId, symbol: &str) -> Option<&'static TokenInfo> {
        KNOWN_TOKENS
            .iter()
            .find(|t| t.is_on(network) && t.symbol.eq_ignore_ascii_case(symbol))
    }

    /// All known tokens on `network`, in registry order.
    pub fn network_tokens(network: &ChainId) -> Vec<&'static TokenInfo> {
        KNOWN_TOKENS.iter().filter(|t| t.is_on(network)).collect()
    }

    /// Parses a price such as `"0.0001 USDT"` into smallest units of that token on `network`.
    pub fn parse_price(
        price: &str,
        network: &ChainId,
    ) -> Result<(TokenAmount, &'static TokenInfo), PriceParseError> {
        let (amount, symbol) = price
            .trim()
            .rsplit_once(char::is_whitespace)
            .ok_or_else(|| PriceParseError::InvalidFormat(price.into()))?;
        let token =
            Self::find_by_symbol(network, symbol).ok_or_else(|| PriceParseError::UnknownToken {
                symbol: symbol.into(),
                network: network.clone(),
            })?;
        let money = MoneyAmount::parse(amount)?;
        let units = money.to_token_units(token.decimals)?;
        Ok((TokenAmount(units), token))
    }

    /// Renders the amount of `requirements` for display: `"0.0001 USDT"` for known
    /// tokens, the raw amount and asset otherwise.
    pub fn format_amount(requirements: &PaymentRequirements) -> String {
        match Self::find_by_address(&requirements.network, &requirements.asset) {
            Some(token) => format!(
                "{} {}",
                requirements.amount.format_units(token.decimals),
                token.symbol
            ),
            None => format!("{} of {}", requirements.amount, requirements.asset),
        }
    }

    /// Symbol of the asset of `requirements`, when known.
    pub fn symbol_of(requirements: &PaymentRequirements) -> Option<&'static str> {
        Self::find_by_address(&requirements.network, &requirements.asset).map(|t| t.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    fn requirements(network: ChainId, asset: &str, amount: u64) -> PaymentRequirements {
        PaymentRequirements {
            scheme: "exact_permit".into(),
            network,
            amount: amount.into(),
            asset: asset.into(),
            pay_to: "TD5gsCwxykWsLN9aPrq2TAfNjByuZKYp4E".into(),
            max_timeout_seconds: 300,
            extra: None,
        }
    }

    #[test]
    fn test_network_names() {
        assert_eq!(
            chain_id_by_network_name("tron-shasta"),
            Some(&ChainId::new("tron", "shasta"))
        );
        assert_eq!(
            network_name_by_chain_id(&ChainId::new("eip155", "97")),
            Some("bsc-testnet")
        );
        assert!(chain_id_by_network_name("base").is_none());
    }

    #[test]
    fn test_find_by_address_evm_case_insensitive() {
        let bsc = ChainId::new("eip155", "56");
        let token =
            TokenRegistry::find_by_address(&bsc, "0x55d398326f99059ff775485246999027b3197955")
                .unwrap();
        assert_eq!(token.symbol, "USDT");
        assert_eq!(token.decimals, 18);
    }

    #[test]
    fn test_find_by_address_wrong_network() {
        let nile = ChainId::new("tron", "nile");
        assert!(TokenRegistry::find_by_address(&nile, "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t").is_none());
    }

    #[test]
    fn test_network_tokens() {
        let bsc = ChainId::new("eip155", "56");
        let symbols: Vec<_> = TokenRegistry::network_tokens(&bsc)
            .into_iter()
            .map(|t| t.symbol)
            .collect();
        assert_eq!(symbols, vec!["USDT", "USDC"]);
        assert!(TokenRegistry::network_tokens(&ChainId::new("eip155", "1")).is_empty());
    }

    #[test]
    fn test_parse_price_eighteen_decimals() {
        let bsc = ChainId::new("eip155", "56");
        let (amount, token) = TokenRegistry::parse_price("0.0001 usdc", &bsc).unwrap();
        assert_eq!(token.symbol, "USDC");
        assert_eq!(amount.inner(), U256::from(100_000_000_000_000u64));
    }

    #[test]
    fn test_parse_price_errors() {
        let nile = ChainId::new("tron", "nile");
        assert!(matches!(
            TokenRegistry::parse_price("0.0001", &nile),
            Err(PriceParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            TokenRegistry::parse_price("0.0001 USDC", &nile),
            Err(PriceParseError::UnknownToken { .. })
        ));
    }

    #[test]
    fn test_format_amount() {
        let nile = ChainId::new("tron", "nile");
        let known = requirements(nile.clone(), "TXYZopYRdj2D9XRtbG411XZZ3kM5VkAeBf", 100);
        assert_eq!(TokenRegistry::format_amount(&known), "0.0001 USDT");
        let unknown = requirements(nile, "TUnknownToken", 100);
        assert_eq!(TokenRegistry::format_amount(&unknown), "100 of TUnknownToken");
    }
}
