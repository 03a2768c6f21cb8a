//! ERC-20 balances over JSON-RPC.

use alloy_primitives::{Address, U256};
use alloy_provider::ProviderBuilder;
use alloy_sol_types::sol;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;
use x402_tron_types::balance::{BalanceError, BalanceOracle};
use x402_tron_types::proto::PaymentRequirements;

use crate::chain::Eip155ChainReference;
use crate::networks::default_rpc_url;

#[cfg(feature = "telemetry")]
use tracing::instrument;

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
    }
);

/// Reads `balanceOf(owner)` on the requirement's asset contract.
///
/// RPC endpoints resolve per chain: an explicit override, then the fallback
/// URL, then the public endpoint of a known network.
#[derive(Debug, Clone, Default)]
pub struct Erc20BalanceOracle {
    overrides: HashMap<u64, Url>,
    fallback: Option<Url>,
    timeout: Option<Duration>,
}

impl Erc20BalanceOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rpc_url(mut self, chain: Eip155ChainReference, url: Url) -> Self {
        self.overrides.insert(chain.inner(), url);
        self
    }

    /// RPC URL for every chain without an override.
    pub fn with_fallback_url(mut self, url: Url) -> Self {
        self.fallback = Some(url);
        self
    }

    /// Upper bound on one `balanceOf` call. Unbounded when unset.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn rpc_url(&self, chain: Eip155ChainReference) -> Option<Url> {
        if let Some(url) = self.overrides.get(&chain.inner()) {
            return Some(url.clone());
        }
        if let Some(url) = &self.fallback {
            return Some(url.clone());
        }
        default_rpc_url(chain).and_then(|url| url.parse().ok())
    }
}

#[async_trait]
impl BalanceOracle for Erc20BalanceOracle {
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "x402.eip155.balance_of", skip_all, fields(network = %requirements.network, token = %requirements.asset), err)
    )]
    async fn balance_of(
        &self,
        requirements: &PaymentRequirements,
        owner: &str,
    ) -> Result<U256, BalanceError> {
        let chain = Eip155ChainReference::try_from(&requirements.network)
            .map_err(|_| BalanceError::UnsupportedNetwork(requirements.network.clone()))?;
        let url = self
            .rpc_url(chain)
            .ok_or_else(|| BalanceError::UnsupportedNetwork(requirements.network.clone()))?;
        let token: Address = requirements
            .asset
            .parse()
            .map_err(|_| BalanceError::InvalidAddress(requirements.asset.clone()))?;
        let owner: Address = owner
            .parse()
            .map_err(|_| BalanceError::InvalidAddress(owner.to_string()))?;

        let provider = ProviderBuilder::new().connect_http(url);
        let contract = IERC20::new(token, provider);
        let call = contract.balanceOf(owner);
        let balance = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, call.call())
                .await
                .map_err(|_| BalanceError::Query(format!("RPC did not answer within {timeout:?}")))?,
            None => call.call().await,
        };
        balance.map_err(|e| BalanceError::Query(e.to_string()))
    }
}
