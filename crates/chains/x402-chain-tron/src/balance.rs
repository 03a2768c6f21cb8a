//! TRC-20 balances through TronGrid's `triggerconstantcontract`.

use alloy_primitives::{U256, hex};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;
use x402_tron_types::balance::{BalanceError, BalanceOracle};
use x402_tron_types::proto::PaymentRequirements;

use crate::chain::{TronAddress, TronChainReference};
use crate::networks::default_grid_url;

#[cfg(feature = "telemetry")]
use tracing::instrument;

const TRIGGER_CONSTANT_CONTRACT: &str = "/wallet/triggerconstantcontract";

#[derive(Debug, Serialize)]
struct TriggerConstantContract<'a> {
    owner_address: &'a str,
    contract_address: &'a str,
    function_selector: &'a str,
    parameter: String,
    visible: bool,
}

#[derive(Debug, Deserialize)]
struct TriggerConstantContractResponse {
    #[serde(default)]
    constant_result: Vec<String>,
    #[serde(default)]
    result: Option<TriggerResult>,
}

#[derive(Debug, Deserialize)]
struct TriggerResult {
    #[serde(default)]
    result: bool,
    #[serde(default)]
    message: Option<String>,
}

/// Reads TRC-20 `balanceOf(owner)` with a constant (non-broadcast) contract call.
///
/// Base URLs resolve per network: an explicit override, then the fallback URL,
/// then the public TronGrid endpoint.
#[derive(Debug, Clone, Default)]
pub struct TronGridBalanceOracle {
    http: Client,
    overrides: HashMap<TronChainReference, Url>,
    fallback: Option<Url>,
}

impl TronGridBalanceOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_grid_url(mut self, chain: TronChainReference, url: Url) -> Self {
        self.overrides.insert(chain, url);
        self
    }

    pub fn with_fallback_url(mut self, url: Url) -> Self {
        self.fallback = Some(url);
        self
    }

    fn grid_url(&self, chain: TronChainReference) -> Result<Url, BalanceError> {
        let base = match self.overrides.get(&chain).or(self.fallback.as_ref()) {
            Some(url) => url.clone(),
            None => default_grid_url(chain)
                .parse()
                .map_err(|e: url::ParseError| BalanceError::Query(e.to_string()))?,
        };
        base.join(TRIGGER_CONSTANT_CONTRACT)
            .map_err(|e| BalanceError::Query(e.to_string()))
    }
}

/// ABI-encodes the single `address` argument: the 20-byte body left-padded to 32 bytes.
fn encode_address_parameter(owner: &TronAddress) -> String {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(owner.body().as_slice());
    hex::encode(word)
}

#[async_trait]
impl BalanceOracle for TronGridBalanceOracle {
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "x402.tron.balance_of", skip_all, fields(network = %requirements.network, token = %requirements.asset), err)
    )]
    async fn balance_of(
        &self,
        requirements: &PaymentRequirements,
        owner: &str,
    ) -> Result<U256, BalanceError> {
        let chain = TronChainReference::try_from(&requirements.network)
            .map_err(|_| BalanceError::UnsupportedNetwork(requirements.network.clone()))?;
        let token: TronAddress = requirements
            .asset
            .parse()
            .map_err(|_| BalanceError::InvalidAddress(requirements.asset.clone()))?;
        let owner: TronAddress = owner
            .parse()
            .map_err(|_| BalanceError::InvalidAddress(owner.to_string()))?;

        let owner_address = owner.to_string();
        let contract_address = token.to_string();
        let request = TriggerConstantContract {
            owner_address: &owner_address,
            contract_address: &contract_address,
            function_selector: "balanceOf(address)",
            parameter: encode_address_parameter(&owner),
            visible: true,
        };
        let response = self
            .http
            .post(self.grid_url(chain)?)
            .json(&request)
            .send()
            .await
            .map_err(|e| BalanceError::Query(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(BalanceError::Query(format!("TronGrid returned {status}")));
        }
        let body: TriggerConstantContractResponse = response
            .json()
            .await
            .map_err(|e| BalanceError::Query(e.to_string()))?;

        if let Some(TriggerResult { result: false, message }) = &body.result {
            let message = message.as_deref().unwrap_or("call reverted");
            return Err(BalanceError::Query(message.to_string()));
        }
        let word = body
            .constant_result
            .first()
            .ok_or_else(|| BalanceError::Query("empty constant_result".into()))?;
        U256::from_str_radix(word, 16).map_err(|e| BalanceError::Query(e.to_string()))
    }
}
