//! Policies narrowing the candidates before selection.
//!
//! Policies run in registration order on the candidates that survived network
//! matching. They may drop candidates but never reorder them.

use alloy_primitives::U256;
use async_trait::async_trait;
use std::sync::Arc;
use x402_tron_types::balance::BalanceOracle;
use x402_tron_types::chain::ChainIdPattern;
use x402_tron_types::networks::TokenRegistry;

use crate::selector::PaymentCandidate;

#[cfg(feature = "telemetry")]
use tracing::{debug, warn};

#[async_trait]
pub trait PaymentPolicy: Send + Sync {
    async fn apply<'a>(&self, candidates: Vec<PaymentCandidate<'a>>) -> Vec<PaymentCandidate<'a>>;
}

/// Drops candidates the payer cannot afford.
///
/// The required amount is the requirement's amount plus the facilitator fee
/// from `extra.fee.feeAmount`, if any. Candidates on networks without a
/// configured oracle are kept, as are candidates whose balance query fails.
#[derive(Clone, Default)]
pub struct SufficientBalancePolicy {
    oracles: Vec<(ChainIdPattern, Arc<dyn BalanceOracle>)>,
}

impl SufficientBalancePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `oracle` for networks matching `pattern`. The first matching oracle wins.
    pub fn with_oracle<O>(mut self, pattern: ChainIdPattern, oracle: O) -> Self
    where
        O: BalanceOracle + 'static,
    {
        self.oracles.push((pattern, Arc::new(oracle)));
        self
    }

    async fn affordable(&self, candidate: &PaymentCandidate<'_>) -> bool {
        let requirements = candidate.requirements;
        let Some((_, oracle)) = self
            .oracles
            .iter()
            .find(|(pattern, _)| pattern.matches(&requirements.network))
        else {
            return true;
        };
        let fee = requirements
            .extra_fields()
            .ok()
            .and_then(|extra| extra.fee)
            .map(|fee| fee.fee_amount.inner())
            .unwrap_or(U256::ZERO);
        let required = requirements.amount.inner().saturating_add(fee);
        let payer = candidate.payer();
        match oracle.balance_of(requirements, &payer).await {
            Ok(balance) => {
                #[cfg(feature = "telemetry")]
                debug!(
                    network = %requirements.network,
                    asset = %requirements.asset,
                    %balance,
                    %required,
                    "Checked payer balance"
                );
                balance >= required
            }
            Err(_error) => {
                #[cfg(feature = "telemetry")]
                warn!(
                    network = %requirements.network,
                    asset = %requirements.asset,
                    error = %_error,
                    "Balance check failed, keeping candidate"
                );
                true
            }
        }
    }
}

#[async_trait]
impl PaymentPolicy for SufficientBalancePolicy {
    async fn apply<'a>(&self, candidates: Vec<PaymentCandidate<'a>>) -> Vec<PaymentCandidate<'a>> {
        let mut affordable = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if self.affordable(&candidate).await {
                affordable.push(candidate);
            }
        }
        affordable
    }
}

/// Narrows to a preferred token symbol and/or scheme when any candidate has it.
///
/// If no candidate matches the preference, all candidates are kept.
#[derive(Debug, Clone, Default)]
pub struct PreferToken {
    symbol: Option<String>,
    scheme: Option<String>,
}

impl PreferToken {
    pub fn symbol<S: Into<String>>(symbol: S) -> Self {
        Self {
            symbol: Some(symbol.into()),
            scheme: None,
        }
    }

    pub fn with_scheme<S: Into<String>>(mut self, scheme: S) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn scheme<S: Into<String>>(scheme: S) -> Self {
        Self {
            symbol: None,
            scheme: Some(scheme.into()),
        }
    }

    fn preferred(&self, candidate: &PaymentCandidate<'_>) -> bool {
        let symbol_ok = self.symbol.as_deref().is_none_or(|symbol| {
            TokenRegistry::symbol_of(candidate.requirements)
                .is_some_and(|s| s.eq_ignore_ascii_case(symbol))
        });
        let scheme_ok = self
            .scheme
            .as_deref()
            .is_none_or(|scheme| candidate.requirements.scheme == scheme);
        symbol_ok && scheme_ok
    }
}

#[async_trait]
impl PaymentPolicy for PreferToken {
    async fn apply<'a>(&self, candidates: Vec<PaymentCandidate<'a>>) -> Vec<PaymentCandidate<'a>> {
        if !candidates.iter().any(|c| self.preferred(c)) {
            return candidates;
        }
        candidates.into_iter().filter(|c| self.preferred(c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockMechanism, requirement};
    use std::collections::HashMap;
    use x402_tron_types::balance::BalanceError;
    use x402_tron_types::proto::PaymentRequirements;
    use x402_tron_types::scheme::X402SchemeClient;

    struct StaticBalances(HashMap<String, U256>);

    #[async_trait]
    impl BalanceOracle for StaticBalances {
        async fn balance_of(
            &self,
            requirements: &PaymentRequirements,
            _owner: &str,
        ) -> Result<U256, BalanceError> {
            self.0
                .get(&requirements.network.to_string())
                .copied()
                .ok_or_else(|| BalanceError::Query("rpc down".into()))
        }
    }

    fn candidates<'a>(
        requirements: &'a [PaymentRequirements],
        mechanism: &Arc<dyn X402SchemeClient>,
    ) -> Vec<PaymentCandidate<'a>> {
        requirements
            .iter()
            .enumerate()
            .map(|(index, requirements)| PaymentCandidate {
                index,
                requirements,
                mechanism: mechanism.clone(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_sufficient_balance_drops_unaffordable() {
        let mechanism: Arc<dyn X402SchemeClient> = Arc::new(MockMechanism::new("tron", "exact_permit"));
        let offered = vec![
            requirement("tron:nile", "exact_permit"),
            requirement("tron:shasta", "exact_permit"),
        ];
        let oracle = StaticBalances(HashMap::from([
            ("tron:nile".to_string(), U256::from(10u64)),
            ("tron:shasta".to_string(), U256::from(5_000_000u64)),
        ]));
        let policy = SufficientBalancePolicy::new().with_oracle(ChainIdPattern::wildcard("tron"), oracle);
        let kept = policy.apply(candidates(&offered, &mechanism)).await;
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].index, 1);
    }

    #[tokio::test]
    async fn test_sufficient_balance_counts_fee() {
        let mechanism: Arc<dyn X402SchemeClient> = Arc::new(MockMechanism::new("tron", "exact_permit"));
        let mut nile = requirement("tron:nile", "exact_permit");
        nile.extra = Some(serde_json::json!({
            "fee": { "feeTo": "TD5gsCwxykWsLN9aPrq2TAfNjByuZKYp4E", "feeAmount": "1" }
        }));
        let offered = vec![nile];
        let oracle = StaticBalances(HashMap::from([(
            "tron:nile".to_string(),
            U256::from(1_000_000u64),
        )]));
        let policy = SufficientBalancePolicy::new().with_oracle(ChainIdPattern::wildcard("tron"), oracle);
        assert!(policy.apply(candidates(&offered, &mechanism)).await.is_empty());
    }

    #[tokio::test]
    async fn test_sufficient_balance_keeps_on_oracle_error_or_missing_oracle() {
        let mechanism: Arc<dyn X402SchemeClient> = Arc::new(MockMechanism::new("eip155", "exact"));
        let offered = vec![requirement("eip155:56", "exact"), requirement("eip155:97", "exact")];
        let oracle = StaticBalances(HashMap::new());
        let policy = SufficientBalancePolicy::new()
            .with_oracle("eip155:56".parse().unwrap(), oracle);
        let kept = policy.apply(candidates(&offered, &mechanism)).await;
        assert_eq!(kept.len(), 2);
    }

    #[tokio::test]
    async fn test_prefer_token_narrows_when_present() {
        let mechanism: Arc<dyn X402SchemeClient> = Arc::new(MockMechanism::new("eip155", "exact"));
        let usdt = requirement("eip155:56", "exact");
        let mut usdc = requirement("eip155:56", "exact");
        usdc.asset = "0x8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d".into();
        let offered = vec![usdt, usdc];
        let kept = PreferToken::symbol("USDC")
            .apply(candidates(&offered, &mechanism))
            .await;
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].index, 1);
    }

    #[tokio::test]
    async fn test_prefer_token_keeps_all_without_match() {
        let mechanism: Arc<dyn X402SchemeClient> = Arc::new(MockMechanism::new("eip155", "exact"));
        let offered = vec![requirement("eip155:56", "exact"), requirement("eip155:97", "exact")];
        let kept = PreferToken::symbol("USDD")
            .with_scheme("exact")
            .apply(candidates(&offered, &mechanism))
            .await;
        assert_eq!(kept.iter().map(|c| c.index).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_prefer_scheme() {
        let mechanism: Arc<dyn X402SchemeClient> = Arc::new(MockMechanism::new("eip155", "exact"));
        let offered = vec![requirement("eip155:56", "exact"), requirement("eip155:56", "exact_permit")];
        let kept = PreferToken::scheme("exact_permit")
            .apply(candidates(&offered, &mechanism))
            .await;
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].requirements.scheme, "exact_permit");
    }
}
