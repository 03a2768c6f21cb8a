//! Balance lookups used to filter out unaffordable requirements.

use alloy_primitives::U256;
use async_trait::async_trait;
use std::sync::Arc;

use crate::chain::ChainId;
use crate::proto::PaymentRequirements;

/// Reports how much of a requirement's asset an owner holds.
#[async_trait]
pub trait BalanceOracle: Send + Sync {
    /// Balance of `owner` in the smallest unit of `requirements.asset` on
    /// `requirements.network`.
    async fn balance_of(
        &self,
        requirements: &PaymentRequirements,
        owner: &str,
    ) -> Result<U256, BalanceError>;
}

#[async_trait]
impl<T: BalanceOracle + ?Sized> BalanceOracle for Arc<T> {
    async fn balance_of(
        &self,
        requirements: &PaymentRequirements,
        owner: &str,
    ) -> Result<U256, BalanceError> {
        (**self).balance_of(requirements, owner).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BalanceError {
    #[error("No balance source for network {0}")]
    UnsupportedNetwork(ChainId),
    #[error("Invalid address {0}")]
    InvalidAddress(String),
    #[error("Balance query failed: {0}")]
    Query(String),
}
