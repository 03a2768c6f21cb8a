//! The EVM `exact` scheme: ERC-3009 `transferWithAuthorization`.
//!
//! The payer signs an EIP-712 `TransferWithAuthorization` for the token
//! contract itself; the facilitator submits it on-chain. The token's EIP-712
//! domain name and version come from the requirement's `extra`.

mod client;
pub use client::*;

use alloy_primitives::B256;
use alloy_sol_types::sol;
use serde::{Deserialize, Serialize};
use x402_tron_types::timestamp::UnixTimestamp;
use x402_tron_types::util::TokenAmount;

use crate::chain::ChecksummedAddress;

pub const EXACT_SCHEME: &str = "exact";

/// Seconds subtracted from now for `validAfter`, absorbing clock skew
/// between the payer and the chain.
pub const VALID_AFTER_SKEW_SECS: u64 = 10 * 60;

/// Wire form of the signed authorization, carried in `payload.authorization`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactEvmAuthorization {
    pub from: ChecksummedAddress,
    pub to: ChecksummedAddress,
    pub value: TokenAmount,
    pub valid_after: UnixTimestamp,
    pub valid_before: UnixTimestamp,
    pub nonce: B256,
}

sol!(
    /// ERC-3009 typed data. Field values must match [`ExactEvmAuthorization`]
    /// exactly, since the facilitator rebuilds this struct to verify.
    #[derive(Debug)]
    struct TransferWithAuthorization {
        address from;
        address to;
        uint256 value;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
);

impl From<&ExactEvmAuthorization> for TransferWithAuthorization {
    fn from(authorization: &ExactEvmAuthorization) -> Self {
        TransferWithAuthorization {
            from: authorization.from.0,
            to: authorization.to.0,
            value: authorization.value.inner(),
            validAfter: alloy_primitives::U256::from(authorization.valid_after.as_secs()),
            validBefore: alloy_primitives::U256::from(authorization.valid_before.as_secs()),
            nonce: authorization.nonce,
        }
    }
}
