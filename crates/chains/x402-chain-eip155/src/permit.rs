//! The `PaymentPermit` EIP-712 message shared by the `exact_permit` mechanisms.
//!
//! EVM and TRON sign the same typed struct; they differ only in how addresses
//! are written on the wire and in the numeric chain id of the domain.

use alloy_primitives::{Address, Signature, U256};
use alloy_sol_types::{Eip712Domain, SolStruct, eip712_domain, sol};
use rand::{Rng, rng};
use serde::{Deserialize, Serialize};
use x402_tron_types::proto::{FeeInfo, PaymentRequirements};
use x402_tron_types::scheme::X402Error;
use x402_tron_types::timestamp::UnixTimestamp;
use x402_tron_types::util::TokenAmount;

use crate::chain::{SerialSigner, SignerLike};

sol!(
    /// Authorization for one payment of `amount` of `token` from `buyer` to
    /// `payTo`, plus `feeAmount` to `feeTo`, valid until `deadline`.
    #[derive(Debug, PartialEq, Eq)]
    struct PaymentPermit {
        address buyer;
        address token;
        address payTo;
        uint256 amount;
        address feeTo;
        uint256 feeAmount;
        uint256 nonce;
        uint256 deadline;
    }
);

/// EIP-712 domain name and version from the requirement's `extra`.
///
/// Without them there is nothing to sign against, so the requirement is
/// reported as unsupported rather than signed with a guessed domain.
pub fn domain_metadata(requirements: &PaymentRequirements) -> Result<(String, String), X402Error> {
    let extra = requirements.extra_fields().map_err(|e| {
        X402Error::UnsupportedScheme(format!("{}: unreadable extra: {e}", requirements.scheme))
    })?;
    match (extra.name, extra.version) {
        (Some(name), Some(version)) => Ok((name, version)),
        _ => Err(X402Error::UnsupportedScheme(format!(
            "{} on {} requires extra.name and extra.version",
            requirements.scheme, requirements.network
        ))),
    }
}

/// Facilitator fee announced in `extra.fee`, if any.
pub fn fee_terms(requirements: &PaymentRequirements) -> Option<FeeInfo> {
    requirements.extra_fields().ok().and_then(|extra| extra.fee)
}

/// Everything needed to sign a [`PaymentPermit`], addresses already in EVM form.
#[derive(Debug, Clone)]
pub struct PermitParams {
    pub chain_id: u64,
    pub name: String,
    pub version: String,
    pub token: Address,
    pub pay_to: Address,
    pub amount: U256,
    pub fee_to: Address,
    pub fee_amount: U256,
    pub max_timeout_seconds: u64,
}

impl PermitParams {
    /// Domain the permit is signed under. The token contract is the verifying contract.
    pub fn domain(&self) -> Eip712Domain {
        eip712_domain! {
            name: self.name.clone(),
            version: self.version.clone(),
            chain_id: self.chain_id,
            verifying_contract: self.token,
        }
    }
}

#[derive(Debug)]
pub struct SignedPermit {
    pub permit: PaymentPermit,
    pub deadline: UnixTimestamp,
    pub signature: Signature,
}

/// Signs a fresh permit with a random nonce and a deadline `max_timeout_seconds` from now.
///
/// Nonce and deadline are generated under the signer lock, so time spent
/// waiting behind other signatures does not shorten the validity window.
pub async fn sign_payment_permit<S: SignerLike>(
    signer: &SerialSigner<S>,
    params: &PermitParams,
) -> Result<SignedPermit, X402Error> {
    let domain = params.domain();
    let ((permit, deadline), signature) = signer
        .sign_with(|buyer| {
            let deadline = UnixTimestamp::now() + params.max_timeout_seconds;
            let nonce: [u8; 32] = rng().random();
            let permit = PaymentPermit {
                buyer,
                token: params.token,
                payTo: params.pay_to,
                amount: params.amount,
                feeTo: params.fee_to,
                feeAmount: params.fee_amount,
                nonce: U256::from_be_bytes(nonce),
                deadline: U256::from(deadline.as_secs()),
            };
            let hash = permit.eip712_signing_hash(&domain);
            ((permit, deadline), hash)
        })
        .await?;
    Ok(SignedPermit {
        permit,
        deadline,
        signature,
    })
}

/// Wire form of a signed permit, carried in `payload.authorization`.
///
/// Addresses are rendered by the mechanism in its chain's native format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermitAuthorization {
    pub buyer: String,
    pub token: String,
    pub pay_to: String,
    pub amount: TokenAmount,
    pub fee_to: String,
    pub fee_amount: TokenAmount,
    pub nonce: TokenAmount,
    pub deadline: UnixTimestamp,
}

impl PermitAuthorization {
    /// Renders `permit` using `format` for every address.
    pub fn from_permit<F>(permit: &PaymentPermit, deadline: UnixTimestamp, format: F) -> Self
    where
        F: Fn(Address) -> String,
    {
        Self {
            buyer: format(permit.buyer),
            token: format(permit.token),
            pay_to: format(permit.payTo),
            amount: permit.amount.into(),
            fee_to: format(permit.feeTo),
            fee_amount: permit.feeAmount.into(),
            nonce: permit.nonce.into(),
            deadline,
        }
    }
}
