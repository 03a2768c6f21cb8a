//! The TRON `exact_permit` scheme.
//!
//! Same `PaymentPermit` typed message as on EVM chains, signed with the same
//! secp256k1 key. Addresses are converted from base58check to their 20-byte
//! body for hashing and rendered back as base58 on the wire. The domain's
//! chain id is the network's numeric TRON chain id.

use alloy_primitives::{Address, U256, hex};
use async_trait::async_trait;
use x402_chain_eip155::chain::{SerialSigner, SignerLike};
use x402_chain_eip155::permit::{
    PermitAuthorization, PermitParams, domain_metadata, fee_terms, sign_payment_permit,
};
use x402_tron_types::proto::{
    PaymentPayload, PaymentRequirements, ResourceInfo, SignedPayload, X402Version2,
};
use x402_tron_types::scheme::{X402Error, X402SchemeClient, X402SchemeId};

use crate::chain::{TRON_NAMESPACE, TronAddress, TronChainReference};

#[cfg(feature = "telemetry")]
use tracing::instrument;

pub const EXACT_PERMIT_SCHEME: &str = "exact_permit";

/// Builds `exact_permit` payloads on TRON networks.
///
/// ```rust,ignore
/// use alloy_signer_local::PrivateKeySigner;
/// use x402_chain_eip155::chain::SerialSigner;
/// use x402_chain_tron::TronExactPermitClient;
///
/// let signer = SerialSigner::new(std::env::var("TRON_PRIVATE_KEY")?.parse::<PrivateKeySigner>()?);
/// let mechanism = TronExactPermitClient::new(signer);
/// println!("paying from {}", mechanism.address());
/// ```
#[derive(Debug, Clone)]
pub struct TronExactPermitClient<S> {
    signer: SerialSigner<S>,
}

impl<S> TronExactPermitClient<S> {
    pub fn new(signer: SerialSigner<S>) -> Self {
        Self { signer }
    }
}

impl<S: SignerLike> TronExactPermitClient<S> {
    /// Base58 address of the paying account.
    pub fn address(&self) -> TronAddress {
        TronAddress::from(self.signer.address())
    }
}

impl<S> X402SchemeId for TronExactPermitClient<S> {
    fn namespace(&self) -> &str {
        TRON_NAMESPACE
    }

    fn scheme(&self) -> &str {
        EXACT_PERMIT_SCHEME
    }
}

#[async_trait]
impl<S> X402SchemeClient for TronExactPermitClient<S>
where
    S: SignerLike + 'static,
{
    fn payer(&self) -> String {
        self.address().to_string()
    }

    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "x402.tron.exact_permit.build", skip_all, fields(network = %requirements.network), err)
    )]
    async fn build(
        &self,
        requirements: &PaymentRequirements,
        resource: Option<&ResourceInfo>,
    ) -> Result<PaymentPayload, X402Error> {
        let chain = TronChainReference::try_from(&requirements.network)
            .map_err(|e| X402Error::UnsupportedScheme(e.to_string()))?;
        let (name, version) = domain_metadata(requirements)?;
        let (fee_to, fee_amount) = match fee_terms(requirements) {
            Some(fee) => (parse_tron_address("feeTo", &fee.fee_to)?, fee.fee_amount.inner()),
            None => (Address::ZERO, U256::ZERO),
        };
        let params = PermitParams {
            chain_id: chain.eip712_chain_id(),
            name,
            version,
            token: parse_tron_address("asset", &requirements.asset)?,
            pay_to: parse_tron_address("payTo", &requirements.pay_to)?,
            amount: requirements.amount.inner(),
            fee_to,
            fee_amount,
            max_timeout_seconds: requirements.max_timeout_seconds,
        };
        let signed = sign_payment_permit(&self.signer, &params).await?;

        let authorization = PermitAuthorization::from_permit(&signed.permit, signed.deadline, |a| {
            TronAddress::from(a).to_string()
        });
        let authorization_json = serde_json::to_value(&authorization)
            .map_err(|e| X402Error::MalformedPayload(e.to_string()))?;
        Ok(PaymentPayload {
            x402_version: X402Version2,
            resource: resource.cloned(),
            accepted: requirements.clone(),
            payload: SignedPayload {
                signature: hex::encode_prefixed(signed.signature.as_bytes()),
                payer: self.payer(),
                nonce: Some(signed.permit.nonce.to_string()),
                deadline: Some(signed.deadline),
                authorization: Some(authorization_json),
            },
        })
    }
}

fn parse_tron_address(field: &str, value: &str) -> Result<Address, X402Error> {
    value
        .parse::<TronAddress>()
        .map(|a| a.body())
        .map_err(|e| X402Error::UnsupportedScheme(format!("{field}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Signature;
    use alloy_signer_local::PrivateKeySigner;
    use alloy_sol_types::SolStruct;
    use serde_json::json;
    use x402_chain_eip155::permit::PaymentPermit;
    use x402_tron_types::util::TokenAmount;

    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_TRON_ADDRESS: &str = "TYBNgWfhGuNzdLtjKtxXTfskAhTbMcqbaG";

    fn mechanism() -> TronExactPermitClient<PrivateKeySigner> {
        let signer: PrivateKeySigner = TEST_KEY.parse().unwrap();
        TronExactPermitClient::new(SerialSigner::new(signer))
    }

    fn requirements() -> PaymentRequirements {
        serde_json::from_value(json!({
            "scheme": "exact_permit",
            "network": "tron:nile",
            "amount": "100",
            "asset": "TXYZopYRdj2D9XRtbG411XZZ3kM5VkAeBf",
            "payTo": "TD5gsCwxykWsLN9aPrq2TAfNjByuZKYp4E",
            "maxTimeoutSeconds": 300,
            "extra": {
                "name": "PaymentPermit",
                "version": "1",
                "fee": { "feeTo": "TEdvoHEatmDKvTh3o9vBRB9Vdtbhn4QFhy", "feeAmount": "1" }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_payer_is_base58() {
        assert_eq!(mechanism().payer(), TEST_TRON_ADDRESS);
    }

    #[tokio::test]
    async fn test_build_signs_with_nile_chain_id() {
        let mechanism = mechanism();
        let requirements = requirements();
        let payload = mechanism.build(&requirements, None).await.unwrap();
        assert_eq!(payload.payload.payer, TEST_TRON_ADDRESS);
        assert_eq!(payload.accepted, requirements);

        let authorization: PermitAuthorization =
            serde_json::from_value(payload.payload.authorization.clone().unwrap()).unwrap();
        assert_eq!(authorization.buyer, TEST_TRON_ADDRESS);
        assert_eq!(authorization.token, "TXYZopYRdj2D9XRtbG411XZZ3kM5VkAeBf");
        assert_eq!(authorization.pay_to, "TD5gsCwxykWsLN9aPrq2TAfNjByuZKYp4E");
        assert_eq!(authorization.fee_to, "TEdvoHEatmDKvTh3o9vBRB9Vdtbhn4QFhy");
        assert_eq!(authorization.fee_amount, TokenAmount::from(1u64));

        let token = parse_tron_address("asset", &requirements.asset).unwrap();
        let params = PermitParams {
            chain_id: 3448148188,
            name: "PaymentPermit".into(),
            version: "1".into(),
            token,
            pay_to: Address::repeat_byte(0x22),
            amount: U256::from(100u64),
            fee_to: Address::repeat_byte(0x33),
            fee_amount: U256::from(1u64),
            max_timeout_seconds: 300,
        };
        let permit = PaymentPermit {
            buyer: mechanism.address().body(),
            token,
            payTo: params.pay_to,
            amount: params.amount,
            feeTo: params.fee_to,
            feeAmount: params.fee_amount,
            nonce: authorization.nonce.inner(),
            deadline: U256::from(authorization.deadline.as_secs()),
        };
        let hash = permit.eip712_signing_hash(&params.domain());
        let signature =
            Signature::from_raw(&hex::decode(&payload.payload.signature).unwrap()).unwrap();
        assert_eq!(
            signature.recover_address_from_prehash(&hash).unwrap(),
            mechanism.address().body()
        );
    }

    #[tokio::test]
    async fn test_missing_fee_signs_zero_fee() {
        let mut requirements = requirements();
        requirements.extra = Some(json!({ "name": "PaymentPermit", "version": "1" }));
        let payload = mechanism().build(&requirements, None).await.unwrap();
        let authorization: PermitAuthorization =
            serde_json::from_value(payload.payload.authorization.unwrap()).unwrap();
        assert_eq!(authorization.fee_amount, TokenAmount::from(0u64));
        assert_eq!(authorization.fee_to, "T9yD14Nj9j7xAB4dbGeiX9h8unkKHxuWwb");
    }

    #[tokio::test]
    async fn test_evm_pay_to_is_unsupported() {
        let mut requirements = requirements();
        requirements.pay_to = "0x2222222222222222222222222222222222222222".into();
        assert!(matches!(
            mechanism().build(&requirements, None).await,
            Err(X402Error::UnsupportedScheme(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_tron_network_is_unsupported() {
        let mut requirements = requirements();
        requirements.network = "tron:devnet".parse().unwrap();
        assert!(matches!(
            mechanism().build(&requirements, None).await,
            Err(X402Error::UnsupportedScheme(_))
        ));
    }
}
