use alloy_primitives::{Address, FixedBytes, hex};
use alloy_sol_types::{SolStruct, eip712_domain};
use async_trait::async_trait;
use rand::{Rng, rng};
use x402_tron_types::proto::{
    PaymentPayload, PaymentRequirements, ResourceInfo, SignedPayload, X402Version2,
};
use x402_tron_types::scheme::{X402Error, X402SchemeClient, X402SchemeId};
use x402_tron_types::timestamp::UnixTimestamp;

use crate::chain::{EIP155_NAMESPACE, Eip155ChainReference, SerialSigner, SignerLike};
use crate::exact::{EXACT_SCHEME, ExactEvmAuthorization, TransferWithAuthorization, VALID_AFTER_SKEW_SECS};
use crate::permit::domain_metadata;

#[cfg(feature = "telemetry")]
use tracing::instrument;

/// Builds `exact` payloads on any EVM chain.
///
/// ```rust,ignore
/// use alloy_signer_local::PrivateKeySigner;
/// use x402_chain_eip155::{Eip155ExactClient, chain::SerialSigner};
///
/// let signer = SerialSigner::new("0x...".parse::<PrivateKeySigner>()?);
/// let mechanism = Eip155ExactClient::new(signer);
/// ```
#[derive(Debug, Clone)]
pub struct Eip155ExactClient<S> {
    signer: SerialSigner<S>,
}

impl<S> Eip155ExactClient<S> {
    pub fn new(signer: SerialSigner<S>) -> Self {
        Self { signer }
    }
}

impl<S> X402SchemeId for Eip155ExactClient<S> {
    fn namespace(&self) -> &str {
        EIP155_NAMESPACE
    }

    fn scheme(&self) -> &str {
        EXACT_SCHEME
    }
}

#[async_trait]
impl<S> X402SchemeClient for Eip155ExactClient<S>
where
    S: SignerLike + 'static,
{
    fn payer(&self) -> String {
        self.signer.address().to_checksum(None)
    }

    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "x402.eip155.exact.build", skip_all, fields(network = %requirements.network), err)
    )]
    async fn build(
        &self,
        requirements: &PaymentRequirements,
        resource: Option<&ResourceInfo>,
    ) -> Result<PaymentPayload, X402Error> {
        let chain = Eip155ChainReference::try_from(&requirements.network)
            .map_err(|e| X402Error::UnsupportedScheme(e.to_string()))?;
        let asset = parse_address("asset", &requirements.asset)?;
        let pay_to = parse_address("payTo", &requirements.pay_to)?;
        let (name, version) = domain_metadata(requirements)?;

        let domain = eip712_domain! {
            name: name,
            version: version,
            chain_id: chain.inner(),
            verifying_contract: asset,
        };

        let max_timeout_seconds = requirements.max_timeout_seconds;
        let value = requirements.amount;
        let (authorization, signature) = self
            .signer
            .sign_with(|from| {
                let now = UnixTimestamp::now();
                let nonce: [u8; 32] = rng().random();
                let authorization = ExactEvmAuthorization {
                    from: from.into(),
                    to: pay_to.into(),
                    value,
                    valid_after: now.before(VALID_AFTER_SKEW_SECS),
                    valid_before: now + max_timeout_seconds,
                    nonce: FixedBytes(nonce),
                };
                let hash = TransferWithAuthorization::from(&authorization).eip712_signing_hash(&domain);
                (authorization, hash)
            })
            .await?;

        let authorization_json = serde_json::to_value(&authorization)
            .map_err(|e| X402Error::MalformedPayload(e.to_string()))?;
        Ok(PaymentPayload {
            x402_version: X402Version2,
            resource: resource.cloned(),
            accepted: requirements.clone(),
            payload: SignedPayload {
                signature: hex::encode_prefixed(signature.as_bytes()),
                payer: self.payer(),
                nonce: Some(authorization.nonce.to_string()),
                deadline: Some(authorization.valid_before),
                authorization: Some(authorization_json),
            },
        })
    }
}

pub(crate) fn parse_address(field: &str, value: &str) -> Result<Address, X402Error> {
    value
        .parse::<Address>()
        .map_err(|_| X402Error::UnsupportedScheme(format!("{field} {value} is not an EVM address")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::signer::tests::{TEST_ADDRESS, test_signer};
    use alloy_primitives::Signature;
    use serde_json::json;

    fn requirements() -> PaymentRequirements {
        serde_json::from_value(json!({
            "scheme": "exact",
            "network": "eip155:56",
            "amount": "1000000",
            "asset": "0x8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d",
            "payTo": "0x2222222222222222222222222222222222222222",
            "maxTimeoutSeconds": 120,
            "extra": { "name": "USD Coin", "version": "2" }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_build_signs_transfer_with_authorization() {
        let mechanism = Eip155ExactClient::new(test_signer());
        let requirements = requirements();
        let payload = mechanism.build(&requirements, None).await.unwrap();

        assert_eq!(payload.payload.payer, TEST_ADDRESS);
        let authorization: ExactEvmAuthorization =
            serde_json::from_value(payload.payload.authorization.clone().unwrap()).unwrap();
        assert_eq!(authorization.value, requirements.amount);
        assert_eq!(
            authorization.valid_before.as_secs() - authorization.valid_after.as_secs(),
            120 + VALID_AFTER_SKEW_SECS
        );

        let domain = eip712_domain! {
            name: "USD Coin",
            version: "2",
            chain_id: 56,
            verifying_contract: requirements.asset.parse::<Address>().unwrap(),
        };
        let hash = TransferWithAuthorization::from(&authorization).eip712_signing_hash(&domain);
        let bytes = hex::decode(&payload.payload.signature).unwrap();
        let signature = Signature::from_raw(&bytes).unwrap();
        assert_eq!(
            signature.recover_address_from_prehash(&hash).unwrap().to_checksum(None),
            TEST_ADDRESS
        );
    }

    #[tokio::test]
    async fn test_build_leaves_requirements_untouched() {
        let mechanism = Eip155ExactClient::new(test_signer());
        let requirements = requirements();
        let snapshot = requirements.clone();
        let first = mechanism.build(&requirements, None).await.unwrap();
        let second = mechanism.build(&requirements, None).await.unwrap();
        assert_eq!(requirements, snapshot);
        assert_eq!(first.accepted, second.accepted);
        assert_eq!(first.accepted.amount, snapshot.amount);
        assert_eq!(first.accepted.pay_to, snapshot.pay_to);
        assert_eq!(first.accepted.asset, snapshot.asset);
        assert_ne!(first.payload.nonce, second.payload.nonce);
    }

    #[tokio::test]
    async fn test_validity_window_starts_after_lock_wait() {
        let signer = test_signer();
        let mechanism = Eip155ExactClient::new(signer.clone());
        let guard = signer.hold_lock().await;
        let task = tokio::spawn(async move { mechanism.build(&requirements(), None).await });
        tokio::time::sleep(std::time::Duration::from_millis(2100)).await;
        let released = UnixTimestamp::now();
        drop(guard);
        let payload = task.await.unwrap().unwrap();
        let authorization: ExactEvmAuthorization =
            serde_json::from_value(payload.payload.authorization.unwrap()).unwrap();
        assert!(authorization.valid_before.as_secs() >= released.as_secs() + 120);
    }

    #[test]
    fn test_mechanism_is_debug() {
        let rendered = format!("{:?}", Eip155ExactClient::new(test_signer()));
        assert!(rendered.contains("SerialSigner"));
    }

    #[tokio::test]
    async fn test_missing_domain_is_unsupported() {
        let mechanism = Eip155ExactClient::new(test_signer());
        let mut requirements = requirements();
        requirements.extra = None;
        assert!(matches!(
            mechanism.build(&requirements, None).await,
            Err(X402Error::UnsupportedScheme(_))
        ));
    }

    #[tokio::test]
    async fn test_tron_asset_is_unsupported() {
        let mechanism = Eip155ExactClient::new(test_signer());
        let mut requirements = requirements();
        requirements.asset = "TXYZopYRdj2D9XRtbG411XZZ3kM5VkAeBf".into();
        assert!(matches!(
            mechanism.build(&requirements, None).await,
            Err(X402Error::UnsupportedScheme(_))
        ));
    }
}
