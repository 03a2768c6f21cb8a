//! The EVM `exact_permit` scheme: a signed [`PaymentPermit`](crate::permit::PaymentPermit).

use alloy_primitives::{Address, U256, hex};
use async_trait::async_trait;
use x402_tron_types::proto::{
    PaymentPayload, PaymentRequirements, ResourceInfo, SignedPayload, X402Version2,
};
use x402_tron_types::scheme::{X402Error, X402SchemeClient, X402SchemeId};

use crate::chain::{EIP155_NAMESPACE, Eip155ChainReference, SerialSigner, SignerLike};
use crate::exact::parse_address;
use crate::permit::{PermitAuthorization, PermitParams, domain_metadata, fee_terms, sign_payment_permit};

#[cfg(feature = "telemetry")]
use tracing::instrument;

pub const EXACT_PERMIT_SCHEME: &str = "exact_permit";

#[derive(Debug, Clone)]
pub struct Eip155ExactPermitClient<S> {
    signer: SerialSigner<S>,
}

impl<S> Eip155ExactPermitClient<S> {
    pub fn new(signer: SerialSigner<S>) -> Self {
        Self { signer }
    }
}

impl<S> X402SchemeId for Eip155ExactPermitClient<S> {
    fn namespace(&self) -> &str {
        EIP155_NAMESPACE
    }

    fn scheme(&self) -> &str {
        EXACT_PERMIT_SCHEME
    }
}

#[async_trait]
impl<S> X402SchemeClient for Eip155ExactPermitClient<S>
where
    S: SignerLike + 'static,
{
    fn payer(&self) -> String {
        self.signer.address().to_checksum(None)
    }

    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "x402.eip155.exact_permit.build", skip_all, fields(network = %requirements.network), err)
    )]
    async fn build(
        &self,
        requirements: &PaymentRequirements,
        resource: Option<&ResourceInfo>,
    ) -> Result<PaymentPayload, X402Error> {
        let chain = Eip155ChainReference::try_from(&requirements.network)
            .map_err(|e| X402Error::UnsupportedScheme(e.to_string()))?;
        let (name, version) = domain_metadata(requirements)?;
        let (fee_to, fee_amount) = match fee_terms(requirements) {
            Some(fee) => (parse_address("feeTo", &fee.fee_to)?, fee.fee_amount.inner()),
            None => (Address::ZERO, U256::ZERO),
        };
        let params = PermitParams {
            chain_id: chain.inner(),
            name,
            version,
            token: parse_address("asset", &requirements.asset)?,
            pay_to: parse_address("payTo", &requirements.pay_to)?,
            amount: requirements.amount.inner(),
            fee_to,
            fee_amount,
            max_timeout_seconds: requirements.max_timeout_seconds,
        };
        let signed = sign_payment_permit(&self.signer, &params).await?;

        let authorization =
            PermitAuthorization::from_permit(&signed.permit, signed.deadline, |a| a.to_checksum(None));
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
