//! Mechanisms and fixtures shared by the unit tests of this crate.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use x402_tron_types::proto::{
    PaymentPayload, PaymentRequirements, ResourceInfo, SignedPayload, X402Version2,
};
use x402_tron_types::scheme::{X402Error, X402SchemeClient, X402SchemeId};
use x402_tron_types::timestamp::UnixTimestamp;

pub const NILE_USDT: &str = "TXYZopYRdj2D9XRtbG411XZZ3kM5VkAeBf";
pub const BSC_USDT: &str = "0x55d398326f99059fF775485246999027B3197955";
pub const MERCHANT: &str = "TD5gsCwxykWsLN9aPrq2TAfNjByuZKYp4E";

pub fn requirement(network: &str, scheme: &str) -> PaymentRequirements {
    let asset = if network.starts_with("tron:") {
        NILE_USDT
    } else {
        BSC_USDT
    };
    PaymentRequirements {
        scheme: scheme.into(),
        network: network.parse().unwrap(),
        amount: 1_000_000u64.into(),
        asset: asset.into(),
        pay_to: MERCHANT.into(),
        max_timeout_seconds: 300,
        extra: None,
    }
}

/// Builds unsigned-but-well-formed payloads and counts how often it was asked to.
pub struct MockMechanism {
    namespace: String,
    scheme: String,
    payer: String,
    fail: bool,
    pub builds: Arc<AtomicUsize>,
}

impl MockMechanism {
    pub fn new(namespace: &str, scheme: &str) -> Self {
        Self {
            namespace: namespace.into(),
            scheme: scheme.into(),
            payer: format!("{namespace}-payer"),
            fail: false,
            builds: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_payer(mut self, payer: &str) -> Self {
        self.payer = payer.into();
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl X402SchemeId for MockMechanism {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn scheme(&self) -> &str {
        &self.scheme
    }
}

#[async_trait]
impl X402SchemeClient for MockMechanism {
    fn payer(&self) -> String {
        self.payer.clone()
    }

    async fn build(
        &self,
        requirements: &PaymentRequirements,
        resource: Option<&ResourceInfo>,
    ) -> Result<PaymentPayload, X402Error> {
        let attempt = self.builds.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(X402Error::SigningFailed("signer rejected".into()));
        }
        Ok(PaymentPayload {
            x402_version: X402Version2,
            resource: resource.cloned(),
            accepted: requirements.clone(),
            payload: SignedPayload {
                signature: format!("0x{}", "11".repeat(65)),
                payer: self.payer.clone(),
                nonce: Some(attempt.to_string()),
                deadline: Some(UnixTimestamp::now() + requirements.max_timeout_seconds),
                authorization: None,
            },
        })
    }
}
