//! Payment mechanisms and the errors of a payment attempt.
//!
//! A mechanism is one (chain family, payment scheme) strategy for turning a
//! [`PaymentRequirements`] into a signed [`PaymentPayload`]. Chain crates
//! implement [`X402SchemeClient`]; the client crate registers them under a
//! [`ChainIdPattern`] and resolves one per requirement.

use async_trait::async_trait;
use std::sync::Arc;

use crate::chain::{ChainId, ChainIdPattern};
use crate::codec::CodecError;
use crate::proto::{PaymentPayload, PaymentRequirements, ResourceInfo};

/// Identifies a mechanism by chain family and scheme name.
pub trait X402SchemeId {
    /// CAIP-2 namespace served by the mechanism (`tron`, `eip155`).
    fn namespace(&self) -> &str;

    /// Scheme name as it appears in requirements (`exact_permit`, `exact`).
    fn scheme(&self) -> &str;

    /// Pattern the mechanism registers under unless told otherwise.
    fn pattern(&self) -> ChainIdPattern {
        ChainIdPattern::wildcard(self.namespace())
    }
}

/// Builds signed payloads for one chain family and scheme.
#[async_trait]
pub trait X402SchemeClient: X402SchemeId + Send + Sync {
    /// Payer address in the chain's native format.
    fn payer(&self) -> String;

    /// Whether this mechanism can construct a payload for `requirements`.
    fn accepts(&self, requirements: &PaymentRequirements) -> bool {
        requirements.scheme == self.scheme() && requirements.network.namespace == self.namespace()
    }

    /// Signs a payload answering `requirements`.
    ///
    /// Implementations read `requirements` only; the payload gets its own copy.
    async fn build(
        &self,
        requirements: &PaymentRequirements,
        resource: Option<&ResourceInfo>,
    ) -> Result<PaymentPayload, X402Error>;
}

impl<T: X402SchemeId + ?Sized> X402SchemeId for Arc<T> {
    fn namespace(&self) -> &str {
        (**self).namespace()
    }

    fn scheme(&self) -> &str {
        (**self).scheme()
    }

    fn pattern(&self) -> ChainIdPattern {
        (**self).pattern()
    }
}

#[async_trait]
impl<T: X402SchemeClient + ?Sized> X402SchemeClient for Arc<T> {
    fn payer(&self) -> String {
        (**self).payer()
    }

    fn accepts(&self, requirements: &PaymentRequirements) -> bool {
        (**self).accepts(requirements)
    }

    async fn build(
        &self,
        requirements: &PaymentRequirements,
        resource: Option<&ResourceInfo>,
    ) -> Result<PaymentPayload, X402Error> {
        (**self).build(requirements, resource).await
    }
}

/// Why a payment could not be prepared.
///
/// None of these trigger a retry; the caller decides whether to start over.
#[derive(Debug, thiserror::Error)]
pub enum X402Error {
    /// The 402 response does not carry a valid challenge.
    #[error("Invalid 402 challenge: {0}")]
    ChallengeParse(String),
    /// No offered requirement matches a registered mechanism, or none survived the policies.
    #[error("No acceptable payment requirement among offered networks [{}]", format_networks(.offered))]
    NoAcceptableRequirement { offered: Vec<ChainId> },
    /// The signer declined, failed or timed out.
    #[error("Signing failed: {0}")]
    SigningFailed(String),
    /// The mechanism has no construction rule for the requirement.
    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),
    /// A payload or settlement failed to encode or decode.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
    /// An interactive selector chose nothing.
    #[error("Payment declined by user")]
    SelectionDeclined,
}

fn format_networks(networks: &[ChainId]) -> String {
    networks
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<CodecError> for X402Error {
    fn from(value: CodecError) -> Self {
        X402Error::MalformedPayload(value.to_string())
    }
}
