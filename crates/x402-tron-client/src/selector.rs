//! Choosing one payment requirement out of the acceptable ones.

use async_trait::async_trait;
use std::sync::Arc;
use x402_tron_types::proto::PaymentRequirements;
use x402_tron_types::scheme::X402SchemeClient;

/// An offered requirement that a registered mechanism can pay.
#[derive(Clone)]
pub struct PaymentCandidate<'a> {
    /// Position of the requirement in the challenge's `accepts`.
    pub index: usize,
    pub requirements: &'a PaymentRequirements,
    pub mechanism: Arc<dyn X402SchemeClient>,
}

impl PaymentCandidate<'_> {
    pub fn payer(&self) -> String {
        self.mechanism.payer()
    }
}

impl std::fmt::Debug for PaymentCandidate<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentCandidate")
            .field("index", &self.index)
            .field("network", &self.requirements.network)
            .field("scheme", &self.requirements.scheme)
            .field("asset", &self.requirements.asset)
            .field("amount", &self.requirements.amount)
            .finish()
    }
}

/// Picks one candidate.
///
/// Candidates arrive in server order, already filtered by network and by the
/// configured policies. Returning `None` declines to pay.
#[async_trait]
pub trait PaymentSelector: Send + Sync {
    async fn select<'a, 'b>(
        &self,
        candidates: &'a [PaymentCandidate<'b>],
    ) -> Option<&'a PaymentCandidate<'b>>;
}

#[async_trait]
impl<T: PaymentSelector + ?Sized> PaymentSelector for Arc<T> {
    async fn select<'a, 'b>(
        &self,
        candidates: &'a [PaymentCandidate<'b>],
    ) -> Option<&'a PaymentCandidate<'b>> {
        (**self).select(candidates).await
    }
}

/// Takes the first candidate, keeping the server's priority.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstMatch;

#[async_trait]
impl PaymentSelector for FirstMatch {
    async fn select<'a, 'b>(
        &self,
        candidates: &'a [PaymentCandidate<'b>],
    ) -> Option<&'a PaymentCandidate<'b>> {
        candidates.first()
    }
}
