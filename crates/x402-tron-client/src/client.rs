//! Payment preparation: from a challenge to a `PAYMENT-SIGNATURE` header.
//!
//! [`X402Client`] owns the registered mechanisms, the policies and the
//! selector. It is used directly by [`X402HttpClient`](crate::X402HttpClient)
//! and doubles as a `reqwest-middleware` for callers that want payments to be
//! transparent.

use http::{Extensions, HeaderMap, HeaderName, HeaderValue, StatusCode};
use reqwest::{Request, Response};
use reqwest_middleware as rqm;
use std::sync::Arc;
use x402_tron_types::chain::ChainIdPattern;
use x402_tron_types::codec;
use x402_tron_types::proto::{PAYMENT_SIGNATURE_HEADER, PaymentPayload, PaymentRequired};
use x402_tron_types::scheme::{X402Error, X402SchemeClient};

use crate::error::FetchError;
use crate::http_transport::payment_required_from_response;
use crate::policy::PaymentPolicy;
use crate::registry::MechanismRegistry;
use crate::selector::{FirstMatch, PaymentCandidate, PaymentSelector};

#[cfg(feature = "telemetry")]
use tracing::{debug, info, instrument, trace};

/// Turns payment challenges into signed payloads.
///
/// ```rust,ignore
/// use x402_tron_client::{PreferToken, X402Client};
///
/// let client = X402Client::new()
///     .register(TronExactPermitClient::new(tron_signer))
///     .register(Eip155ExactClient::new(evm_signer))
///     .with_policy(PreferToken::symbol("USDT"));
/// ```
pub struct X402Client<TSelector> {
    registry: MechanismRegistry,
    policies: Vec<Arc<dyn PaymentPolicy>>,
    selector: TSelector,
    header_name: HeaderName,
}

impl X402Client<FirstMatch> {
    /// A client with no mechanisms, no policies and [`FirstMatch`] selection.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for X402Client<FirstMatch> {
    fn default() -> Self {
        Self {
            registry: MechanismRegistry::default(),
            policies: Vec::new(),
            selector: FirstMatch,
            header_name: HeaderName::from_static("payment-signature"),
        }
    }
}

impl<TSelector> X402Client<TSelector> {
    /// Registers a mechanism for every chain of its namespace.
    pub fn register<M>(mut self, mechanism: M) -> Self
    where
        M: X402SchemeClient + 'static,
    {
        self.registry.register(mechanism);
        self
    }

    /// Registers a mechanism for the chains matched by `pattern` only.
    pub fn register_for<M>(mut self, pattern: ChainIdPattern, mechanism: M) -> Self
    where
        M: X402SchemeClient + 'static,
    {
        self.registry.register_for(pattern, mechanism);
        self
    }

    /// Appends a policy. Policies run in the order they were added.
    pub fn with_policy<P: PaymentPolicy + 'static>(mut self, policy: P) -> Self {
        self.policies.push(Arc::new(policy));
        self
    }

    pub fn with_selector<P: PaymentSelector + 'static>(self, selector: P) -> X402Client<P> {
        X402Client {
            registry: self.registry,
            policies: self.policies,
            selector,
            header_name: self.header_name,
        }
    }

    /// Overrides the request header carrying the payload.
    pub fn with_header_name(mut self, header_name: HeaderName) -> Self {
        self.header_name = header_name;
        self
    }

    pub fn header_name(&self) -> &HeaderName {
        &self.header_name
    }

    pub fn registry(&self) -> &MechanismRegistry {
        &self.registry
    }

    /// Offered requirements this client can pay, in server order, after policies.
    pub async fn candidates<'a>(&self, payment_required: &'a PaymentRequired) -> Vec<PaymentCandidate<'a>> {
        let mut candidates: Vec<PaymentCandidate<'a>> = payment_required
            .accepts
            .iter()
            .enumerate()
            .filter_map(|(index, requirements)| {
                self.registry
                    .resolve(requirements)
                    .map(|mechanism| PaymentCandidate {
                        index,
                        requirements,
                        mechanism: mechanism.clone(),
                    })
            })
            .collect();
        for policy in &self.policies {
            if candidates.is_empty() {
                break;
            }
            candidates = policy.apply(candidates).await;
        }
        candidates
    }
}

impl<TSelector> X402Client<TSelector>
where
    TSelector: PaymentSelector,
{
    /// Chooses the requirement to pay.
    ///
    /// Fails with [`X402Error::NoAcceptableRequirement`] when nothing is payable
    /// and with [`X402Error::SelectionDeclined`] when the selector returns nothing.
    #[cfg_attr(feature = "telemetry", instrument(name = "x402.client.select", skip_all, err))]
    pub async fn select<'a>(
        &self,
        payment_required: &'a PaymentRequired,
    ) -> Result<PaymentCandidate<'a>, X402Error> {
        let candidates = self.candidates(payment_required).await;
        if candidates.is_empty() {
            return Err(X402Error::NoAcceptableRequirement {
                offered: payment_required.offered_networks(),
            });
        }
        let selected = self
            .selector
            .select(&candidates)
            .await
            .ok_or(X402Error::SelectionDeclined)?;

        #[cfg(feature = "telemetry")]
        debug!(
            index = selected.index,
            scheme = %selected.requirements.scheme,
            network = %selected.requirements.network,
            "Selected payment requirement"
        );

        Ok(selected.clone())
    }

    /// Selects a requirement and signs a payload for it.
    pub async fn create_payment(
        &self,
        payment_required: &PaymentRequired,
    ) -> Result<PaymentPayload, X402Error> {
        let selected = self.select(payment_required).await?;
        selected
            .mechanism
            .build(selected.requirements, payment_required.resource.as_ref())
            .await
    }

    /// Headers to attach to the paid retry.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "x402.client.make_payment_headers", skip_all, err)
    )]
    pub async fn make_payment_headers(
        &self,
        payment_required: &PaymentRequired,
    ) -> Result<HeaderMap, X402Error> {
        let payload = self.create_payment(payment_required).await?;
        payment_headers(&self.header_name, &payload)
    }
}

/// Encodes `payload` into a single-entry header map under `header_name`.
pub fn payment_headers(
    header_name: &HeaderName,
    payload: &PaymentPayload,
) -> Result<HeaderMap, X402Error> {
    let encoded = codec::encode(payload)?;
    let value = HeaderValue::from_str(&encoded)
        .map_err(|e| X402Error::MalformedPayload(format!("{PAYMENT_SIGNATURE_HEADER} value: {e}")))?;
    let mut headers = HeaderMap::new();
    headers.insert(header_name.clone(), value);
    Ok(headers)
}

#[async_trait::async_trait]
impl<TSelector> rqm::Middleware for X402Client<TSelector>
where
    TSelector: PaymentSelector + Send + Sync + 'static,
{
    /// Pays for 402 responses and retries once.
    ///
    /// A second 402 is returned as is; this middleware never pays twice for
    /// the same request.
    #[cfg_attr(feature = "telemetry", instrument(name = "x402.client.handle", skip_all, err))]
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: rqm::Next<'_>,
    ) -> rqm::Result<Response> {
        let retry_req = req.try_clone();
        let res = next.clone().run(req, extensions).await?;

        if res.status() != StatusCode::PAYMENT_REQUIRED {
            #[cfg(feature = "telemetry")]
            trace!(status = ?res.status(), "No payment required, returning response");
            return Ok(res);
        }

        #[cfg(feature = "telemetry")]
        info!(url = %res.url(), "Received 402 Payment Required, processing payment");

        let mut retry = retry_req.ok_or(rqm::Error::Middleware(FetchError::RequestNotCloneable.into()))?;
        let payment_required = payment_required_from_response(res)
            .await
            .map_err(|e| rqm::Error::Middleware(e.into()))?;
        let headers = self
            .make_payment_headers(&payment_required)
            .await
            .map_err(|e| rqm::Error::Middleware(e.into()))?;
        retry.headers_mut().extend(headers);

        #[cfg(feature = "telemetry")]
        trace!(url = %retry.url(), "Retrying request with payment header");

        next.run(retry, extensions).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PreferToken;
    use crate::test_support::{MockMechanism, requirement};
    use async_trait::async_trait;
    use x402_tron_types::proto::{PaymentRequirements, X402Version2};

    fn challenge(accepts: Vec<PaymentRequirements>) -> PaymentRequired {
        PaymentRequired {
            x402_version: X402Version2,
            error: Some("Payment required".into()),
            resource: None,
            accepts,
        }
    }

    struct Decline;

    #[async_trait]
    impl PaymentSelector for Decline {
        async fn select<'a, 'b>(
            &self,
            _candidates: &'a [PaymentCandidate<'b>],
        ) -> Option<&'a PaymentCandidate<'b>> {
            None
        }
    }

    struct Last;

    #[async_trait]
    impl PaymentSelector for Last {
        async fn select<'a, 'b>(
            &self,
            candidates: &'a [PaymentCandidate<'b>],
        ) -> Option<&'a PaymentCandidate<'b>> {
            candidates.last()
        }
    }

    #[tokio::test]
    async fn test_selects_first_matching_in_server_order() {
        let client = X402Client::new()
            .register(MockMechanism::new("tron", "exact_permit"))
            .register(MockMechanism::new("eip155", "exact"));
        let pr = challenge(vec![
            requirement("eip155:56", "exact_gasfree"),
            requirement("tron:nile", "exact_permit"),
            requirement("eip155:56", "exact"),
        ]);
        let selected = client.select(&pr).await.unwrap();
        assert_eq!(selected.index, 1);
        assert_eq!(selected.requirements.network.to_string(), "tron:nile");
    }

    #[tokio::test]
    async fn test_skips_unregistered_networks() {
        let client = X402Client::new().register(MockMechanism::new("eip155", "exact"));
        let pr = challenge(vec![requirement("tron:nile", "exact_permit"), requirement("eip155:56", "exact")]);
        let selected = client.select(&pr).await.unwrap();
        assert_eq!(selected.index, 1);
    }

    #[tokio::test]
    async fn test_no_acceptable_requirement_lists_offers() {
        let client = X402Client::new().register(MockMechanism::new("eip155", "exact"));
        let pr = challenge(vec![
            requirement("tron:nile", "exact_permit"),
            requirement("tron:nile", "exact_gasfree"),
        ]);
        match client.select(&pr).await {
            Err(X402Error::NoAcceptableRequirement { offered }) => {
                assert_eq!(offered, vec!["tron:nile".parse().unwrap()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_policies_narrow_candidates() {
        let client = X402Client::new()
            .register(MockMechanism::new("tron", "exact_permit"))
            .register(MockMechanism::new("eip155", "exact"))
            .with_policy(PreferToken::scheme("exact"));
        let pr = challenge(vec![requirement("tron:nile", "exact_permit"), requirement("eip155:56", "exact")]);
        assert_eq!(client.select(&pr).await.unwrap().index, 1);
    }

    #[tokio::test]
    async fn test_custom_selectors() {
        let pr = challenge(vec![requirement("tron:nile", "exact_permit"), requirement("tron:shasta", "exact_permit")]);
        let declining = X402Client::new()
            .register(MockMechanism::new("tron", "exact_permit"))
            .with_selector(Decline);
        assert!(matches!(declining.select(&pr).await, Err(X402Error::SelectionDeclined)));
        let last = X402Client::new()
            .register(MockMechanism::new("tron", "exact_permit"))
            .with_selector(Last);
        assert_eq!(last.select(&pr).await.unwrap().index, 1);
    }

    #[tokio::test]
    async fn test_payment_headers_round_trip() {
        let client = X402Client::new().register(MockMechanism::new("tron", "exact_permit"));
        let pr = challenge(vec![requirement("tron:nile", "exact_permit")]);
        let headers = client.make_payment_headers(&pr).await.unwrap();
        let value = headers.get(PAYMENT_SIGNATURE_HEADER).unwrap();
        let payload: PaymentPayload = codec::decode(value.as_bytes()).unwrap();
        assert_eq!(payload.accepted, pr.accepts[0]);
        assert_eq!(payload.payload.payer, "tron-payer");
    }

    #[tokio::test]
    async fn test_build_failure_propagates() {
        let client = X402Client::new().register(MockMechanism::new("tron", "exact_permit").failing());
        let pr = challenge(vec![requirement("tron:nile", "exact_permit")]);
        assert!(matches!(
            client.create_payment(&pr).await,
            Err(X402Error::SigningFailed(_))
        ));
    }
}
