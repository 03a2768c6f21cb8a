//! The request, challenge, pay, retry flow as an explicit state machine.

use bytes::Bytes;
use http::{HeaderMap, StatusCode, header::CONTENT_TYPE};
use reqwest::{IntoUrl, Request, Response};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use x402_tron_types::proto::{PaymentRequired, PaymentRequirements, SettleResponse};
use x402_tron_types::scheme::X402Error;

use crate::client::{X402Client, payment_headers};
use crate::error::FetchError;
use crate::http_transport::{ResponseBody, payment_required_from_response, settlement_from_headers};
use crate::selector::{FirstMatch, PaymentSelector};

#[cfg(feature = "telemetry")]
use tracing::{debug, info, instrument, warn};

/// Where a paid fetch currently stands.
///
/// A flow always starts in [`Requesting`](FlowState::Requesting) and ends in
/// exactly one of [`Settled`](FlowState::Settled), [`Rejected`](FlowState::Rejected)
/// or [`Failed`](FlowState::Failed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowState {
    Requesting,
    ChallengeReceived,
    PayloadPrepared,
    Retrying,
    Settled,
    Rejected,
    Failed,
}

impl FlowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::Settled | FlowState::Rejected | FlowState::Failed)
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlowState::Requesting => "requesting",
            FlowState::ChallengeReceived => "challenge_received",
            FlowState::PayloadPrepared => "payload_prepared",
            FlowState::Retrying => "retrying",
            FlowState::Settled => "settled",
            FlowState::Rejected => "rejected",
            FlowState::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Timeout applied to each HTTP request, not to the whole flow.
    pub timeout: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
        }
    }
}

/// Final response of a flow that ended in [`FlowState::Settled`].
#[derive(Debug, Clone)]
pub struct PaidResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Decoded `PAYMENT-RESPONSE` header. Servers settling asynchronously omit it.
    pub settlement: Option<SettleResponse>,
    /// The requirement that was paid, or `None` if the resource was free.
    pub accepted: Option<PaymentRequirements>,
    pub body: ResponseBody,
}

impl PaidResponse {
    pub fn paid(&self) -> bool {
        self.accepted.is_some()
    }
}

type TransitionListener = Arc<dyn Fn(FlowState) + Send + Sync>;

/// Fetches x402-protected resources, paying at most once per call.
///
/// Unlike the middleware integration, every step is visible: transitions are
/// logged and reported to an optional listener, and each terminal outcome maps
/// to a distinct [`FetchError`] variant.
pub struct X402HttpClient<TSelector = FirstMatch> {
    http: reqwest::Client,
    x402: Arc<X402Client<TSelector>>,
    on_transition: Option<TransitionListener>,
}

impl<TSelector> Clone for X402HttpClient<TSelector> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            x402: self.x402.clone(),
            on_transition: self.on_transition.clone(),
        }
    }
}

impl<TSelector> X402HttpClient<TSelector>
where
    TSelector: PaymentSelector,
{
    pub fn new(http: reqwest::Client, x402: X402Client<TSelector>) -> Self {
        Self {
            http,
            x402: Arc::new(x402),
            on_transition: None,
        }
    }

    pub fn from_config(config: &FetcherConfig, x402: X402Client<TSelector>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self::new(http, x402))
    }

    /// Calls `listener` on every state transition, in order.
    pub fn on_transition<F>(mut self, listener: F) -> Self
    where
        F: Fn(FlowState) + Send + Sync + 'static,
    {
        self.on_transition = Some(Arc::new(listener));
        self
    }

    pub fn x402(&self) -> &X402Client<TSelector> {
        &self.x402
    }

    pub async fn get<U: IntoUrl>(&self, url: U) -> Result<PaidResponse, FetchError> {
        let request = self.http.get(url).build().map_err(unsent)?;
        self.execute(request).await
    }

    pub async fn post_json<U: IntoUrl, T: Serialize + ?Sized>(
        &self,
        url: U,
        body: &T,
    ) -> Result<PaidResponse, FetchError> {
        let request = self.http.post(url).json(body).build().map_err(unsent)?;
        self.execute(request).await
    }

    pub async fn execute(&self, request: Request) -> Result<PaidResponse, FetchError> {
        self.execute_with_cancel(request, &CancellationToken::new()).await
    }

    /// Runs the flow until a terminal state or until `cancel` fires.
    ///
    /// Cancellation before the paid retry is sent yields [`FetchError::Cancelled`].
    /// Cancellation while the retry is in flight yields [`FetchError::Interrupted`]:
    /// the server may already have settled the payment.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "x402.fetch", skip_all, fields(method = %request.method(), url = %request.url()))
    )]
    pub async fn execute_with_cancel(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<PaidResponse, FetchError> {
        let result = self.run(request, cancel).await;
        match &result {
            Ok(_) => self.transition(FlowState::Settled),
            Err(FetchError::Rejected { .. }) => self.transition(FlowState::Rejected),
            Err(_error) => {
                #[cfg(feature = "telemetry")]
                warn!(error = %_error, "x402 flow failed");
                self.transition(FlowState::Failed)
            }
        }
        result
    }

    async fn run(&self, request: Request, cancel: &CancellationToken) -> Result<PaidResponse, FetchError> {
        let mut retry = request.try_clone().ok_or(FetchError::RequestNotCloneable)?;

        self.transition(FlowState::Requesting);
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            response = self.http.execute(request) => response.map_err(unsent)?,
        };
        let status = response.status();
        if status.is_success() {
            #[cfg(feature = "telemetry")]
            debug!(%status, "No payment required");
            return into_paid_response(response, None).await;
        }
        if status != StatusCode::PAYMENT_REQUIRED {
            return Err(failed(response).await);
        }

        let payment_required = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            parsed = payment_required_from_response(response) => parsed?,
        };
        self.transition(FlowState::ChallengeReceived);

        let (accepted, headers) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            prepared = self.prepare(&payment_required) => prepared?,
        };
        self.transition(FlowState::PayloadPrepared);
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        retry.headers_mut().extend(headers);
        self.transition(FlowState::Retrying);
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Interrupted),
            response = self.http.execute(retry) => response.map_err(|source| FetchError::Network {
                payment_attached: true,
                source,
            })?,
        };
        let status = response.status();
        if status == StatusCode::PAYMENT_REQUIRED {
            let reason = match response.bytes().await {
                Ok(body) => rejection_reason(&body),
                Err(error) => Some(unreadable_body(&error)),
            };
            return Err(FetchError::Rejected { reason });
        }
        if !status.is_success() {
            return Err(failed(response).await);
        }
        into_paid_response(response, Some(accepted)).await
    }

    /// Select, build and encode. Returns the paid requirement as copied into the payload.
    async fn prepare(
        &self,
        payment_required: &PaymentRequired,
    ) -> Result<(PaymentRequirements, HeaderMap), X402Error> {
        let selected = self.x402.select(payment_required).await?;
        let payload = selected
            .mechanism
            .build(selected.requirements, payment_required.resource.as_ref())
            .await?;
        let headers = payment_headers(self.x402.header_name(), &payload)?;

        #[cfg(feature = "telemetry")]
        info!(
            scheme = %payload.accepted.scheme,
            network = %payload.accepted.network,
            amount = %payload.accepted.amount,
            payer = %payload.payload.payer,
            "Prepared payment"
        );

        Ok((payload.accepted, headers))
    }

    fn transition(&self, state: FlowState) {
        #[cfg(feature = "telemetry")]
        debug!(%state, "x402 flow transition");
        if let Some(listener) = &self.on_transition {
            listener(state);
        }
    }
}

fn unsent(source: reqwest::Error) -> FetchError {
    FetchError::Network {
        payment_attached: false,
        source,
    }
}

async fn failed(response: Response) -> FetchError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|error| unreadable_body(&error));
    FetchError::Failed { status, body }
}

/// Stands in for a body that could not be read, so it is not mistaken for an empty one.
fn unreadable_body(error: &reqwest::Error) -> String {
    format!("<response body unreadable: {error}>")
}

async fn into_paid_response(
    response: Response,
    accepted: Option<PaymentRequirements>,
) -> Result<PaidResponse, FetchError> {
    let status = response.status();
    let headers = response.headers().clone();
    let settlement = settlement_from_headers(&headers)?;
    let payment_attached = accepted.is_some();
    let bytes: Bytes = response.bytes().await.map_err(|source| FetchError::Network {
        payment_attached,
        source,
    })?;
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    let body = ResponseBody::from_parts(content_type, bytes);

    #[cfg(feature = "telemetry")]
    if let Some(settlement) = &settlement {
        info!(
            success = settlement.is_success(),
            network = %settlement.network(),
            transaction = settlement.transaction().unwrap_or_default(),
            "Settlement received"
        );
    }

    Ok(PaidResponse {
        status,
        headers,
        settlement,
        accepted,
        body,
    })
}

fn rejection_reason(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value.get("error")?.as_str().map(str::to_owned)
}
