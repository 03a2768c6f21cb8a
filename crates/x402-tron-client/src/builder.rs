//! Wiring [`X402Client`] into `reqwest-middleware`.

use reqwest::{Client, ClientBuilder};
use reqwest_middleware as rqm;

use crate::client::X402Client;
use crate::selector::PaymentSelector;

/// Adds transparent x402 payments to a `reqwest` client.
///
/// ```rust,ignore
/// use x402_tron_client::{ReqwestWithPayments, X402Client};
///
/// let http = reqwest::Client::new().with_payments(X402Client::new().register(mechanism)).build();
/// let res = http.get("http://localhost:8000/protected-nile").send().await?;
/// ```
pub trait ReqwestWithPayments: Sized {
    type Output;

    fn with_payments<S>(self, x402_client: X402Client<S>) -> Self::Output
    where
        S: PaymentSelector + Send + Sync + 'static;
}

impl ReqwestWithPayments for Client {
    type Output = rqm::ClientBuilder;

    fn with_payments<S>(self, x402_client: X402Client<S>) -> rqm::ClientBuilder
    where
        S: PaymentSelector + Send + Sync + 'static,
    {
        rqm::ClientBuilder::new(self).with(x402_client)
    }
}

impl ReqwestWithPayments for ClientBuilder {
    type Output = Result<rqm::ClientBuilder, reqwest::Error>;

    fn with_payments<S>(self, x402_client: X402Client<S>) -> Self::Output
    where
        S: PaymentSelector + Send + Sync + 'static,
    {
        Ok(self.build()?.with_payments(x402_client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockMechanism, requirement};
    use serde_json::json;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use x402_tron_types::proto::PAYMENT_SIGNATURE_HEADER;

    #[tokio::test]
    async fn test_middleware_pays_and_retries_once() {
        let server = MockServer::start().await;
        let challenge = json!({
            "x402Version": 2,
            "accepts": [requirement("tron:nile", "exact_permit")],
        });
        Mock::given(method("GET"))
            .and(path("/protected-nile"))
            .and(header_exists(PAYMENT_SIGNATURE_HEADER))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/protected-nile"))
            .respond_with(ResponseTemplate::new(402).set_body_json(challenge))
            .with_priority(2)
            .expect(1)
            .mount(&server)
            .await;

        let x402 = X402Client::new().register(MockMechanism::new("tron", "exact_permit"));
        let http = Client::new().with_payments(x402).build();
        let res = http
            .get(format!("{}/protected-nile", server.uri()))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
    }

    #[tokio::test]
    async fn test_middleware_passes_through_second_402() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({
                "x402Version": 2,
                "error": "Payment verification failed",
                "accepts": [requirement("tron:nile", "exact_permit")],
            })))
            .expect(2)
            .mount(&server)
            .await;

        let x402 = X402Client::new().register(MockMechanism::new("tron", "exact_permit"));
        let http = ClientBuilder::new().with_payments(x402).unwrap().build();
        let res = http.get(server.uri()).send().await.unwrap();
        assert_eq!(res.status(), 402);
    }
}
