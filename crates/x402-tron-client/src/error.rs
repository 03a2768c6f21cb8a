use http::StatusCode;
use x402_tron_types::scheme::X402Error;

/// Terminal failure of a paid fetch.
///
/// `Rejected` and `Failed` mean the server answered; everything else means the
/// flow stopped on this side of the wire.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Selecting, signing or encoding the payment failed.
    #[error(transparent)]
    Payment(#[from] X402Error),
    /// The request never produced a response.
    #[error("HTTP request failed: {source}")]
    Network {
        /// Whether the failed request carried a payment header.
        payment_attached: bool,
        #[source]
        source: reqwest::Error,
    },
    /// The server answered the paid retry with another 402.
    #[error("Payment rejected by server{}", .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    Rejected { reason: Option<String> },
    /// The server answered with a status that is neither success nor 402.
    #[error("Request failed with status {status}: {body}")]
    Failed { status: StatusCode, body: String },
    /// Cancelled before any payment left this process.
    #[error("Cancelled before payment was sent")]
    Cancelled,
    /// Cancelled after the paid retry was sent; the payment may have settled.
    #[error("Interrupted after payment was sent; settlement state unknown")]
    Interrupted,
    /// The request body is a stream and cannot be replayed with a payment.
    #[error("Request object is not cloneable. Are you passing a streaming body?")]
    RequestNotCloneable,
}

impl FetchError {
    /// Whether a caller can start the whole flow again without risking a double payment.
    pub fn is_safe_to_retry(&self) -> bool {
        match self {
            FetchError::Network {
                payment_attached, ..
            } => !payment_attached,
            FetchError::Cancelled => true,
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Network { source, .. } if source.is_timeout())
    }
}
