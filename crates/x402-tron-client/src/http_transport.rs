//! Reading x402 data out of HTTP responses.

use bytes::Bytes;
use http::HeaderMap;
use mime::Mime;
use serde_json::Value;
use x402_tron_types::codec;
use x402_tron_types::proto::{
    PAYMENT_REQUIRED_HEADER, PAYMENT_RESPONSE_HEADER, PaymentRequired, SettleResponse,
};
use x402_tron_types::scheme::X402Error;

#[cfg(feature = "telemetry")]
use tracing::{debug, instrument};

/// Extracts the challenge from a `402 Payment Required` response.
///
/// The JSON body is authoritative. The base64 `PAYMENT-REQUIRED` header is
/// used only when the body does not parse.
#[cfg_attr(
    feature = "telemetry",
    instrument(name = "x402.client.parse_payment_required", skip_all, err)
)]
pub async fn payment_required_from_response(
    response: reqwest::Response,
) -> Result<PaymentRequired, X402Error> {
    let header = response.headers().get(PAYMENT_REQUIRED_HEADER).cloned();
    let body = response
        .bytes()
        .await
        .map_err(|e| X402Error::ChallengeParse(format!("Unreadable 402 body: {e}")))?;
    payment_required_from_parts(header.as_ref().map(|h| h.as_bytes()), &body)
}

/// Same as [`payment_required_from_response`] for an already buffered response.
pub fn payment_required_from_parts(
    header: Option<&[u8]>,
    body: &[u8],
) -> Result<PaymentRequired, X402Error> {
    let body_error = match serde_json::from_slice::<PaymentRequired>(body) {
        Ok(payment_required) => {
            #[cfg(feature = "telemetry")]
            debug!("Parsed payment challenge from body");
            return Ok(payment_required);
        }
        Err(e) => e,
    };
    match header {
        Some(header) => codec::decode::<PaymentRequired>(header).map_err(|e| {
            X402Error::ChallengeParse(format!("body: {body_error}; {PAYMENT_REQUIRED_HEADER} header: {e}"))
        }),
        None => Err(X402Error::ChallengeParse(body_error.to_string())),
    }
}

/// Decodes the `PAYMENT-RESPONSE` header, if the server sent one.
pub fn settlement_from_headers(headers: &HeaderMap) -> Result<Option<SettleResponse>, X402Error> {
    let Some(header) = headers.get(PAYMENT_RESPONSE_HEADER) else {
        return Ok(None);
    };
    let settlement = codec::decode::<SettleResponse>(header.as_bytes())?;
    Ok(Some(settlement))
}

/// A response body, classified by content type.
#[derive(Debug, Clone)]
pub enum ResponseBody {
    Json(Value),
    Image {
        bytes: Bytes,
        mime: Mime,
        /// File extension matching the image type, without a dot.
        extension: String,
    },
    Text(String),
}

impl ResponseBody {
    pub fn from_parts(content_type: Option<&str>, bytes: Bytes) -> Self {
        let mime = content_type.and_then(|ct| ct.parse::<Mime>().ok());
        let Some(mime) = mime else {
            return Self::text(&bytes);
        };
        let is_json = mime.subtype() == mime::JSON || mime.suffix() == Some(mime::JSON);
        if is_json {
            return match serde_json::from_slice(&bytes) {
                Ok(value) => ResponseBody::Json(value),
                Err(_) => Self::text(&bytes),
            };
        }
        if mime.type_() == mime::IMAGE {
            let extension = image_extension(&mime);
            return ResponseBody::Image {
                bytes,
                mime,
                extension,
            };
        }
        Self::text(&bytes)
    }

    fn text(bytes: &[u8]) -> Self {
        ResponseBody::Text(String::from_utf8_lossy(bytes).into_owned())
    }
}

fn image_extension(mime: &Mime) -> String {
    match mime.subtype().as_str() {
        "jpeg" => "jpg".to_string(),
        "svg" => "svg".to_string(),
        "*" | "" => "png".to_string(),
        other if other.chars().all(|c| c.is_ascii_alphanumeric()) => other.to_string(),
        _ => "png".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    const CHALLENGE: &str = r#"{
        "x402Version": 2,
        "error": "Payment required",
        "accepts": [{
            "scheme": "exact_permit",
            "network": "tron:nile",
            "amount": "100",
            "asset": "TXYZopYRdj2D9XRtbG411XZZ3kM5VkAeBf",
            "payTo": "TD5gsCwxykWsLN9aPrq2TAfNjByuZKYp4E"
        }]
    }"#;

    #[test]
    fn test_challenge_from_body() {
        let pr = payment_required_from_parts(None, CHALLENGE.as_bytes()).unwrap();
        assert_eq!(pr.accepts.len(), 1);
        assert_eq!(pr.accepts[0].network.to_string(), "tron:nile");
    }

    #[test]
    fn test_challenge_from_header_when_body_is_not_json() {
        let compact: Value = serde_json::from_str(CHALLENGE).unwrap();
        let header = codec::encode(&compact).unwrap();
        let pr = payment_required_from_parts(Some(header.as_bytes()), b"Payment Required").unwrap();
        assert_eq!(pr.accepts[0].scheme, "exact_permit");
    }

    #[test]
    fn test_challenge_missing_everywhere() {
        let err = payment_required_from_parts(None, b"<html>nope</html>").unwrap_err();
        assert!(matches!(err, X402Error::ChallengeParse(_)));
        let err = payment_required_from_parts(Some(&b"%%%"[..]), b"").unwrap_err();
        assert!(matches!(err, X402Error::ChallengeParse(_)));
    }

    #[test]
    fn test_settlement_header() {
        let mut headers = HeaderMap::new();
        assert!(settlement_from_headers(&headers).unwrap().is_none());
        headers.insert(
            PAYMENT_RESPONSE_HEADER,
            HeaderValue::from_static(
                "eyJzdWNjZXNzIjp0cnVlLCJ0cmFuc2FjdGlvbiI6ImFiYzEyMyIsIm5ldHdvcmsiOiJ0cm9uOm5pbGUifQ==",
            ),
        );
        let settlement = settlement_from_headers(&headers).unwrap().unwrap();
        assert_eq!(settlement.transaction(), Some("abc123"));
        headers.insert(PAYMENT_RESPONSE_HEADER, HeaderValue::from_static("not base64!"));
        assert!(matches!(
            settlement_from_headers(&headers),
            Err(X402Error::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_body_classification() {
        let json = ResponseBody::from_parts(
            Some("application/json; charset=utf-8"),
            Bytes::from_static(br#"{"ok":true}"#),
        );
        assert!(matches!(json, ResponseBody::Json(v) if v["ok"] == true));

        let problem = ResponseBody::from_parts(
            Some("application/problem+json"),
            Bytes::from_static(br#"{"title":"x"}"#),
        );
        assert!(matches!(problem, ResponseBody::Json(_)));

        let broken = ResponseBody::from_parts(Some("application/json"), Bytes::from_static(b"{"));
        assert!(matches!(broken, ResponseBody::Text(t) if t == "{"));

        let jpeg = ResponseBody::from_parts(Some("image/jpeg"), Bytes::from_static(b"\xff\xd8"));
        assert!(matches!(jpeg, ResponseBody::Image { extension, .. } if extension == "jpg"));

        let svg = ResponseBody::from_parts(Some("image/svg+xml"), Bytes::from_static(b"<svg/>"));
        assert!(matches!(svg, ResponseBody::Image { extension, .. } if extension == "svg"));

        let text = ResponseBody::from_parts(None, Bytes::from_static(b"hello"));
        assert!(matches!(text, ResponseBody::Text(t) if t == "hello"));
    }
}
