//! Header codec for x402 messages.
//!
//! Payment payloads, settlement responses and header-borne challenges all use
//! the same convention: canonical JSON, then standard padded base64. [`decode`]
//! is the exact left inverse of [`encode`].
//!
//! ```
//! use x402_tron_types::codec;
//! use x402_tron_types::proto::SettleResponse;
//!
//! let header = "eyJzdWNjZXNzIjp0cnVlLCJ0cmFuc2FjdGlvbiI6ImFiYzEyMyIsIm5ldHdvcmsiOiJ0cm9uOm5pbGUifQ==";
//! let settle: SettleResponse = codec::decode(header).unwrap();
//! assert_eq!(settle.transaction(), Some("abc123"));
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::util::Base64Bytes;

/// Ways a header value can fail to decode.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Not valid standard base64, or truncated.
    #[error("Header value is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// Valid base64, but the JSON does not match the expected message.
    #[error("Header value does not match the expected schema: {0}")]
    Schema(#[source] serde_json::Error),
    /// The value could not be serialized.
    #[error("Failed to serialize message: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Encodes a message as base64 of its JSON serialization.
pub fn encode<T: Serialize>(value: &T) -> Result<String, CodecError> {
    let json = serde_json::to_vec(value).map_err(CodecError::Serialize)?;
    Ok(Base64Bytes::encode(json).to_string())
}

/// Decodes a header value produced by [`encode`].
///
/// Surrounding whitespace is ignored.
pub fn decode<T: DeserializeOwned>(value: impl AsRef<[u8]>) -> Result<T, CodecError> {
    let bytes = Base64Bytes::from(value.as_ref()).decode()?;
    serde_json::from_slice(&bytes).map_err(|e| {
        #[cfg(feature = "telemetry")]
        tracing::debug!(
            message_type = std::any::type_name::<T>(),
            json = %String::from_utf8_lossy(&bytes),
            error = %e,
            "header JSON does not match schema"
        );
        CodecError::Schema(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainId;
    use crate::proto::{
        PaymentPayload, PaymentRequirements, ResourceInfo, SettleResponse, SignedPayload,
        X402Version2,
    };
    use crate::timestamp::UnixTimestamp;
    use serde_json::json;

    fn payload() -> PaymentPayload {
        PaymentPayload {
            x402_version: X402Version2,
            resource: Some(ResourceInfo {
                url: "http://localhost:8000/protected-nile".into(),
                description: Some("Protected image".into()),
                mime_type: Some("image/png".into()),
            }),
            accepted: PaymentRequirements {
                scheme: "exact_permit".into(),
                network: ChainId::new("tron", "nile"),
                amount: 1_000_000u64.into(),
                asset: "TXYZopYRdj2D9XRtbG411XZZ3kM5VkAeBf".into(),
                pay_to: "TD5gsCwxykWsLN9aPrq2TAfNjByuZKYp4E".into(),
                max_timeout_seconds: 1200,
                extra: Some(json!({ "name": "PaymentPermit", "version": "1" })),
            },
            payload: SignedPayload {
                signature: format!("0x{}", "ab".repeat(65)),
                payer: "TNPeeaaFB7K9cmo4uQpcU32zGK8G1NYqeL".into(),
                nonce: Some("42".into()),
                deadline: Some(UnixTimestamp::from_secs(1_700_001_200)),
                authorization: Some(json!({ "amount": "1000000" })),
            },
        }
    }

    #[test]
    fn test_payload_roundtrip() {
        let original = payload();
        let encoded = encode(&original).unwrap();
        let decoded: PaymentPayload = decode(&encoded).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_payload_roundtrip_without_optional_fields() {
        let mut original = payload();
        original.resource = None;
        original.accepted.extra = None;
        original.payload.nonce = None;
        original.payload.deadline = None;
        original.payload.authorization = None;
        let decoded: PaymentPayload = decode(encode(&original).unwrap()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_explicit_null_survives_roundtrip() {
        let mut original = payload();
        original.accepted.extra = Some(serde_json::Value::Null);
        original.payload.authorization = Some(serde_json::Value::Null);
        let decoded: PaymentPayload = decode(encode(&original).unwrap()).unwrap();
        assert_eq!(decoded, original);
        assert!(decoded.accepted.extra_fields().is_ok());
    }

    #[test]
    fn test_decode_ignores_surrounding_whitespace() {
        let encoded = format!("  {}\n", encode(&payload()).unwrap());
        let decoded: PaymentPayload = decode(&encoded).unwrap();
        assert_eq!(decoded, payload());
    }

    #[test]
    fn test_decode_rejects_non_base64() {
        let result = decode::<PaymentPayload>("%%% not base64 %%%");
        assert!(matches!(result, Err(CodecError::Base64(_))));
    }

    #[test]
    fn test_decode_rejects_truncated() {
        let encoded = encode(&payload()).unwrap();
        let truncated = &encoded[..encoded.len() / 2];
        assert!(decode::<PaymentPayload>(truncated).is_err());
    }

    #[test]
    fn test_decode_rejects_schema_mismatch() {
        let settle = SettleResponse::Success {
            payer: None,
            transaction: "abc123".into(),
            network: ChainId::new("tron", "nile"),
        };
        let encoded = encode(&settle).unwrap();
        let result = decode::<PaymentPayload>(&encoded);
        assert!(matches!(result, Err(CodecError::Schema(_))));
    }
}
