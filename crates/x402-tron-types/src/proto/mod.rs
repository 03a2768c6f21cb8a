//! Protocol types for x402 payment messages.
//!
//! A paying client meets three messages:
//!
//! - [`PaymentRequired`] - the body (or `Payment-Required` header) of a `402` response
//! - [`PaymentPayload`] - the signed answer, sent in the [`PAYMENT_SIGNATURE_HEADER`]
//! - [`SettleResponse`] - the facilitator's verdict, returned in the [`PAYMENT_RESPONSE_HEADER`]
//!
//! # Wire Format
//!
//! All types serialize to JSON using camelCase field names. Headers carry that
//! JSON as standard base64, see [`crate::codec`].

mod v2;

pub use v2::*;

/// Request header carrying the encoded [`PaymentPayload`] on the paid retry.
pub const PAYMENT_SIGNATURE_HEADER: &str = "PAYMENT-SIGNATURE";

/// Response header carrying the encoded [`SettleResponse`].
pub const PAYMENT_RESPONSE_HEADER: &str = "PAYMENT-RESPONSE";

/// Optional response header carrying an encoded [`PaymentRequired`] challenge.
pub const PAYMENT_REQUIRED_HEADER: &str = "PAYMENT-REQUIRED";
