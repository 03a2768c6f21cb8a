//! Helper types used across the crate.
//!
//! - [`b64`] - Base64 bytes as carried in HTTP headers
//! - [`money_amount`] - Human-readable prices such as `"0.0001"`
//! - [`token_amount`] - Integer token amounts in the smallest unit

pub mod b64;
pub mod money_amount;
pub mod token_amount;

pub use b64::*;
pub use token_amount::*;
