#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! EIP-155 (EVM) payment mechanisms for the x402 client.
//!
//! Two schemes are supported on any EVM chain, with BNB Smart Chain as the
//! known network:
//!
//! - [`exact`] - ERC-3009 `transferWithAuthorization` signed under the token's EIP-712 domain
//! - [`exact_permit`] - A `PaymentPermit` typed message carrying an optional facilitator fee
//!
//! The permit message itself lives in [`permit`] and is reused by the TRON
//! mechanism, which signs the same struct with TRON addresses.
//!
//! All signing goes through [`chain::SerialSigner`], which serializes access to
//! one key and bounds each signature with a timeout.
//!
//! # Feature Flags
//!
//! - `provider` - [`chain::Erc20BalanceOracle`], reading ERC-20 balances over JSON-RPC
//! - `telemetry` - Tracing instrumentation
//!
//! # Example
//!
//! ```ignore
//! use alloy_signer_local::PrivateKeySigner;
//! use x402_chain_eip155::{Eip155ExactPermitClient, chain::SerialSigner};
//!
//! let signer = SerialSigner::new("0x...".parse::<PrivateKeySigner>()?);
//! let mechanism = Eip155ExactPermitClient::new(signer);
//! ```

pub mod chain;
pub mod exact;
pub mod exact_permit;
pub mod permit;

mod networks;
pub use networks::*;

pub use exact::Eip155ExactClient;
pub use exact_permit::Eip155ExactPermitClient;
