#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! TRON payment mechanisms for the x402 client.
//!
//! - [`chain`] - Base58check [`TronAddress`](chain::TronAddress) and the
//!   [`TronChainReference`](chain::TronChainReference) of mainnet, Nile and Shasta
//! - [`exact_permit`] - The `exact_permit` scheme, signing the shared
//!   `PaymentPermit` message with TRON addresses and chain ids
//! - [`balance`] - TRC-20 balances read through TronGrid
//!
//! TRON accounts use secp256k1 keys, so the signer type and its serialization
//! come from `x402-chain-eip155`.
//!
//! # Feature Flags
//!
//! - `telemetry` - Tracing instrumentation

pub mod balance;
pub mod chain;
pub mod exact_permit;

mod networks;
pub use networks::*;

pub use balance::TronGridBalanceOracle;
pub use exact_permit::TronExactPermitClient;
