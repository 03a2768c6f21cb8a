#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Paying for [x402](https://www.x402.org) resources over `reqwest`.
//!
//! The flow is always the same: request the resource, receive a
//! `402 Payment Required` challenge, pick one of the offered requirements,
//! sign a payload for it, and repeat the request once with the payload in the
//! `PAYMENT-SIGNATURE` header.
//!
//! ## Quickstart
//!
//! ```rust,ignore
//! use x402_tron_client::{X402Client, X402HttpClient};
//! use x402_chain_eip155::chain::SerialSigner;
//! use x402_chain_tron::TronExactPermitClient;
//!
//! let x402 = X402Client::new().register(TronExactPermitClient::new(SerialSigner::new(signer)));
//! let client = X402HttpClient::new(reqwest::Client::new(), x402);
//! let response = client.get("http://localhost:8000/protected-nile").await?;
//! if let Some(settlement) = &response.settlement {
//!     println!("settled in {:?}", settlement.transaction());
//! }
//! ```
//!
//! ## Pieces
//!
//! - [`MechanismRegistry`] - mechanisms keyed by chain pattern, resolved exact, then set, then wildcard
//! - [`PaymentPolicy`] - filters applied to matching requirements, such as [`SufficientBalancePolicy`]
//! - [`PaymentSelector`] - picks one candidate; [`FirstMatch`] by default, interactive selectors plug in here
//! - [`X402HttpClient`] - the observable request/challenge/retry state machine
//! - [`ReqwestWithPayments`] - transparent `reqwest-middleware` integration for callers that do not
//!   need the explicit state machine

mod builder;
mod client;
mod error;
mod fetcher;
mod http_transport;
mod policy;
mod registry;
mod selector;

#[cfg(test)]
mod test_support;

pub use builder::*;
pub use client::*;
pub use error::*;
pub use fetcher::*;
pub use http_transport::*;
pub use policy::*;
pub use registry::*;
pub use selector::*;
