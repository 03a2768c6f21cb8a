#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for x402 payments on TRON and EVM networks.
//!
//! This crate holds everything a paying client needs to understand a
//! `402 Payment Required` challenge and answer it, independent of any
//! particular chain:
//!
//! - [`chain`] - CAIP-2 chain identifiers and the patterns mechanisms register under
//! - [`proto`] - Wire format of challenges, payment payloads and settlement responses
//! - [`codec`] - Base64-of-JSON header encoding used for payloads and settlements
//! - [`scheme`] - Traits implemented by chain mechanisms and the error taxonomy of a payment attempt
//! - [`balance`] - Balance lookups used to filter out unaffordable requirements
//! - [`networks`] - Well-known TRON and BSC networks and their stablecoin deployments
//! - [`timestamp`] - Unix timestamps for permit deadlines and authorization windows
//! - [`util`] - Base64 bytes, human-readable money amounts, token amounts
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation

pub mod balance;
pub mod chain;
pub mod codec;
pub mod networks;
pub mod proto;
pub mod scheme;
pub mod timestamp;
pub mod util;
