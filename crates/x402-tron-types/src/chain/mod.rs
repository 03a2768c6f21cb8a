//! Chain identifiers for x402 payments.
//!
//! Requirements name their network with a CAIP-2 [`ChainId`] (`tron:nile`,
//! `eip155:56`). Mechanisms register under a [`ChainIdPattern`], which may
//! cover one chain, a set of chains, or a whole chain family.

mod chain_id;

pub use chain_id::*;
