//! EVM chain primitives shared by the `exact` and `exact_permit` mechanisms.

pub mod signer;
pub mod types;

pub use signer::*;
pub use types::*;

#[cfg(feature = "provider")]
mod erc20;
#[cfg(feature = "provider")]
pub use erc20::*;
