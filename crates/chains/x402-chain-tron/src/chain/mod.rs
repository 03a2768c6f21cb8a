//! TRON addresses and network references.

mod address;
mod types;

pub use address::*;
pub use types::*;
