//! Command-line client for x402-protected resources on TRON and EVM networks.
//!
//! Requests a resource, and when the server answers `402 Payment Required`,
//! signs one of the offered requirements and repeats the request once with
//! the payment attached. Prints the resource and the settlement result.
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `TRON_PRIVATE_KEY`, `BSC_PRIVATE_KEY` select the paying wallets
//! - `SERVER_URL`, `ENDPOINT_PATH` select the resource
//! - `RUST_LOG` controls log verbosity, `OTEL_*` variables enable span export

mod config;
mod output;
mod prompt;
mod run;
mod sig_down;
mod telemetry;

use std::process;

use crate::run::run;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        process::exit(1)
    }
}
