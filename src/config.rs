//! Command-line and environment configuration.
//!
//! Every flag falls back to an environment variable, and `.env` is loaded
//! before parsing, so a checked-in `.env.example` is enough to get started.

use alloy_signer_local::PrivateKeySigner;
use clap::{Parser, ValueEnum};
use http::HeaderName;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "x402-tron-demo")]
#[command(about = "Fetch an x402-protected resource, paying on TRON or EVM networks")]
pub struct Config {
    /// Base URL of the protected server
    #[arg(long, env = "SERVER_URL", default_value = "http://localhost:8000")]
    pub server_url: Url,

    /// Path of the protected resource, joined to the server URL
    #[arg(long, env = "ENDPOINT_PATH", default_value = "/protected-nile")]
    pub endpoint: String,

    /// Hex private key paying on TRON networks
    #[arg(long, env = "TRON_PRIVATE_KEY", hide_env_values = true)]
    pub tron_private_key: Option<String>,

    /// Hex private key paying on EVM networks
    #[arg(long, env = "BSC_PRIVATE_KEY", hide_env_values = true)]
    pub evm_private_key: Option<String>,

    #[arg(long, env = "HTTP_TIMEOUT_SECONDS", default_value_t = 60)]
    pub http_timeout_seconds: u64,

    /// Upper bound on a single signature, including waiting for the key
    #[arg(long, default_value_t = 30)]
    pub signing_timeout_seconds: u64,

    #[arg(long, value_enum, default_value_t = HttpMethod::Get)]
    pub method: HttpMethod,

    /// JSON body sent with `--method post`
    #[arg(long)]
    pub data: Option<String>,

    /// Choose among payable requirements interactively
    #[arg(long)]
    pub choose: bool,

    /// Prefer requirements paid in this token symbol, e.g. USDT
    #[arg(long, env = "PREFER_TOKEN")]
    pub prefer_token: Option<String>,

    /// Prefer requirements of this scheme, e.g. exact_permit
    #[arg(long, env = "PREFER_SCHEME")]
    pub prefer_scheme: Option<String>,

    /// Keep requirements even when the balance looks insufficient
    #[arg(long)]
    pub skip_balance_check: bool,

    /// TronGrid base URL used for every TRON network
    #[arg(long, env = "TRON_GRID_URL")]
    pub tron_grid_url: Option<Url>,

    /// JSON-RPC URL used for every EVM network
    #[arg(long, env = "EVM_RPC_URL")]
    pub evm_rpc_url: Option<Url>,

    /// Where image responses are saved; defaults to the system temp dir
    #[arg(long, env = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Request header carrying the encoded payment
    #[arg(long, env = "PAYMENT_HEADER", default_value = "PAYMENT-SIGNATURE")]
    pub payment_header: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Set TRON_PRIVATE_KEY or BSC_PRIVATE_KEY (or pass --tron-private-key / --evm-private-key)")]
    NoPrivateKey,
    #[error("Invalid {family} private key: {reason}")]
    InvalidPrivateKey {
        family: &'static str,
        reason: String,
    },
    #[error("Invalid resource URL {0}: {1}")]
    InvalidResourceUrl(String, url::ParseError),
    #[error("--data is not valid JSON: {0}")]
    InvalidData(#[from] serde_json::Error),
    #[error("Invalid payment header name {0:?}")]
    InvalidHeaderName(String),
}

/// Keys the client pays with. At least one is present.
#[derive(Debug)]
pub struct Wallets {
    pub tron: Option<PrivateKeySigner>,
    pub evm: Option<PrivateKeySigner>,
}

impl Config {
    /// Loads `.env`, then parses flags and environment.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Config::parse()
    }

    pub fn resource_url(&self) -> Result<Url, ConfigError> {
        self.server_url
            .join(&self.endpoint)
            .map_err(|e| ConfigError::InvalidResourceUrl(self.endpoint.clone(), e))
    }

    pub fn wallets(&self) -> Result<Wallets, ConfigError> {
        let tron = parse_key("TRON", self.tron_private_key.as_deref())?;
        let evm = parse_key("EVM", self.evm_private_key.as_deref())?;
        if tron.is_none() && evm.is_none() {
            return Err(ConfigError::NoPrivateKey);
        }
        Ok(Wallets { tron, evm })
    }

    /// Parsed `--data`, or `None` when absent.
    pub fn body(&self) -> Result<Option<Value>, ConfigError> {
        match self.data.as_deref() {
            Some(data) => Ok(Some(serde_json::from_str(data)?)),
            None => Ok(None),
        }
    }

    pub fn header_name(&self) -> Result<HeaderName, ConfigError> {
        HeaderName::try_from(self.payment_header.as_str())
            .map_err(|_| ConfigError::InvalidHeaderName(self.payment_header.clone()))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }

    pub fn signing_timeout(&self) -> Duration {
        Duration::from_secs(self.signing_timeout_seconds)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

fn parse_key(family: &'static str, key: Option<&str>) -> Result<Option<PrivateKeySigner>, ConfigError> {
    let Some(key) = key.map(str::trim).filter(|k| !k.is_empty()) else {
        return Ok(None);
    };
    key.parse::<PrivateKeySigner>()
        .map(Some)
        .map_err(|e| ConfigError::InvalidPrivateKey {
            family,
            reason: e.to_string(),
        })
}
