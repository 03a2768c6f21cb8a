use http::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request};
use std::sync::Arc;
use x402_chain_eip155::chain::{Erc20BalanceOracle, SerialSigner};
use x402_chain_eip155::{Eip155ExactClient, Eip155ExactPermitClient};
use x402_chain_tron::chain::TronAddress;
use x402_chain_tron::{TronExactPermitClient, TronGridBalanceOracle};
use x402_tron_client::{
    FetcherConfig, FirstMatch, PaymentSelector, PreferToken, SufficientBalancePolicy, X402Client,
    X402HttpClient,
};
use x402_tron_types::chain::ChainIdPattern;

use crate::config::{Config, HttpMethod, Wallets};
use crate::output;
use crate::prompt::PromptSelector;
use crate::sig_down::SigDown;
use crate::telemetry::Telemetry;

/// Fetches the configured resource once, paying if challenged.
///
/// - Loads `.env` and parses flags.
/// - Registers a TRON `exact_permit` mechanism and the EVM `exact_permit` and
///   `exact` mechanisms for whichever keys are configured.
/// - Filters requirements by balance and preference, then pays the first one
///   left or asks, with `--choose`.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    let _telemetry = Telemetry::init();

    let wallets = config.wallets()?;
    let url = config.resource_url()?;
    let body = config.body()?;
    eprint!("{}", output::supported_networks());

    let x402 = payment_client(&config, wallets)?;
    let fetcher = X402HttpClient::from_config(
        &FetcherConfig {
            timeout: config.http_timeout(),
        },
        x402,
    )?
    .on_transition(|state| tracing::info!(%state, "x402 flow"));

    let method = match config.method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
    };
    let mut request = Request::new(method, url);
    if let Some(body) = &body {
        *request.body_mut() = Some(serde_json::to_vec(body)?.into());
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    tracing::info!(method = %request.method(), url = %request.url(), "Fetching resource");

    let sig_down = SigDown::try_new()?;
    let result = fetcher
        .execute_with_cancel(request, &sig_down.cancellation_token())
        .await;
    let response = match result {
        Ok(response) => response,
        Err(error) => {
            if let Some(hint) = output::error_hint(&error) {
                eprintln!("{hint}");
            }
            return Err(error.into());
        }
    };

    eprintln!("HTTP {}", response.status);
    println!("{}", output::render_body(&response.body, &config.output_dir())?);
    eprint!("{}", output::payment_summary(&response));
    Ok(())
}

fn payment_client(
    config: &Config,
    wallets: Wallets,
) -> Result<X402Client<Arc<dyn PaymentSelector>>, Box<dyn std::error::Error>> {
    let mut x402 = X402Client::new().with_header_name(config.header_name()?);

    if let Some(key) = wallets.tron {
        let signer = SerialSigner::new(key).with_timeout(config.signing_timeout());
        tracing::info!(address = %TronAddress::from(signer.address()), "TRON wallet loaded");
        x402 = x402.register(TronExactPermitClient::new(signer));
    }
    if let Some(key) = wallets.evm {
        let signer = SerialSigner::new(key).with_timeout(config.signing_timeout());
        tracing::info!(address = %signer.address(), "EVM wallet loaded");
        x402 = x402
            .register(Eip155ExactPermitClient::new(signer.clone()))
            .register(Eip155ExactClient::new(signer));
    }

    if config.skip_balance_check {
        tracing::warn!("Balance check disabled");
    } else {
        let grid_client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;
        let mut tron_oracle = TronGridBalanceOracle::new().with_client(grid_client);
        if let Some(url) = &config.tron_grid_url {
            tron_oracle = tron_oracle.with_fallback_url(url.clone());
        }
        let mut evm_oracle = Erc20BalanceOracle::new().with_timeout(config.http_timeout());
        if let Some(url) = &config.evm_rpc_url {
            evm_oracle = evm_oracle.with_fallback_url(url.clone());
        }
        x402 = x402.with_policy(
            SufficientBalancePolicy::new()
                .with_oracle(ChainIdPattern::wildcard("tron"), tron_oracle)
                .with_oracle(ChainIdPattern::wildcard("eip155"), evm_oracle),
        );
    }

    let preference = match (&config.prefer_token, &config.prefer_scheme) {
        (Some(token), Some(scheme)) => Some(PreferToken::symbol(token).with_scheme(scheme)),
        (Some(token), None) => Some(PreferToken::symbol(token)),
        (None, Some(scheme)) => Some(PreferToken::scheme(scheme)),
        (None, None) => None,
    };
    if let Some(preference) = preference {
        x402 = x402.with_policy(preference);
    }

    let selector: Arc<dyn PaymentSelector> = if config.choose {
        Arc::new(PromptSelector)
    } else {
        Arc::new(FirstMatch)
    };
    Ok(x402.with_selector(selector))
}
