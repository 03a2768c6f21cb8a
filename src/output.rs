//! Terminal rendering of responses, settlements and failures.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use x402_tron_client::{FetchError, PaidResponse, ResponseBody};
use x402_tron_types::networks::{KNOWN_NETWORKS, TokenRegistry, network_name_by_chain_id};
use x402_tron_types::proto::SettleResponse;

/// Text bodies longer than this many characters are cut for display.
pub const TEXT_PREVIEW_CHARS: usize = 200;

/// One line per known network with its token symbols.
pub fn supported_networks() -> String {
    let mut out = String::from("Supported networks:\n");
    for network in KNOWN_NETWORKS {
        let chain_id = network.chain_id();
        let tokens = TokenRegistry::network_tokens(&chain_id)
            .iter()
            .map(|t| t.symbol)
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "  {:<14} {:<16} {}", network.name, chain_id.to_string(), tokens);
    }
    out
}

fn network_label(settlement: &SettleResponse) -> String {
    let network = settlement.network();
    match network_name_by_chain_id(network) {
        Some(name) => format!("{name} ({network})"),
        None => network.to_string(),
    }
}

/// What was paid and how settlement went.
pub fn payment_summary(response: &PaidResponse) -> String {
    let Some(accepted) = &response.accepted else {
        return "Resource was free, nothing paid".to_string();
    };
    let mut out = format!(
        "Paid {} on {} via {}\n",
        TokenRegistry::format_amount(accepted),
        accepted.network,
        accepted.scheme
    );
    match &response.settlement {
        None => out.push_str("Settlement: no PAYMENT-RESPONSE header, the server may settle later\n"),
        Some(settlement) => {
            let verdict = if settlement.is_success() { "success" } else { "failed" };
            let _ = writeln!(out, "Settlement: {verdict}");
            let _ = writeln!(out, "  network:     {}", network_label(settlement));
            if let Some(transaction) = settlement.transaction() {
                let _ = writeln!(out, "  transaction: {transaction}");
            }
            if let Some(reason) = settlement.error_reason() {
                let _ = writeln!(out, "  error:       {reason}");
            }
        }
    }
    out
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}... ({} more characters)", &text[..cut], text[cut..].chars().count()),
        None => text.to_string(),
    }
}

/// Renders the body for stdout. Images are written to `output_dir` as
/// `x402_*.<ext>` and reported by path.
pub fn render_body(body: &ResponseBody, output_dir: &Path) -> std::io::Result<String> {
    match body {
        ResponseBody::Json(value) => {
            Ok(serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()))
        }
        ResponseBody::Text(text) => Ok(truncate_chars(text, TEXT_PREVIEW_CHARS)),
        ResponseBody::Image {
            bytes,
            mime,
            extension,
        } => {
            let path = save_image(bytes, extension, output_dir)?;
            Ok(format!(
                "Image ({mime}, {} bytes) saved to {}",
                bytes.len(),
                path.display()
            ))
        }
    }
}

fn save_image(bytes: &[u8], extension: &str, output_dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let mut file = tempfile::Builder::new()
        .prefix("x402_")
        .suffix(&format!(".{extension}"))
        .tempfile_in(output_dir)?;
    file.write_all(bytes)?;
    let (_, path) = file.keep()?;
    Ok(path)
}

/// Extra advice for failures where the payment state matters.
pub fn error_hint(error: &FetchError) -> Option<&'static str> {
    match error {
        FetchError::Network {
            payment_attached: true,
            source,
        } if source.is_timeout() => Some(
            "The paid request timed out. Settlement may still complete on-chain; check the payer's transactions before retrying.",
        ),
        FetchError::Network {
            payment_attached: false,
            source,
        } if source.is_timeout() => {
            Some("The server did not answer in time. Nothing was paid; try a larger --http-timeout-seconds.")
        }
        FetchError::Interrupted => Some(
            "Interrupted after the payment was sent. Settlement may still complete on-chain.",
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{HeaderMap, StatusCode};
    use serde_json::json;
    use x402_tron_types::chain::ChainId;
    use x402_tron_types::proto::PaymentRequirements;

    fn requirements() -> PaymentRequirements {
        serde_json::from_value(json!({
            "scheme": "exact_permit",
            "network": "tron:nile",
            "amount": "100",
            "asset": "TXYZopYRdj2D9XRtbG411XZZ3kM5VkAeBf",
            "payTo": "TD5gsCwxykWsLN9aPrq2TAfNjByuZKYp4E"
        }))
        .unwrap()
    }

    fn response(accepted: Option<PaymentRequirements>, settlement: Option<SettleResponse>) -> PaidResponse {
        PaidResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            settlement,
            accepted,
            body: ResponseBody::Text("ok".into()),
        }
    }

    #[test]
    fn test_summary_of_successful_settlement() {
        let settlement = SettleResponse::Success {
            payer: None,
            transaction: "abc123".into(),
            network: ChainId::new("tron", "nile"),
        };
        let summary = payment_summary(&response(Some(requirements()), Some(settlement)));
        assert!(summary.starts_with("Paid 0.0001 USDT on tron:nile via exact_permit"));
        assert!(summary.contains("Settlement: success"));
        assert!(summary.contains("tron-nile (tron:nile)"));
        assert!(summary.contains("transaction: abc123"));
    }

    #[test]
    fn test_summary_of_failed_settlement() {
        let settlement = SettleResponse::Error {
            reason: "insufficient_funds".into(),
            payer: None,
            network: ChainId::new("tron", "nile"),
        };
        let summary = payment_summary(&response(Some(requirements()), Some(settlement)));
        assert!(summary.contains("Settlement: failed"));
        assert!(summary.contains("error:       insufficient_funds"));
        assert!(!summary.contains("transaction"));
    }

    #[test]
    fn test_summary_without_payment() {
        assert_eq!(payment_summary(&response(None, None)), "Resource was free, nothing paid");
        assert!(payment_summary(&response(Some(requirements()), None)).contains("no PAYMENT-RESPONSE"));
    }

    #[test]
    fn test_text_is_truncated_by_chars() {
        let text = "é".repeat(250);
        let rendered = render_body(&ResponseBody::Text(text), Path::new(".")).unwrap();
        assert!(rendered.starts_with(&"é".repeat(200)));
        assert!(rendered.ends_with("... (50 more characters)"));
        let short = render_body(&ResponseBody::Text("hello".into()), Path::new(".")).unwrap();
        assert_eq!(short, "hello");
    }

    #[test]
    fn test_image_saved_with_prefix_and_extension() {
        let dir = tempfile::tempdir().unwrap();
        let body = ResponseBody::Image {
            bytes: Bytes::from_static(b"\x89PNG\r\n\x1a\n"),
            mime: mime::IMAGE_PNG,
            extension: "png".into(),
        };
        let rendered = render_body(&body, dir.path()).unwrap();
        let saved: Vec<_> = std::fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().path()).collect();
        assert_eq!(saved.len(), 1);
        let name = saved[0].file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("x402_") && name.ends_with(".png"));
        assert_eq!(std::fs::read(&saved[0]).unwrap(), b"\x89PNG\r\n\x1a\n");
        assert!(rendered.contains(&name));
    }

    #[test]
    fn test_supported_networks_lists_tokens() {
        let listing = supported_networks();
        assert!(listing.contains("tron-nile"));
        assert!(listing.contains("USDT, USDC"));
    }
}
