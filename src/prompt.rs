use async_trait::async_trait;
use std::io::{BufRead, Write};
use x402_tron_client::{PaymentCandidate, PaymentSelector};
use x402_tron_types::networks::{TokenRegistry, network_name_by_chain_id};

/// Asks on the terminal which requirement to pay.
///
/// An empty answer takes the first candidate, `q` declines to pay.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptSelector;

#[derive(Debug, PartialEq, Eq)]
enum Choice {
    Pick(usize),
    Decline,
    Invalid,
}

fn parse_choice(input: &str, len: usize) -> Choice {
    let input = input.trim();
    if input.is_empty() {
        return Choice::Pick(0);
    }
    if input.eq_ignore_ascii_case("q") {
        return Choice::Decline;
    }
    match input.parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Choice::Pick(n - 1),
        _ => Choice::Invalid,
    }
}

fn describe(candidate: &PaymentCandidate<'_>) -> String {
    let requirements = candidate.requirements;
    let network = network_name_by_chain_id(&requirements.network)
        .map(str::to_string)
        .unwrap_or_else(|| requirements.network.to_string());
    format!(
        "{} on {} via {} (from {})",
        TokenRegistry::format_amount(requirements),
        network,
        requirements.scheme,
        candidate.payer()
    )
}

fn read_choice(len: usize) -> Option<usize> {
    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        eprint!("Pay with [1-{len}, Enter for 1, q to cancel]: ");
        std::io::stderr().flush().ok();
        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => return None,
            Ok(_) => {}
        }
        match parse_choice(&line, len) {
            Choice::Pick(index) => return Some(index),
            Choice::Decline => return None,
            Choice::Invalid => eprintln!("Not a valid choice: {}", line.trim()),
        }
    }
}

#[async_trait]
impl PaymentSelector for PromptSelector {
    async fn select<'a, 'b>(
        &self,
        candidates: &'a [PaymentCandidate<'b>],
    ) -> Option<&'a PaymentCandidate<'b>> {
        if candidates.is_empty() {
            return None;
        }
        eprintln!("The server accepts:");
        for (position, candidate) in candidates.iter().enumerate() {
            eprintln!("  {}. {}", position + 1, describe(candidate));
        }
        let len = candidates.len();
        let index = tokio::task::spawn_blocking(move || read_choice(len))
            .await
            .ok()
            .flatten()?;
        candidates.get(index)
    }
}
