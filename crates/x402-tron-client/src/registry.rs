//! Registered payment mechanisms, keyed by chain pattern.

use std::sync::Arc;
use x402_tron_types::chain::ChainIdPattern;
use x402_tron_types::proto::PaymentRequirements;
use x402_tron_types::scheme::X402SchemeClient;

/// A mechanism together with the chains it was registered for.
#[derive(Clone)]
pub struct RegisteredMechanism {
    pub pattern: ChainIdPattern,
    pub mechanism: Arc<dyn X402SchemeClient>,
}

/// Maps chain patterns to mechanisms.
///
/// [`resolve`](MechanismRegistry::resolve) considers only mechanisms whose
/// pattern matches the requirement's network and which accept its scheme.
/// Among those, an exact pattern beats a set, a set beats a wildcard, and
/// registration order breaks ties.
#[derive(Clone, Default)]
pub struct MechanismRegistry {
    entries: Vec<RegisteredMechanism>,
}

impl MechanismRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `mechanism` under its own [`pattern`](x402_tron_types::scheme::X402SchemeId::pattern).
    pub fn register<M>(&mut self, mechanism: M)
    where
        M: X402SchemeClient + 'static,
    {
        let pattern = mechanism.pattern();
        self.register_for(pattern, mechanism);
    }

    /// Registers `mechanism` for the chains matched by `pattern`.
    pub fn register_for<M>(&mut self, pattern: ChainIdPattern, mechanism: M)
    where
        M: X402SchemeClient + 'static,
    {
        self.entries.push(RegisteredMechanism {
            pattern,
            mechanism: Arc::new(mechanism),
        });
    }

    /// The mechanism that should build a payload for `requirements`, if any.
    pub fn resolve(&self, requirements: &PaymentRequirements) -> Option<&Arc<dyn X402SchemeClient>> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| {
                entry.pattern.matches(&requirements.network) && entry.mechanism.accepts(requirements)
            })
            .max_by_key(|(index, entry)| (entry.pattern.specificity(), std::cmp::Reverse(*index)))
            .map(|(_, entry)| &entry.mechanism)
    }

    pub fn entries(&self) -> &[RegisteredMechanism] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockMechanism, requirement};
    use x402_tron_types::scheme::X402SchemeId;

    #[test]
    fn test_resolve_prefers_exact_over_wildcard() {
        let mut registry = MechanismRegistry::new();
        registry.register(MockMechanism::new("tron", "exact_permit").with_payer("wildcard"));
        registry.register_for(
            "tron:nile".parse().unwrap(),
            MockMechanism::new("tron", "exact_permit").with_payer("exact"),
        );
        let nile = requirement("tron:nile", "exact_permit");
        assert_eq!(registry.resolve(&nile).unwrap().payer(), "exact");
        let shasta = requirement("tron:shasta", "exact_permit");
        assert_eq!(registry.resolve(&shasta).unwrap().payer(), "wildcard");
    }

    #[test]
    fn test_resolve_prefers_set_over_wildcard() {
        let mut registry = MechanismRegistry::new();
        registry.register(MockMechanism::new("eip155", "exact").with_payer("wildcard"));
        registry.register_for(
            "eip155:{56,97}".parse().unwrap(),
            MockMechanism::new("eip155", "exact").with_payer("set"),
        );
        let bsc = requirement("eip155:56", "exact");
        assert_eq!(registry.resolve(&bsc).unwrap().payer(), "set");
    }

    #[test]
    fn test_resolve_ties_go_to_first_registered() {
        let mut registry = MechanismRegistry::new();
        registry.register(MockMechanism::new("tron", "exact_permit").with_payer("first"));
        registry.register(MockMechanism::new("tron", "exact_permit").with_payer("second"));
        let nile = requirement("tron:nile", "exact_permit");
        assert_eq!(registry.resolve(&nile).unwrap().payer(), "first");
    }

    #[test]
    fn test_resolve_requires_matching_scheme() {
        let mut registry = MechanismRegistry::new();
        registry.register(MockMechanism::new("eip155", "exact_permit"));
        registry.register(MockMechanism::new("eip155", "exact"));
        let exact = requirement("eip155:56", "exact");
        assert_eq!(registry.resolve(&exact).unwrap().scheme(), "exact");
        let gasfree = requirement("eip155:56", "exact_gasfree");
        assert!(registry.resolve(&gasfree).is_none());
    }

    #[test]
    fn test_resolve_requires_matching_network() {
        let mut registry = MechanismRegistry::new();
        registry.register(MockMechanism::new("eip155", "exact_permit"));
        assert!(registry.resolve(&requirement("tron:nile", "exact_permit")).is_none());
    }
}
