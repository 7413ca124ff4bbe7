//! Feature gate abstraction (spec §4.D "feature_gate_key").
//!
//! A real host runtime decides gate state from its own config/experiment
//! system; this crate only needs a narrow yes/no check keyed by name, so
//! it defines the trait at that seam rather than depending on a concrete
//! feature-flag crate. Grounded on the same narrow-collaborator-trait
//! pattern as [`crate::headers::HeaderAccess`].

use std::collections::HashSet;

/// A source of boolean feature-gate decisions, keyed by name.
pub trait FeatureGate: Send + Sync {
    /// True if the gate named `key` is enabled. An empty `key` means "no
    /// gate configured", which filters treat as always-enabled.
    fn enabled(&self, key: &str) -> bool;
}

/// A gate that is always on, used when a filter has no `feature_gate_key`
/// configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOn;

impl FeatureGate for AlwaysOn {
    fn enabled(&self, _key: &str) -> bool {
        true
    }
}

/// A gate that is always off, useful for disabling a filter outright in
/// tests without removing its config.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOff;

impl FeatureGate for AlwaysOff {
    fn enabled(&self, _key: &str) -> bool {
        false
    }
}

/// A gate backed by a fixed set of enabled keys, for tests and static
/// deployments.
#[derive(Debug, Clone, Default)]
pub struct StaticGate(HashSet<String>);

impl StaticGate {
    pub fn new(enabled_keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(enabled_keys.into_iter().map(Into::into).collect())
    }
}

impl FeatureGate for StaticGate {
    fn enabled(&self, key: &str) -> bool {
        key.is_empty() || self.0.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_on_enables_everything() {
        assert!(AlwaysOn.enabled("anything"));
        assert!(AlwaysOn.enabled(""));
    }

    #[test]
    fn always_off_disables_everything() {
        assert!(!AlwaysOff.enabled("anything"));
    }

    #[test]
    fn static_gate_checks_membership_and_empty_key() {
        let gate = StaticGate::new(["rollout-a"]);
        assert!(gate.enabled("rollout-a"));
        assert!(!gate.enabled("rollout-b"));
        assert!(gate.enabled(""));
    }
}
