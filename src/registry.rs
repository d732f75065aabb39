//! Payload registry for the demo CLI.
//!
//! Payloads are the measured workloads wired to the harness by the binary.
//! Each one knows how to build its per-cycle task factory and how to check
//! its own kernels for correctness.

use std::time::Duration;

use crate::clock::Clock;
use crate::error::Result;

/// A workload that can be timed by a [`Clock`].
pub trait Payload: Send + Sync {
    /// Name of the payload (e.g., "dot_product")
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// Category (e.g., "math", "random")
    fn category(&self) -> &'static str;

    /// Run the adaptive loop over this payload with inputs of `size` elements.
    fn time(&self, clock: &Clock, size: usize) -> Result<Vec<Duration>>;

    /// Verify the payload's kernels against their reference.
    fn verify(&self) -> std::result::Result<(), String>;
}

/// All known payloads.
pub struct PayloadRegistry {
    payloads: Vec<Box<dyn Payload>>,
}

impl PayloadRegistry {
    pub fn new() -> Self {
        Self {
            payloads: Vec::new(),
        }
    }

    pub fn register<P: Payload + 'static>(&mut self, payload: P) {
        self.payloads.push(Box::new(payload));
    }

    pub fn all(&self) -> &[Box<dyn Payload>] {
        &self.payloads
    }

    /// Find payload by name
    pub fn find(&self, name: &str) -> Option<&dyn Payload> {
        self.payloads
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref())
    }

    pub fn list_names(&self) -> Vec<&'static str> {
        self.payloads.iter().map(|p| p.name()).collect()
    }
}

impl Default for PayloadRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the default registry with every bundled payload.
pub fn build_registry() -> PayloadRegistry {
    let mut registry = PayloadRegistry::new();

    registry.register(crate::payloads::dot_product::DotProductPayload);
    registry.register(crate::payloads::xoroshiro::XoroshiroPayload);

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_payloads_verify() {
        let registry = build_registry();

        for payload in registry.all() {
            if let Err(e) = payload.verify() {
                panic!("Payload '{}' failed verification: {}", payload.name(), e);
            }
        }
    }

    #[test]
    fn test_find_by_name() {
        let registry = build_registry();
        assert_eq!(registry.list_names(), vec!["dot_product", "xoroshiro128++"]);
        assert!(registry.find("dot_product").is_some());
        assert!(registry.find("missing").is_none());
    }
}
