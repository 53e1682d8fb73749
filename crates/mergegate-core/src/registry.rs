//! Registry of the checks that gate a run.

use sha2::{Digest, Sha256};

use crate::check::CheckSpec;
use crate::error::{GateError, Result};

/// The fixed set of checks gating one run.
///
/// Built once from configuration at orchestration start; no check may be
/// added or removed mid-run. Carries a deterministic digest of the ordered
/// check names for stable run identity across re-runs of the same gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRegistry {
    specs: Vec<CheckSpec>,
    digest: String,
}

impl CheckRegistry {
    /// Build a registry from an ordered sequence of check names.
    ///
    /// Deduplicates by exact (case-sensitive) name, keeping the first
    /// occurrence's position. Every configured check is required.
    ///
    /// Fails with [`GateError::EmptyCheckSet`] if no checks remain after
    /// deduplication, and [`GateError::EmptyCheckName`] if any name is
    /// empty or whitespace.
    pub fn build(names: &[String]) -> Result<Self> {
        let mut specs: Vec<CheckSpec> = Vec::with_capacity(names.len());

        for name in names {
            if name.trim().is_empty() {
                return Err(GateError::EmptyCheckName);
            }
            if specs.iter().any(|s| s.name == *name) {
                continue;
            }
            specs.push(CheckSpec::required(name.clone()));
        }

        if specs.is_empty() {
            return Err(GateError::EmptyCheckSet);
        }

        let digest = compute_registry_digest(&specs);
        Ok(Self { specs, digest })
    }

    /// The checks in configured order.
    pub fn specs(&self) -> &[CheckSpec] {
        &self.specs
    }

    /// SHA-256 digest over the ordered check names.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Number of registered checks.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether the registry holds no checks. Always false for a built
    /// registry; kept for the conventional len/is_empty pair.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Whether a check with this exact name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.specs.iter().any(|s| s.name == name)
    }
}

/// Compute deterministic digest of ordered check names.
fn compute_registry_digest(specs: &[CheckSpec]) -> String {
    let mut hasher = Sha256::new();
    for spec in specs {
        hasher.update(spec.name.as_bytes());
        hasher.update(b"\0");
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_preserves_order() {
        let registry = CheckRegistry::build(&names(&["scan", "build", "review"])).unwrap();
        let got: Vec<&str> = registry.specs().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(got, vec!["scan", "build", "review"]);
        assert!(registry.specs().iter().all(|s| s.required));
    }

    #[test]
    fn test_build_dedupes_case_sensitive() {
        let registry = CheckRegistry::build(&names(&["build", "Build", "build"])).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("build"));
        assert!(registry.contains("Build"));
    }

    #[test]
    fn test_empty_set_is_rejected() {
        let err = CheckRegistry::build(&[]).unwrap_err();
        assert!(matches!(err, GateError::EmptyCheckSet));
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let err = CheckRegistry::build(&names(&["build", "  "])).unwrap_err();
        assert!(matches!(err, GateError::EmptyCheckName));
    }

    #[test]
    fn test_digest_is_stable_and_order_sensitive() {
        let a = CheckRegistry::build(&names(&["build", "scan"])).unwrap();
        let b = CheckRegistry::build(&names(&["build", "scan"])).unwrap();
        let c = CheckRegistry::build(&names(&["scan", "build"])).unwrap();
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
        assert_eq!(a.digest().len(), 64);
    }

    #[test]
    fn test_duplicates_do_not_change_digest() {
        let a = CheckRegistry::build(&names(&["build", "scan"])).unwrap();
        let b = CheckRegistry::build(&names(&["build", "scan", "build"])).unwrap();
        assert_eq!(a.digest(), b.digest());
    }
}
