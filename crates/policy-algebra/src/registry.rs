//! Reference registry used to resolve `PolicyReference` nodes.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::policy::Policy;

/// A concurrent URI -> policy table with optional parent delegation.
///
/// The parent is held weakly: it belongs to whoever configured it, and a
/// dropped parent behaves like an empty one.
#[derive(Debug, Default)]
pub struct PolicyRegistry {
    policies: RwLock<HashMap<String, Policy>>,
    parent: Option<Weak<PolicyRegistry>>,
}

impl PolicyRegistry {
    /// Creates an empty registry with no parent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry that delegates misses to `parent`.
    pub fn with_parent(parent: &Arc<PolicyRegistry>) -> Self {
        Self {
            policies: RwLock::new(HashMap::new()),
            parent: Some(Arc::downgrade(parent)),
        }
    }

    /// Registers a policy under a URI, returning the policy it replaced.
    pub fn register(&self, uri: impl Into<String>, policy: Policy) -> Option<Policy> {
        let uri = uri.into();
        debug!(uri = %uri, "registering policy");
        self.policies.write().insert(uri, policy)
    }

    /// Removes a policy from this registry (never from the parent).
    pub fn remove(&self, uri: &str) -> Option<Policy> {
        debug!(uri = %uri, "removing policy");
        self.policies.write().remove(uri)
    }

    /// Looks up a policy, delegating to the parent chain on a miss.
    pub fn lookup(&self, uri: &str) -> Option<Policy> {
        if let Some(policy) = self.policies.read().get(uri) {
            return Some(policy.clone());
        }

        let parent = self.parent.as_ref().and_then(Weak::upgrade)?;
        trace!(uri = %uri, "delegating lookup to parent registry");
        parent.lookup(uri)
    }

    /// Returns true if the URI resolves locally or through a parent.
    pub fn contains(&self, uri: &str) -> bool {
        self.lookup(uri).is_some()
    }

    /// Number of locally registered policies.
    pub fn len(&self) -> usize {
        self.policies.read().len()
    }

    /// Returns true if nothing is registered locally.
    pub fn is_empty(&self) -> bool {
        self.policies.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_register_lookup_remove() {
        let registry = PolicyRegistry::new();
        assert!(registry.lookup("#p").is_none());

        assert!(registry.register("#p", Policy::new().with_name("p")).is_none());
        assert_eq!(registry.lookup("#p").unwrap().name(), Some("p"));
        assert_eq!(registry.len(), 1);

        let replaced = registry.register("#p", Policy::new().with_name("p2"));
        assert_eq!(replaced.unwrap().name(), Some("p"));

        assert!(registry.remove("#p").is_some());
        assert!(registry.is_empty());
        assert!(!registry.contains("#p"));
    }

    #[test]
    fn test_parent_delegation() {
        let parent = Arc::new(PolicyRegistry::new());
        parent.register("#shared", Policy::new().with_name("shared"));

        let child = PolicyRegistry::with_parent(&parent);
        child.register("#local", Policy::new().with_name("local"));

        assert_eq!(child.lookup("#shared").unwrap().name(), Some("shared"));
        assert_eq!(child.lookup("#local").unwrap().name(), Some("local"));
        assert!(parent.lookup("#local").is_none());

        // Local entries shadow the parent.
        child.register("#shared", Policy::new().with_name("override"));
        assert_eq!(child.lookup("#shared").unwrap().name(), Some("override"));

        // Removal never reaches into the parent.
        child.remove("#shared");
        assert_eq!(child.lookup("#shared").unwrap().name(), Some("shared"));
    }

    #[test]
    fn test_dropped_parent_is_empty() {
        let parent = Arc::new(PolicyRegistry::new());
        parent.register("#shared", Policy::new());
        let child = PolicyRegistry::with_parent(&parent);
        drop(parent);
        assert!(child.lookup("#shared").is_none());
    }

    #[test]
    fn test_concurrent_registration() {
        let registry = Arc::new(PolicyRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let uri = format!("#p{}", i);
                    registry.register(uri.clone(), Policy::new().with_id(uri.clone()));
                    registry.lookup(&uri).is_some()
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(registry.len(), 8);
    }
}
