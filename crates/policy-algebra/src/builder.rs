//! Requirement builders keyed by qualified name.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::assertion::{PrimitiveAssertion, Requirement, NESTED_POLICY_KEY, OPTIONAL_KEY};
use crate::error::{PolicyError, Result};
use crate::parser;
use crate::qname::QName;

/// Builds a requirement from a document element.
pub trait AssertionBuilder: fmt::Debug + Send + Sync {
    /// Builds the requirement named `name` from its element body.
    ///
    /// `builders` is the registry in use, for bodies that nest policies.
    fn build(&self, name: &QName, body: &Value, builders: &BuilderRegistry) -> Result<Requirement>;
}

/// Fallback builder: keeps any element as a [`PrimitiveAssertion`].
///
/// Map bodies have their `optional` and `policy` keys lifted out; `null`
/// becomes an empty payload and any other scalar or list is stored under
/// `value`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrimitiveAssertionBuilder;

impl AssertionBuilder for PrimitiveAssertionBuilder {
    fn build(&self, name: &QName, body: &Value, builders: &BuilderRegistry) -> Result<Requirement> {
        let mut payload = match body {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other.clone());
                map
            }
        };

        let optional = match payload.remove(OPTIONAL_KEY) {
            None => false,
            Some(Value::Bool(flag)) => flag,
            Some(other) => {
                return Err(PolicyError::BuilderError {
                    name: name.to_string(),
                    message: format!("'{}' must be a boolean, got {}", OPTIONAL_KEY, other),
                })
            }
        };

        let mut assertion = PrimitiveAssertion::new(name.clone()).with_optional(optional);
        if let Some(nested) = payload.remove(NESTED_POLICY_KEY) {
            assertion = assertion.with_policy(parser::policy_from_value(&nested, builders)?);
        }

        Ok(Arc::new(assertion.with_payload(payload)))
    }
}

/// A concurrent qualified-name -> builder table with a fallback builder.
#[derive(Debug)]
pub struct BuilderRegistry {
    builders: RwLock<HashMap<QName, Arc<dyn AssertionBuilder>>>,
    fallback: Arc<dyn AssertionBuilder>,
}

impl BuilderRegistry {
    /// Creates a registry that falls back to [`PrimitiveAssertionBuilder`].
    pub fn new() -> Self {
        Self::with_fallback(Arc::new(PrimitiveAssertionBuilder))
    }

    /// Creates a registry with a custom fallback builder.
    pub fn with_fallback(fallback: Arc<dyn AssertionBuilder>) -> Self {
        Self {
            builders: RwLock::new(HashMap::new()),
            fallback,
        }
    }

    /// Registers a builder for a name, returning the one it replaced.
    pub fn register(
        &self,
        name: QName,
        builder: Arc<dyn AssertionBuilder>,
    ) -> Option<Arc<dyn AssertionBuilder>> {
        debug!(name = %name, "registering requirement builder");
        self.builders.write().insert(name, builder)
    }

    /// Removes the builder registered for a name.
    pub fn unregister(&self, name: &QName) -> Option<Arc<dyn AssertionBuilder>> {
        self.builders.write().remove(name)
    }

    /// Returns true if a specific builder is registered for the name.
    pub fn is_registered(&self, name: &QName) -> bool {
        self.builders.read().contains_key(name)
    }

    /// Builds a requirement with the registered builder or the fallback.
    pub fn build(&self, name: &QName, body: &Value) -> Result<Requirement> {
        // Clone the handle so builders can recurse into this registry.
        let builder = self.builders.read().get(name).cloned();
        match builder {
            Some(builder) => builder.build(name, body, self),
            None => {
                trace!(name = %name, "no builder registered, keeping element as primitive");
                self.fallback.build(name, body, self)
            }
        }
    }
}

impl Default for BuilderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::Assertion;
    use serde_json::json;

    /// Builds a fixed-strength requirement regardless of the body.
    #[derive(Debug)]
    struct StrengthBuilder;

    impl AssertionBuilder for StrengthBuilder {
        fn build(&self, name: &QName, body: &Value, _: &BuilderRegistry) -> Result<Requirement> {
            let bits = body.get("bits").and_then(Value::as_u64).ok_or_else(|| {
                PolicyError::BuilderError {
                    name: name.to_string(),
                    message: "missing 'bits'".to_string(),
                }
            })?;
            Ok(Arc::new(
                PrimitiveAssertion::new(name.clone()).with_value("bits", json!(bits.max(128))),
            ))
        }
    }

    fn strength() -> QName {
        QName::new("urn:sec", "EncryptionStrength")
    }

    #[test]
    fn test_unknown_elements_become_primitive() {
        let registry = BuilderRegistry::new();
        let name = QName::new("urn:vendor", "Throttle");
        let req = registry
            .build(&name, &json!({"rate": 10, "optional": true}))
            .unwrap();

        assert_eq!(req.name(), &name);
        assert!(req.is_optional());
        assert_eq!(req.to_value(), json!({"rate": 10, "optional": true}));
    }

    #[test]
    fn test_scalar_and_null_bodies() {
        let registry = BuilderRegistry::new();
        let name = QName::local("Mode");
        assert_eq!(registry.build(&name, &Value::Null).unwrap().to_value(), json!({}));
        assert_eq!(
            registry.build(&name, &json!("strict")).unwrap().to_value(),
            json!({"value": "strict"})
        );
    }

    #[test]
    fn test_registered_builder_takes_precedence() {
        let registry = BuilderRegistry::new();
        assert!(registry.register(strength(), Arc::new(StrengthBuilder)).is_none());
        assert!(registry.is_registered(&strength()));

        let req = registry.build(&strength(), &json!({"bits": 64})).unwrap();
        assert_eq!(req.to_value(), json!({"bits": 128}));

        let err = registry.build(&strength(), &json!({})).unwrap_err();
        assert!(matches!(err, PolicyError::BuilderError { .. }));

        registry.unregister(&strength());
        let req = registry.build(&strength(), &json!({})).unwrap();
        assert_eq!(req.to_value(), json!({}));
    }

    #[test]
    fn test_invalid_optional_flag() {
        let registry = BuilderRegistry::new();
        let err = registry
            .build(&QName::local("X"), &json!({"optional": "yes"}))
            .unwrap_err();
        assert!(matches!(err, PolicyError::BuilderError { .. }));
    }
}
