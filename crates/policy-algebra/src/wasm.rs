//! WASM bindings for the policy normalizer.

#![cfg(feature = "wasm")]

use std::sync::Arc;

use crate::builder::BuilderRegistry;
use crate::parser;
use crate::registry::PolicyRegistry;
use crate::writer;
use wasm_bindgen::prelude::*;

fn to_js(err: crate::error::PolicyError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// WASM-compatible normalizer with its own reference and builder registries.
#[wasm_bindgen]
pub struct WasmPolicyNormalizer {
    registry: Arc<PolicyRegistry>,
    builders: BuilderRegistry,
}

#[wasm_bindgen]
impl WasmPolicyNormalizer {
    /// Creates a normalizer with empty registries.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(PolicyRegistry::new()),
            builders: BuilderRegistry::new(),
        }
    }

    /// Registers a referenced policy from a JSON or YAML document.
    #[wasm_bindgen]
    pub fn register_policy(&mut self, uri: &str, document: &str) -> Result<(), JsValue> {
        let policy = parser::parse_policy(document, &self.builders).map_err(to_js)?;
        self.registry.register(uri, policy);
        Ok(())
    }

    /// Registers every policy of a URI -> policy document map.
    #[wasm_bindgen]
    pub fn register_policies(&mut self, document: &str) -> Result<usize, JsValue> {
        parser::register_policies(document, &self.builders, &self.registry).map_err(to_js)
    }

    /// Normalizes a policy document and returns the canonical policy as JSON.
    #[wasm_bindgen]
    pub fn normalize(&self, document: &str, deep: bool) -> Result<String, JsValue> {
        let component = parser::parse_component(document, &self.builders).map_err(to_js)?;
        let canonical = crate::normalizer::normalize(&component, Some(&*self.registry), deep)
            .map_err(to_js)?;
        writer::to_json(&canonical.into()).map_err(to_js)
    }

    /// Returns the number of alternatives of a policy document.
    #[wasm_bindgen]
    pub fn alternative_count(&self, document: &str) -> Result<usize, JsValue> {
        let policy = parser::parse_policy(document, &self.builders).map_err(to_js)?;
        Ok(policy.alternatives(Some(&*self.registry)).map_err(to_js)?.len())
    }

    /// Returns the number of registered policies.
    #[wasm_bindgen]
    pub fn policy_count(&self) -> usize {
        self.registry.len()
    }
}

impl Default for WasmPolicyNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the digest of a policy document.
#[wasm_bindgen]
pub fn policy_digest(document: &str) -> Result<String, JsValue> {
    let component = parser::parse_component(document, &BuilderRegistry::new()).map_err(to_js)?;
    Ok(crate::digest::digest(&component))
}

/// Logs a message to the console (for debugging).
#[wasm_bindgen]
pub fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

/// Returns the version of the policy algebra.
#[wasm_bindgen]
pub fn version() -> String {
    crate::VERSION.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wasm_normalizer() {
        let mut normalizer = WasmPolicyNormalizer::new();
        normalizer
            .register_policy(
                "urn:policy:logging",
                r#"{"Policy": {"components": [{"AuditLog": null}]}}"#,
            )
            .unwrap();
        assert_eq!(normalizer.policy_count(), 1);

        let document = r#"
Policy:
  components:
    - PolicyReference: urn:policy:logging
    - ExactlyOne:
        - All: [ { Basic256: null } ]
        - All: [ { Basic128: null } ]
"#;
        assert_eq!(normalizer.alternative_count(document).unwrap(), 2);
        let canonical = normalizer.normalize(document, true).unwrap();
        assert!(canonical.contains("ExactlyOne"));
    }
}
