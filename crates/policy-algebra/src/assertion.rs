//! Requirement leaves ("assertions").

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::component::{All, Component, ExactlyOne};
use crate::error::Result;
use crate::normalizer::Normalizer;
use crate::policy::Policy;
use crate::qname::QName;
use crate::writer;

/// Body key carrying the optionality flag in policy documents.
pub const OPTIONAL_KEY: &str = "optional";

/// Body key carrying a nested policy in policy documents.
pub const NESTED_POLICY_KEY: &str = "policy";

/// A shared, immutable requirement leaf.
pub type Requirement = Arc<dyn Assertion>;

/// An opaque leaf constraint identified by a qualified name.
///
/// The engine never interprets a requirement beyond its name and optionality.
/// Domain crates implement this trait for their own constraint types and
/// register an [`AssertionBuilder`](crate::builder::AssertionBuilder) so the
/// parser can produce them.
pub trait Assertion: fmt::Debug + Send + Sync {
    /// Returns the qualified name of the requirement.
    fn name(&self) -> &QName;

    /// Returns true if the requirement may be left unsatisfied.
    fn is_optional(&self) -> bool;

    /// Self-normalization hook, invoked by deep normalization.
    ///
    /// `Ok(None)` keeps the requirement as is. A returned `Policy` replaces
    /// the requirement with that policy's alternatives; a returned
    /// requirement replaces it one for one. Nested policies should be
    /// normalized through `normalizer` so reference cycles across the hook
    /// are still detected.
    fn normalize(&self, _normalizer: &mut Normalizer<'_>) -> Result<Option<Component>> {
        Ok(None)
    }

    /// Renders the element body as it appears in policy documents.
    fn to_value(&self) -> Value;

    /// Structural comparison with another requirement.
    fn equal(&self, other: &dyn Assertion) -> bool {
        self.name() == other.name()
            && self.is_optional() == other.is_optional()
            && self.to_value() == other.to_value()
    }
}

/// The default requirement: a name, a JSON payload, and an optional nested
/// policy. Unknown document elements are kept as these.
#[derive(Debug, Clone)]
pub struct PrimitiveAssertion {
    name: QName,
    optional: bool,
    payload: Map<String, Value>,
    policy: Option<Policy>,
}

impl PrimitiveAssertion {
    /// Creates a required assertion with an empty payload.
    pub fn new(name: QName) -> Self {
        Self {
            name,
            optional: false,
            payload: Map::new(),
            policy: None,
        }
    }

    /// Sets the optionality flag.
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Adds a payload entry.
    pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    /// Replaces the whole payload.
    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = payload;
        self
    }

    /// Attaches a nested policy.
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Returns the payload.
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Returns the nested policy, if any.
    pub fn policy(&self) -> Option<&Policy> {
        self.policy.as_ref()
    }

    /// Wraps the assertion as a tree leaf.
    pub fn into_component(self) -> Component {
        Component::Requirement(Arc::new(self))
    }
}

impl Assertion for PrimitiveAssertion {
    fn name(&self) -> &QName {
        &self.name
    }

    fn is_optional(&self) -> bool {
        self.optional
    }

    fn normalize(&self, normalizer: &mut Normalizer<'_>) -> Result<Option<Component>> {
        if !self.optional && self.policy.is_none() {
            return Ok(None);
        }

        let mut required = self.clone();
        required.optional = false;
        if let Some(nested) = &self.policy {
            let nested = Component::Policy(nested.clone());
            required.policy = Some(normalizer.normalize(&nested)?);
        }

        if !self.optional {
            return Ok(Some(required.into_component()));
        }

        // Optional means two alternatives: present, or absent.
        let mut present = All::new();
        present.add_component(required.into_component());
        let mut choice = ExactlyOne::new();
        choice.add_component(Component::All(present));
        choice.add_component(Component::All(All::new()));

        let mut expanded = Policy::new();
        expanded.add_component(Component::ExactlyOne(choice));
        Ok(Some(Component::Policy(expanded)))
    }

    fn to_value(&self) -> Value {
        let mut body = self.payload.clone();
        if self.optional {
            body.insert(OPTIONAL_KEY.to_string(), Value::Bool(true));
        }
        if let Some(nested) = &self.policy {
            body.insert(
                NESTED_POLICY_KEY.to_string(),
                writer::policy_to_value(nested),
            );
        }
        Value::Object(body)
    }
}
