//! The top-level policy container.

use std::collections::BTreeMap;

use crate::builder::BuilderRegistry;
use crate::component::{Component, ExactlyOne};
use crate::error::Result;
use crate::normalizer;
use crate::parser;
use crate::qname::QName;
use crate::registry::PolicyRegistry;
use crate::writer;

/// A policy: a conjunction of its children plus identity attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Policy {
    components: Vec<Component>,
    attributes: BTreeMap<QName, String>,
}

impl Policy {
    /// Creates an empty policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `Name` attribute.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.set_name(name);
        self
    }

    /// Sets the `wsu:Id` attribute.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.set_id(id);
        self
    }

    /// Appends a child, builder style.
    pub fn with_component(mut self, component: impl Into<Component>) -> Self {
        self.add_component(component.into());
        self
    }

    /// Returns the `Name` attribute.
    pub fn name(&self) -> Option<&str> {
        self.attribute(&QName::policy_name())
    }

    /// Sets the `Name` attribute.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.set_attribute(QName::policy_name(), name);
    }

    /// Returns the `wsu:Id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.attribute(&QName::policy_id())
    }

    /// Sets the `wsu:Id` attribute.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.set_attribute(QName::policy_id(), id);
    }

    /// Returns an attribute by qualified name.
    pub fn attribute(&self, name: &QName) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Sets an attribute, replacing any previous value.
    pub fn set_attribute(&mut self, name: QName, value: impl Into<String>) {
        self.attributes.insert(name, value.into());
    }

    /// Returns all attributes.
    pub fn attributes(&self) -> &BTreeMap<QName, String> {
        &self.attributes
    }

    /// Appends a child.
    pub fn add_component(&mut self, component: Component) {
        self.components.push(component);
    }

    /// Appends several children in order.
    pub fn add_components(&mut self, components: impl IntoIterator<Item = Component>) {
        self.components.extend(components);
    }

    /// Returns the ordered children.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Returns true if there are no children.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Returns the single `ExactlyOne` child if the policy is canonical.
    pub fn canonical_choice(&self) -> Option<&ExactlyOne> {
        match self.components.as_slice() {
            [Component::ExactlyOne(choice)] => Some(choice),
            _ => None,
        }
    }

    /// Returns true if the policy is `Policy -> ExactlyOne -> All*` with only
    /// requirements inside each `All`.
    pub fn is_canonical(&self) -> bool {
        let Some(alternatives) = self.canonical_choice().and_then(ExactlyOne::alternatives)
        else {
            return false;
        };
        alternatives.iter().all(|all| {
            all.components()
                .iter()
                .all(|c| matches!(c, Component::Requirement(_)))
        })
    }

    /// Reduces the policy to canonical form.
    pub fn normalize(&self, registry: Option<&PolicyRegistry>, deep: bool) -> Result<Policy> {
        normalizer::normalize(&Component::Policy(self.clone()), registry, deep)
    }

    /// Returns the alternatives of the shallow canonical form.
    ///
    /// Each call normalizes afresh.
    pub fn alternatives(&self, registry: Option<&PolicyRegistry>) -> Result<Alternatives> {
        let canonical = self.normalize(registry, false)?;
        let alternatives = canonical
            .into_choice()
            .into_components()
            .into_iter()
            .map(|alternative| match alternative {
                Component::All(all) => all.into_components(),
                other => unreachable!("normalized policy holds {}", other.type_name()),
            })
            .collect::<Vec<_>>();
        Ok(Alternatives {
            inner: alternatives.into_iter(),
        })
    }

    /// Returns a policy requiring everything in `self` and in `other`.
    ///
    /// The result is not normalized and carries no attributes.
    pub fn merge(&self, other: &Policy) -> Policy {
        let mut merged = Policy::new();
        merged.add_components(self.components.iter().cloned());
        merged.add_components(other.components.iter().cloned());
        merged
    }

    /// Parses a policy from a YAML document.
    pub fn from_yaml(yaml: &str, builders: &BuilderRegistry) -> Result<Self> {
        parser::parse_policy_with_format(yaml, parser::PolicyFormat::Yaml, builders)
    }

    /// Parses a policy from a JSON document.
    pub fn from_json(json: &str, builders: &BuilderRegistry) -> Result<Self> {
        parser::parse_policy_with_format(json, parser::PolicyFormat::Json, builders)
    }

    /// Serializes the policy to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&writer::policy_to_value(self))?)
    }

    /// Serializes the policy to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&writer::policy_to_value(self))?)
    }

    /// Consumes a canonical policy, returning its `ExactlyOne`.
    pub(crate) fn into_choice(mut self) -> ExactlyOne {
        match (self.components.pop(), self.components.is_empty()) {
            (Some(Component::ExactlyOne(choice)), true) => choice,
            _ => panic!("policy is not in canonical form"),
        }
    }
}

/// The alternatives of a policy, each one the requirement list of an `All`.
#[derive(Debug, Clone)]
pub struct Alternatives {
    inner: std::vec::IntoIter<Vec<Component>>,
}

impl Iterator for Alternatives {
    type Item = Vec<Component>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Alternatives {}
