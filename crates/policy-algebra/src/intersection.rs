//! Domain-independent policy intersection.
//!
//! Two alternatives are compatible when they require the same set of
//! requirement names. Their intersection is the concatenation of both; what
//! the combined requirements mean is left to the domain.

use std::collections::BTreeSet;

use tracing::debug;

use crate::component::{All, Component, ExactlyOne};
use crate::error::Result;
use crate::policy::Policy;
use crate::qname::QName;
use crate::registry::PolicyRegistry;

/// Returns the requirement names used by an alternative.
pub fn alternative_vocabulary(alternative: &[Component]) -> BTreeSet<QName> {
    alternative
        .iter()
        .filter_map(|component| match component {
            Component::Requirement(requirement) => Some(requirement.name().clone()),
            _ => None,
        })
        .collect()
}

/// Returns true if two alternatives use the same requirement names.
pub fn compatible_alternatives(a: &[Component], b: &[Component]) -> bool {
    alternative_vocabulary(a) == alternative_vocabulary(b)
}

impl Policy {
    /// Returns the requirement names used across all alternatives of the
    /// deep canonical form.
    pub fn vocabulary(&self, registry: Option<&PolicyRegistry>) -> Result<BTreeSet<QName>> {
        Ok(deep_alternatives(self, registry)?
            .iter()
            .flat_map(|alternative| alternative_vocabulary(alternative))
            .collect())
    }

    /// Intersects two policies.
    ///
    /// The result is canonical, with one alternative per compatible pair in
    /// (self, other) order. An empty choice means nothing is compatible.
    pub fn intersect(&self, other: &Policy, registry: Option<&PolicyRegistry>) -> Result<Policy> {
        let left = deep_alternatives(self, registry)?;
        let right = deep_alternatives(other, registry)?;

        let mut choice = ExactlyOne::new();
        for a in &left {
            for b in right.iter().filter(|b| compatible_alternatives(a, b)) {
                let combined = a.iter().chain(b.iter()).cloned();
                choice.add_component(Component::All(All::from_iter(combined)));
            }
        }
        debug!(
            left = left.len(),
            right = right.len(),
            compatible = choice.components().len(),
            "intersected policies"
        );

        Ok(Policy::new().with_component(choice))
    }

    /// Returns true if the two policies share at least one compatible pair of
    /// alternatives.
    pub fn is_compatible(&self, other: &Policy, registry: Option<&PolicyRegistry>) -> Result<bool> {
        Ok(!self.intersect(other, registry)?.into_choice().is_empty())
    }
}

fn deep_alternatives(
    policy: &Policy,
    registry: Option<&PolicyRegistry>,
) -> Result<Vec<Vec<Component>>> {
    Ok(policy
        .normalize(registry, true)?
        .into_choice()
        .into_components()
        .into_iter()
        .filter_map(|alternative| match alternative {
            Component::All(all) => Some(all.into_components()),
            _ => None,
        })
        .collect())
}
