//! Reduction of component trees to canonical form.
//!
//! Every operator is reduced to a list of alternatives (an `ExactlyOne` of
//! `All`s). Disjunctions concatenate the alternatives of their children;
//! conjunctions take the left-to-right cross product, collapsing to the
//! unsatisfiable empty list as soon as one child has no alternative.

use std::slice;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::assertion::Requirement;
use crate::component::{All, Component, ExactlyOne, OperatorKind, PolicyReference};
use crate::error::{PolicyError, Result};
use crate::policy::Policy;
use crate::registry::PolicyRegistry;

/// One alternative: the requirements of a single `All`.
type Alternative = Vec<Component>;

/// Normalizes any component into a canonical policy.
///
/// When `deep` is set, requirements are given the chance to rewrite
/// themselves through [`Assertion::normalize`]. The result carries the
/// input's `Name` and `Id` if the input is a policy; other attributes are
/// dropped.
///
/// [`Assertion::normalize`]: crate::assertion::Assertion::normalize
pub fn normalize(
    component: &Component,
    registry: Option<&PolicyRegistry>,
    deep: bool,
) -> Result<Policy> {
    Normalizer::new(registry, deep).normalize(component)
}

/// State of a single normalization call.
///
/// Requirement hooks receive the normalizer in use, so nested policies they
/// normalize share its registry and its set of references being inlined.
#[derive(Debug)]
pub struct Normalizer<'a> {
    registry: Option<&'a PolicyRegistry>,
    deep: bool,
    /// URIs currently being inlined, innermost last.
    resolving: Vec<String>,
}

impl<'a> Normalizer<'a> {
    /// Creates a normalizer with no reference being inlined.
    pub fn new(registry: Option<&'a PolicyRegistry>, deep: bool) -> Self {
        Self {
            registry,
            deep,
            resolving: Vec::new(),
        }
    }

    /// Returns the registry references resolve against.
    pub fn registry(&self) -> Option<&'a PolicyRegistry> {
        self.registry
    }

    /// Returns true if requirement hooks are invoked.
    pub fn is_deep(&self) -> bool {
        self.deep
    }

    /// Normalizes a component into a canonical policy.
    ///
    /// A reference back to a URI this normalizer is already inlining fails
    /// with [`PolicyError::CircularReference`].
    pub fn normalize(&mut self, component: &Component) -> Result<Policy> {
        let alternatives = self.normalize_root(component)?;

        let mut policy = Policy::new();
        if let Component::Policy(source) = component {
            if let Some(name) = source.name() {
                policy.set_name(name);
            }
            if let Some(id) = source.id() {
                policy.set_id(id);
            }
        }
        policy.add_component(Component::ExactlyOne(into_choice(alternatives)));
        Ok(policy)
    }

    /// Leaves at the root are treated as the only child of an `All`.
    fn normalize_root(&mut self, component: &Component) -> Result<Vec<Alternative>> {
        match component.kind() {
            Some(kind) => self.normalize_operator(kind, component.components()),
            None => self.normalize_operator(OperatorKind::Conjunction, slice::from_ref(component)),
        }
    }

    fn normalize_operator(
        &mut self,
        kind: OperatorKind,
        children: &[Component],
    ) -> Result<Vec<Alternative>> {
        if children.is_empty() {
            return Ok(match kind {
                OperatorKind::Disjunction => Vec::new(),
                OperatorKind::Conjunction => vec![Vec::new()],
            });
        }

        let contributions = children
            .iter()
            .map(|child| self.contribution(child))
            .collect::<Result<Vec<_>>>()?;

        Ok(match kind {
            OperatorKind::Disjunction => contributions.into_iter().flatten().collect(),
            OperatorKind::Conjunction => cross_product(contributions),
        })
    }

    /// Reduces one child to the alternatives it contributes to its parent.
    fn contribution(&mut self, child: &Component) -> Result<Vec<Alternative>> {
        match child {
            Component::Requirement(requirement) => self.requirement(requirement),
            Component::Reference(reference) => self.reference(reference),
            Component::Policy(policy) => {
                self.normalize_operator(OperatorKind::Conjunction, policy.components())
            }
            Component::ExactlyOne(choice) => {
                self.normalize_operator(OperatorKind::Disjunction, choice.components())
            }
            Component::All(all) => {
                self.normalize_operator(OperatorKind::Conjunction, all.components())
            }
        }
    }

    fn requirement(&mut self, requirement: &Requirement) -> Result<Vec<Alternative>> {
        if !self.deep {
            return Ok(single(Component::Requirement(Arc::clone(requirement))));
        }

        match requirement.normalize(self)? {
            None => Ok(single(Component::Requirement(Arc::clone(requirement)))),
            Some(Component::Requirement(rewritten)) => Ok(single(Component::Requirement(rewritten))),
            Some(Component::Policy(policy)) if policy.is_canonical() => {
                Ok(into_alternatives(policy.into_choice()))
            }
            Some(other) => {
                trace!(
                    requirement = %requirement.name(),
                    shape = other.type_name(),
                    "reducing non-canonical hook result"
                );
                self.shallow(&other)
            }
        }
    }

    fn reference(&mut self, reference: &PolicyReference) -> Result<Vec<Alternative>> {
        let uri = reference.uri();
        if self.resolving.iter().any(|pending| pending == uri) {
            return Err(PolicyError::CircularReference(uri.to_string()));
        }

        let policy = self
            .registry
            .and_then(|registry| registry.lookup(uri))
            .ok_or_else(|| PolicyError::UnresolvedReference(uri.to_string()))?;
        debug!(uri = %uri, depth = self.resolving.len(), "inlining policy reference");

        self.resolving.push(uri.to_string());
        let alternatives = self.normalize_operator(OperatorKind::Conjunction, policy.components());
        self.resolving.pop();
        alternatives
    }

    /// Reduces a component without invoking requirement hooks.
    fn shallow(&mut self, component: &Component) -> Result<Vec<Alternative>> {
        let deep = std::mem::replace(&mut self.deep, false);
        let alternatives = match component.kind() {
            Some(_) => self.contribution(component),
            None => self.normalize_operator(OperatorKind::Conjunction, slice::from_ref(component)),
        };
        self.deep = deep;
        alternatives
    }
}

fn single(component: Component) -> Vec<Alternative> {
    vec![vec![component]]
}

/// Left-to-right cross product; any empty contribution empties the result.
fn cross_product(contributions: Vec<Vec<Alternative>>) -> Vec<Alternative> {
    let mut contributions = contributions.into_iter();
    let Some(mut accumulated) = contributions.next() else {
        return vec![Vec::new()];
    };

    for next in contributions {
        if accumulated.is_empty() || next.is_empty() {
            trace!("conjunction has an unsatisfiable child");
            return Vec::new();
        }
        trace!(left = accumulated.len(), right = next.len(), "combining alternatives");
        accumulated = accumulated
            .iter()
            .flat_map(|left| {
                next.iter()
                    .map(move |right| left.iter().chain(right).cloned().collect::<Alternative>())
            })
            .collect();
    }
    accumulated
}

fn into_choice(alternatives: Vec<Alternative>) -> ExactlyOne {
    alternatives
        .into_iter()
        .map(|alternative| Component::All(All::from_iter(alternative)))
        .collect()
}

/// Unpacks the `All` children of a canonical choice.
fn into_alternatives(choice: ExactlyOne) -> Vec<Alternative> {
    choice
        .into_components()
        .into_iter()
        .map(|component| match component {
            Component::All(all) => all.into_components(),
            other => unreachable!("canonical choice holds {}", other.type_name()),
        })
        .collect()
}
