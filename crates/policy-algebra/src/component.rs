//! The component tree: operators, requirements and references.

use crate::assertion::Requirement;
use crate::policy::Policy;

/// Combination semantics of an operator node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    /// Every child must hold (`Policy`, `All`).
    Conjunction,
    /// Exactly one child must hold (`ExactlyOne`).
    Disjunction,
}

/// A node of a policy expression.
#[derive(Debug, Clone)]
pub enum Component {
    Policy(Policy),
    ExactlyOne(ExactlyOne),
    All(All),
    Requirement(Requirement),
    Reference(PolicyReference),
}

impl Component {
    /// Returns the operator kind, or `None` for leaves.
    pub fn kind(&self) -> Option<OperatorKind> {
        match self {
            Component::Policy(_) | Component::All(_) => Some(OperatorKind::Conjunction),
            Component::ExactlyOne(_) => Some(OperatorKind::Disjunction),
            Component::Requirement(_) | Component::Reference(_) => None,
        }
    }

    /// Returns true for `Policy`, `ExactlyOne` and `All`.
    pub fn is_operator(&self) -> bool {
        self.kind().is_some()
    }

    /// Returns the ordered children of an operator.
    ///
    /// # Panics
    ///
    /// Panics if called on a requirement or reference.
    pub fn components(&self) -> &[Component] {
        match self {
            Component::Policy(p) => p.components(),
            Component::ExactlyOne(e) => e.components(),
            Component::All(a) => a.components(),
            leaf => panic!("{} has no child components", leaf.type_name()),
        }
    }

    /// Appends a child to an operator.
    ///
    /// # Panics
    ///
    /// Panics if called on a requirement or reference.
    pub fn add_component(&mut self, component: Component) {
        match self {
            Component::Policy(p) => p.add_component(component),
            Component::ExactlyOne(e) => e.add_component(component),
            Component::All(a) => a.add_component(component),
            leaf => panic!("cannot add a child to {}", leaf.type_name()),
        }
    }

    /// Returns true if an operator has no children.
    ///
    /// # Panics
    ///
    /// Panics if called on a requirement or reference.
    pub fn is_empty(&self) -> bool {
        self.components().is_empty()
    }

    /// Short variant name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Component::Policy(_) => "Policy",
            Component::ExactlyOne(_) => "ExactlyOne",
            Component::All(_) => "All",
            Component::Requirement(_) => "Requirement",
            Component::Reference(_) => "PolicyReference",
        }
    }
}

/// Order-sensitive structural equality of two trees.
///
/// Operators compare variant and children pairwise in order, policies also
/// compare attributes, requirements compare through [`Assertion::equal`],
/// references compare URIs.
///
/// [`Assertion::equal`]: crate::assertion::Assertion::equal
pub fn equal(x: &Component, y: &Component) -> bool {
    x == y
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Component::Policy(a), Component::Policy(b)) => a == b,
            (Component::ExactlyOne(a), Component::ExactlyOne(b)) => a == b,
            (Component::All(a), Component::All(b)) => a == b,
            (Component::Requirement(a), Component::Requirement(b)) => a.equal(b.as_ref()),
            (Component::Reference(a), Component::Reference(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Policy> for Component {
    fn from(policy: Policy) -> Self {
        Component::Policy(policy)
    }
}

impl From<ExactlyOne> for Component {
    fn from(choice: ExactlyOne) -> Self {
        Component::ExactlyOne(choice)
    }
}

impl From<All> for Component {
    fn from(all: All) -> Self {
        Component::All(all)
    }
}

impl From<PolicyReference> for Component {
    fn from(reference: PolicyReference) -> Self {
        Component::Reference(reference)
    }
}

macro_rules! operator {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            components: Vec<Component>,
        }

        impl $name {
            /// Creates an empty operator.
            pub fn new() -> Self {
                Self::default()
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

            /// Consumes the operator, returning its children.
            pub fn into_components(self) -> Vec<Component> {
                self.components
            }

            /// Returns true if there are no children.
            pub fn is_empty(&self) -> bool {
                self.components.is_empty()
            }
        }

        impl FromIterator<Component> for $name {
            fn from_iter<I: IntoIterator<Item = Component>>(iter: I) -> Self {
                Self {
                    components: iter.into_iter().collect(),
                }
            }
        }
    };
}

operator!(
    /// Disjunction: satisfy exactly one child. Empty means unsatisfiable.
    ExactlyOne
);

operator!(
    /// Conjunction: satisfy every child. Empty means vacuously satisfied.
    All
);

impl ExactlyOne {
    /// Returns the alternatives of a canonical choice, `None` if any child is
    /// not an `All`.
    pub fn alternatives(&self) -> Option<Vec<&All>> {
        self.components
            .iter()
            .map(|c| match c {
                Component::All(all) => Some(all),
                _ => None,
            })
            .collect()
    }
}

/// A named pointer to a registered policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyReference {
    uri: String,
}

impl PolicyReference {
    /// Creates a reference to the given URI.
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    /// Returns the referenced URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::PrimitiveAssertion;
    use crate::qname::QName;

    fn req(name: &str) -> Component {
        PrimitiveAssertion::new(QName::local(name)).into_component()
    }

    #[test]
    fn test_operator_kinds() {
        assert_eq!(
            Component::Policy(Policy::new()).kind(),
            Some(OperatorKind::Conjunction)
        );
        assert_eq!(
            Component::All(All::new()).kind(),
            Some(OperatorKind::Conjunction)
        );
        assert_eq!(
            Component::ExactlyOne(ExactlyOne::new()).kind(),
            Some(OperatorKind::Disjunction)
        );
        assert_eq!(req("A").kind(), None);
        assert!(!Component::Reference(PolicyReference::new("#p")).is_operator());
    }

    #[test]
    fn test_append_and_query() {
        let mut all = Component::All(All::new());
        assert!(all.is_empty());
        all.add_component(req("A"));
        all.add_component(req("B"));
        assert!(!all.is_empty());
        assert_eq!(all.components().len(), 2);
        assert_eq!(all.components()[0], req("A"));
    }

    #[test]
    #[should_panic(expected = "has no child components")]
    fn test_leaf_has_no_children() {
        req("A").components();
    }

    #[test]
    fn test_equality_is_order_sensitive() {
        let ab: All = [req("A"), req("B")].into_iter().collect();
        let ba: All = [req("B"), req("A")].into_iter().collect();
        assert!(equal(&ab.clone().into(), &ab.clone().into()));
        assert!(!equal(&ab.into(), &ba.into()));
    }

    #[test]
    fn test_equality_distinguishes_variants() {
        let all: Component = All::from_iter([req("A")]).into();
        let choice: Component = ExactlyOne::from_iter([req("A")]).into();
        assert_ne!(all, choice);
        assert_ne!(
            Component::from(PolicyReference::new("#a")),
            Component::from(PolicyReference::new("#b"))
        );
    }
}
