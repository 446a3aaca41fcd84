//! Qualified names for requirements and policy attributes.

use std::fmt;
use std::str::FromStr;

use crate::error::PolicyError;

/// WS-Security utility namespace, home of the `Id` attribute.
pub const WSU_NAMESPACE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";

/// WS-Policy 1.5 namespace.
pub const WSP_NAMESPACE: &str = "http://www.w3.org/ns/ws-policy";

/// A namespace-qualified name.
///
/// Rendered and parsed in Clark notation: `{namespace}local`, or just `local`
/// when the namespace is empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QName {
    namespace: String,
    local: String,
}

impl QName {
    /// Creates a qualified name in the given namespace.
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }

    /// Creates an unqualified name.
    pub fn local(local: impl Into<String>) -> Self {
        Self::new(String::new(), local)
    }

    /// The unprefixed `Name` policy attribute.
    pub fn policy_name() -> Self {
        Self::local("Name")
    }

    /// The `wsu:Id` policy attribute.
    pub fn policy_id() -> Self {
        Self::new(WSU_NAMESPACE, "Id")
    }

    /// Returns the namespace, empty when unqualified.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the local part.
    pub fn local_part(&self) -> &str {
        &self.local
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}

impl FromStr for QName {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PolicyError::InvalidDocument(format!("Invalid qualified name '{}'", s));

        let qname = match s.strip_prefix('{') {
            Some(rest) => {
                let (namespace, local) = rest.split_once('}').ok_or_else(invalid)?;
                QName::new(namespace, local)
            }
            None => QName::local(s),
        };

        if qname.local.is_empty() || qname.local.contains(['{', '}']) {
            return Err(invalid());
        }
        Ok(qname)
    }
}
