//! Policy document parser.
//!
//! Documents are JSON or YAML. Every node is a single-key map: the key names
//! the element, the value is its body.
//!
//! ```yaml
//! Policy:
//!   Name: urn:policy:transport
//!   components:
//!     - "{urn:sec}EncryptionStrength": { bits: 256 }
//!     - ExactlyOne:
//!         - All: [ "{urn:sec}UsernameToken": null ]
//!         - All: [ "{urn:sec}X509Token": { optional: true } ]
//!     - PolicyReference: urn:policy:logging
//! ```
//!
//! Element names other than the operators are requirements, built through
//! the [`BuilderRegistry`].

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::builder::BuilderRegistry;
use crate::component::{All, Component, ExactlyOne, PolicyReference};
use crate::error::{PolicyError, Result};
use crate::policy::Policy;
use crate::qname::{QName, WSP_NAMESPACE};
use crate::registry::PolicyRegistry;

pub(crate) const POLICY: &str = "Policy";
pub(crate) const EXACTLY_ONE: &str = "ExactlyOne";
pub(crate) const ALL: &str = "All";
pub(crate) const POLICY_REFERENCE: &str = "PolicyReference";

pub(crate) const NAME_KEY: &str = "Name";
pub(crate) const ID_KEY: &str = "Id";
pub(crate) const ATTRIBUTES_KEY: &str = "attributes";
pub(crate) const COMPONENTS_KEY: &str = "components";

/// Supported policy document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyFormat {
    Yaml,
    Json,
}

impl PolicyFormat {
    /// Detects format from file extension.
    pub fn from_extension(path: &str) -> Option<Self> {
        if path.ends_with(".yaml") || path.ends_with(".yml") {
            Some(PolicyFormat::Yaml)
        } else if path.ends_with(".json") {
            Some(PolicyFormat::Json)
        } else {
            None
        }
    }

    /// Detects format from content.
    pub fn detect(content: &str) -> Self {
        if content.trim_start().starts_with('{') {
            PolicyFormat::Json
        } else {
            PolicyFormat::Yaml
        }
    }

    fn read(self, content: &str) -> Result<Value> {
        match self {
            PolicyFormat::Yaml => Ok(serde_yaml::from_str(content)?),
            PolicyFormat::Json => {
                serde_json::from_str(content).map_err(|e| PolicyError::ParseError(e.to_string()))
            }
        }
    }
}

/// Parses a policy, auto-detecting the format.
pub fn parse_policy(content: &str, builders: &BuilderRegistry) -> Result<Policy> {
    parse_policy_with_format(content, PolicyFormat::detect(content), builders)
}

/// Parses a policy in the given format.
pub fn parse_policy_with_format(
    content: &str,
    format: PolicyFormat,
    builders: &BuilderRegistry,
) -> Result<Policy> {
    policy_from_value(&format.read(content)?, builders)
}

/// Parses any component, auto-detecting the format.
pub fn parse_component(content: &str, builders: &BuilderRegistry) -> Result<Component> {
    component_from_value(&PolicyFormat::detect(content).read(content)?, builders)
}

/// Parses every policy of a multi-document YAML stream.
pub fn parse_policies_yaml(content: &str, builders: &BuilderRegistry) -> Result<Vec<Policy>> {
    serde_yaml::Deserializer::from_str(content)
        .map(|document| {
            let value = Value::deserialize(document)?;
            policy_from_value(&value, builders)
        })
        .collect()
}

/// Registers every policy of a URI -> policy document map.
///
/// ```yaml
/// urn:policy:logging:
///   Policy: { components: [ "{urn:ops}AuditLog": null ] }
/// ```
///
/// Returns the number of policies registered. Nothing is registered if any
/// entry fails to parse.
pub fn register_policies(
    content: &str,
    builders: &BuilderRegistry,
    registry: &PolicyRegistry,
) -> Result<usize> {
    let value = PolicyFormat::detect(content).read(content)?;
    let entries = value
        .as_object()
        .ok_or_else(|| invalid("policy set must map URIs to policies"))?;

    let policies = entries
        .iter()
        .map(|(uri, node)| Ok((uri.clone(), policy_from_value(node, builders)?)))
        .collect::<Result<Vec<_>>>()?;

    let count = policies.len();
    for (uri, policy) in policies {
        registry.register(uri, policy);
    }
    Ok(count)
}

/// Builds a policy from a `Policy` node.
pub fn policy_from_value(value: &Value, builders: &BuilderRegistry) -> Result<Policy> {
    match component_from_value(value, builders)? {
        Component::Policy(policy) => Ok(policy),
        other => Err(invalid(format!("expected Policy, found {}", other.type_name()))),
    }
}

/// Builds a component from a node.
pub fn component_from_value(value: &Value, builders: &BuilderRegistry) -> Result<Component> {
    let (key, body) = single_entry(value)?;
    let name: QName = key.parse()?;

    let operator = if name.namespace().is_empty() || name.namespace() == WSP_NAMESPACE {
        name.local_part()
    } else {
        ""
    };

    match operator {
        POLICY => Ok(Component::Policy(policy_body(body, builders)?)),
        EXACTLY_ONE => Ok(Component::ExactlyOne(ExactlyOne::from_iter(children(body, builders)?))),
        ALL => Ok(Component::All(All::from_iter(children(body, builders)?))),
        POLICY_REFERENCE => {
            let uri = body
                .as_str()
                .ok_or_else(|| invalid("PolicyReference body must be a URI string"))?;
            Ok(Component::Reference(PolicyReference::new(uri)))
        }
        _ => Ok(Component::Requirement(builders.build(&name, body)?)),
    }
}

fn policy_body(body: &Value, builders: &BuilderRegistry) -> Result<Policy> {
    let empty = Map::new();
    let fields = match body {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => return Err(invalid("Policy body must be a map")),
    };

    let mut policy = Policy::new();
    for (key, value) in fields {
        match key.as_str() {
            NAME_KEY => policy.set_name(string_field(key, value)?),
            ID_KEY => policy.set_id(string_field(key, value)?),
            ATTRIBUTES_KEY => {
                let attributes = value
                    .as_object()
                    .ok_or_else(|| invalid("Policy attributes must be a map"))?;
                for (name, value) in attributes {
                    policy.set_attribute(name.parse()?, string_field(name, value)?);
                }
            }
            COMPONENTS_KEY => policy.add_components(children(value, builders)?),
            other => return Err(invalid(format!("unknown Policy field '{}'", other))),
        }
    }
    Ok(policy)
}

fn children(body: &Value, builders: &BuilderRegistry) -> Result<Vec<Component>> {
    match body {
        Value::Null => Ok(Vec::new()),
        Value::Array(nodes) => nodes
            .iter()
            .map(|node| component_from_value(node, builders))
            .collect(),
        _ => Err(invalid("operator body must be a list of components")),
    }
}

fn single_entry(value: &Value) -> Result<(&String, &Value)> {
    value
        .as_object()
        .filter(|map| map.len() == 1)
        .and_then(|map| map.iter().next())
        .ok_or_else(|| invalid(format!("expected a single-key element map, found {}", value)))
}

fn string_field(key: &str, value: &Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid(format!("'{}' must be a string", key)))
}

fn invalid(message: impl Into<String>) -> PolicyError {
    PolicyError::InvalidDocument(message.into())
}
