//! Renders component trees back into the document dialect read by
//! [`parser`](crate::parser).

use serde_json::{Map, Value};

use crate::component::Component;
use crate::error::Result;
use crate::parser::{
    ALL, ATTRIBUTES_KEY, COMPONENTS_KEY, EXACTLY_ONE, ID_KEY, NAME_KEY, POLICY, POLICY_REFERENCE,
};
use crate::policy::Policy;
use crate::qname::QName;

/// Renders any component as a document node.
pub fn component_to_value(component: &Component) -> Value {
    match component {
        Component::Policy(policy) => policy_to_value(policy),
        Component::ExactlyOne(choice) => element(EXACTLY_ONE, children(choice.components())),
        Component::All(all) => element(ALL, children(all.components())),
        Component::Requirement(requirement) => {
            element(&requirement.name().to_string(), requirement.to_value())
        }
        Component::Reference(reference) => {
            element(POLICY_REFERENCE, Value::String(reference.uri().to_string()))
        }
    }
}

/// Renders a policy as a `Policy` node.
pub fn policy_to_value(policy: &Policy) -> Value {
    let mut body = Map::new();
    let mut extra = Map::new();

    for (name, value) in policy.attributes() {
        let value = Value::String(value.clone());
        if *name == QName::policy_name() {
            body.insert(NAME_KEY.to_string(), value);
        } else if *name == QName::policy_id() {
            body.insert(ID_KEY.to_string(), value);
        } else {
            extra.insert(name.to_string(), value);
        }
    }
    if !extra.is_empty() {
        body.insert(ATTRIBUTES_KEY.to_string(), Value::Object(extra));
    }
    body.insert(COMPONENTS_KEY.to_string(), children(policy.components()));

    element(POLICY, Value::Object(body))
}

/// Serializes a component as pretty JSON.
pub fn to_json(component: &Component) -> Result<String> {
    Ok(serde_json::to_string_pretty(&component_to_value(component))?)
}

/// Serializes a component as YAML.
pub fn to_yaml(component: &Component) -> Result<String> {
    Ok(serde_yaml::to_string(&component_to_value(component))?)
}

fn children(components: &[Component]) -> Value {
    Value::Array(components.iter().map(component_to_value).collect())
}

fn element(name: &str, body: Value) -> Value {
    let mut node = Map::new();
    node.insert(name.to_string(), body);
    Value::Object(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::PrimitiveAssertion;
    use crate::builder::BuilderRegistry;
    use crate::component::{All, ExactlyOne, PolicyReference};
    use crate::parser;
    use serde_json::json;

    fn sample() -> Policy {
        let mut policy = Policy::new().with_name("urn:policy:transport").with_id("t1");
        policy.set_attribute(QName::new("urn:meta", "owner"), "platform");
        policy
            .with_component(
                PrimitiveAssertion::new(QName::new("urn:sec", "EncryptionStrength"))
                    .with_value("bits", json!(256))
                    .into_component(),
            )
            .with_component(ExactlyOne::from_iter([
                Component::All(All::new()),
                Component::All(All::from_iter([PrimitiveAssertion::new(QName::local(
                    "Audit",
                ))
                .with_optional(true)
                .into_component()])),
            ]))
            .with_component(PolicyReference::new("urn:policy:logging"))
    }

    #[test]
    fn test_policy_node_layout() {
        let value = policy_to_value(&sample());
        assert_eq!(value["Policy"]["Name"], json!("urn:policy:transport"));
        assert_eq!(value["Policy"]["Id"], json!("t1"));
        assert_eq!(
            value["Policy"]["attributes"],
            json!({"{urn:meta}owner": "platform"})
        );
        assert_eq!(
            value["Policy"]["components"][0],
            json!({"{urn:sec}EncryptionStrength": {"bits": 256}})
        );
        assert_eq!(
            value["Policy"]["components"][2],
            json!({"PolicyReference": "urn:policy:logging"})
        );
    }

    #[test]
    fn test_written_documents_parse_back() {
        let builders = BuilderRegistry::new();
        let policy = sample();

        let from_json = parser::parse_policy(&to_json(&policy.clone().into()).unwrap(), &builders);
        assert_eq!(from_json.unwrap(), policy);

        let from_yaml = parser::parse_policy(&policy.to_yaml().unwrap(), &builders);
        assert_eq!(from_yaml.unwrap(), policy);
    }

    #[test]
    fn test_empty_policy_has_empty_components() {
        assert_eq!(
            policy_to_value(&Policy::new()),
            json!({"Policy": {"components": []}})
        );
    }
}
