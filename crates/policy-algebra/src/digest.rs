//! Content digests of component trees.
//!
//! A tree is rendered with [`writer::component_to_value`], serialized as
//! canonical JSON (sorted keys, no whitespace) and hashed with SHA-256.
//! Structurally equal trees therefore share a digest.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::component::Component;
use crate::policy::Policy;
use crate::writer;

/// Prefix of policy digests.
pub const DIGEST_PREFIX: &str = "sha256:";

/// Computes the digest of a component tree.
pub fn digest(component: &Component) -> String {
    digest_value(&writer::component_to_value(component))
}

/// Computes the digest of a policy.
pub fn policy_digest(policy: &Policy) -> String {
    digest_value(&writer::policy_to_value(policy))
}

fn digest_value(value: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonicalize(value).as_bytes());
    format!("{}{}", DIGEST_PREFIX, hex::encode(hasher.finalize()))
}

/// Serializes a JSON value with object keys in lexicographic order.
pub fn canonicalize(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(&mut out, value);
    out
}

fn write_canonical(out: &mut String, value: &Value) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));

            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Scalars and keys share serde_json's escaping.
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(out, item);
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

impl Policy {
    /// Returns the content digest of this policy as written.
    ///
    /// Normalize first to compare policies by meaning rather than by shape.
    pub fn digest(&self) -> String {
        policy_digest(self)
    }
}
