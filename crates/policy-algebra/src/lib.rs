//! Policy algebra
//!
//! Represents alternative-based requirement sets ("encryption strength X
//! AND either token type A or token type B") as a small tree grammar and
//! reduces any such tree to its canonical form: one `ExactlyOne` of `All`s,
//! where each `All` is a complete, independent way to comply.
//!
//! The crate compiles to both WASM and native targets.

pub mod assertion;
pub mod builder;
pub mod component;
pub mod digest;
pub mod error;
pub mod intersection;
pub mod normalizer;
pub mod parser;
pub mod policy;
pub mod qname;
pub mod registry;
pub mod writer;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use assertion::{Assertion, PrimitiveAssertion, Requirement};
pub use builder::{AssertionBuilder, BuilderRegistry};
pub use component::{equal, All, Component, ExactlyOne, OperatorKind, PolicyReference};
pub use error::{PolicyError, Result};
pub use normalizer::{normalize, Normalizer};
pub use policy::{Alternatives, Policy};
pub use qname::QName;
pub use registry::PolicyRegistry;

/// Version of the policy algebra.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::assertion::{Assertion, PrimitiveAssertion, Requirement};
    pub use crate::builder::{AssertionBuilder, BuilderRegistry};
    pub use crate::component::{All, Component, ExactlyOne, OperatorKind, PolicyReference};
    pub use crate::error::{PolicyError, Result};
    pub use crate::normalizer::{normalize, Normalizer};
    pub use crate::policy::{Alternatives, Policy};
    pub use crate::qname::QName;
    pub use crate::registry::PolicyRegistry;
}
