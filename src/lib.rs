//! XSD Semantic Resolution
//!
//! The cross-schema phase of a WSDL/XSD code generator. Given a forest of
//! already-parsed schema documents it:
//!
//! - **Resolves attribute references**: every `<xs:attribute ref="p:name"/>`
//!   is rewritten with the name, type, `fixed` value and namespace of the
//!   global attribute it points at, looked up across all schemas.
//! - **Names types**: infers the external XML name of each named type from the
//!   elements declared with it, falling back to the type's own name when they
//!   disagree.
//!
//! ## Pipeline
//!
//! ```text
//! parser ──> Forest ──> resolve_attribute_refs (mutates attributes)
//!                   └─> TypeNameResolver::build ──> name_for_type (read-only)
//!                                                         │
//!                                                         └──> emitter
//! ```
//!
//! Both passes use the shared [`walk`] traversal and [`QName`] keys. Indexes
//! live for one run and are dropped with it.

pub mod config;
pub mod error;
pub mod loader;
pub mod qname;
pub mod resolve;
pub mod schema;
pub mod walk;

pub use config::{ErrorPolicy, ResolverConfig, TypeNaming};
pub use error::{ResolveError, Result};
pub use loader::{load_from_path, LoadedForest};
pub use qname::QName;
pub use resolve::{
    resolve_attribute_refs, ResolutionReport, ResolvedForest, Resolver, TypeNameResolution,
    TypeNameResolver,
};
pub use schema::{Attribute, ComplexType, Element, Forest, Form, Nesting, Schema, SchemaNamespaces, SimpleType};
