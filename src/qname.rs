//! Qualified Names
//!
//! A [`QName`] is the (namespace URI, local name) pair used as the key of every
//! global lookup in the resolvers. Prefixes never survive into a `QName`; they
//! are resolved against the declaring schema's bindings on the way in.
//!
//! Two derivation policies exist:
//! - **Prefix-qualified** ([`QName::from_reference`]): unprefixed references
//!   live in the schema's target namespace.
//! - **Contextual** ([`QName::from_type_reference`]): unprefixed type references
//!   live in the namespace the schema assigns to the referencing element, which
//!   is empty for unqualified local elements.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ResolveError, Result};
use crate::schema::{Element, Nesting, SchemaNamespaces};

/// Namespace-qualified name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QName {
    /// Namespace URI (empty for no namespace)
    pub namespace: String,
    /// Local part
    pub local: String,
}

impl QName {
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }

    /// Name in no namespace
    pub fn unqualified(local: impl Into<String>) -> Self {
        Self::new(String::new(), local)
    }

    /// Resolve a possibly-prefixed reference against a schema's bindings.
    ///
    /// No colon: the whole string is the local part and the namespace is the
    /// schema's target namespace. A prefix missing from `xmlns` is an error.
    pub fn from_reference(reference: &str, schema: &SchemaNamespaces) -> Result<Self> {
        match split_prefix(reference) {
            None => Ok(Self::new(schema.target_namespace.as_str(), reference)),
            Some((prefix, local)) => {
                let namespace = lookup_prefix(prefix, reference, schema)?;
                Ok(Self::new(namespace, local))
            }
        }
    }

    /// Resolve the `type` reference of an element.
    ///
    /// Prefixed references go through the schema's bindings like
    /// [`QName::from_reference`]. Unprefixed references take the namespace the
    /// schema assigns to `element` at the given nesting.
    pub fn from_type_reference(
        reference: &str,
        element: &Element,
        nesting: Nesting,
        schema: &SchemaNamespaces,
    ) -> Result<Self> {
        match split_prefix(reference) {
            None => {
                let namespace = schema.xml_name_for_element(element, nesting).namespace;
                Ok(Self::new(namespace, reference))
            }
            Some((prefix, local)) => {
                let namespace = lookup_prefix(prefix, reference, schema)?;
                Ok(Self::new(namespace, local))
            }
        }
    }

    pub fn is_unqualified(&self) -> bool {
        self.namespace.is_empty()
    }
}

/// Strip any prefix from a reference, keeping the local part
pub fn local_part(reference: &str) -> &str {
    split_prefix(reference).map(|(_, local)| local).unwrap_or(reference)
}

fn split_prefix(reference: &str) -> Option<(&str, &str)> {
    reference.split_once(':')
}

fn lookup_prefix(prefix: &str, reference: &str, schema: &SchemaNamespaces) -> Result<String> {
    schema
        .xmlns
        .get(prefix)
        .cloned()
        .ok_or_else(|| ResolveError::UnboundPrefix {
            prefix: prefix.to_string(),
            reference: reference.to_string(),
            namespace: schema.target_namespace.clone(),
        })
}

/// Clark notation: `{namespace}local`, or just `local` with no namespace
impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}
