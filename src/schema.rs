//! Schema tree model
//!
//! Owned, serde-friendly structs for an already-parsed XSD forest. The parser
//! that produces them lives elsewhere; the resolvers read most fields and
//! write back only the attribute fields filled in by reference resolution.
//!
//! Each [`Schema`] keeps its namespace header ([`SchemaNamespaces`]) apart from
//! its declaration lists so traversals can borrow the header immutably while
//! mutating declarations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::qname::QName;

// =============================================================================
// Form
// =============================================================================

/// `elementFormDefault` / `attributeFormDefault` / `form` value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Form {
    Qualified,
    #[default]
    Unqualified,
}

/// Where an element declaration sits in its schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Nesting {
    /// Declared directly under `xs:schema`
    TopLevel,
    /// Declared inside a complex type
    Local,
}

// =============================================================================
// Schema
// =============================================================================

/// Namespace header of one schema document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaNamespaces {
    /// `targetNamespace` (empty for chameleon/no-namespace schemas)
    #[serde(default)]
    pub target_namespace: String,

    /// Prefix -> namespace URI bindings in scope for the document
    #[serde(default)]
    pub xmlns: BTreeMap<String, String>,

    #[serde(default)]
    pub element_form_default: Form,

    #[serde(default)]
    pub attribute_form_default: Form,
}

impl SchemaNamespaces {
    pub fn new(target_namespace: impl Into<String>) -> Self {
        Self {
            target_namespace: target_namespace.into(),
            ..Default::default()
        }
    }

    /// Bind a prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.xmlns.insert(prefix.into(), uri.into());
        self
    }

    pub fn with_element_form_default(mut self, form: Form) -> Self {
        self.element_form_default = form;
        self
    }

    pub fn with_attribute_form_default(mut self, form: Form) -> Self {
        self.attribute_form_default = form;
        self
    }

    /// Name this schema gives an element on the wire.
    ///
    /// An explicit `form` wins. Otherwise top-level elements are always
    /// qualified and local elements follow `elementFormDefault`.
    pub fn xml_name_for_element(&self, element: &Element, nesting: Nesting) -> QName {
        let form = element.form.unwrap_or(match nesting {
            Nesting::TopLevel => Form::Qualified,
            Nesting::Local => self.element_form_default,
        });
        self.qualify(form, &element.name)
    }

    /// Name this schema gives an attribute on the wire.
    ///
    /// An explicit `form` wins, otherwise `attributeFormDefault`.
    pub fn xml_name_for_attribute(&self, attribute: &Attribute) -> QName {
        let form = attribute.form.unwrap_or(self.attribute_form_default);
        self.qualify(form, &attribute.name)
    }

    fn qualify(&self, form: Form, local: &str) -> QName {
        match form {
            Form::Qualified => QName::new(self.target_namespace.as_str(), local),
            Form::Unqualified => QName::unqualified(local),
        }
    }
}

/// One parsed XSD document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(flatten)]
    pub namespaces: SchemaNamespaces,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<Element>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub complex_types: Vec<ComplexType>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub simple_types: Vec<SimpleType>,

    /// Top-level (global) attribute declarations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
}

impl Schema {
    pub fn new(namespaces: SchemaNamespaces) -> Self {
        Self {
            namespaces,
            ..Default::default()
        }
    }

    pub fn target_namespace(&self) -> &str {
        &self.namespaces.target_namespace
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    pub fn with_complex_type(mut self, complex_type: ComplexType) -> Self {
        self.complex_types.push(complex_type);
        self
    }

    pub fn with_simple_type(mut self, simple_type: SimpleType) -> Self {
        self.simple_types.push(simple_type);
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }
}

// =============================================================================
// Declarations
// =============================================================================

/// `xs:element`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,

    /// Possibly-prefixed type reference; empty for inline types
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub type_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<Form>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complex_type: Option<Box<ComplexType>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple_type: Option<SimpleType>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }

    pub fn with_form(mut self, form: Form) -> Self {
        self.form = Some(form);
        self
    }

    pub fn with_complex_type(mut self, complex_type: ComplexType) -> Self {
        self.complex_type = Some(Box::new(complex_type));
        self
    }

    pub fn with_simple_type(mut self, simple_type: SimpleType) -> Self {
        self.simple_type = Some(simple_type);
        self
    }
}

/// `xs:complexType`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexType {
    /// Empty for anonymous (inline) types
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sequence: Vec<Element>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choice: Vec<Element>,

    /// Members of a choice nested in a sequence (or vice versa)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sequence_choice: Vec<Element>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all: Vec<Element>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,

    #[serde(default)]
    pub complex_content: ComplexContent,

    #[serde(default)]
    pub simple_content: SimpleContent,
}

impl ComplexType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Anonymous type for inline use under an element
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_sequence(mut self, element: Element) -> Self {
        self.sequence.push(element);
        self
    }

    pub fn with_choice(mut self, element: Element) -> Self {
        self.choice.push(element);
        self
    }

    pub fn with_all(mut self, element: Element) -> Self {
        self.all.push(element);
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }
}

/// `xs:complexContent`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexContent {
    #[serde(default)]
    pub extension: Extension,
}

/// `xs:complexContent/xs:extension`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extension {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub base: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sequence: Vec<Element>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choice: Vec<Element>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sequence_choice: Vec<Element>,
}

/// `xs:simpleContent`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleContent {
    #[serde(default)]
    pub extension: SimpleExtension,
}

/// `xs:simpleContent/xs:extension`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleExtension {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub base: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
}

/// `xs:simpleType`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleType {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default)]
    pub restriction: Restriction,
}

impl SimpleType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Anonymous restriction of `base`
    pub fn restricting(base: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            restriction: Restriction { base: base.into() },
        }
    }
}

/// `xs:restriction`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Restriction {
    #[serde(default)]
    pub base: String,
}

/// `xs:attribute`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Possibly-prefixed reference to a global attribute
    #[serde(default, rename = "ref", skip_serializing_if = "String::is_empty")]
    pub reference: String,

    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub type_name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fixed: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<Form>,

    /// Namespace filled in when a reference is resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple_type: Option<SimpleType>,
}

impl Attribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Declaration that borrows a global attribute
    pub fn referencing(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }

    pub fn with_fixed(mut self, fixed: impl Into<String>) -> Self {
        self.fixed = fixed.into();
        self
    }

    pub fn with_form(mut self, form: Form) -> Self {
        self.form = Some(form);
        self
    }

    pub fn with_simple_type(mut self, simple_type: SimpleType) -> Self {
        self.simple_type = Some(simple_type);
        self
    }

    pub fn is_reference(&self) -> bool {
        !self.reference.is_empty()
    }
}

// =============================================================================
// Forest
// =============================================================================

/// Ordered set of schemas processed together in one generation run.
///
/// Target namespaces are not unique: several documents may share one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Forest {
    schemas: Vec<Schema>,
}

impl Forest {
    pub fn new(schemas: Vec<Schema>) -> Self {
        Self { schemas }
    }

    pub fn schemas(&self) -> &[Schema] {
        &self.schemas
    }

    pub fn schemas_mut(&mut self) -> &mut [Schema] {
        &mut self.schemas
    }

    pub fn push(&mut self, schema: Schema) {
        self.schemas.push(schema);
    }

    pub fn get(&self, index: usize) -> Option<&Schema> {
        self.schemas.get(index)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// All schemas declaring into `namespace`, in input order
    pub fn find_by_namespace<'a>(&'a self, namespace: &'a str) -> impl Iterator<Item = &'a Schema> + 'a {
        self.schemas
            .iter()
            .filter(move |s| s.namespaces.target_namespace == namespace)
    }
}

impl From<Vec<Schema>> for Forest {
    fn from(schemas: Vec<Schema>) -> Self {
        Self::new(schemas)
    }
}

impl FromIterator<Schema> for Forest {
    fn from_iter<I: IntoIterator<Item = Schema>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
