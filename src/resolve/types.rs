//! Type Name Resolution
//!
//! Named XSD types have no wire name of their own. When a generated type needs
//! one, it borrows the name of the elements declared with that type:
//!
//! - no element uses the type: `(schema target namespace, type name)`
//! - all elements agree on name and namespace: that element's name
//! - elements disagree: `(schema target namespace, type name)` again
//!
//! The last case is lossy. Emitters should treat [`TypeNameResolution::Ambiguous`]
//! as "no faithful external name" rather than trusting the fallback.
//!
//! The index is built once per forest and never mutates the schemas.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::config::TypeNaming;
use crate::qname::{local_part, QName};
use crate::schema::{Element, Forest, Nesting, SchemaNamespaces};
use crate::walk::{walk, Scope, Visitor};

/// An element declared with a named type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeUsage {
    /// Position of the declaring schema in the forest
    pub schema_index: usize,
    /// Element name as declared
    pub element: String,
    pub nesting: Nesting,
    /// Name the declaring schema gives the element on the wire
    pub xml_name: QName,
}

/// Answer to "which XML name should this type use?"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum TypeNameResolution {
    /// No element uses the type; the type's own name
    Unused(QName),
    /// Every element using the type shares this name
    Unique(QName),
    /// Elements disagree; the type's own name as a fallback
    Ambiguous(QName),
}

impl TypeNameResolution {
    pub fn qname(&self) -> &QName {
        match self {
            Self::Unused(name) | Self::Unique(name) | Self::Ambiguous(name) => name,
        }
    }

    pub fn into_qname(self) -> QName {
        match self {
            Self::Unused(name) | Self::Unique(name) | Self::Ambiguous(name) => name,
        }
    }

    pub fn is_unique(&self) -> bool {
        matches!(self, Self::Unique(_))
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous(_))
    }
}

#[derive(Debug, Clone)]
enum TypeIndex {
    NamespaceAware(HashMap<QName, Vec<TypeUsage>>),
    LocalNameOnly(HashMap<String, Vec<TypeUsage>>),
}

/// Element-by-type index for one forest
#[derive(Debug, Clone)]
pub struct TypeNameResolver {
    index: TypeIndex,
}

struct IndexBuilder {
    index: TypeIndex,
    indexed: usize,
}

impl Visitor for IndexBuilder {
    fn enter_element(&mut self, scope: &Scope<'_>, element: &Element) {
        if element.type_name.is_empty() {
            return;
        }

        let usage = TypeUsage {
            schema_index: scope.schema_index,
            element: element.name.clone(),
            nesting: scope.nesting,
            xml_name: scope.namespaces.xml_name_for_element(element, scope.nesting),
        };

        match &mut self.index {
            TypeIndex::NamespaceAware(by_qname) => {
                let key = match QName::from_type_reference(
                    &element.type_name,
                    element,
                    scope.nesting,
                    scope.namespaces,
                ) {
                    Ok(key) => key,
                    Err(err) => {
                        debug!(element = %element.name, "not indexing element: {}", err);
                        return;
                    }
                };
                by_qname.entry(key).or_default().push(usage);
            }
            TypeIndex::LocalNameOnly(by_local) => {
                by_local
                    .entry(local_part(&element.type_name).to_string())
                    .or_default()
                    .push(usage);
            }
        }
        self.indexed += 1;
    }
}

impl TypeNameResolver {
    /// Index every typed element in the forest
    pub fn build(forest: &Forest, naming: TypeNaming) -> Self {
        let index = match naming {
            TypeNaming::NamespaceAware => TypeIndex::NamespaceAware(HashMap::new()),
            TypeNaming::LocalNameOnly => TypeIndex::LocalNameOnly(HashMap::new()),
        };
        let mut builder = IndexBuilder { index, indexed: 0 };
        walk(forest, &mut builder);

        debug!(elements = builder.indexed, ?naming, "built element-by-type index");
        Self { index: builder.index }
    }

    pub fn naming(&self) -> TypeNaming {
        match self.index {
            TypeIndex::NamespaceAware(_) => TypeNaming::NamespaceAware,
            TypeIndex::LocalNameOnly(_) => TypeNaming::LocalNameOnly,
        }
    }

    /// Elements declared with `type_name`, as seen from the schema declaring it
    pub fn usages(&self, type_name: &str, schema: &SchemaNamespaces) -> &[TypeUsage] {
        let found = match &self.index {
            TypeIndex::NamespaceAware(by_qname) => {
                by_qname.get(&QName::new(schema.target_namespace.as_str(), type_name))
            }
            TypeIndex::LocalNameOnly(by_local) => by_local.get(type_name),
        };
        found.map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolve the external name of `type_name` declared in `schema`.
    ///
    /// `type_name` is the type's own (unprefixed) name; it is always taken to
    /// live in `schema`'s target namespace.
    pub fn name_for_type(&self, type_name: &str, schema: &SchemaNamespaces) -> TypeNameResolution {
        let fallback = QName::new(schema.target_namespace.as_str(), type_name);
        let usages = self.usages(type_name, schema);
        let Some(first) = usages.first() else {
            return TypeNameResolution::Unused(fallback);
        };

        let names: BTreeSet<&str> = usages.iter().map(|u| u.element.as_str()).collect();

        match &self.index {
            TypeIndex::NamespaceAware(_) => {
                let namespaces: BTreeSet<&str> =
                    usages.iter().map(|u| u.xml_name.namespace.as_str()).collect();
                if names.len() == 1 && namespaces.len() == 1 {
                    TypeNameResolution::Unique(first.xml_name.clone())
                } else {
                    TypeNameResolution::Ambiguous(fallback)
                }
            }
            TypeIndex::LocalNameOnly(_) => {
                if names.len() == 1 {
                    TypeNameResolution::Unique(QName::new(
                        schema.target_namespace.as_str(),
                        first.element.as_str(),
                    ))
                } else {
                    TypeNameResolution::Ambiguous(fallback)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ComplexType, Form, Schema};

    const NS1: &str = "urn:ns1";
    const NS2: &str = "urn:ns2";

    fn types_schema() -> Schema {
        Schema::new(SchemaNamespaces::new(NS1)).with_complex_type(ComplexType::new("Address"))
    }

    fn using_schema(elements: Vec<Element>) -> Schema {
        let mut schema = Schema::new(SchemaNamespaces::new(NS2).with_prefix("a", NS1));
        schema.elements = elements;
        schema
    }

    fn resolve(forest: &Forest) -> TypeNameResolution {
        TypeNameResolver::build(forest, TypeNaming::NamespaceAware)
            .name_for_type("Address", &forest.schemas()[0].namespaces)
    }

    #[test]
    fn test_unused_type_keeps_own_name() {
        let forest = Forest::new(vec![types_schema()]);
        assert_eq!(resolve(&forest), TypeNameResolution::Unused(QName::new(NS1, "Address")));
    }

    #[test]
    fn test_single_element_names_type() {
        let forest = Forest::new(vec![
            types_schema(),
            using_schema(vec![Element::new("ShippingAddress").with_type("a:Address")]),
        ]);
        assert_eq!(
            resolve(&forest),
            TypeNameResolution::Unique(QName::new(NS2, "ShippingAddress"))
        );
    }

    #[test]
    fn test_disagreeing_names_fall_back() {
        let forest = Forest::new(vec![
            types_schema(),
            using_schema(vec![
                Element::new("ShippingAddress").with_type("a:Address"),
                Element::new("BillingAddress").with_type("a:Address"),
            ]),
        ]);
        let resolution = resolve(&forest);
        assert!(resolution.is_ambiguous());
        assert_eq!(resolution.into_qname(), QName::new(NS1, "Address"));
    }

    #[test]
    fn test_disagreeing_namespaces_fall_back() {
        let mut same_ns = types_schema();
        same_ns
            .elements
            .push(Element::new("ShippingAddress").with_type("Address"));
        let forest = Forest::new(vec![
            same_ns,
            using_schema(vec![Element::new("ShippingAddress").with_type("a:Address")]),
        ]);
        assert!(resolve(&forest).is_ambiguous());
    }

    #[test]
    fn test_agreeing_elements_across_schemas() {
        let forest = Forest::new(vec![
            types_schema(),
            using_schema(vec![Element::new("Address").with_type("a:Address")]),
            using_schema(vec![Element::new("Address").with_type("a:Address")]),
        ]);
        assert_eq!(resolve(&forest), TypeNameResolution::Unique(QName::new(NS2, "Address")));
    }

    #[test]
    fn test_unprefixed_local_element_is_not_in_target_namespace() {
        // A local unqualified element's unprefixed type reference lands in no
        // namespace, so it does not count as a use of {urn:ns1}Address.
        let wrapper = ComplexType::anonymous().with_sequence(Element::new("home").with_type("Address"));
        let mut schema = types_schema();
        schema.elements.push(Element::new("Person").with_complex_type(wrapper));
        let forest = Forest::new(vec![schema]);
        assert!(matches!(resolve(&forest), TypeNameResolution::Unused(_)));

        let resolver = TypeNameResolver::build(&forest, TypeNaming::NamespaceAware);
        let no_ns = SchemaNamespaces::new("");
        assert_eq!(
            resolver.name_for_type("Address", &no_ns),
            TypeNameResolution::Unique(QName::unqualified("home"))
        );
    }

    #[test]
    fn test_qualified_local_element_counts() {
        let wrapper = ComplexType::anonymous().with_sequence(Element::new("home").with_type("Address"));
        let mut schema = types_schema();
        schema.namespaces.element_form_default = Form::Qualified;
        schema.elements.push(Element::new("Person").with_complex_type(wrapper));
        let forest = Forest::new(vec![schema]);

        assert_eq!(resolve(&forest), TypeNameResolution::Unique(QName::new(NS1, "home")));
    }

    #[test]
    fn test_unbound_type_prefix_not_indexed() {
        let forest = Forest::new(vec![
            types_schema(),
            using_schema(vec![Element::new("Shipping").with_type("zz:Address")]),
        ]);
        let resolver = TypeNameResolver::build(&forest, TypeNaming::NamespaceAware);
        assert!(resolver.usages("Address", &forest.schemas()[0].namespaces).is_empty());
    }

    #[test]
    fn test_query_is_repeatable() {
        let forest = Forest::new(vec![
            types_schema(),
            using_schema(vec![Element::new("ShippingAddress").with_type("a:Address")]),
        ]);
        let resolver = TypeNameResolver::build(&forest, TypeNaming::NamespaceAware);
        let ns1 = &forest.schemas()[0].namespaces;
        let first = resolver.name_for_type("Address", ns1);
        let second = resolver.name_for_type("Address", ns1);
        assert_eq!(first, second);
        assert_eq!(resolver.usages("Address", ns1).len(), 1);
    }

    #[test]
    fn test_local_name_only_ignores_namespaces() {
        let mut same_ns = types_schema();
        same_ns
            .elements
            .push(Element::new("ShippingAddress").with_type("Address"));
        let forest = Forest::new(vec![
            same_ns,
            using_schema(vec![Element::new("ShippingAddress").with_type("a:Address")]),
        ]);
        let resolver = TypeNameResolver::build(&forest, TypeNaming::LocalNameOnly);
        assert_eq!(resolver.naming(), TypeNaming::LocalNameOnly);

        let resolution = resolver.name_for_type("Address", &forest.schemas()[0].namespaces);
        assert_eq!(resolution, TypeNameResolution::Unique(QName::new(NS1, "ShippingAddress")));
    }

    #[test]
    fn test_local_name_only_disagreeing_names() {
        let forest = Forest::new(vec![
            types_schema(),
            using_schema(vec![
                Element::new("ShippingAddress").with_type("a:Address"),
                Element::new("BillingAddress").with_type("a:Address"),
            ]),
        ]);
        let resolver = TypeNameResolver::build(&forest, TypeNaming::LocalNameOnly);
        let resolution = resolver.name_for_type("Address", &forest.schemas()[0].namespaces);
        assert_eq!(resolution, TypeNameResolution::Ambiguous(QName::new(NS1, "Address")));
    }
}
