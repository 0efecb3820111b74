//! Attribute Reference Resolution
//!
//! Rewrites every `<xs:attribute ref="..."/>` with the properties of the
//! global attribute it names. Runs in two phases over the forest:
//!
//! 1. **Index**: snapshot every named top-level attribute under
//!    `(declaring schema's target namespace, name)`. Later declarations
//!    overwrite earlier ones with the same key.
//! 2. **Apply**: walk all nested attributes. References are resolved against
//!    the enclosing schema's prefix bindings and looked up in the index; the
//!    target must not itself be a reference (one hop only).
//!
//! Attributes without a reference and without a type pick up the restriction
//! base of their inline simple type.

use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::config::ErrorPolicy;
use crate::error::{ResolveError, Result};
use crate::qname::QName;
use crate::schema::{Attribute, Forest, SchemaNamespaces};
use crate::walk::{walk_mut, Scope, VisitorMut};

// =============================================================================
// Attribute Index
// =============================================================================

/// Global attributes of a forest keyed by qualified name.
///
/// Holds copies taken at build time, so applying resolutions never changes
/// what a lookup returns within the same run.
#[derive(Debug, Clone, Default)]
pub struct AttributeIndex {
    attributes: HashMap<QName, Attribute>,
}

impl AttributeIndex {
    /// Index the top-level attributes of every schema
    pub fn build(forest: &Forest) -> Self {
        let mut attributes = HashMap::new();

        for schema in forest.schemas() {
            for attribute in schema.attributes.iter().filter(|a| !a.name.is_empty()) {
                let key = QName::new(schema.target_namespace(), attribute.name.as_str());
                if attributes.insert(key.clone(), attribute.clone()).is_some() {
                    debug!(attribute = %key, "duplicate global attribute, keeping the later declaration");
                }
            }
        }

        Self { attributes }
    }

    pub fn get(&self, key: &QName) -> Option<&Attribute> {
        self.attributes.get(key)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Find the global attribute a `ref` points at, as seen from `schema`
    pub fn lookup(&self, reference: &str, schema: &SchemaNamespaces) -> Result<&Attribute> {
        let key = QName::from_reference(reference, schema)?;
        match self.attributes.get(&key) {
            Some(target) if !target.is_reference() => Ok(target),
            _ => Err(ResolveError::UnresolvedAttributeRef {
                reference: reference.to_string(),
                namespace: schema.target_namespace.clone(),
            }),
        }
    }
}

// =============================================================================
// Report
// =============================================================================

/// An attribute reference left unresolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedRef {
    /// Position of the enclosing schema in the forest
    pub schema_index: usize,
    /// Target namespace of the enclosing schema
    pub namespace: String,
    /// The `ref` value as written
    pub reference: String,
    pub reason: String,
}

/// Outcome of an attribute resolution pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolutionReport {
    /// References rewritten from their global declaration
    pub resolved: usize,
    /// Types defaulted from an inline simple type
    pub defaulted: usize,
    /// References left as they were
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<UnresolvedRef>,
}

impl ResolutionReport {
    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty()
    }
}

// =============================================================================
// Apply pass
// =============================================================================

struct ApplyRefs<'i> {
    index: &'i AttributeIndex,
    report: ResolutionReport,
    errors: Vec<ResolveError>,
}

impl VisitorMut for ApplyRefs<'_> {
    fn enter_attribute(&mut self, scope: &Scope<'_>, attribute: &mut Attribute) {
        if attribute.is_reference() {
            match self.index.lookup(&attribute.reference, scope.namespaces) {
                Ok(target) => {
                    copy_from_global(attribute, target, scope.namespaces);
                    self.report.resolved += 1;
                }
                Err(err) => {
                    warn!(
                        reference = %attribute.reference,
                        namespace = %scope.namespaces.target_namespace,
                        "{}",
                        err
                    );
                    self.report.unresolved.push(UnresolvedRef {
                        schema_index: scope.schema_index,
                        namespace: scope.namespaces.target_namespace.clone(),
                        reference: attribute.reference.clone(),
                        reason: err.to_string(),
                    });
                    self.errors.push(err);
                }
            }
        } else if attribute.type_name.is_empty() && attribute.target_namespace.is_none() {
            let base = attribute
                .simple_type
                .as_ref()
                .map(|st| st.restriction.base.as_str())
                .filter(|base| !base.is_empty());
            if let Some(base) = base {
                attribute.type_name = base.to_string();
                debug!(attribute = %attribute.name, type_name = %attribute.type_name, "defaulted type from inline simple type");
                self.report.defaulted += 1;
            }
        }
    }
}

/// Copy a global attribute's identity onto a referencing declaration.
///
/// A local `fixed` wins over the global one. The namespace comes from the
/// referencing schema's attribute naming rule, not the declaring schema's.
fn copy_from_global(attribute: &mut Attribute, target: &Attribute, schema: &SchemaNamespaces) {
    debug!(reference = %attribute.reference, name = %target.name, "resolved attribute ref");
    attribute.name = target.name.clone();
    attribute.type_name = target.type_name.clone();
    if attribute.fixed.is_empty() {
        attribute.fixed = target.fixed.clone();
    }
    attribute.target_namespace = Some(schema.xml_name_for_attribute(target).namespace);
    attribute.reference.clear();
}

/// Rewrite every resolvable reference in place and collect the failures.
pub(crate) fn apply_attribute_refs(forest: &mut Forest) -> (ResolutionReport, Vec<ResolveError>) {
    let index = AttributeIndex::build(forest);
    debug!(globals = index.len(), "built global attribute index");

    let mut pass = ApplyRefs {
        index: &index,
        report: ResolutionReport::default(),
        errors: Vec::new(),
    };
    walk_mut(forest, &mut pass);

    let ApplyRefs { report, errors, .. } = pass;
    info!(
        resolved = report.resolved,
        defaulted = report.defaulted,
        unresolved = report.unresolved.len(),
        "attribute reference resolution complete"
    );
    (report, errors)
}

/// The error a policy turns collected failures into, if any
pub(crate) fn policy_error(policy: ErrorPolicy, errors: Vec<ResolveError>) -> Option<ResolveError> {
    match policy {
        ErrorPolicy::Collect if !errors.is_empty() => Some(ResolveError::Unresolved(errors)),
        _ => None,
    }
}

/// Resolve all attribute references in the forest in place.
///
/// With [`ErrorPolicy::Collect`] every failure is returned together as
/// [`ResolveError::Unresolved`] after the whole forest has been processed.
/// With [`ErrorPolicy::Skip`] failures only appear in the report. Either way
/// all resolvable attributes are rewritten and nothing is rolled back.
pub fn resolve_attribute_refs(forest: &mut Forest, policy: ErrorPolicy) -> Result<ResolutionReport> {
    let (report, errors) = apply_attribute_refs(forest);
    match policy_error(policy, errors) {
        Some(err) => Err(err),
        None => Ok(report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ComplexType, Element, Form, Schema, SimpleType};

    const XS: &str = "http://www.w3.org/2001/XMLSchema";

    fn common() -> Schema {
        Schema::new(SchemaNamespaces::new("urn:common").with_prefix("xs", XS))
            .with_attribute(Attribute::new("lang").with_type("xs:language").with_fixed("en"))
    }

    fn orders(attributes: Vec<Attribute>) -> Schema {
        let mut ct = ComplexType::new("OrderType");
        ct.attributes = attributes;
        Schema::new(
            SchemaNamespaces::new("urn:orders")
                .with_prefix("c", "urn:common")
                .with_prefix("xs", XS),
        )
        .with_complex_type(ct)
    }

    fn order_attrs(forest: &Forest) -> &[Attribute] {
        &forest.schemas()[1].complex_types[0].attributes
    }

    #[test]
    fn test_index_skips_unnamed_and_last_write_wins() {
        let forest = Forest::new(vec![
            common().with_attribute(Attribute::referencing("c:other")),
            Schema::new(SchemaNamespaces::new("urn:common"))
                .with_attribute(Attribute::new("lang").with_type("xs:token")),
        ]);
        let index = AttributeIndex::build(&forest);
        assert_eq!(index.len(), 1);
        let lang = index.get(&QName::new("urn:common", "lang")).unwrap();
        assert_eq!(lang.type_name, "xs:token");
    }

    #[test]
    fn test_resolves_cross_schema_ref() {
        let mut forest = Forest::new(vec![common(), orders(vec![Attribute::referencing("c:lang")])]);
        let report = resolve_attribute_refs(&mut forest, ErrorPolicy::Collect).unwrap();

        assert_eq!(report.resolved, 1);
        let attr = &order_attrs(&forest)[0];
        assert_eq!(attr.name, "lang");
        assert_eq!(attr.type_name, "xs:language");
        assert_eq!(attr.fixed, "en");
        assert!(attr.reference.is_empty());
        // urn:orders leaves attributes unqualified by default
        assert_eq!(attr.target_namespace.as_deref(), Some(""));
    }

    #[test]
    fn test_namespace_follows_referencing_schema() {
        let mut forest = Forest::new(vec![common(), orders(vec![Attribute::referencing("c:lang")])]);
        forest.schemas_mut()[1].namespaces.attribute_form_default = Form::Qualified;
        resolve_attribute_refs(&mut forest, ErrorPolicy::Collect).unwrap();
        assert_eq!(order_attrs(&forest)[0].target_namespace.as_deref(), Some("urn:orders"));
    }

    #[test]
    fn test_local_fixed_wins() {
        let mut forest = Forest::new(vec![
            common(),
            orders(vec![Attribute::referencing("c:lang").with_fixed("de")]),
        ]);
        resolve_attribute_refs(&mut forest, ErrorPolicy::Collect).unwrap();
        let attr = &order_attrs(&forest)[0];
        assert_eq!(attr.fixed, "de");
        assert_eq!(attr.type_name, "xs:language");
    }

    #[test]
    fn test_name_and_type_always_overwritten() {
        let mut forest = Forest::new(vec![
            common(),
            orders(vec![Attribute {
                name: "stale".to_string(),
                type_name: "xs:int".to_string(),
                ..Attribute::referencing("c:lang")
            }]),
        ]);
        resolve_attribute_refs(&mut forest, ErrorPolicy::Collect).unwrap();
        let attr = &order_attrs(&forest)[0];
        assert_eq!(attr.name, "lang");
        assert_eq!(attr.type_name, "xs:language");
    }

    #[test]
    fn test_unprefixed_ref_uses_own_namespace() {
        let schema = Schema::new(SchemaNamespaces::new("urn:common"))
            .with_attribute(Attribute::new("id").with_type("xs:ID"))
            .with_element(
                Element::new("Item")
                    .with_complex_type(ComplexType::anonymous().with_attribute(Attribute::referencing("id"))),
            );
        let mut forest = Forest::new(vec![schema]);
        resolve_attribute_refs(&mut forest, ErrorPolicy::Collect).unwrap();

        let ct = forest.schemas()[0].elements[0].complex_type.as_deref().unwrap();
        assert_eq!(ct.attributes[0].type_name, "xs:ID");
    }

    #[test]
    fn test_ref_to_ref_is_unresolved() {
        // a -> b -> lang: only one hop is followed
        let chain = Schema::new(SchemaNamespaces::new("urn:chain").with_prefix("c", "urn:common"))
            .with_attribute(Attribute {
                name: "b".to_string(),
                ..Attribute::referencing("c:lang")
            });
        let mut referencing = orders(vec![Attribute::referencing("ch:b")]);
        referencing.namespaces.xmlns.insert("ch".to_string(), "urn:chain".to_string());
        let mut forest = Forest::new(vec![common(), referencing, chain]);

        let err = resolve_attribute_refs(&mut forest, ErrorPolicy::Collect).unwrap_err();
        assert_eq!(err.failures().len(), 1);
        assert!(err.to_string().contains("ch:b"));

        let attr = &order_attrs(&forest)[0];
        assert_eq!(attr.reference, "ch:b");
        assert!(attr.name.is_empty());
        assert!(attr.target_namespace.is_none());
    }

    #[test]
    fn test_unbound_prefix_collected() {
        let mut forest = Forest::new(vec![common(), orders(vec![Attribute::referencing("foo:Bar")])]);
        let err = resolve_attribute_refs(&mut forest, ErrorPolicy::Collect).unwrap_err();
        match err.failures()[0] {
            ResolveError::UnboundPrefix { prefix, namespace, .. } => {
                assert_eq!(prefix, "foo");
                assert_eq!(namespace, "urn:orders");
            }
            other => panic!("Expected UnboundPrefix, got {:?}", other),
        }
    }

    #[test]
    fn test_collect_keeps_resolving_after_failure() {
        let mut forest = Forest::new(vec![
            common(),
            orders(vec![
                Attribute::referencing("c:missing"),
                Attribute::referencing("c:lang"),
                Attribute::referencing("nope:x"),
            ]),
        ]);
        let err = resolve_attribute_refs(&mut forest, ErrorPolicy::Collect).unwrap_err();
        assert_eq!(err.failures().len(), 2);

        let attrs = order_attrs(&forest);
        assert_eq!(attrs[0].reference, "c:missing");
        assert_eq!(attrs[1].name, "lang");
        assert_eq!(attrs[2].reference, "nope:x");
    }

    #[test]
    fn test_skip_policy_reports_without_error() {
        let mut forest = Forest::new(vec![
            common(),
            orders(vec![Attribute::referencing("c:missing"), Attribute::referencing("c:lang")]),
        ]);
        let report = resolve_attribute_refs(&mut forest, ErrorPolicy::Skip).unwrap();
        assert_eq!(report.resolved, 1);
        assert_eq!(report.unresolved.len(), 1);
        assert_eq!(report.unresolved[0].reference, "c:missing");
        assert_eq!(report.unresolved[0].schema_index, 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_inline_simple_type_defaults_type() {
        let mut forest = Forest::new(vec![orders(vec![
            Attribute::new("code").with_simple_type(SimpleType::restricting("xs:string")),
            Attribute::new("typed")
                .with_type("xs:int")
                .with_simple_type(SimpleType::restricting("xs:string")),
        ])]);
        let report = resolve_attribute_refs(&mut forest, ErrorPolicy::Collect).unwrap();
        assert_eq!(report.defaulted, 1);

        let attrs = &forest.schemas()[0].complex_types[0].attributes;
        assert_eq!(attrs[0].type_name, "xs:string");
        assert_eq!(attrs[1].type_name, "xs:int");
    }

    #[test]
    fn test_second_run_is_noop() {
        let mut forest = Forest::new(vec![
            common(),
            orders(vec![
                Attribute::referencing("c:lang"),
                Attribute::new("code").with_simple_type(SimpleType::restricting("xs:string")),
            ]),
        ]);
        resolve_attribute_refs(&mut forest, ErrorPolicy::Collect).unwrap();
        let once = forest.clone();

        let report = resolve_attribute_refs(&mut forest, ErrorPolicy::Collect).unwrap();
        assert_eq!(report.resolved, 0);
        assert_eq!(report.defaulted, 0);
        assert_eq!(forest, once);
    }

    #[test]
    fn test_untyped_global_not_redefaulted_on_second_run() {
        let mut forest = Forest::new(vec![
            Schema::new(SchemaNamespaces::new("urn:common")).with_attribute(Attribute::new("code")),
            orders(vec![
                Attribute::referencing("c:code").with_simple_type(SimpleType::restricting("xs:string"))
            ]),
        ]);
        resolve_attribute_refs(&mut forest, ErrorPolicy::Collect).unwrap();
        assert!(order_attrs(&forest)[0].type_name.is_empty());
        let once = forest.clone();

        let report = resolve_attribute_refs(&mut forest, ErrorPolicy::Collect).unwrap();
        assert_eq!(report.defaulted, 0);
        assert_eq!(forest, once);
    }

    #[test]
    fn test_empty_forest_has_empty_index() {
        let index = AttributeIndex::build(&Forest::default());
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
    }
}
