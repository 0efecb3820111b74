//! Declaration tree walker
//!
//! Depth-first traversal over a [`Forest`] shared by every resolution pass.
//! Schemas are visited in input order; within a schema, top-level elements,
//! then top-level complex types, then top-level simple types. Each complex
//! type is expanded in this order:
//!
//! ```text
//! sequence -> choice -> sequence_choice -> all -> attributes
//!   -> complexContent/extension: attributes, sequence, choice, sequence_choice
//!   -> simpleContent/extension: attributes
//! ```
//!
//! Every element reached is recursed into (inline complex type, then inline
//! simple type) before its next sibling. Top-level attributes are not
//! visited; passes that need them read `Schema::attributes` directly.
//!
//! Hooks receive an explicit [`Scope`] instead of sharing a "current schema"
//! variable, so enter/exit ordering never carries state a pass depends on.

use crate::schema::{
    Attribute, ComplexType, Element, Forest, Nesting, Schema, SchemaNamespaces, SimpleType,
};

/// Traversal context handed to every hook
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    /// Position of the enclosing schema in the forest
    pub schema_index: usize,
    /// Namespace header of the enclosing schema
    pub namespaces: &'a SchemaNamespaces,
    /// `TopLevel` only for elements declared directly under the schema
    pub nesting: Nesting,
}

impl<'a> Scope<'a> {
    fn new(schema_index: usize, namespaces: &'a SchemaNamespaces) -> Self {
        Self {
            schema_index,
            namespaces,
            nesting: Nesting::TopLevel,
        }
    }

    fn local(&self) -> Self {
        Self {
            nesting: Nesting::Local,
            ..*self
        }
    }
}

// =============================================================================
// Read-only traversal
// =============================================================================

/// Read-only hooks. Unimplemented hooks are no-ops.
#[allow(unused_variables)]
pub trait Visitor {
    fn enter_schema(&mut self, scope: &Scope<'_>) {}
    fn exit_schema(&mut self, scope: &Scope<'_>) {}
    fn enter_element(&mut self, scope: &Scope<'_>, element: &Element) {}
    fn exit_element(&mut self, scope: &Scope<'_>, element: &Element) {}
    fn enter_complex_type(&mut self, scope: &Scope<'_>, complex_type: &ComplexType) {}
    fn exit_complex_type(&mut self, scope: &Scope<'_>, complex_type: &ComplexType) {}
    fn enter_simple_type(&mut self, scope: &Scope<'_>, simple_type: &SimpleType) {}
    fn exit_simple_type(&mut self, scope: &Scope<'_>, simple_type: &SimpleType) {}
    fn enter_attribute(&mut self, scope: &Scope<'_>, attribute: &Attribute) {}
    fn exit_attribute(&mut self, scope: &Scope<'_>, attribute: &Attribute) {}
}

/// Walk the whole forest
pub fn walk<V: Visitor>(forest: &Forest, visitor: &mut V) {
    for (schema_index, schema) in forest.schemas().iter().enumerate() {
        let scope = Scope::new(schema_index, &schema.namespaces);
        visitor.enter_schema(&scope);
        walk_schema(&scope, schema, visitor);
        visitor.exit_schema(&scope);
    }
}

fn walk_schema<V: Visitor>(scope: &Scope<'_>, schema: &Schema, visitor: &mut V) {
    walk_elements(scope, &schema.elements, visitor);
    for complex_type in &schema.complex_types {
        walk_complex_type(scope, complex_type, visitor);
    }
    for simple_type in &schema.simple_types {
        walk_simple_type(scope, simple_type, visitor);
    }
}

fn walk_elements<V: Visitor>(scope: &Scope<'_>, elements: &[Element], visitor: &mut V) {
    for element in elements {
        visitor.enter_element(scope, element);
        if let Some(complex_type) = element.complex_type.as_deref() {
            walk_complex_type(scope, complex_type, visitor);
        }
        if let Some(simple_type) = &element.simple_type {
            walk_simple_type(scope, simple_type, visitor);
        }
        visitor.exit_element(scope, element);
    }
}

fn walk_attributes<V: Visitor>(scope: &Scope<'_>, attributes: &[Attribute], visitor: &mut V) {
    for attribute in attributes {
        visitor.enter_attribute(scope, attribute);
        visitor.exit_attribute(scope, attribute);
    }
}

fn walk_complex_type<V: Visitor>(scope: &Scope<'_>, complex_type: &ComplexType, visitor: &mut V) {
    visitor.enter_complex_type(scope, complex_type);

    let inner = scope.local();
    walk_elements(&inner, &complex_type.sequence, visitor);
    walk_elements(&inner, &complex_type.choice, visitor);
    walk_elements(&inner, &complex_type.sequence_choice, visitor);
    walk_elements(&inner, &complex_type.all, visitor);
    walk_attributes(&inner, &complex_type.attributes, visitor);

    let extension = &complex_type.complex_content.extension;
    walk_attributes(&inner, &extension.attributes, visitor);
    walk_elements(&inner, &extension.sequence, visitor);
    walk_elements(&inner, &extension.choice, visitor);
    walk_elements(&inner, &extension.sequence_choice, visitor);

    walk_attributes(&inner, &complex_type.simple_content.extension.attributes, visitor);

    visitor.exit_complex_type(scope, complex_type);
}

fn walk_simple_type<V: Visitor>(scope: &Scope<'_>, simple_type: &SimpleType, visitor: &mut V) {
    visitor.enter_simple_type(scope, simple_type);
    visitor.exit_simple_type(scope, simple_type);
}

// =============================================================================
// Mutating traversal
// =============================================================================

/// Mutating hooks, same order as [`Visitor`]
#[allow(unused_variables)]
pub trait VisitorMut {
    fn enter_schema(&mut self, scope: &Scope<'_>) {}
    fn exit_schema(&mut self, scope: &Scope<'_>) {}
    fn enter_element(&mut self, scope: &Scope<'_>, element: &mut Element) {}
    fn exit_element(&mut self, scope: &Scope<'_>, element: &mut Element) {}
    fn enter_complex_type(&mut self, scope: &Scope<'_>, complex_type: &mut ComplexType) {}
    fn exit_complex_type(&mut self, scope: &Scope<'_>, complex_type: &mut ComplexType) {}
    fn enter_simple_type(&mut self, scope: &Scope<'_>, simple_type: &mut SimpleType) {}
    fn exit_simple_type(&mut self, scope: &Scope<'_>, simple_type: &mut SimpleType) {}
    fn enter_attribute(&mut self, scope: &Scope<'_>, attribute: &mut Attribute) {}
    fn exit_attribute(&mut self, scope: &Scope<'_>, attribute: &mut Attribute) {}
}

/// Walk the whole forest, allowing hooks to edit declarations in place
pub fn walk_mut<V: VisitorMut>(forest: &mut Forest, visitor: &mut V) {
    for (schema_index, schema) in forest.schemas_mut().iter_mut().enumerate() {
        // Split the borrow: header read-only, declarations mutable
        let Schema {
            namespaces,
            elements,
            complex_types,
            simple_types,
            ..
        } = schema;
        let scope = Scope::new(schema_index, namespaces);

        visitor.enter_schema(&scope);
        walk_elements_mut(&scope, elements, visitor);
        for complex_type in complex_types.iter_mut() {
            walk_complex_type_mut(&scope, complex_type, visitor);
        }
        for simple_type in simple_types.iter_mut() {
            walk_simple_type_mut(&scope, simple_type, visitor);
        }
        visitor.exit_schema(&scope);
    }
}

fn walk_elements_mut<V: VisitorMut>(scope: &Scope<'_>, elements: &mut [Element], visitor: &mut V) {
    for element in elements {
        visitor.enter_element(scope, element);
        if let Some(complex_type) = element.complex_type.as_deref_mut() {
            walk_complex_type_mut(scope, complex_type, visitor);
        }
        if let Some(simple_type) = element.simple_type.as_mut() {
            walk_simple_type_mut(scope, simple_type, visitor);
        }
        visitor.exit_element(scope, element);
    }
}

fn walk_attributes_mut<V: VisitorMut>(scope: &Scope<'_>, attributes: &mut [Attribute], visitor: &mut V) {
    for attribute in attributes {
        visitor.enter_attribute(scope, attribute);
        visitor.exit_attribute(scope, attribute);
    }
}

fn walk_complex_type_mut<V: VisitorMut>(scope: &Scope<'_>, complex_type: &mut ComplexType, visitor: &mut V) {
    visitor.enter_complex_type(scope, complex_type);

    let inner = scope.local();
    walk_elements_mut(&inner, &mut complex_type.sequence, visitor);
    walk_elements_mut(&inner, &mut complex_type.choice, visitor);
    walk_elements_mut(&inner, &mut complex_type.sequence_choice, visitor);
    walk_elements_mut(&inner, &mut complex_type.all, visitor);
    walk_attributes_mut(&inner, &mut complex_type.attributes, visitor);

    let extension = &mut complex_type.complex_content.extension;
    walk_attributes_mut(&inner, &mut extension.attributes, visitor);
    walk_elements_mut(&inner, &mut extension.sequence, visitor);
    walk_elements_mut(&inner, &mut extension.choice, visitor);
    walk_elements_mut(&inner, &mut extension.sequence_choice, visitor);

    walk_attributes_mut(&inner, &mut complex_type.simple_content.extension.attributes, visitor);

    visitor.exit_complex_type(scope, complex_type);
}

fn walk_simple_type_mut<V: VisitorMut>(scope: &Scope<'_>, simple_type: &mut SimpleType, visitor: &mut V) {
    visitor.enter_simple_type(scope, simple_type);
    visitor.exit_simple_type(scope, simple_type);
}
