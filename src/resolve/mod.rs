//! Semantic Resolution
//!
//! The two forest-wide passes that sit between parsing and emission:
//!
//! - [`attributes`]: rewrite `ref` attributes from their global declarations
//! - [`types`]: infer the external XML name of each named type
//!
//! The passes share no state and may run in either order. [`Resolver`] runs
//! both with one configuration and hands back everything the emitter asks.

pub mod attributes;
pub mod types;

pub use attributes::{resolve_attribute_refs, AttributeIndex, ResolutionReport, UnresolvedRef};
pub use types::{TypeNameResolution, TypeNameResolver, TypeUsage};

use serde::Serialize;
use tracing::info;

use crate::config::ResolverSettings;
use crate::error::ResolveError;
use crate::schema::Forest;

/// Kind of a top-level type declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Complex,
    Simple,
}

/// Resolved external name of one top-level type
#[derive(Debug, Clone, Serialize)]
pub struct TypeNameEntry {
    pub schema_index: usize,
    pub kind: TypeKind,
    /// Declared type name
    pub type_name: String,
    pub resolution: TypeNameResolution,
}

/// Runs both resolution passes over a forest
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    settings: ResolverSettings,
}

/// Results of a full resolution run
#[derive(Debug)]
pub struct ResolvedForest {
    pub report: ResolutionReport,
    pub types: TypeNameResolver,
    /// Aggregate of unresolved references under the collecting policy
    pub error: Option<ResolveError>,
}

impl Resolver {
    pub fn new(settings: ResolverSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Resolve attribute references in place, then index element types.
    ///
    /// Unresolved references never stop the type index from being built.
    /// Under the collecting error policy they are carried in
    /// [`ResolvedForest::error`] for the caller to report once its output
    /// is written.
    pub fn run(&self, forest: &mut Forest) -> ResolvedForest {
        let (report, errors) = attributes::apply_attribute_refs(forest);
        let error = attributes::policy_error(self.settings.error_policy, errors);
        let types = TypeNameResolver::build(forest, self.settings.type_naming);
        info!(schemas = forest.len(), clean = error.is_none(), "resolution complete");
        ResolvedForest { report, types, error }
    }
}

impl ResolvedForest {
    /// External name of every named top-level type, in declaration order
    pub fn type_names(&self, forest: &Forest) -> Vec<TypeNameEntry> {
        let mut entries = Vec::new();

        for (schema_index, schema) in forest.schemas().iter().enumerate() {
            let declared = schema
                .complex_types
                .iter()
                .map(|ct| (TypeKind::Complex, ct.name.as_str()))
                .chain(schema.simple_types.iter().map(|st| (TypeKind::Simple, st.name.as_str())))
                .filter(|(_, name)| !name.is_empty());

            for (kind, name) in declared {
                entries.push(TypeNameEntry {
                    schema_index,
                    kind,
                    type_name: name.to_string(),
                    resolution: self.types.name_for_type(name, &schema.namespaces),
                });
            }
        }

        entries
    }
}
