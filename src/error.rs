//! Error types for schema resolution

use thiserror::Error;

/// Result type for resolution operations
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Resolution errors
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("unable to resolve namespace prefix {prefix:?} in reference {reference:?} in schema with namespace {namespace:?}")]
    UnboundPrefix {
        prefix: String,
        reference: String,
        namespace: String,
    },

    #[error("unable to resolve attribute ref {reference:?} in schema with namespace {namespace:?}")]
    UnresolvedAttributeRef { reference: String, namespace: String },

    #[error("{} unresolved reference(s):{}", .0.len(), format_list(.0))]
    Unresolved(Vec<ResolveError>),

    #[error("Invalid schema format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl ResolveError {
    /// Flatten an aggregate into its individual failures
    pub fn failures(&self) -> Vec<&ResolveError> {
        match self {
            ResolveError::Unresolved(errors) => errors.iter().flat_map(|e| e.failures()).collect(),
            other => vec![other],
        }
    }

    /// Whether this is a reference failure (as opposed to IO or config)
    pub fn is_reference_failure(&self) -> bool {
        matches!(
            self,
            ResolveError::UnboundPrefix { .. }
                | ResolveError::UnresolvedAttributeRef { .. }
                | ResolveError::Unresolved(_)
        )
    }
}

fn format_list(errors: &[ResolveError]) -> String {
    errors.iter().map(|e| format!("\n  - {}", e)).collect()
}
