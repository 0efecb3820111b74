//! Configuration management for the resolver
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (xsd-resolve.toml)
//! - Environment variables (XSD_RESOLVE__*)
//!
//! ## Example config file (xsd-resolve.toml):
//! ```toml
//! [resolver]
//! error_policy = "collect"
//! type_naming = "namespace_aware"
//!
//! [loader]
//! skip_prefixes = ["vendor/"]
//!
//! [output]
//! format = "pretty"
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{ResolveError, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Resolution behaviour
    #[serde(default)]
    pub resolver: ResolverSettings,

    /// Forest loading
    #[serde(default)]
    pub loader: LoaderSettings,

    /// Output settings
    #[serde(default)]
    pub output: OutputSettings,
}

/// What to do with attribute references that cannot be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Report every failure together once the pass completes
    #[default]
    Collect,
    /// Leave the attribute unmodified and keep going
    Skip,
}

/// How types are mapped to external XML names.
///
/// The two strategies build different indexes and are never combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TypeNaming {
    /// Key by (namespace, local name); elements must agree on both
    #[default]
    NamespaceAware,
    /// Key by bare local name across all schemas; elements must agree on name only
    LocalNameOnly,
}

/// Resolution settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverSettings {
    #[serde(default)]
    pub error_policy: ErrorPolicy,

    #[serde(default)]
    pub type_naming: TypeNaming,
}

/// Loader settings for directory inputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderSettings {
    /// Skip files whose relative path starts with one of these
    #[serde(default = "default_skip_prefixes")]
    pub skip_prefixes: Vec<String>,

    /// If non-empty, only load files whose relative path starts with one of these
    #[serde(default)]
    pub include_prefixes: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

fn default_skip_prefixes() -> Vec<String> {
    vec![".git/".to_string(), "target/".to_string()]
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            skip_prefixes: default_skip_prefixes(),
            include_prefixes: Vec::new(),
        }
    }
}

impl OutputFormat {
    /// Serialize a value in this format
    pub fn to_json<T: Serialize>(&self, value: &T) -> serde_json::Result<String> {
        match self {
            OutputFormat::Pretty => serde_json::to_string_pretty(value),
            OutputFormat::Compact => serde_json::to_string(value),
        }
    }
}

impl ResolverConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, layering a specific file over the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_locations = [
            "xsd-resolve.toml",
            ".xsd-resolve.toml",
            "config/xsd-resolve.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "xsd", "xsd-resolve") {
            let xdg_config = config_dir.config_dir().join("xsd-resolve.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("XSD_RESOLVE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ResolveError::InvalidFormat(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ResolverConfig::default();
        assert_eq!(config.resolver.error_policy, ErrorPolicy::Collect);
        assert_eq!(config.resolver.type_naming, TypeNaming::NamespaceAware);
        assert_eq!(config.output.format, OutputFormat::Pretty);
        assert!(config.loader.include_prefixes.is_empty());
    }

    #[test]
    fn test_serialize_config() {
        let config = ResolverConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[resolver]"));
        assert!(toml_str.contains("error_policy = \"collect\""));
        assert!(toml_str.contains("type_naming = \"namespace_aware\""));
    }

    #[test]
    fn test_parse_partial_config() {
        let config: ResolverConfig = toml::from_str(
            r#"
            [resolver]
            error_policy = "skip"
            type_naming = "local_name_only"
            "#,
        )
        .unwrap();
        assert_eq!(config.resolver.error_policy, ErrorPolicy::Skip);
        assert_eq!(config.resolver.type_naming, TypeNaming::LocalNameOnly);
        assert_eq!(config.loader.skip_prefixes, default_skip_prefixes());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        let mut config = ResolverConfig::default();
        config.resolver.error_policy = ErrorPolicy::Skip;
        config.output.format = OutputFormat::Compact;
        config.save(path.to_str().unwrap()).unwrap();

        let loaded = ResolverConfig::load_from(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(loaded.resolver.error_policy, ErrorPolicy::Skip);
        assert_eq!(loaded.output.format, OutputFormat::Compact);
    }

    #[test]
    fn test_missing_explicit_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let err = ResolverConfig::load_from(Some(path.to_str().unwrap())).unwrap_err();
        assert!(matches!(err, ResolveError::Config(_)));
        assert!(!err.is_reference_failure());
    }
}
