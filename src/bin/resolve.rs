//! XSD Resolve CLI
//!
//! Runs attribute-reference and type-name resolution over a schema forest
//! dumped as JSON by the parser stage.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use xsd_resolve::resolve::TypeNameEntry;
use xsd_resolve::{load_from_path, Forest, ResolvedForest, ResolverConfig, Resolver, TypeNameResolution};

#[derive(Parser)]
#[command(name = "xsd-resolve")]
#[command(about = "Resolve attribute references and type names in an XSD forest")]
struct Cli {
    /// Config file layered over the default locations
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve attribute references and write the resulting forest
    Attrs {
        /// Forest JSON file or directory
        path: PathBuf,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the external name of one type
    TypeName {
        /// Forest JSON file or directory
        path: PathBuf,
        /// Type name (unprefixed)
        type_name: String,
        /// Target namespace of the schema declaring the type
        #[arg(short, long, default_value = "")]
        namespace: String,
    },

    /// Print the external name of every top-level type
    Names {
        /// Forest JSON file or directory
        path: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.as_ref().map(|p| p.to_string_lossy().into_owned());
    let config = ResolverConfig::load_from(config_path.as_deref()).context("loading configuration")?;
    let resolver = Resolver::new(config.resolver.clone());

    match cli.command {
        Commands::Attrs { path, output } => {
            let mut forest = load(&path, &config)?;
            let resolved = resolver.run(&mut forest);

            let json = config.output.format.to_json(&forest)?;
            match output {
                Some(output) => {
                    std::fs::write(&output, json).with_context(|| format!("writing {}", output.display()))?;
                    println!("✅ Resolved forest written to {:?}", output);
                }
                None => println!("{}", json),
            }

            let report = &resolved.report;
            eprintln!(
                "{} resolved, {} defaulted, {} unresolved",
                report.resolved,
                report.defaulted,
                report.unresolved.len()
            );
            for unresolved in &report.unresolved {
                eprintln!("  ⚠️  {}", unresolved.reason);
            }
            finish(resolved)
        }

        Commands::TypeName { path, type_name, namespace } => {
            let mut forest = load(&path, &config)?;
            let resolved = resolver.run(&mut forest);

            let schema = forest
                .find_by_namespace(&namespace)
                .next()
                .with_context(|| format!("no schema with target namespace {:?}", namespace))?;
            let resolution = resolved.types.name_for_type(&type_name, &schema.namespaces);
            println!("{}\t{}", resolution.qname(), kind_label(&resolution));
            finish(resolved)
        }

        Commands::Names { path } => {
            let mut forest = load(&path, &config)?;
            let resolved = resolver.run(&mut forest);

            let entries = resolved.type_names(&forest);
            for entry in &entries {
                print_entry(&forest, entry);
            }
            let ambiguous = entries.iter().filter(|e| e.resolution.is_ambiguous()).count();
            if ambiguous > 0 {
                eprintln!("⚠️  {} type(s) used by disagreeing elements", ambiguous);
            }
            finish(resolved)
        }
    }
}

fn load(path: &Path, config: &ResolverConfig) -> anyhow::Result<Forest> {
    let loaded = load_from_path(path, &config.loader).with_context(|| format!("loading {}", path.display()))?;
    tracing::info!(schemas = loaded.forest.len(), bundle_hash = %loaded.bundle_hash, "forest loaded");
    Ok(loaded.forest)
}

/// Fail with the collected reference errors once output has been written
fn finish(resolved: ResolvedForest) -> anyhow::Result<()> {
    match resolved.error {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

fn print_entry(forest: &Forest, entry: &TypeNameEntry) {
    let namespace = forest
        .get(entry.schema_index)
        .map(|s| s.target_namespace())
        .unwrap_or_default();
    println!(
        "{{{}}}{} -> {}\t{}",
        namespace,
        entry.type_name,
        entry.resolution.qname(),
        kind_label(&entry.resolution)
    );
}

fn kind_label(resolution: &TypeNameResolution) -> &'static str {
    match resolution {
        TypeNameResolution::Unused(_) => "unused",
        TypeNameResolution::Unique(_) => "unique",
        TypeNameResolution::Ambiguous(_) => "ambiguous",
    }
}
