//! `assetman` -- command-line front end for the asset registry.
//!
//! Every project-scoped command acts on the registry's current project,
//! set by `project create` or `project use`.
//!
//! # Environment variables
//!
//! | Variable                        | Required | Default               | Description                          |
//! |---------------------------------|----------|-----------------------|--------------------------------------|
//! | `ASSETMAN_DOCUMENT`             | no       | `asset_registry.json` | Registry document location           |
//! | `ASSETMAN_IMPORT_COOLDOWN_SECS` | no       | from document (`2`)   | Duplicate-import window              |
//! | `ASSETMAN_COOLDOWN_PURGE_SECS`  | no       | `10`                  | Age at which cooldown entries expire |
//! | `ASSETMAN_ENFORCE_ACYCLIC`      | no       | `false`               | Reject cyclic dependency edges       |
//! | `ASSETMAN_LOG_FORMAT`           | no       | `text`                | `text` or `json` log lines on stderr |
//! | `RUST_LOG`                      | no       | `assetman=info`       | Log filter                           |

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use assetman_core::{
    AssetQuery, AssetRegistry, AssetType, ProjectHandle, RegisterOptions, RegistryConfig,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "assetman", about = "Browse, tag and version project assets")]
struct Cli {
    /// Registry document (overrides ASSETMAN_DOCUMENT)
    #[arg(long, global = true)]
    document: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    /// Log line format
    #[arg(long, value_enum, default_value = "text", env = "ASSETMAN_LOG_FORMAT", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Project operations
    #[command(subcommand)]
    Project(ProjectCommands),
    /// Asset registration and lookup
    #[command(subcommand)]
    Asset(AssetCommands),
    /// Collection operations
    #[command(subcommand)]
    Collection(CollectionCommands),
    /// Dependency tracking
    #[command(subcommand)]
    Dep(DepCommands),
    /// Version history
    #[command(subcommand)]
    Version(VersionCommands),
    /// Tagging
    #[command(subcommand)]
    Tag(TagCommands),
}

#[derive(Subcommand, Debug)]
enum ProjectCommands {
    /// Create a project with the standard layout and make it current
    Create {
        name: String,
        /// Directory the project folder is created in
        #[arg(long, default_value = ".")]
        base: PathBuf,
    },
    /// Make an existing directory the current project
    Use { path: PathBuf },
    /// List known projects
    List,
    /// Show one project record
    Info { name: String },
}

#[derive(Subcommand, Debug)]
enum AssetCommands {
    /// Register one or more files
    Register {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Reference files in place instead of copying them into the project
        #[arg(long, default_value_t = false)]
        no_copy: bool,
        /// Store this type instead of the classified one (single file only)
        #[arg(long = "type")]
        asset_type: Option<String>,
        /// Description (single file only)
        #[arg(long, default_value = "")]
        description: String,
        /// Fail instead of overwriting an existing record (single file only)
        #[arg(long, default_value_t = false)]
        no_replace: bool,
    },
    /// Remove an asset record
    Remove {
        name: String,
        /// Also delete the project copy
        #[arg(long, default_value_t = false)]
        delete_file: bool,
    },
    /// List registered assets
    List,
    /// Search registered assets
    Find {
        #[arg(long)]
        text: Option<String>,
        #[arg(long = "type")]
        asset_type: Option<String>,
    },
    /// Copy a registered asset out of the project
    Export { name: String, destination: PathBuf },
}

#[derive(Subcommand, Debug)]
enum CollectionCommands {
    /// Create a collection
    Create {
        name: String,
        #[arg(long = "asset")]
        assets: Vec<String>,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Add an asset name to a collection
    Add { collection: String, asset: String },
    /// Remove an asset name from a collection
    Remove { collection: String, asset: String },
    /// Delete a collection
    Delete { name: String },
    /// List collections
    List,
    /// Drop entries whose asset is no longer registered
    Prune,
}

#[derive(Subcommand, Debug)]
enum DepCommands {
    /// Record that ASSET requires DEPENDENCY
    Add { asset: String, dependency: String },
    /// Drop a dependency edge
    Remove { asset: String, dependency: String },
    /// Direct prerequisites of an asset
    List { asset: String },
    /// Assets that require the given asset
    Dependents { asset: String },
}

#[derive(Subcommand, Debug)]
enum VersionCommands {
    /// Append a version entry for a file
    Create {
        asset_path: PathBuf,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Show an asset's version history
    List { asset: String },
}

#[derive(Subcommand, Debug)]
enum TagCommands {
    /// Tag an asset
    Add { asset: String, tag: String },
    /// Remove a tag from an asset
    Remove { asset: String, tag: String },
    /// Tags on an asset
    List { asset: String },
    /// Assets carrying a tag
    Find { tag: String },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let mut config = RegistryConfig::from_env().context("Invalid registry configuration")?;
    if let Some(document) = cli.document {
        config.document_path = document;
    }

    let mut registry = AssetRegistry::open(&config)
        .with_context(|| format!("Failed to open {}", config.document_path.display()))?;

    let format = cli.format;
    match cli.command {
        Commands::Project(cmd) => run_project(&mut registry, format, cmd)?,
        Commands::Asset(cmd) => run_asset(&mut registry, format, cmd)?,
        Commands::Collection(cmd) => run_collection(&mut registry, format, cmd)?,
        Commands::Dep(cmd) => run_dep(&mut registry, format, cmd)?,
        Commands::Version(cmd) => run_version(&mut registry, format, cmd)?,
        Commands::Tag(cmd) => run_tag(&mut registry, format, cmd)?,
    }

    tracing::debug!(stats = ?registry.stats().snapshot(), "Operation statistics");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "assetman=info,assetman_core=info".into());
    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => subscriber
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

fn current(registry: &AssetRegistry) -> Result<ProjectHandle> {
    registry.current_project().context(
        "No current project. \
         Run `assetman project create <name>` or `assetman project use <path>` first",
    )
}

/// Print `value` as JSON, or as the text produced by `human`.
fn emit<T: Serialize>(
    format: OutputFormat,
    value: &T,
    human: impl FnOnce(&T) -> String,
) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Human => {
            let text = human(value);
            if !text.is_empty() {
                println!("{text}");
            }
        }
    }
    Ok(())
}

fn changed(format: OutputFormat, changed: bool, yes: &str, no: &str) -> Result<()> {
    emit(format, &json!({ "changed": changed }), |_| {
        (if changed { yes } else { no }).to_string()
    })
}

fn lines<I: IntoIterator<Item = S>, S: AsRef<str>>(items: I, empty: &str) -> String {
    let text = items
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("\n");
    if text.is_empty() {
        empty.to_string()
    } else {
        text
    }
}

fn run_project(
    registry: &mut AssetRegistry,
    format: OutputFormat,
    cmd: ProjectCommands,
) -> Result<()> {
    match cmd {
        ProjectCommands::Create { name, base } => {
            let handle = registry.create_project(&name, &base)?;
            emit(format, &json!({ "name": handle.name(), "path": handle.root() }), |_| {
                format!("Created project {} at {}", handle.name(), handle.root().display())
            })
        }
        ProjectCommands::Use { path } => {
            let handle = registry.set_current_project(&path)?;
            emit(format, &json!({ "name": handle.name(), "path": handle.root() }), |_| {
                format!("Current project: {} ({})", handle.name(), handle.root().display())
            })
        }
        ProjectCommands::List => {
            let projects = registry.list_projects();
            emit(format, &projects, |p| lines(p, "No projects"))
        }
        ProjectCommands::Info { name } => {
            let project = registry
                .get_project_info(&name)
                .with_context(|| format!("Unknown project '{name}'"))?;
            emit(format, project, |p| {
                format!(
                    "{name}\n  path:         {}\n  created:      {}\n  assets:       {}\
                     \n  collections:  {}\n  dependencies: {}\n  versioned:    {}\
                     \n  tags:         {}",
                    p.path.display(),
                    p.created.to_rfc3339(),
                    p.registered_assets.len(),
                    p.collections.len(),
                    p.dependencies.len(),
                    p.versions.len(),
                    p.tags.len(),
                )
            })
        }
    }
}

fn run_asset(registry: &mut AssetRegistry, format: OutputFormat, cmd: AssetCommands) -> Result<()> {
    let project = current(registry)?;
    match cmd {
        AssetCommands::Register {
            paths,
            no_copy,
            asset_type,
            description,
            no_replace,
        } => {
            if let [path] = paths.as_slice() {
                let options = RegisterOptions {
                    copy_to_project: !no_copy,
                    type_override: asset_type.map(AssetType::from),
                    description,
                    replace: !no_replace,
                };
                let record = registry.register_asset(&project, path, &options)?;
                return emit(format, &record, |r| {
                    format!(
                        "Registered {} ({}, {} bytes) -> {}",
                        path.display(),
                        r.asset_type,
                        r.size,
                        r.path.display()
                    )
                });
            }

            if asset_type.is_some() || !description.is_empty() || no_replace {
                tracing::warn!(
                    "--type, --description and --no-replace apply to single-file \
                     registration only; ignoring"
                );
            }
            let mut progress = |done: usize, total: usize, path: &Path| {
                tracing::info!(done, total, path = %path.display(), "Registering");
            };
            let report =
                registry.register_multiple_assets(&project, &paths, !no_copy, Some(&mut progress));
            emit(format, &report, |r| {
                let mut out = format!("Registered {} of {}", r.registered.len(), paths.len());
                for failure in &r.failed {
                    out.push_str(&format!(
                        "\n  failed: {} ({})",
                        failure.path.display(),
                        failure.reason
                    ));
                }
                out
            })
        }
        AssetCommands::Remove { name, delete_file } => {
            let record = registry.remove_asset_from_library(&project, &name, delete_file)?;
            emit(format, &record, |_| format!("Removed {name}"))
        }
        AssetCommands::List => {
            let assets = registry.get_registered_assets(&project);
            emit(format, &assets, |a| {
                lines(
                    a.iter().map(|(name, r)| {
                        format!("{name}\t{}\t{}\t{}", r.asset_type, r.size, r.path.display())
                    }),
                    "No assets registered",
                )
            })
        }
        AssetCommands::Find { text, asset_type } => {
            let query = AssetQuery {
                text,
                asset_type: asset_type.map(AssetType::from),
            };
            let found = registry.find_assets(&project, &query);
            emit(format, &found, |f| {
                lines(
                    f.iter()
                        .map(|(name, r)| format!("{name}\t{}\t{}", r.asset_type, r.path.display())),
                    "No matches",
                )
            })
        }
        AssetCommands::Export { name, destination } => {
            let target = registry.export_asset(&project, &name, &destination)?;
            emit(format, &json!({ "path": target }), |_| {
                format!("Exported {name} -> {}", target.display())
            })
        }
    }
}

fn run_collection(
    registry: &mut AssetRegistry,
    format: OutputFormat,
    cmd: CollectionCommands,
) -> Result<()> {
    let project = current(registry)?;
    match cmd {
        CollectionCommands::Create {
            name,
            assets,
            description,
        } => {
            registry.create_collection(&project, &name, assets, &description)?;
            changed(format, true, &format!("Created collection {name}"), "")
        }
        CollectionCommands::Add { collection, asset } => {
            let added = registry.add_asset_to_collection(&project, &collection, &asset)?;
            changed(
                format,
                added,
                &format!("Added {asset} to {collection}"),
                &format!("{asset} is already in {collection}"),
            )
        }
        CollectionCommands::Remove { collection, asset } => {
            let removed = registry.remove_asset_from_collection(&project, &collection, &asset)?;
            changed(
                format,
                removed,
                &format!("Removed {asset} from {collection}"),
                &format!("{asset} is not in {collection}"),
            )
        }
        CollectionCommands::Delete { name } => {
            let collection = registry.delete_collection(&project, &name)?;
            emit(format, &collection, |_| format!("Deleted collection {name}"))
        }
        CollectionCommands::List => {
            let collections = registry.get_collections(&project);
            emit(format, &collections, |c| {
                lines(
                    c.iter().map(|(name, col)| format!("{name}: {}", col.assets.join(", "))),
                    "No collections",
                )
            })
        }
        CollectionCommands::Prune => {
            let removed = registry.prune_collections(&project)?;
            emit(format, &json!({ "removed": removed }), |_| {
                format!("Removed {removed} stale collection entries")
            })
        }
    }
}

fn run_dep(registry: &mut AssetRegistry, format: OutputFormat, cmd: DepCommands) -> Result<()> {
    let project = current(registry)?;
    match cmd {
        DepCommands::Add { asset, dependency } => {
            let added = registry.track_dependency(&project, &asset, &dependency)?;
            changed(
                format,
                added,
                &format!("{asset} now requires {dependency}"),
                &format!("{asset} already requires {dependency}"),
            )
        }
        DepCommands::Remove { asset, dependency } => {
            let removed = registry.remove_dependency(&project, &asset, &dependency)?;
            changed(
                format,
                removed,
                &format!("{asset} no longer requires {dependency}"),
                &format!("{asset} did not require {dependency}"),
            )
        }
        DepCommands::List { asset } => {
            let deps = registry.get_dependencies(&project, &asset);
            emit(format, &deps, |d| lines(d, "No dependencies"))
        }
        DepCommands::Dependents { asset } => {
            let dependents = registry.get_dependents(&project, &asset);
            emit(format, &dependents, |d| lines(d, "No dependents"))
        }
    }
}

fn run_version(
    registry: &mut AssetRegistry,
    format: OutputFormat,
    cmd: VersionCommands,
) -> Result<()> {
    let project = current(registry)?;
    match cmd {
        VersionCommands::Create { asset_path, notes } => {
            let entry = registry.create_asset_version(&project, &asset_path, &notes)?;
            emit(format, &entry, |e| {
                format!("Created version {} of {}", e.version, asset_path.display())
            })
        }
        VersionCommands::List { asset } => {
            let history = registry.get_asset_versions(&project, &asset);
            emit(format, &history, |h| {
                lines(
                    h.iter().map(|v| {
                        format!(
                            "v{}\t{}\t{} bytes\t{}",
                            v.version,
                            v.created.to_rfc3339(),
                            v.file_size,
                            v.notes
                        )
                    }),
                    "No versions",
                )
            })
        }
    }
}

fn run_tag(registry: &mut AssetRegistry, format: OutputFormat, cmd: TagCommands) -> Result<()> {
    let project = current(registry)?;
    match cmd {
        TagCommands::Add { asset, tag } => {
            let added = registry.tag_asset(&project, &asset, &tag)?;
            changed(
                format,
                added,
                &format!("Tagged {asset} with {tag}"),
                &format!("{asset} already tagged {tag}"),
            )
        }
        TagCommands::Remove { asset, tag } => {
            let removed = registry.untag_asset(&project, &asset, &tag)?;
            changed(
                format,
                removed,
                &format!("Removed tag {tag} from {asset}"),
                &format!("{asset} was not tagged {tag}"),
            )
        }
        TagCommands::List { asset } => {
            let tags = registry.tags_for_asset(&project, &asset);
            emit(format, &tags, |t| lines(t, "No tags"))
        }
        TagCommands::Find { tag } => {
            let assets = registry.assets_with_tag(&project, &tag);
            emit(format, &assets, |a| lines(a, "No assets"))
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn register_parses_multiple_paths() {
        let cli = Cli::try_parse_from([
            "assetman", "asset", "register", "a.ma", "b.obj", "--no-copy",
        ])
        .expect("parse");
        match cli.command {
            Commands::Asset(AssetCommands::Register { paths, no_copy, .. }) => {
                assert_eq!(paths, vec![PathBuf::from("a.ma"), PathBuf::from("b.obj")]);
                assert!(no_copy);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_format_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["assetman", "project", "list", "--format", "json"])
            .expect("parse");
        assert!(matches!(cli.format, OutputFormat::Json));
    }

    #[test]
    fn lines_falls_back_when_empty() {
        assert_eq!(lines(Vec::<String>::new(), "none"), "none");
        assert_eq!(lines(["a", "b"], "none"), "a\nb");
    }
}
