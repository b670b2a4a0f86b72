//! `graphschema`: install, inspect and remove graph schema extensions.
//!
//! # Usage
//!
//! ```text
//! graphschema upsert extension.json
//! graphschema show Test_Extension
//! graphschema --store ~/graphschema.db register-kind Tag_Tier_Zero Tag_Owned
//! ```
//!
//! Extension documents are JSON with `extension`, `node_kinds`,
//! `edge_kinds`, `properties`, `environments` and `findings` keys.

mod settings;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use graphschema_core::{input::GraphExtensionInput, store::SchemaStore};
use graphschema_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::{CliConfig, expand_tilde};

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "graphschema", version, about = "Graph schema extension store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "graphschema.toml")]
  config: PathBuf,

  /// SQLite database file; overrides `store_path` from the config.
  #[arg(long, value_name = "FILE")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create or reconcile an extension from a JSON document.
  Upsert { file: PathBuf },
  /// Install a built-in extension from a JSON document if absent.
  SeedBuiltin { file: PathBuf },
  /// Delete an extension and everything it owns.
  Delete { name: String },
  /// Print an extension with everything it owns as JSON.
  Show { name: String },
  /// List installed extensions.
  List,
  /// Register platform kind names (e.g. environment kinds).
  RegisterKind {
    #[arg(required = true)]
    names: Vec<String>,
  },
  /// Register or reactivate a source kind.
  RegisterSourceKind { name: String },
  /// Hide a source kind from lookups until it is registered again.
  DeactivateSourceKind { name: String },
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = CliConfig::load(&cli.config)?;
  let store_path = cli
    .store
    .as_deref()
    .map(expand_tilde)
    .unwrap_or(cfg.store_path);

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  run(&store, cli.command).await
}

async fn run<S: SchemaStore>(store: &S, command: Command) -> anyhow::Result<()> {
  match command {
    Command::Upsert { file } => {
      let input = read_extension(&file)?;
      let name = input.extension.name.clone();
      let existed = store
        .upsert_graph_extension(input)
        .await
        .with_context(|| format!("failed to upsert extension {name}"))?;
      println!("{} {name}", if existed { "updated" } else { "created" });
    }
    Command::SeedBuiltin { file } => {
      let input = read_extension(&file)?;
      let name = input.extension.name.clone();
      let seeded = store
        .seed_builtin_extension(input)
        .await
        .with_context(|| format!("failed to seed extension {name}"))?;
      println!("{} {name}", if seeded { "seeded" } else { "already present" });
    }
    Command::Delete { name } => {
      let extension = store
        .get_extension_by_name(name.clone())
        .await
        .with_context(|| format!("failed to find extension {name}"))?;
      store
        .delete_schema_extension(extension.id)
        .await
        .with_context(|| format!("failed to delete extension {name}"))?;
      println!("deleted {name}");
    }
    Command::Show { name } => {
      let schema = store
        .get_graph_schema(name.clone())
        .await
        .with_context(|| format!("failed to load extension {name}"))?;
      println!("{}", serde_json::to_string_pretty(&schema)?);
    }
    Command::List => {
      for extension in store.list_extensions().await? {
        let builtin = if extension.is_builtin { " (built-in)" } else { "" };
        println!(
          "{}\t{}\t{}{builtin}",
          extension.name, extension.version, extension.display_name
        );
      }
    }
    Command::RegisterKind { names } => {
      for name in names {
        let kind = store
          .register_kind(name.clone())
          .await
          .with_context(|| format!("failed to register kind {name}"))?;
        println!("{}\t{}", kind.id, kind.name);
      }
    }
    Command::RegisterSourceKind { name } => {
      let source_kind = store
        .register_source_kind(name.clone())
        .await
        .with_context(|| format!("failed to register source kind {name}"))?;
      println!("{}\t{}", source_kind.id, source_kind.name);
    }
    Command::DeactivateSourceKind { name } => {
      store
        .deactivate_source_kind(name.clone())
        .await
        .with_context(|| format!("failed to deactivate source kind {name}"))?;
      println!("deactivated {name}");
    }
  }
  Ok(())
}

fn read_extension(path: &Path) -> anyhow::Result<GraphExtensionInput> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading {}", path.display()))?;
  serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}
