//! Binary entry point for sheetsync.
//!
//! This binary provides the CLI for exporting records to CSV sheets and
//! importing sheets back into records.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Parser, Subcommand};
use commands::{ImportArgs, cmd_columns, cmd_create, cmd_export, cmd_import, cmd_template, cmd_types};
use sheetsync::config::SyncConfig;
use sheetsync::observability;
use sheetsync::{Error, MemoryStore, Result, SchemaRegistry};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Sheetsync - maps nested records to single-row CSV sheets and back.
#[derive(Parser)]
#[command(name = "sheetsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// TOML schema describing the record types.
    #[arg(long, global = true, env = "SHEETSYNC_SCHEMA")]
    schema: Option<PathBuf>,

    /// JSON object store snapshot (in-memory when omitted).
    #[arg(long, global = true, env = "SHEETSYNC_STORE")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// List exportable types.
    Types,

    /// Show the column names of a type.
    Columns {
        /// Type name.
        type_name: String,
    },

    /// Export an object to a sheet.
    Export {
        /// Object path, e.g. `/Game/Items/Sword.Sword`.
        object: String,

        /// Output file.
        file: PathBuf,
    },

    /// Write an empty sheet for a type.
    Template {
        /// Type name.
        type_name: String,

        /// Output file.
        file: PathBuf,
    },

    /// Import a sheet.
    Import(ImportArgs),

    /// Create a default record at a path.
    Create {
        /// Record path, `Package.Name` or `Package`.
        path: String,

        /// Type name.
        type_name: String,

        /// Do not save the new record.
        #[arg(long)]
        no_save: bool,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init_from_settings(&config.logging, cli.verbose) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(cli: Cli, config: SyncConfig) -> Result<()> {
    let registry = load_schema(cli.schema.as_deref())?;

    match cli.command {
        Commands::Types => cmd_types(&registry),

        Commands::Columns { type_name } => cmd_columns(&registry, &type_name),

        Commands::Export { object, file } => {
            let store = open_store(cli.store.as_deref())?;
            cmd_export(&registry, &store, &object, &file)
        },

        Commands::Template { type_name, file } => cmd_template(&registry, &type_name, &file),

        Commands::Import(args) => {
            let mut store = open_store(cli.store.as_deref())?;
            cmd_import(&registry, &mut store, &config, args)
        },

        Commands::Create {
            path,
            type_name,
            no_save,
        } => {
            let mut store = open_store(cli.store.as_deref())?;
            cmd_create(&registry, &mut store, &config, &path, &type_name, !no_save)
        },
    }
}

/// Loads configuration.
fn load_config(path: Option<&Path>) -> Result<SyncConfig> {
    let config = match path {
        Some(path) => SyncConfig::load_from_file(path)?,
        None => SyncConfig::load_default(),
    };
    Ok(config.with_env_overrides())
}

fn load_schema(path: Option<&Path>) -> Result<SchemaRegistry> {
    let path = path.ok_or_else(|| {
        Error::InvalidInput("no schema given (use --schema or SHEETSYNC_SCHEMA)".to_string())
    })?;
    SchemaRegistry::load_from_file(path)
}

fn open_store(path: Option<&Path>) -> Result<MemoryStore> {
    path.map_or_else(|| Ok(MemoryStore::new()), MemoryStore::open)
}
