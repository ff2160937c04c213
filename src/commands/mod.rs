//! Command handlers module.
//!
//! - `schema.rs`: type and column discovery (`types`, `columns`)
//! - `io.rs`: sheet export, templates, import and record creation

mod io;
mod schema;

use clap::Args;
use std::path::PathBuf;

pub use io::{cmd_create, cmd_export, cmd_import, cmd_template};
pub use schema::{cmd_columns, cmd_types};

/// Arguments of the `import` command.
///
/// With neither `--object` nor `--path`, the sheet is imported into a new
/// transient record of `--type` and printed as JSON.
#[derive(Args)]
pub struct ImportArgs {
    /// Sheet to import.
    pub file: PathBuf,

    /// Existing object to update.
    #[arg(long, conflicts_with = "path")]
    pub object: Option<String>,

    /// Record path to create or update.
    #[arg(long, requires = "type_name")]
    pub path: Option<String>,

    /// Record type for `--path` or a transient import.
    #[arg(long = "type", value_name = "TYPE")]
    pub type_name: Option<String>,

    /// Do not save the target after importing.
    #[arg(long)]
    pub no_save: bool,

    /// Write-back scope override (`root_only` or `root_and_expanded`).
    #[arg(long)]
    pub scope: Option<String>,
}
