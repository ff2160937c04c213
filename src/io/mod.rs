//! Sheet file I/O.
//!
//! - **Format adapter** ([`formats::csv`]) reads and writes the two-row sheet
//!   file: a header row of column names and one data row.
//! - **Services** tie the file format to the mapping engine and the host
//!   store.
//!
//! # Examples
//!
//! ```rust,ignore
//! use sheetsync::io::{ExportService, ImportService};
//!
//! let report = ExportService::new(&registry, &store)
//!     .export_to_file(&id, Path::new("sword.csv"))?;
//! println!("Exported {} columns", report.columns.len());
//!
//! let report = ImportService::new(&registry, &mut store, &config)
//!     .import_file_to_path(Path::new("sword.csv"), "/Game/Items/Sword", "Weapon", true)?;
//! println!("Applied {} cells", report.applied);
//! ```

pub mod formats;
pub mod services;

pub use services::export::{ExportReport, ExportService};
pub use services::import::{ImportReport, ImportService};
