//! Export and import services.

pub mod export;
pub mod import;

pub use export::{ExportReport, ExportService};
pub use import::{ImportReport, ImportService};
