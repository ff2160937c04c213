//! Sheet export service.
//!
//! Exports one object graph to a sheet file, or a type's empty template.

use crate::io::formats::write_row;
use crate::mapping::{ColumnSet, GraphExporter, SchemaWalker, SyncIssue};
use crate::models::ObjectId;
use crate::storage::{ObjectStore, TypeRegistry};
use crate::{Error, Result};
use std::io::Write;
use std::path::Path;
use tracing::instrument;

/// Result of an export operation.
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    /// Column names written, in order.
    pub columns: Vec<String>,
    /// Fields that could not be expanded.
    pub issues: Vec<SyncIssue>,
}

impl ExportReport {
    /// Returns whether the export noted any issue.
    #[must_use]
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// Service for exporting objects to sheets.
pub struct ExportService<'a> {
    registry: &'a dyn TypeRegistry,
    store: &'a dyn ObjectStore,
}

impl<'a> ExportService<'a> {
    /// Creates a new export service.
    #[must_use]
    pub fn new(registry: &'a dyn TypeRegistry, store: &'a dyn ObjectStore) -> Self {
        Self { registry, store }
    }

    /// Flattens the object `id` into columns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the object does not exist and
    /// [`Error::RejectedType`] if its type is not exportable.
    pub fn export_columns(&self, id: &ObjectId) -> Result<(ColumnSet, Vec<SyncIssue>)> {
        let object = self
            .store
            .object(id)
            .ok_or_else(|| Error::InvalidInput(format!("no object '{id}'")))?;
        let exported = GraphExporter::new(self.registry, self.store).export(object)?;
        if exported.columns.is_empty() {
            return Err(Error::InvalidInput(format!(
                "'{id}' has no exportable properties"
            )));
        }
        Ok((exported.columns, exported.issues))
    }

    /// Exports the object `id` to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the object cannot be exported or writing fails.
    pub fn export_to_writer<W: Write>(&self, id: &ObjectId, writer: W) -> Result<ExportReport> {
        let (columns, issues) = self.export_columns(id)?;
        write_row(writer, &columns)?;
        Ok(ExportReport {
            columns: columns.into_names(),
            issues,
        })
    }

    /// Exports the object `id` to a sheet file.
    ///
    /// Nothing is written if the export fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the object cannot be exported or the file cannot
    /// be written.
    #[instrument(skip(self, path), fields(operation = "export_to_file", path = %path.display()))]
    pub fn export_to_file(&self, id: &ObjectId, path: &Path) -> Result<ExportReport> {
        let mut buf = Vec::new();
        let report = self.export_to_writer(id, &mut buf)?;
        write_file(path, &buf)?;
        tracing::info!(
            id = %id,
            columns = report.columns.len(),
            issues = report.issues.len(),
            "Exported sheet"
        );
        Ok(report)
    }

    /// Writes the header of `type_name` over an empty data row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RejectedType`] if the type is not exportable and
    /// [`Error::InvalidInput`] if it has no columns.
    #[instrument(skip(self, path), fields(operation = "write_template", path = %path.display()))]
    pub fn write_template(&self, type_name: &str, path: &Path) -> Result<ExportReport> {
        let columns = SchemaWalker::new(self.registry).placeholder_row(type_name)?;
        if columns.is_empty() {
            return Err(Error::InvalidInput(format!(
                "'{type_name}' has no exportable properties"
            )));
        }
        let mut buf = Vec::new();
        write_row(&mut buf, &columns)?;
        write_file(path, &buf)?;
        tracing::info!(type_name, columns = columns.len(), "Wrote template");
        Ok(ExportReport {
            columns: columns.into_names(),
            issues: Vec::new(),
        })
    }

    /// Returns the column names of `type_name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RejectedType`] if the type is not exportable.
    pub fn columns_for(&self, type_name: &str) -> Result<Vec<String>> {
        SchemaWalker::new(self.registry).columns_for(type_name)
    }

    /// Returns the sorted names of concrete exportable types.
    #[must_use]
    pub fn exportable_types(&self) -> Vec<String> {
        SchemaWalker::new(self.registry).exportable_types()
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
            operation: "create_export_dir".to_string(),
            cause: format!("{}: {e}", parent.display()),
        })?;
    }
    std::fs::write(path, contents).map_err(|e| Error::OperationFailed {
        operation: "write_sheet".to_string(),
        cause: format!("{}: {e}", path.display()),
    })
}
