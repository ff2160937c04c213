//! Sheet import service.
//!
//! Reads a sheet file and writes its row into an existing object, a new
//! transient object, or an object at a record path (create-or-update).
//! Every call parses the file before touching the store, creates at most one
//! object and saves at most once.

use crate::config::SyncConfig;
use crate::io::formats::read_row_from_file;
use crate::mapping::{GraphImporter, Row, SyncIssue};
use crate::models::ObjectId;
use crate::storage::{ObjectStore, TypeRegistry, is_transient};
use crate::{Error, Result};
use std::path::Path;
use tracing::instrument;

/// Result of an import operation.
#[derive(Debug, Clone)]
pub struct ImportReport {
    /// Object the row was written into.
    pub target: ObjectId,
    /// Cells decoded and written.
    pub applied: usize,
    /// Columns that matched no field.
    pub skipped_unknown: usize,
    /// Cells and fields that could not be applied.
    pub issues: Vec<SyncIssue>,
    /// Whether the target was created by this call.
    pub created: bool,
    /// Whether the target was persisted.
    pub saved: bool,
}

impl ImportReport {
    /// Returns whether the import noted any issue.
    #[must_use]
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// Service for importing sheets into objects.
pub struct ImportService<'a> {
    registry: &'a dyn TypeRegistry,
    store: &'a mut dyn ObjectStore,
    config: &'a SyncConfig,
}

impl<'a> ImportService<'a> {
    /// Creates a new import service.
    #[must_use]
    pub fn new(
        registry: &'a dyn TypeRegistry,
        store: &'a mut dyn ObjectStore,
        config: &'a SyncConfig,
    ) -> Self {
        Self {
            registry,
            store,
            config,
        }
    }

    /// Writes `row` into the object `id` under the configured scope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the object does not exist and
    /// [`Error::RejectedType`] if its type is not exportable.
    pub fn import_row(&mut self, row: &Row, id: &ObjectId) -> Result<ImportReport> {
        let scope = self.config.write_back_scope;
        let applied = GraphImporter::new(self.registry, &mut *self.store, scope).import(row, id)?;
        Ok(ImportReport {
            target: id.clone(),
            applied: applied.applied,
            skipped_unknown: applied.skipped_unknown,
            issues: applied.issues,
            created: false,
            saved: false,
        })
    }

    /// Imports a sheet into the existing object `id`.
    ///
    /// The object is saved afterwards when `save_on_import` is set and it
    /// has a storage path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed, the object is missing or
    /// not exportable, or saving fails.
    #[instrument(skip(self, path), fields(operation = "import_file_into", path = %path.display()))]
    pub fn import_file_into(&mut self, path: &Path, id: &ObjectId) -> Result<ImportReport> {
        let row = read_row_from_file(path)?;
        let mut report = self.import_row(&row, id)?;
        if self.config.save_on_import && !is_transient(id) {
            self.store.persist(id)?;
            report.saved = true;
        }
        log_report(&report);
        Ok(report)
    }

    /// Imports a sheet into a new transient object of `type_name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RejectedType`] if the type is not exportable and an
    /// error if the file is malformed.
    #[instrument(skip(self, path), fields(operation = "import_file_to_new", path = %path.display()))]
    pub fn import_file_to_new(&mut self, path: &Path, type_name: &str) -> Result<ImportReport> {
        self.require_exportable(type_name)?;
        self.require_concrete(type_name)?;
        let row = read_row_from_file(path)?;
        let record = self.registry.default_record(type_name);
        let id = self.store.create(record, None)?;
        let mut report = self.import_row(&row, &id)?;
        report.created = true;
        log_report(&report);
        Ok(report)
    }

    /// Imports a sheet into the object at `record_path`, creating it if
    /// nothing exists there.
    ///
    /// An existing object must be of `type_name` or a subtype of it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a bad path, [`Error::RejectedType`]
    /// if the type is not exportable, [`Error::InvalidInput`] when an abstract
    /// type would have to be created, [`Error::NameCollision`] if an
    /// incompatible object occupies the path, and an error if the file is
    /// malformed or saving fails.
    #[instrument(skip(self, path), fields(operation = "import_file_to_path", path = %path.display()))]
    pub fn import_file_to_path(
        &mut self,
        path: &Path,
        record_path: &str,
        type_name: &str,
        save: bool,
    ) -> Result<ImportReport> {
        let location = self.config.path_policy.split(record_path)?;
        self.require_exportable(type_name)?;
        let row = read_row_from_file(path)?;

        let id = location.object_id();
        let created = match self.store.object(&id) {
            Some(existing) => {
                if !self.registry.is_subtype_of(existing.type_name(), type_name) {
                    return Err(Error::NameCollision {
                        path: id.to_string(),
                        reason: format!(
                            "existing object is a '{}', not a '{type_name}'",
                            existing.type_name()
                        ),
                    });
                }
                tracing::debug!(id = %id, "Updating existing object");
                false
            },
            None => {
                self.require_concrete(type_name)?;
                let record = self.registry.default_record(type_name);
                self.store.create(record, Some(id.clone()))?;
                true
            },
        };

        let mut report = self.import_row(&row, &id)?;
        report.created = created;
        if save {
            self.store.persist(&id)?;
            report.saved = true;
        }
        log_report(&report);
        Ok(report)
    }

    /// Creates a default-initialized object of `type_name` at `record_path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a bad path or an abstract type,
    /// [`Error::RejectedType`] for an unknown or unexportable type,
    /// [`Error::NameCollision`]
    /// if anything exists at the path, and an error if saving fails.
    #[instrument(skip(self), fields(operation = "create_record"))]
    pub fn create_record(
        &mut self,
        record_path: &str,
        type_name: &str,
        save: bool,
    ) -> Result<ObjectId> {
        let location = self.config.path_policy.split(record_path)?;
        self.require_exportable(type_name)?;
        self.require_concrete(type_name)?;

        let record = self.registry.default_record(type_name);
        let id = self.store.create(record, Some(location.object_id()))?;
        if save {
            self.store.persist(&id)?;
        }
        tracing::info!(id = %id, type_name, saved = save, "Created record");
        Ok(id)
    }

    fn require_concrete(&self, type_name: &str) -> Result<()> {
        if self
            .registry
            .descriptor(type_name)
            .is_some_and(|d| d.is_abstract)
        {
            return Err(Error::InvalidInput(format!(
                "cannot create abstract type '{type_name}'"
            )));
        }
        Ok(())
    }

    fn require_exportable(&self, type_name: &str) -> Result<()> {
        if self.registry.is_exportable(type_name) {
            Ok(())
        } else {
            Err(Error::RejectedType {
                type_name: type_name.to_string(),
            })
        }
    }
}

fn log_report(report: &ImportReport) {
    tracing::info!(
        target_id = %report.target,
        applied = report.applied,
        skipped_unknown = report.skipped_unknown,
        issues = report.issues.len(),
        created = report.created,
        saved = report.saved,
        "Imported sheet"
    );
}
