//! # Sheetsync
//!
//! Synchronizes structured records with flat, single-row CSV sheets.
//!
//! A record is described by a [`TypeDescriptor`] (its fields, their kinds and
//! their opt-in markers). The mapping engine turns a live record graph into
//! one CSV row (one column per leaf or per element of an expanded container)
//! and writes such a row back into a live graph.
//!
//! ## Features
//!
//! - Schema discovery: the column set of a type without any instance
//! - Export of arbitrarily nested records, lists, maps and references
//! - Import with container growth, keyed-map insertion and cycle guards
//! - Write-back scope switch (root leaves only, or root and expanded fields)
//! - Path policy for records created by an import
//!
//! ## Example
//!
//! ```rust,ignore
//! use sheetsync::io::ExportService;
//!
//! let service = ExportService::new(&registry, &store);
//! let report = service.export_to_file(&ObjectId::new("/Game/Items/Sword.Sword"), path)?;
//! println!("{} columns", report.columns.len());
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
pub mod io;
pub mod mapping;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

pub use config::{SyncConfig, WriteBackScope};
pub use mapping::{DecodeError, IssueSeverity, SyncIssue};
pub use models::{
    ElementKind, FieldDescriptor, FieldKind, MapValue, Object, ObjectId, Record, RecordKind,
    RefTarget, ScalarKind, TypeDescriptor, Value,
};
pub use storage::{MemoryStore, ObjectStore, SchemaRegistry, TypeRegistry};

/// Error type for sheetsync operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When | Fatal |
/// |---------|-------------|-------|
/// | `RejectedType` | Type is unknown or lacks the exportable marker | yes |
/// | `MalformedFile` | Fewer than two CSV records, header/value count mismatch | yes |
/// | `MalformedCell` | One leaf value fails to decode | no, collected as an issue |
/// | `NameCollision` | Target path holds an existing, incompatible record | yes |
/// | `UnsupportedShape` | Expand marker on a set field | no, collected as an issue |
/// | `InvalidInput` | Bad record path, empty export, bad CLI or config value | yes |
/// | `OperationFailed` | File I/O, parse or persistence failures | yes |
#[derive(Debug, ThisError)]
pub enum Error {
    /// The type is unknown or not marked exportable.
    #[error("type '{type_name}' is not marked exportable")]
    RejectedType {
        /// Name of the rejected type.
        type_name: String,
    },

    /// The CSV file does not hold a header row and a matching data row.
    #[error("malformed csv file: {0}")]
    MalformedFile(String),

    /// A single cell could not be decoded into its field.
    #[error("malformed cell '{column}': {source}")]
    MalformedCell {
        /// Column the cell belongs to.
        column: String,
        /// Why decoding failed.
        #[source]
        source: DecodeError,
    },

    /// A record path already resolves to an object that cannot be used.
    #[error("name collision at '{path}': {reason}")]
    NameCollision {
        /// The object path that collided.
        path: String,
        /// What was found there.
        reason: String,
    },

    /// A field has a shape the engine cannot expand.
    #[error("unsupported shape on field '{field}': {reason}")]
    UnsupportedShape {
        /// Field carrying the marker.
        field: String,
        /// Why it cannot be expanded.
        reason: String,
    },

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Builds an [`Error::OperationFailed`] from any displayable cause.
    pub fn operation(operation: &str, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }

    /// Returns whether the error aborts the whole call.
    ///
    /// Cell and shape errors are isolated to one field.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::MalformedCell { .. } | Self::UnsupportedShape { .. }
        )
    }
}

/// Result type alias for sheetsync operations.
pub type Result<T> = std::result::Result<T, Error>;
