//! Record ⇄ row mapping engine.
//!
//! # Components
//!
//! | Component | Direction | Entry point |
//! |-----------|-----------|-------------|
//! | Value codec | leaf ⇄ cell text | [`codec::encode`], [`codec::decode`] |
//! | Schema walker | type → column names | [`SchemaWalker::columns_for`] |
//! | Graph exporter | object graph → row | [`GraphExporter::export`] |
//! | Graph importer | row → object graph | [`GraphImporter::import`] |
//!
//! # Column paths
//!
//! A column is the concatenation of the prefixes gathered while descending
//! through expand fields, followed by the leaf's column key:
//!
//! ```text
//! stats_hp          record field `stats`, leaf `hp`
//! loot_2            scalar list `loot`, index 2
//! slots_0_count     record list `slots`, index 0, leaf `count`
//! resist_fire       scalar map `resist`, key `fire`
//! ```
//!
//! Every walk is synchronous and keeps its own visited set, created per call.

pub mod codec;
mod columns;
mod export;
mod import;
mod issue;
mod schema;

pub use codec::DecodeError;
pub use columns::{ColumnSet, Row};
pub use export::{ExportedRow, GraphExporter};
pub use import::{AppliedRow, GraphImporter, MAX_LIST_INDEX};
pub use issue::{IssueSeverity, SyncIssue};
pub use schema::SchemaWalker;
