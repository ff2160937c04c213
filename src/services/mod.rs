//! Business logic services.
//!
//! The file-level import/export services live in [`crate::io`]; this module
//! holds the policies they consult.

mod path_policy;

pub use path_policy::{DEFAULT_ROOT, PathPolicy, RecordPath};
