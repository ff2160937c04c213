//! Data models for sheetsync.
//!
//! Type descriptors describe what a record looks like; values hold what a
//! live record currently contains.

mod descriptor;
mod value;

pub use descriptor::{
    ElementKind, FieldDescriptor, FieldKind, RecordKind, RefTarget, ScalarKind, TypeDescriptor,
};
pub use value::{MapValue, Object, ObjectId, Record, Value};
