//! Host collaborators.
//!
//! - **Traits**: [`TypeRegistry`] (type metadata) and [`ObjectStore`] (live objects)
//! - **Reference hosts**: [`SchemaRegistry`] loaded from TOML, [`MemoryStore`]
//!   backed by a JSON snapshot

pub mod memory;
pub mod schema;
pub mod traits;

pub use memory::{MemoryStore, TRANSIENT_ROOT, is_transient};
pub use schema::SchemaRegistry;
pub use traits::{ObjectStore, TypeRegistry};
