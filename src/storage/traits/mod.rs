//! Host collaborator traits.
//!
//! The mapping engine never touches a concrete metadata system or object
//! store; it talks to these two seams.

mod registry;
mod store;

pub use registry::TypeRegistry;
pub use store::ObjectStore;
