//! Object store trait.

use crate::Result;
use crate::models::{Object, ObjectId, Record};

/// Trait for host object stores.
///
/// The store owns every live object. The importer checks an object out with
/// [`ObjectStore::take`] while it mutates it and hands it back with
/// [`ObjectStore::restore`]; a checked-out object still counts as existing.
pub trait ObjectStore {
    /// Returns a stored object.
    fn object(&self, id: &ObjectId) -> Option<&Object>;

    /// Resolves a reference, loading the object first when `load` is set.
    ///
    /// Stores without lazy loading return the resident object.
    fn resolve(&self, id: &ObjectId, load: bool) -> Option<&Object> {
        let _ = load;
        self.object(id)
    }

    /// Checks if an object exists, including checked-out objects.
    fn contains(&self, id: &ObjectId) -> bool;

    /// Checks an object out for mutation.
    fn take(&mut self, id: &ObjectId) -> Option<Object>;

    /// Returns a checked-out object.
    fn restore(&mut self, object: Object);

    /// Creates an object.
    ///
    /// With `id` set, the object is stored under that path and creation fails
    /// with `NameCollision` if the path is taken. Without it a transient,
    /// unaddressed object is created.
    fn create(&mut self, record: Record, id: Option<ObjectId>) -> Result<ObjectId>;

    /// Durably saves an object.
    fn persist(&mut self, id: &ObjectId) -> Result<()>;
}
