//! In-memory object store with JSON snapshots.

use crate::models::{Object, ObjectId, Record};
use crate::storage::traits::ObjectStore;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Maximum snapshot file size (16MB).
const MAX_SNAPSHOT_SIZE: u64 = 16 * 1024 * 1024;

/// Path prefix of objects created without a storage path.
pub const TRANSIENT_ROOT: &str = "/Transient";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    objects: Vec<Object>,
}

/// Object store kept in memory, optionally backed by a JSON snapshot file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: BTreeMap<ObjectId, Object>,
    checked_out: BTreeSet<ObjectId>,
    backing: Option<PathBuf>,
    saved: Vec<ObjectId>,
    transient_count: u64,
}

impl MemoryStore {
    /// Creates an empty, unbacked store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a store backed by `path`, loading it when the file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing snapshot cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut store = if path.exists() {
            Self::load_snapshot(&path)?
        } else {
            Self::new()
        };
        store.backing = Some(path);
        Ok(store)
    }

    fn load_snapshot(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path).map_err(|e| Error::OperationFailed {
            operation: "read_snapshot".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        if metadata.len() > MAX_SNAPSHOT_SIZE {
            return Err(Error::InvalidInput(format!(
                "snapshot too large: {} bytes (max {MAX_SNAPSHOT_SIZE})",
                metadata.len()
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_snapshot".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        let snapshot: Snapshot =
            serde_json::from_str(&text).map_err(|e| Error::OperationFailed {
                operation: "parse_snapshot".to_string(),
                cause: e.to_string(),
            })?;

        let mut store = Self::new();
        for object in snapshot.objects {
            store.insert(object);
        }
        tracing::debug!(path = %path.display(), objects = store.len(), "Loaded snapshot");
        Ok(store)
    }

    /// Builder-style insertion.
    #[must_use]
    pub fn with_object(mut self, object: Object) -> Self {
        self.insert(object);
        self
    }

    /// Inserts or replaces an object.
    pub fn insert(&mut self, object: Object) {
        self.objects.insert(object.id.clone(), object);
    }

    /// Number of resident objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if the store holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// IDs persisted through [`ObjectStore::persist`], in call order.
    #[must_use]
    pub fn saved(&self) -> &[ObjectId] {
        &self.saved
    }

    /// Iterates resident objects in ID order.
    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.objects.values()
    }

    /// Writes every addressed object to `path` as JSON.
    ///
    /// Transient objects are not written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let snapshot = Snapshot {
            objects: self
                .objects
                .values()
                .filter(|o| !is_transient(&o.id))
                .cloned()
                .collect(),
        };
        let text = serde_json::to_string_pretty(&snapshot).map_err(|e| Error::OperationFailed {
            operation: "serialize_snapshot".to_string(),
            cause: e.to_string(),
        })?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
                operation: "create_snapshot_dir".to_string(),
                cause: e.to_string(),
            })?;
        }
        std::fs::write(path, text).map_err(|e| Error::OperationFailed {
            operation: "write_snapshot".to_string(),
            cause: format!("{}: {e}", path.display()),
        })
    }
}

/// Checks whether an ID lives under [`TRANSIENT_ROOT`].
#[must_use]
pub fn is_transient(id: &ObjectId) -> bool {
    id.as_str()
        .strip_prefix(TRANSIENT_ROOT)
        .is_some_and(|rest| rest.starts_with('/'))
}

impl ObjectStore for MemoryStore {
    fn object(&self, id: &ObjectId) -> Option<&Object> {
        self.objects.get(id)
    }

    fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id) || self.checked_out.contains(id)
    }

    fn take(&mut self, id: &ObjectId) -> Option<Object> {
        let object = self.objects.remove(id)?;
        self.checked_out.insert(id.clone());
        Some(object)
    }

    fn restore(&mut self, object: Object) {
        self.checked_out.remove(&object.id);
        self.insert(object);
    }

    fn create(&mut self, record: Record, id: Option<ObjectId>) -> Result<ObjectId> {
        let id = match id {
            Some(id) => {
                if self.contains(&id) {
                    return Err(Error::NameCollision {
                        path: id.to_string(),
                        reason: "an object already exists at this path".to_string(),
                    });
                }
                id
            },
            None => loop {
                self.transient_count += 1;
                let candidate = ObjectId::new(format!(
                    "{TRANSIENT_ROOT}/{}_{}",
                    record.type_name, self.transient_count
                ));
                if !self.contains(&candidate) {
                    break candidate;
                }
            },
        };
        tracing::debug!(id = %id, type_name = %record.type_name, "Created object");
        self.insert(Object::new(id.clone(), record));
        Ok(id)
    }

    fn persist(&mut self, id: &ObjectId) -> Result<()> {
        if !self.objects.contains_key(id) {
            return Err(Error::OperationFailed {
                operation: "persist".to_string(),
                cause: format!("no resident object '{id}'"),
            });
        }
        if is_transient(id) {
            return Err(Error::InvalidInput(format!(
                "transient object '{id}' has no storage path"
            )));
        }
        if let Some(path) = &self.backing {
            self.save_to(path)?;
        }
        self.saved.push(id.clone());
        Ok(())
    }
}
