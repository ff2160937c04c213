//! Graph exporter: a live object graph to one row.

use crate::mapping::codec::encode;
use crate::mapping::{ColumnSet, SchemaWalker, SyncIssue};
use crate::models::{ElementKind, FieldDescriptor, FieldKind, Object, ObjectId, Record, ScalarKind, Value};
use crate::storage::{ObjectStore, TypeRegistry};
use crate::{Error, Result};
use std::collections::HashSet;

/// Output of one export walk.
#[derive(Debug, Clone, Default)]
pub struct ExportedRow {
    /// Columns in canonical order with their values.
    pub columns: ColumnSet,
    /// Fields that could not be expanded.
    pub issues: Vec<SyncIssue>,
}

/// Walks an object graph and flattens it into columns.
///
/// Each object is entered at most once per walk. When a reference leads back
/// to an object already visited, its columns are left out of the row rather
/// than padded with placeholders, so a cyclic graph can export fewer columns
/// than [`SchemaWalker::columns_for`] reports for the same type.
pub struct GraphExporter<'a> {
    registry: &'a dyn TypeRegistry,
    store: &'a dyn ObjectStore,
    visited: HashSet<ObjectId>,
    expanding: Vec<String>,
    columns: ColumnSet,
    issues: Vec<SyncIssue>,
}

impl<'a> GraphExporter<'a> {
    /// Creates an exporter.
    #[must_use]
    pub fn new(registry: &'a dyn TypeRegistry, store: &'a dyn ObjectStore) -> Self {
        Self {
            registry,
            store,
            visited: HashSet::new(),
            expanding: Vec::new(),
            columns: ColumnSet::new(),
            issues: Vec::new(),
        }
    }

    /// Exports `object` and everything its expand fields reach.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RejectedType`] if the object's type is not exportable.
    pub fn export(mut self, object: &Object) -> Result<ExportedRow> {
        if !self.registry.is_exportable(object.type_name()) {
            return Err(Error::RejectedType {
                type_name: object.type_name().to_string(),
            });
        }
        self.visit_object(object, "");
        tracing::debug!(
            id = %object.id,
            columns = self.columns.len(),
            visited = self.visited.len(),
            "Exported object graph"
        );
        Ok(ExportedRow {
            columns: self.columns,
            issues: self.issues,
        })
    }

    fn visit_object(&mut self, object: &Object, prefix: &str) {
        if !self.visited.insert(object.id.clone()) {
            tracing::debug!(id = %object.id, prefix, "Already visited, skipping");
            return;
        }
        self.visit_record(&object.record, prefix);
    }

    fn visit_record(&mut self, record: &Record, prefix: &str) {
        let registry = self.registry;
        let Some(layout) = registry.layout(&record.type_name) else {
            return;
        };

        self.expanding.push(record.type_name.clone());
        for field in layout {
            let value = record.get(&field.name);
            if field.emits_column() {
                let text = value.map_or_else(
                    || encode(&field.kind, &registry.default_value(&field.kind)),
                    |v| encode(&field.kind, v),
                );
                self.columns
                    .insert(format!("{prefix}{}", field.column_key()), text);
            }
            if field.expand {
                let nested = format!("{prefix}{}", field.expand_prefix());
                self.expand_field(field, value, &nested);
            }
        }
        self.expanding.pop();
    }

    fn expand_field(&mut self, field: &FieldDescriptor, value: Option<&Value>, prefix: &str) {
        match &field.kind {
            FieldKind::Record(type_name) => {
                if !self.registry.can_expand(type_name) {
                    return;
                }
                match value.and_then(Value::as_record) {
                    Some(record) => self.visit_record(record, prefix),
                    None => self.placeholders(type_name, prefix),
                }
            },
            FieldKind::Reference(target) => {
                if !self.registry.can_expand(&target.class) {
                    return;
                }
                match self.resolve(value, target.soft) {
                    Some(object) => self.visit_object(object, prefix),
                    None => self.placeholders(&target.class, prefix),
                }
            },
            FieldKind::List(element) => {
                let Some(Value::List(items)) = value else {
                    return;
                };
                for (index, item) in items.iter().enumerate() {
                    self.expand_element(element, item, &format!("{prefix}{index}"));
                }
            },
            FieldKind::Map { key, value: element } => {
                let Some(Value::Map(map)) = value else {
                    return;
                };
                for (entry_key, item) in map.iter() {
                    let segment = encode(&FieldKind::Scalar(key.clone()), entry_key);
                    self.expand_element(element, item, &format!("{prefix}{segment}"));
                }
            },
            FieldKind::Set(_) => {
                tracing::warn!(field = %field.name, "Expand is not supported on sets");
                self.issues.push(SyncIssue::from(Error::UnsupportedShape {
                    field: field.name.clone(),
                    reason: "expand is not supported on sets".to_string(),
                }));
            },
            FieldKind::Scalar(_) => {},
        }
    }

    /// Emits one container element addressed by `path` (prefix plus index or key).
    fn expand_element(&mut self, element: &ElementKind, item: &Value, path: &str) {
        match element {
            ElementKind::Record(type_name) => {
                if !self.registry.can_expand(type_name) {
                    return;
                }
                if let Some(record) = item.as_record() {
                    self.visit_record(record, &format!("{path}_"));
                }
            },
            ElementKind::Reference(target) => {
                // Null and non-exportable elements are skipped without error.
                let Some(object) = self.resolve(Some(item), target.soft) else {
                    return;
                };
                if self.registry.can_expand(object.type_name()) {
                    self.visit_object(object, &format!("{path}_"));
                }
            },
            ElementKind::Scalar(kind) => {
                self.columns
                    .insert(path.to_string(), encode_scalar(kind, item));
            },
        }
    }

    fn resolve(&self, value: Option<&Value>, soft: bool) -> Option<&'a Object> {
        let store = self.store;
        let id = value.and_then(Value::as_reference)?;
        let object = store.resolve(id, soft);
        if object.is_none() {
            tracing::debug!(id = %id, "Reference does not resolve");
        }
        object
    }

    /// Emits empty columns for a declared type that has no instance.
    ///
    /// Types already being expanded on the current path are not entered, the
    /// same rule [`SchemaWalker`] applies.
    fn placeholders(&mut self, type_name: &str, prefix: &str) {
        let mut stack = self.expanding.clone();
        SchemaWalker::new(self.registry).walk(type_name, prefix, &mut self.columns, &mut stack);
    }
}

fn encode_scalar(kind: &ScalarKind, value: &Value) -> String {
    encode(&FieldKind::Scalar(kind.clone()), value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MapValue, RefTarget, TypeDescriptor};
    use crate::storage::{MemoryStore, SchemaRegistry};

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new()
            .with_type(
                TypeDescriptor::class("Npc")
                    .exportable()
                    .field(FieldDescriptor::scalar("name", ScalarKind::Text))
                    .field(
                        FieldDescriptor::new("friend", FieldKind::Reference(RefTarget::hard("Npc")))
                            .expanded(),
                    )
                    .field(
                        FieldDescriptor::new(
                            "loot",
                            FieldKind::List(ElementKind::Scalar(ScalarKind::Int)),
                        )
                        .expanded(),
                    )
                    .field(
                        FieldDescriptor::new(
                            "stats",
                            FieldKind::Map {
                                key: ScalarKind::Text,
                                value: ElementKind::Scalar(ScalarKind::Float),
                            },
                        )
                        .expanded(),
                    )
                    .field(
                        FieldDescriptor::new("tags", FieldKind::Set(ScalarKind::Text)).expanded(),
                    ),
            )
    }

    fn npc(id: &str, name: &str, friend: Option<&str>) -> Object {
        let mut stats = MapValue::new();
        stats.insert(Value::Text("speed".to_string()), Value::Float(1.5));
        Object::new(
            ObjectId::new(id),
            Record::new("Npc")
                .with("name", Value::Text(name.to_string()))
                .with("friend", Value::Reference(friend.map(ObjectId::new)))
                .with("loot", Value::List(vec![Value::Int(3), Value::Int(4)]))
                .with("stats", Value::Map(stats))
                .with("tags", Value::Set(Vec::new())),
        )
    }

    #[test]
    fn test_export_expands_containers() {
        let registry = registry();
        let store = MemoryStore::new().with_object(npc("/Game/A.A", "Ann", None));
        let object = store.object(&ObjectId::new("/Game/A.A")).unwrap();

        let row = GraphExporter::new(&registry, &store).export(object).unwrap();
        assert_eq!(
            row.columns.names(),
            ["name", "loot_0", "loot_1", "stats_speed"]
        );
        assert_eq!(row.columns.get("loot_1"), Some("4"));
        assert_eq!(row.columns.get("stats_speed"), Some("1.5"));
        assert_eq!(row.issues.len(), 1);
    }

    #[test]
    fn test_export_cycle_drops_visited_branch() {
        let registry = registry();
        let store = MemoryStore::new()
            .with_object(npc("/Game/A.A", "Ann", Some("/Game/B.B")))
            .with_object(npc("/Game/B.B", "Ben", Some("/Game/A.A")));
        let object = store.object(&ObjectId::new("/Game/A.A")).unwrap();

        let row = GraphExporter::new(&registry, &store).export(object).unwrap();
        assert_eq!(row.columns.get("friend_name"), Some("Ben"));
        assert!(!row.columns.contains("friend_friend_name"));
    }
}
