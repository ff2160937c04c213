//! Graph importer: one row back into a live object graph.

use crate::config::WriteBackScope;
use crate::mapping::codec::{DecodeError, decode, decode_scalar};
use crate::mapping::{Row, SyncIssue};
use crate::models::{
    ElementKind, FieldDescriptor, FieldKind, MapValue, ObjectId, Record, ScalarKind, Value,
};
use crate::storage::{ObjectStore, TypeRegistry};
use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Highest container index an import may grow a list to.
pub const MAX_LIST_INDEX: usize = 65_535;

/// Outcome of one import walk.
#[derive(Debug, Clone, Default)]
pub struct AppliedRow {
    /// Cells decoded and written.
    pub applied: usize,
    /// Columns that matched no field.
    pub skipped_unknown: usize,
    /// Cells and fields that could not be applied.
    pub issues: Vec<SyncIssue>,
}

/// Writes a row into an object and, depending on scope, the objects,
/// records and containers its expand fields reach.
///
/// Container sizes and map keys are discovered from the column names. Each
/// object is entered at most once per walk.
pub struct GraphImporter<'a> {
    registry: &'a dyn TypeRegistry,
    store: &'a mut dyn ObjectStore,
    scope: WriteBackScope,
    visited: HashSet<ObjectId>,
    expanding: Vec<String>,
    consumed: HashSet<String>,
    applied: usize,
    issues: Vec<SyncIssue>,
}

impl<'a> GraphImporter<'a> {
    /// Creates an importer.
    #[must_use]
    pub fn new(
        registry: &'a dyn TypeRegistry,
        store: &'a mut dyn ObjectStore,
        scope: WriteBackScope,
    ) -> Self {
        Self {
            registry,
            store,
            scope,
            visited: HashSet::new(),
            expanding: Vec::new(),
            consumed: HashSet::new(),
            applied: 0,
            issues: Vec::new(),
        }
    }

    /// Applies `row` to the object `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RejectedType`] if the object's type is not exportable
    /// and [`Error::InvalidInput`] if no such object exists.
    pub fn import(mut self, row: &Row, id: &ObjectId) -> Result<AppliedRow> {
        let type_name = self
            .store
            .object(id)
            .map(|object| object.type_name().to_string())
            .ok_or_else(|| Error::InvalidInput(format!("no object at '{id}'")))?;
        if !self.registry.is_exportable(&type_name) {
            return Err(Error::RejectedType { type_name });
        }

        self.apply_object(row, id, "");

        let skipped_unknown = row
            .iter()
            .filter(|(column, _)| !self.consumed.contains(*column))
            .count();
        tracing::debug!(
            id = %id,
            applied = self.applied,
            skipped_unknown,
            issues = self.issues.len(),
            "Imported row"
        );
        Ok(AppliedRow {
            applied: self.applied,
            skipped_unknown,
            issues: self.issues,
        })
    }

    fn apply_object(&mut self, row: &Row, id: &ObjectId, prefix: &str) {
        if !self.visited.insert(id.clone()) {
            tracing::debug!(id = %id, prefix, "Already visited, skipping");
            return;
        }
        let Some(mut object) = self.store.take(id) else {
            return;
        };
        self.apply_record(row, &mut object.record, prefix);
        self.store.restore(object);
    }

    fn apply_record(&mut self, row: &Row, record: &mut Record, prefix: &str) {
        let registry = self.registry;
        let Some(layout) = registry.layout(&record.type_name) else {
            return;
        };

        self.expanding.push(record.type_name.clone());
        for field in layout {
            if field.emits_column() {
                let column = format!("{prefix}{}", field.column_key());
                if let Some(text) = row.get(&column) {
                    self.consumed.insert(column.clone());
                    if let Some(value) = self.decode_cell(&field.kind, &column, text) {
                        record.set(field.name.clone(), value);
                        self.applied += 1;
                    }
                }
            }
            if !field.expand || self.scope != WriteBackScope::RootAndExpanded {
                continue;
            }
            let nested = format!("{prefix}{}", field.expand_prefix());
            self.expand_field(row, record, field, &nested);
        }
        self.expanding.pop();
    }

    /// Decodes one cell, recording a failure as an issue.
    fn decode_cell(&mut self, kind: &FieldKind, column: &str, text: &str) -> Option<Value> {
        match decode(kind, text, &*self.store) {
            Ok(value) => Some(value),
            Err(DecodeError::EmptyCell) => {
                tracing::trace!(column, "Empty cell left unapplied");
                None
            },
            Err(source) => {
                tracing::warn!(column, error = %source, "Malformed cell");
                self.issues.push(SyncIssue::from(Error::MalformedCell {
                    column: column.to_string(),
                    source,
                }));
                None
            },
        }
    }

    fn expand_field(&mut self, row: &Row, record: &mut Record, field: &FieldDescriptor, prefix: &str) {
        match &field.kind {
            FieldKind::Record(type_name) => {
                if !self.registry.can_expand(type_name) {
                    return;
                }
                // Never fabricate a struct of a type already being expanded.
                let present = matches!(record.get(&field.name), Some(Value::Record(_)));
                if !present && self.expanding.contains(type_name) {
                    return;
                }
                let slot = field_slot(self.registry, record, field);
                if !matches!(slot, Value::Record(_)) {
                    *slot = Value::Record(self.registry.default_record(type_name));
                }
                if let Some(nested) = slot.as_record_mut() {
                    self.apply_record(row, nested, prefix);
                }
            },
            FieldKind::Reference(target) => {
                if !self.registry.can_expand(&target.class) {
                    return;
                }
                if let Some(id) = record.get(&field.name).and_then(Value::as_reference).cloned() {
                    self.apply_reference(row, &id, target.soft, prefix);
                }
            },
            FieldKind::List(ElementKind::Scalar(kind)) => {
                self.apply_scalar_list(row, record, field, kind, prefix);
            },
            FieldKind::List(element) => self.apply_list(row, record, field, element, prefix),
            FieldKind::Map {
                key,
                value: ElementKind::Scalar(kind),
            } => self.apply_scalar_map(row, record, field, key, kind, prefix),
            FieldKind::Map { key, value } => self.apply_map(row, record, field, key, value, prefix),
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

    /// Enters a referenced object if it exists and its type is expandable.
    fn apply_reference(&mut self, row: &Row, id: &ObjectId, soft: bool, prefix: &str) {
        if self.visited.contains(id) {
            return;
        }
        let expandable = self
            .store
            .resolve(id, soft)
            .is_some_and(|object| self.registry.can_expand(object.type_name()));
        if expandable {
            self.apply_object(row, id, prefix);
        }
    }

    /// Record and reference elements, addressed as `{prefix}{index}_{column}`.
    fn apply_list(
        &mut self,
        row: &Row,
        record: &mut Record,
        field: &FieldDescriptor,
        element: &ElementKind,
        prefix: &str,
    ) {
        if let ElementKind::Record(type_name) = element
            && !self.registry.can_expand(type_name)
        {
            return;
        }
        let indices: BTreeSet<usize> = row
            .with_prefix(prefix)
            .filter_map(|(_, suffix, _)| leading_segment(suffix))
            .filter_map(|segment| self.parse_index(segment, &field.name))
            .collect();
        let Some(&max) = indices.last() else {
            return;
        };

        let default = self.registry.default_value(&FieldKind::from(element));
        let mut items = take_list(record, &field.name);
        if items.len() <= max {
            items.resize(max + 1, default);
        }

        for index in indices {
            let path = format!("{prefix}{index}_");
            match element {
                ElementKind::Record(_) => {
                    if let Some(nested) = items.get_mut(index).and_then(Value::as_record_mut) {
                        self.apply_record(row, nested, &path);
                    }
                },
                ElementKind::Reference(target) => {
                    let id = items.get(index).and_then(Value::as_reference).cloned();
                    if let Some(id) = id {
                        self.apply_reference(row, &id, target.soft, &path);
                    }
                },
                ElementKind::Scalar(_) => {},
            }
        }
        record.set(field.name.clone(), Value::List(items));
    }

    /// Scalar elements, addressed as `{prefix}{index}`.
    ///
    /// The list grows once to the highest index seen; writes then go in
    /// ascending index order.
    fn apply_scalar_list(
        &mut self,
        row: &Row,
        record: &mut Record,
        field: &FieldDescriptor,
        kind: &ScalarKind,
        prefix: &str,
    ) {
        let mut writes: BTreeMap<usize, (String, String)> = BTreeMap::new();
        for (column, suffix, text) in row.with_prefix(prefix) {
            if let Some(index) = self.parse_index(suffix, &field.name) {
                writes.insert(index, (column.to_string(), text.to_string()));
            }
        }
        let Some(&max) = writes.keys().next_back() else {
            return;
        };

        let value_kind = FieldKind::Scalar(kind.clone());
        let default = self.registry.default_value(&value_kind);
        let decoded: Vec<(usize, Option<Value>)> = writes
            .into_iter()
            .map(|(index, (column, text))| {
                self.consumed.insert(column.clone());
                (index, self.decode_cell(&value_kind, &column, &text))
            })
            .collect();

        let mut items = take_list(record, &field.name);
        if items.len() <= max {
            items.resize(max + 1, default);
        }
        for (index, value) in decoded {
            if let Some(value) = value {
                items[index] = value;
                self.applied += 1;
            }
        }
        record.set(field.name.clone(), Value::List(items));
    }

    /// Record and reference values, addressed as `{prefix}{key}_{column}`.
    fn apply_map(
        &mut self,
        row: &Row,
        record: &mut Record,
        field: &FieldDescriptor,
        key_kind: &ScalarKind,
        element: &ElementKind,
        prefix: &str,
    ) {
        if let ElementKind::Record(type_name) = element
            && !self.registry.can_expand(type_name)
        {
            return;
        }
        let keys: BTreeSet<&str> = row
            .with_prefix(prefix)
            .filter_map(|(_, suffix, _)| leading_segment(suffix))
            .collect();
        if keys.is_empty() {
            return;
        }

        let default = self.registry.default_value(&FieldKind::from(element));
        let mut map = take_map(record, &field.name);
        for key_text in keys {
            let Ok(key) = decode_scalar(key_kind, key_text) else {
                tracing::debug!(field = %field.name, key = key_text, "Map key does not decode");
                continue;
            };
            let slot = map.insert_deferred(key, || default.clone());
            let path = format!("{prefix}{key_text}_");
            match element {
                ElementKind::Record(_) => {
                    if let Some(nested) = map.value_mut(slot).and_then(Value::as_record_mut) {
                        self.apply_record(row, nested, &path);
                    }
                },
                ElementKind::Reference(target) => {
                    let id = map
                        .value_mut(slot)
                        .and_then(|value| value.as_reference().cloned());
                    if let Some(id) = id {
                        self.apply_reference(row, &id, target.soft, &path);
                    }
                },
                ElementKind::Scalar(_) => {},
            }
        }
        if map.needs_rehash() {
            map.rehash();
        }
        record.set(field.name.clone(), Value::Map(map));
    }

    /// Scalar values, addressed as `{prefix}{key}`.
    fn apply_scalar_map(
        &mut self,
        row: &Row,
        record: &mut Record,
        field: &FieldDescriptor,
        key_kind: &ScalarKind,
        kind: &ScalarKind,
        prefix: &str,
    ) {
        let value_kind = FieldKind::Scalar(kind.clone());
        let mut entries = Vec::new();
        for (column, key_text, text) in row.with_prefix(prefix) {
            if key_text.is_empty() {
                continue;
            }
            let Ok(key) = decode_scalar(key_kind, key_text) else {
                continue;
            };
            self.consumed.insert(column.to_string());
            if let Some(value) = self.decode_cell(&value_kind, column, text) {
                entries.push((key, value));
            }
        }
        if entries.is_empty() {
            return;
        }

        let default = self.registry.default_value(&value_kind);
        let mut map = take_map(record, &field.name);
        for (key, value) in entries {
            let slot = map.insert_deferred(key, || default.clone());
            if let Some(target) = map.value_mut(slot) {
                *target = value;
                self.applied += 1;
            }
        }
        if map.needs_rehash() {
            map.rehash();
        }
        record.set(field.name.clone(), Value::Map(map));
    }

    fn parse_index(&mut self, segment: &str, field: &str) -> Option<usize> {
        if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        match segment.parse::<usize>() {
            Ok(index) if index <= MAX_LIST_INDEX => Some(index),
            _ => {
                tracing::warn!(field, index = segment, "List index out of range");
                self.issues.push(SyncIssue::error(
                    field,
                    format!("list index {segment} exceeds {MAX_LIST_INDEX}"),
                ));
                None
            },
        }
    }
}

/// The part of `suffix` before its first `_`, if that part is non-empty.
fn leading_segment(suffix: &str) -> Option<&str> {
    suffix
        .find('_')
        .filter(|&pos| pos > 0)
        .map(|pos| &suffix[..pos])
}

fn field_slot<'r>(
    registry: &dyn TypeRegistry,
    record: &'r mut Record,
    field: &FieldDescriptor,
) -> &'r mut Value {
    record
        .fields
        .entry(field.name.clone())
        .or_insert_with(|| registry.default_value(&field.kind))
}

/// Moves a list out of `record`; a missing or mistyped value becomes empty.
fn take_list(record: &mut Record, field: &str) -> Vec<Value> {
    match record.fields.remove(field) {
        Some(Value::List(items)) => items,
        _ => Vec::new(),
    }
}

/// Moves a map out of `record`; a missing or mistyped value becomes empty.
fn take_map(record: &mut Record, field: &str) -> MapValue {
    match record.fields.remove(field) {
        Some(Value::Map(map)) => map,
        _ => MapValue::new(),
    }
}
