//! Live record values.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Stable identity of a stored object (its object path).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Creates a new object ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ObjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Float.
    Float(f64),
    /// Text or enumerated name.
    Text(String),
    /// Reference to a stored object; `None` is null.
    Reference(Option<ObjectId>),
    /// Ordered list.
    List(Vec<Value>),
    /// Unordered set (insertion order kept for stable output).
    Set(Vec<Value>),
    /// Keyed map.
    Map(MapValue),
    /// Nested record held by value.
    Record(Record),
}

impl Value {
    /// Canonical, locale-independent text of a scalar or reference.
    ///
    /// Containers and records fall back to their JSON form.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.clone(),
            Self::Reference(id) => id.as_ref().map(ToString::to_string).unwrap_or_default(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }

    /// Name of the variant, for diagnostics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Reference(_) => "reference",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
            Self::Record(_) => "record",
        }
    }

    /// Returns the referenced ID, if this is a non-null reference.
    #[must_use]
    pub const fn as_reference(&self) -> Option<&ObjectId> {
        match self {
            Self::Reference(Some(id)) => Some(id),
            _ => None,
        }
    }

    /// Returns the nested record, if any.
    #[must_use]
    pub const fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Returns the nested record mutably, if any.
    pub const fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }
}

/// A keyed map with a deferred index.
///
/// Entries keep insertion order. The lookup index covers a prefix of the
/// entries; [`MapValue::insert_deferred`] appends past that prefix without
/// touching the index, and [`MapValue::rehash`] commits the tail in one pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<(Value, Value)>", into = "Vec<(Value, Value)>")]
pub struct MapValue {
    entries: Vec<(Value, Value)>,
    index: HashMap<String, usize>,
    indexed: usize,
}

impl MapValue {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether entries were appended since the last rehash.
    #[must_use]
    pub fn needs_rehash(&self) -> bool {
        self.indexed < self.entries.len()
    }

    /// Slot of `key`, searching the indexed prefix and then the pending tail.
    #[must_use]
    pub fn find(&self, key: &Value) -> Option<usize> {
        let text = key.to_text();
        if let Some(&slot) = self.index.get(&text) {
            return Some(slot);
        }
        self.entries[self.indexed..]
            .iter()
            .position(|(k, _)| k.to_text() == text)
            .map(|pos| pos + self.indexed)
    }

    /// Returns the slot of `key`, appending `default()` first when missing.
    ///
    /// The index is not updated; call [`MapValue::rehash`] once the batch of
    /// insertions is done.
    pub fn insert_deferred(&mut self, key: Value, default: impl FnOnce() -> Value) -> usize {
        if let Some(slot) = self.find(&key) {
            return slot;
        }
        self.entries.push((key, default()));
        self.entries.len() - 1
    }

    /// Rebuilds the index over every entry.
    pub fn rehash(&mut self) {
        self.index.clear();
        for (slot, (key, _)) in self.entries.iter().enumerate() {
            self.index.insert(key.to_text(), slot);
        }
        self.indexed = self.entries.len();
    }

    /// Inserts or replaces an entry and rehashes.
    pub fn insert(&mut self, key: Value, value: Value) {
        let slot = self.insert_deferred(key, || Value::Bool(false));
        self.entries[slot].1 = value;
        self.rehash();
    }

    /// Value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.find(key).map(|slot| &self.entries[slot].1)
    }

    /// Mutable value in `slot`.
    pub fn value_mut(&mut self, slot: usize) -> Option<&mut Value> {
        self.entries.get_mut(slot).map(|(_, value)| value)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl PartialEq for MapValue {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl From<Vec<(Value, Value)>> for MapValue {
    fn from(entries: Vec<(Value, Value)>) -> Self {
        let mut map = Self::new();
        for (key, value) in entries {
            let slot = map.insert_deferred(key, || Value::Bool(false));
            map.entries[slot].1 = value;
        }
        map.rehash();
        map
    }
}

impl From<MapValue> for Vec<(Value, Value)> {
    fn from(map: MapValue) -> Self {
        map.entries
    }
}

/// Field values of one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Name of the record's type.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Values by field name.
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    /// Creates an empty record of `type_name`.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    /// Value of `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Mutable value of `field`.
    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields.get_mut(field)
    }

    /// Sets `field`, returning the previous value.
    pub fn set(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(field.into(), value)
    }
}

/// A stored object: identity plus record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    /// Object path.
    pub id: ObjectId,
    /// Record contents.
    pub record: Record,
}

impl Object {
    /// Creates an object.
    #[must_use]
    pub const fn new(id: ObjectId, record: Record) -> Self {
        Self { id, record }
    }

    /// Type name of the record.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.record.type_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_display() {
        let id = ObjectId::new("/Game/Items/Sword.Sword");
        assert_eq!(id.to_string(), "/Game/Items/Sword.Sword");
        assert_eq!(id.as_str(), "/Game/Items/Sword.Sword");
        assert_eq!(ObjectId::from("/Game/A.A"), ObjectId::new("/Game/A.A"));
    }

    #[test]
    fn test_value_text() {
        assert_eq!(Value::Bool(true).to_text(), "true");
        assert_eq!(Value::Int(-7).to_text(), "-7");
        assert_eq!(Value::Float(1.5).to_text(), "1.5");
        assert_eq!(Value::Reference(None).to_text(), "");
        assert_eq!(
            Value::Reference(Some(ObjectId::new("/Game/A.A"))).to_text(),
            "/Game/A.A"
        );
    }

    #[test]
    fn test_map_deferred_insert() {
        let mut map = MapValue::new();
        let a = map.insert_deferred(Value::Text("a".to_string()), || Value::Int(0));
        let b = map.insert_deferred(Value::Text("b".to_string()), || Value::Int(0));
        assert!(map.needs_rehash());

        // Pending entries are still found before the rehash.
        let again = map.insert_deferred(Value::Text("a".to_string()), || Value::Int(9));
        assert_eq!(a, again);
        assert_eq!(map.len(), 2);

        if let Some(value) = map.value_mut(b) {
            *value = Value::Int(2);
        }
        map.rehash();
        assert!(!map.needs_rehash());
        assert_eq!(map.get(&Value::Text("b".to_string())), Some(&Value::Int(2)));
        assert_eq!(map.get(&Value::Text("a".to_string())), Some(&Value::Int(0)));
    }

    #[test]
    fn test_map_insert_replaces() {
        let mut map = MapValue::new();
        map.insert(Value::Int(1), Value::Text("one".to_string()));
        map.insert(Value::Int(1), Value::Text("uno".to_string()));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&Value::Int(1)), Some(&Value::Text("uno".to_string())));
    }

    #[test]
    fn test_record_json_shape() {
        let record = Record::new("Stat")
            .with("value", Value::Int(3))
            .with("owner", Value::Reference(None));
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"type\":\"Stat\""));
        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_map_serde_keeps_index() {
        let mut map = MapValue::new();
        map.insert(Value::Text("hp".to_string()), Value::Int(10));
        let json = serde_json::to_string(&Value::Map(map)).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        let Value::Map(back) = back else {
            panic!("expected map");
        };
        assert!(!back.needs_rehash());
        assert_eq!(back.get(&Value::Text("hp".to_string())), Some(&Value::Int(10)));
    }
}
