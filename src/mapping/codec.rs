//! Value codec: leaf values to and from cell text.
//!
//! # Formats
//!
//! | Kind | Cell text |
//! |------|-----------|
//! | bool | `true` / `false` (decode also takes `1`/`0`/`yes`/`no`) |
//! | int, float | Locale-independent decimal |
//! | text, enum | As-is |
//! | reference | Object path, empty for null |
//! | record | JSON object |
//! | list, set | `;`-separated items, quoted when holding `;` or `"` |
//! | map | JSON object keyed by the key's text, empty for an empty map |

use crate::models::{ElementKind, FieldKind, MapValue, ObjectId, Record, ScalarKind, Value};
use crate::storage::ObjectStore;
use thiserror::Error;

/// Why a cell could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The cell is empty and the kind has no empty form.
    #[error("empty cell")]
    EmptyCell,

    /// Not a boolean.
    #[error("'{0}' is not a boolean")]
    InvalidBool(String),

    /// Not an integer.
    #[error("'{0}' is not an integer")]
    InvalidInt(String),

    /// Not a number.
    #[error("'{0}' is not a number")]
    InvalidFloat(String),

    /// Not one of the enum's variants.
    #[error("'{value}' is not one of [{}]", variants.join(", "))]
    UnknownVariant {
        /// Cell text.
        value: String,
        /// Accepted names.
        variants: Vec<String>,
    },

    /// No object exists at the path.
    #[error("no object at '{0}'")]
    UnresolvedReference(String),

    /// JSON text did not parse.
    #[error("invalid json: {0}")]
    InvalidJson(String),

    /// JSON parsed but has the wrong shape.
    #[error("expected {expected}, found {found}")]
    KindMismatch {
        /// Expected shape.
        expected: String,
        /// Actual shape.
        found: String,
    },
}

/// Encodes a field value as cell text.
#[must_use]
pub fn encode(kind: &FieldKind, value: &Value) -> String {
    match (kind, value) {
        (FieldKind::List(element), Value::List(items) | Value::Set(items)) => {
            let texts: Vec<String> = items.iter().map(|item| encode_element(element, item)).collect();
            join_list_cell(&texts)
        },
        (FieldKind::Set(_), Value::Set(items) | Value::List(items)) => {
            let texts: Vec<String> = items.iter().map(Value::to_text).collect();
            join_list_cell(&texts)
        },
        (FieldKind::Map { value: element, .. }, Value::Map(map)) => encode_map(element, map),
        (FieldKind::Record(_), Value::Record(record)) => encode_record(record),
        _ => value.to_text(),
    }
}

fn encode_element(element: &ElementKind, value: &Value) -> String {
    match (element, value) {
        (ElementKind::Record(_), Value::Record(record)) => encode_record(record),
        _ => value.to_text(),
    }
}

fn encode_record(record: &Record) -> String {
    serde_json::to_string(record).unwrap_or_default()
}

fn encode_map(element: &ElementKind, map: &MapValue) -> String {
    if map.is_empty() {
        return String::new();
    }
    let mut object = serde_json::Map::new();
    for (key, value) in map.iter() {
        object.insert(key.to_text(), to_json(element, value));
    }
    serde_json::Value::Object(object).to_string()
}

fn to_json(element: &ElementKind, value: &Value) -> serde_json::Value {
    match value {
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map_or_else(|| serde_json::Value::String(f.to_string()), serde_json::Value::Number),
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Reference(None) => serde_json::Value::Null,
        Value::Reference(Some(id)) => serde_json::Value::String(id.to_string()),
        Value::Record(record) if matches!(element, ElementKind::Record(_)) => {
            serde_json::to_value(record).unwrap_or(serde_json::Value::Null)
        },
        other => serde_json::to_value(other).unwrap_or(serde_json::Value::Null),
    }
}

/// Decodes cell text into a value of `kind`.
///
/// # Errors
///
/// Returns a [`DecodeError`] when the text does not fit the kind. Lists, sets
/// and maps decode all-or-nothing.
pub fn decode(kind: &FieldKind, text: &str, store: &dyn ObjectStore) -> Result<Value, DecodeError> {
    match kind {
        FieldKind::Scalar(scalar) => decode_scalar(scalar, text),
        FieldKind::Reference(target) => decode_reference(text, target.soft, store),
        FieldKind::Record(type_name) => decode_record(type_name, text),
        FieldKind::List(element) => split_list_cell(text)
            .iter()
            .map(|item| decode(&FieldKind::from(element), item, store))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        FieldKind::Set(scalar) => {
            let mut items: Vec<Value> = Vec::new();
            for item in split_list_cell(text) {
                let value = decode_scalar(scalar, &item)?;
                if !items.contains(&value) {
                    items.push(value);
                }
            }
            Ok(Value::Set(items))
        },
        FieldKind::Map { key, value } => decode_map(key, value, text, store),
    }
}

/// Decodes a scalar.
///
/// # Errors
///
/// Returns a [`DecodeError`] when the text does not parse as `kind`.
pub fn decode_scalar(kind: &ScalarKind, text: &str) -> Result<Value, DecodeError> {
    let trimmed = text.trim();
    match kind {
        ScalarKind::Text => return Ok(Value::Text(text.to_string())),
        ScalarKind::Enum(variants) if variants.is_empty() => {
            return Ok(Value::Text(text.to_string()));
        },
        _ if trimmed.is_empty() => return Err(DecodeError::EmptyCell),
        _ => {},
    }

    match kind {
        ScalarKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Value::Bool(true)),
            "false" | "0" | "no" => Ok(Value::Bool(false)),
            _ => Err(DecodeError::InvalidBool(text.to_string())),
        },
        ScalarKind::Int => trimmed
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| DecodeError::InvalidInt(text.to_string())),
        ScalarKind::Float => trimmed
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| DecodeError::InvalidFloat(text.to_string())),
        ScalarKind::Enum(variants) => variants
            .iter()
            .find(|v| v.as_str() == trimmed)
            .or_else(|| variants.iter().find(|v| v.eq_ignore_ascii_case(trimmed)))
            .map(|v| Value::Text(v.clone()))
            .ok_or_else(|| DecodeError::UnknownVariant {
                value: text.to_string(),
                variants: variants.clone(),
            }),
        ScalarKind::Text => Ok(Value::Text(text.to_string())),
    }
}

fn decode_reference(text: &str, soft: bool, store: &dyn ObjectStore) -> Result<Value, DecodeError> {
    let path = text.trim();
    if path.is_empty() || path.eq_ignore_ascii_case("none") {
        return Ok(Value::Reference(None));
    }
    let id = ObjectId::new(path);
    // Soft references may point at objects that are not loaded yet.
    if soft || store.contains(&id) {
        Ok(Value::Reference(Some(id)))
    } else {
        Err(DecodeError::UnresolvedReference(path.to_string()))
    }
}

fn decode_record(type_name: &str, text: &str) -> Result<Value, DecodeError> {
    if text.trim().is_empty() {
        return Err(DecodeError::EmptyCell);
    }
    let record: Record =
        serde_json::from_str(text).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;
    if record.type_name != type_name {
        return Err(DecodeError::KindMismatch {
            expected: type_name.to_string(),
            found: record.type_name,
        });
    }
    Ok(Value::Record(record))
}

fn decode_map(
    key_kind: &ScalarKind,
    element: &ElementKind,
    text: &str,
    store: &dyn ObjectStore,
) -> Result<Value, DecodeError> {
    if text.trim().is_empty() {
        return Ok(Value::Map(MapValue::new()));
    }
    let parsed: serde_json::Value =
        serde_json::from_str(text).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;
    let serde_json::Value::Object(entries) = parsed else {
        return Err(DecodeError::KindMismatch {
            expected: "json object".to_string(),
            found: json_label(&parsed).to_string(),
        });
    };

    let value_kind = FieldKind::from(element);
    let mut map = MapValue::new();
    for (key_text, json) in entries {
        let key = decode_scalar(key_kind, &key_text)?;
        let value_text = match json {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Null => String::new(),
            nested => nested.to_string(),
        };
        let value = decode(&value_kind, &value_text, store)?;
        map.insert_deferred(key, || value);
    }
    map.rehash();
    Ok(Value::Map(map))
}

const fn json_label(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Joins list items into one cell.
///
/// Items holding `;` or `"` are quoted with inner quotes doubled. Empty
/// items are quoted too, so a single empty item survives the round trip.
#[must_use]
pub fn join_list_cell<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| {
            let item = item.as_ref();
            if item.is_empty() || item.contains([';', '"']) {
                format!("\"{}\"", item.replace('"', "\"\""))
            } else {
                item.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Splits a list cell into items, undoing [`join_list_cell`].
///
/// An empty cell is an empty list.
#[must_use]
pub fn split_list_cell(cell: &str) -> Vec<String> {
    if cell.is_empty() {
        return Vec::new();
    }

    let mut items = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = cell.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ';' => items.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    items.push(current);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Object, RefTarget};
    use crate::storage::MemoryStore;
    use test_case::test_case;

    fn store() -> MemoryStore {
        MemoryStore::new().with_object(Object::new(
            ObjectId::new("/Game/Npc/Bob.Bob"),
            Record::new("Npc"),
        ))
    }

    #[test_case(ScalarKind::Bool, "true", Value::Bool(true) ; "bool true")]
    #[test_case(ScalarKind::Bool, "No", Value::Bool(false) ; "bool no")]
    #[test_case(ScalarKind::Int, " -42 ", Value::Int(-42) ; "int trimmed")]
    #[test_case(ScalarKind::Float, "2.5", Value::Float(2.5) ; "float")]
    #[test_case(ScalarKind::Text, " padded ", Value::Text(" padded ".to_string()) ; "text kept")]
    #[test_case(ScalarKind::Text, "", Value::Text(String::new()) ; "text empty")]
    fn test_decode_scalar(kind: ScalarKind, text: &str, expected: Value) {
        assert_eq!(decode_scalar(&kind, text).unwrap(), expected);
    }

    #[test_case(ScalarKind::Int, "" ; "empty int")]
    #[test_case(ScalarKind::Int, "1.5" ; "fractional int")]
    #[test_case(ScalarKind::Float, "abc" ; "bad float")]
    #[test_case(ScalarKind::Bool, "maybe" ; "bad bool")]
    fn test_decode_scalar_rejects(kind: ScalarKind, text: &str) {
        assert!(decode_scalar(&kind, text).is_err());
    }

    #[test]
    fn test_enum_variants() {
        let kind = ScalarKind::Enum(vec!["Common".to_string(), "Rare".to_string()]);
        assert_eq!(
            decode_scalar(&kind, "rare").unwrap(),
            Value::Text("Rare".to_string())
        );
        assert!(matches!(
            decode_scalar(&kind, "Epic"),
            Err(DecodeError::UnknownVariant { .. })
        ));
    }

    #[test]
    fn test_bool_encodes_lowercase() {
        let kind = FieldKind::Scalar(ScalarKind::Bool);
        assert_eq!(encode(&kind, &Value::Bool(true)), "true");
        assert_eq!(encode(&kind, &Value::Bool(false)), "false");
    }

    #[test]
    fn test_reference_decode() {
        let store = store();
        let hard = FieldKind::Reference(RefTarget::hard("Npc"));
        assert_eq!(decode(&hard, "", &store).unwrap(), Value::Reference(None));
        assert_eq!(
            decode(&hard, "/Game/Npc/Bob.Bob", &store).unwrap(),
            Value::Reference(Some(ObjectId::new("/Game/Npc/Bob.Bob")))
        );
        assert!(matches!(
            decode(&hard, "/Game/Npc/Ghost.Ghost", &store),
            Err(DecodeError::UnresolvedReference(_))
        ));

        let soft = FieldKind::Reference(RefTarget::soft("Npc"));
        assert!(decode(&soft, "/Game/Npc/Ghost.Ghost", &store).is_ok());
    }

    #[test]
    fn test_list_cell_quoting() {
        let items = ["plain", "semi;colon", "say \"hi\"", ""];
        let cell = join_list_cell(&items);
        assert_eq!(cell, "plain;\"semi;colon\";\"say \"\"hi\"\"\";\"\"");
        assert_eq!(split_list_cell(&cell), items);
    }

    #[test]
    fn test_list_cell_empty() {
        assert!(split_list_cell("").is_empty());
        assert_eq!(split_list_cell("\"\""), vec![String::new()]);
    }

    #[test]
    fn test_list_decode_atomic() {
        let store = store();
        let kind = FieldKind::List(ElementKind::Scalar(ScalarKind::Int));
        assert_eq!(
            decode(&kind, "1;2;3", &store).unwrap(),
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
        assert!(decode(&kind, "1;x;3", &store).is_err());
    }

    #[test]
    fn test_set_dedupes() {
        let store = store();
        let kind = FieldKind::Set(ScalarKind::Text);
        let value = decode(&kind, "a;b;a", &store).unwrap();
        assert_eq!(
            value,
            Value::Set(vec![Value::Text("a".to_string()), Value::Text("b".to_string())])
        );
    }

    #[test]
    fn test_map_cell() {
        let store = store();
        let kind = FieldKind::Map {
            key: ScalarKind::Text,
            value: ElementKind::Scalar(ScalarKind::Int),
        };
        let mut map = MapValue::new();
        map.insert(Value::Text("hp".to_string()), Value::Int(10));
        map.insert(Value::Text("mp".to_string()), Value::Int(4));

        let cell = encode(&kind, &Value::Map(map.clone()));
        assert_eq!(cell, r#"{"hp":10,"mp":4}"#);
        assert_eq!(decode(&kind, &cell, &store).unwrap(), Value::Map(map));
    }

    #[test]
    fn test_map_cell_empty() {
        let store = store();
        let kind = FieldKind::Map {
            key: ScalarKind::Int,
            value: ElementKind::Scalar(ScalarKind::Text),
        };
        assert_eq!(encode(&kind, &Value::Map(MapValue::new())), "");
        assert_eq!(
            decode(&kind, "", &store).unwrap(),
            Value::Map(MapValue::new())
        );
        assert!(matches!(
            decode(&kind, "[1,2]", &store),
            Err(DecodeError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_record_leaf_fallback() {
        let store = store();
        let kind = FieldKind::Record("Stats".to_string());
        let record = Record::new("Stats").with("weight", Value::Float(1.25));
        let cell = encode(&kind, &Value::Record(record.clone()));
        assert_eq!(decode(&kind, &cell, &store).unwrap(), Value::Record(record));

        let wrong = FieldKind::Record("Other".to_string());
        assert!(matches!(
            decode(&wrong, &cell, &store),
            Err(DecodeError::KindMismatch { .. })
        ));
    }
}
