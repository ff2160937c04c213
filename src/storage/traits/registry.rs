//! Type metadata trait.

use crate::models::{
    FieldDescriptor, FieldKind, MapValue, Record, RecordKind, ScalarKind, TypeDescriptor, Value,
};

/// Trait for type metadata providers.
///
/// Implementations answer what a type looks like; they never hold instances.
pub trait TypeRegistry {
    /// Returns the descriptor of a type.
    fn descriptor(&self, type_name: &str) -> Option<&TypeDescriptor>;

    /// Returns the flattened field layout of a type.
    ///
    /// Own fields come first in declaration order, followed by the supertype's
    /// layout (outer to inner).
    fn layout(&self, type_name: &str) -> Option<&[FieldDescriptor]>;

    /// Lists every registered type name.
    fn type_names(&self) -> Vec<String>;

    /// Checks the class-level exportable marker.
    fn is_exportable(&self, type_name: &str) -> bool {
        self.descriptor(type_name).is_some_and(|d| d.exportable)
    }

    /// Checks whether an expand marker may recurse into `type_name`.
    ///
    /// Struct types are nested by value and always expandable; class types
    /// need the exportable marker.
    fn can_expand(&self, type_name: &str) -> bool {
        self.descriptor(type_name)
            .is_some_and(|d| d.kind == RecordKind::Struct || d.exportable)
    }

    /// Checks whether `type_name` is `ancestor` or derives from it.
    fn is_subtype_of(&self, type_name: &str, ancestor: &str) -> bool {
        let mut current = Some(type_name);
        let mut hops = 0usize;
        while let Some(name) = current {
            if name == ancestor {
                return true;
            }
            hops += 1;
            if hops > self.type_names().len() {
                return false;
            }
            current = self.descriptor(name).and_then(|d| d.supertype.as_deref());
        }
        false
    }

    /// Default value of a field kind.
    fn default_value(&self, kind: &FieldKind) -> Value {
        default_value_guarded(self, kind, &mut Vec::new())
    }

    /// Default-initialized record of `type_name`.
    fn default_record(&self, type_name: &str) -> Record {
        default_record_guarded(self, type_name, &mut Vec::new())
    }
}

fn default_scalar(kind: &ScalarKind) -> Value {
    match kind {
        ScalarKind::Bool => Value::Bool(false),
        ScalarKind::Int => Value::Int(0),
        ScalarKind::Float => Value::Float(0.0),
        ScalarKind::Text => Value::Text(String::new()),
        ScalarKind::Enum(variants) => Value::Text(variants.first().cloned().unwrap_or_default()),
    }
}

fn default_value_guarded<R: TypeRegistry + ?Sized>(
    registry: &R,
    kind: &FieldKind,
    stack: &mut Vec<String>,
) -> Value {
    match kind {
        FieldKind::Scalar(scalar) => default_scalar(scalar),
        FieldKind::Reference(_) => Value::Reference(None),
        FieldKind::Record(type_name) => {
            Value::Record(default_record_guarded(registry, type_name, stack))
        },
        FieldKind::List(_) => Value::List(Vec::new()),
        FieldKind::Set(_) => Value::Set(Vec::new()),
        FieldKind::Map { .. } => Value::Map(MapValue::new()),
    }
}

fn default_record_guarded<R: TypeRegistry + ?Sized>(
    registry: &R,
    type_name: &str,
    stack: &mut Vec<String>,
) -> Record {
    let mut record = Record::new(type_name);
    // A by-value struct that contains itself has no finite default.
    if stack.iter().any(|t| t == type_name) {
        return record;
    }
    let Some(layout) = registry.layout(type_name) else {
        return record;
    };
    stack.push(type_name.to_string());
    for field in layout {
        let value = default_value_guarded(registry, &field.kind, stack);
        record.fields.entry(field.name.clone()).or_insert(value);
    }
    stack.pop();
    record
}

