//! TOML-backed type registry.
//!
//! Schema files list types as `[[types]]` tables:
//!
//! ```toml
//! [[types]]
//! name = "Weapon"
//! exportable = true
//!
//! [[types.fields]]
//! name = "damage"
//! kind = { scalar = "int" }
//!
//! [[types.fields]]
//! name = "stats"
//! kind = { record = "Stats" }
//! expand = true
//! ```

use crate::models::{ElementKind, FieldDescriptor, FieldKind, TypeDescriptor};
use crate::storage::traits::TypeRegistry;
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Maximum schema file size (1MB).
const MAX_SCHEMA_SIZE: u64 = 1024 * 1024;

#[derive(Debug, Deserialize)]
struct SchemaFile {
    #[serde(default)]
    types: Vec<TypeDescriptor>,
}

/// In-memory type registry with precomputed layouts.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    types: BTreeMap<String, TypeDescriptor>,
    layouts: HashMap<String, Vec<FieldDescriptor>>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration.
    #[must_use]
    pub fn with_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    /// Registers (or replaces) a type and rebuilds every layout.
    pub fn register(&mut self, descriptor: TypeDescriptor) {
        self.types.insert(descriptor.name.clone(), descriptor);
        self.rebuild_layouts();
    }

    /// Parses a registry from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid schema or references
    /// unknown types.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: SchemaFile = toml::from_str(text).map_err(|e| Error::OperationFailed {
            operation: "parse_schema".to_string(),
            cause: e.to_string(),
        })?;

        let mut registry = Self::new();
        for descriptor in file.types {
            registry.types.insert(descriptor.name.clone(), descriptor);
        }
        registry.rebuild_layouts();
        registry.validate()?;
        Ok(registry)
    }

    /// Loads a registry from a TOML schema file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path).map_err(|e| Error::OperationFailed {
            operation: "read_schema".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        if metadata.len() > MAX_SCHEMA_SIZE {
            return Err(Error::InvalidInput(format!(
                "schema file too large: {} bytes (max {MAX_SCHEMA_SIZE})",
                metadata.len()
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_schema".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        let registry = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), types = registry.types.len(), "Loaded schema");
        Ok(registry)
    }

    /// Checks that every supertype and field target names a registered type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] naming the first dangling reference.
    pub fn validate(&self) -> Result<()> {
        for descriptor in self.types.values() {
            if let Some(supertype) = &descriptor.supertype
                && !self.types.contains_key(supertype)
            {
                return Err(Error::InvalidInput(format!(
                    "type '{}' extends unknown type '{supertype}'",
                    descriptor.name
                )));
            }
            for field in &descriptor.fields {
                if let Some(target) = target_type(&field.kind)
                    && !self.types.contains_key(target)
                {
                    return Err(Error::InvalidInput(format!(
                        "field '{}.{}' refers to unknown type '{target}'",
                        descriptor.name, field.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if no types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn rebuild_layouts(&mut self) {
        self.layouts = self
            .types
            .keys()
            .map(|name| (name.clone(), self.flatten(name)))
            .collect();
    }

    /// Own fields followed by each supertype's own fields, outer to inner.
    fn flatten(&self, type_name: &str) -> Vec<FieldDescriptor> {
        let mut fields = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(type_name);
        while let Some(name) = current {
            if !seen.insert(name) {
                tracing::warn!(type_name, "Supertype chain loops back to '{name}'");
                break;
            }
            let Some(descriptor) = self.types.get(name) else {
                break;
            };
            fields.extend(descriptor.fields.iter().cloned());
            current = descriptor.supertype.as_deref();
        }
        fields
    }
}

fn element_target(element: &ElementKind) -> Option<&str> {
    match element {
        ElementKind::Record(name) => Some(name.as_str()),
        ElementKind::Reference(target) => Some(target.class.as_str()),
        ElementKind::Scalar(_) => None,
    }
}

fn target_type(kind: &FieldKind) -> Option<&str> {
    match kind {
        FieldKind::Record(name) => Some(name.as_str()),
        FieldKind::Reference(target) => Some(target.class.as_str()),
        FieldKind::List(element) | FieldKind::Map { value: element, .. } => element_target(element),
        FieldKind::Scalar(_) | FieldKind::Set(_) => None,
    }
}

impl TypeRegistry for SchemaRegistry {
    fn descriptor(&self, type_name: &str) -> Option<&TypeDescriptor> {
        self.types.get(type_name)
    }

    fn layout(&self, type_name: &str) -> Option<&[FieldDescriptor]> {
        self.layouts.get(type_name).map(Vec::as_slice)
    }

    fn type_names(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecordKind, RefTarget, ScalarKind, Value};

    const SCHEMA: &str = r#"
        [[types]]
        name = "Item"
        exportable = true
        abstract = true

        [[types.fields]]
        name = "label"
        kind = { scalar = "text" }

        [[types]]
        name = "Sword"
        exportable = true
        supertype = "Item"

        [[types.fields]]
        name = "damage"
        kind = { scalar = "int" }

        [[types.fields]]
        name = "stats"
        kind = { record = "Stats" }
        expand = true

        [[types.fields]]
        name = "owner"
        kind = { reference = { class = "Item" } }

        [[types]]
        name = "Stats"
        kind = "struct"

        [[types.fields]]
        name = "weight"
        kind = { scalar = "float" }
    "#;

    #[test]
    fn test_load_schema_toml() {
        let registry = SchemaRegistry::from_toml_str(SCHEMA).unwrap();
        assert_eq!(registry.len(), 3);
        let stats = registry.descriptor("Stats").unwrap();
        assert_eq!(stats.kind, RecordKind::Struct);
        assert!(registry.descriptor("Item").unwrap().is_abstract);
    }

    #[test]
    fn test_layout_own_then_super() {
        let registry = SchemaRegistry::from_toml_str(SCHEMA).unwrap();
        let names: Vec<&str> = registry
            .layout("Sword")
            .unwrap()
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["damage", "stats", "owner", "label"]);
    }

    #[test]
    fn test_subtype_and_expand_rules() {
        let registry = SchemaRegistry::from_toml_str(SCHEMA).unwrap();
        assert!(registry.is_subtype_of("Sword", "Item"));
        assert!(!registry.is_subtype_of("Item", "Sword"));
        assert!(registry.can_expand("Stats"));
        assert!(!registry.is_exportable("Stats"));
        assert!(!registry.can_expand("Missing"));
    }

    #[test]
    fn test_default_record() {
        let registry = SchemaRegistry::from_toml_str(SCHEMA).unwrap();
        let record = registry.default_record("Sword");
        assert_eq!(record.get("damage"), Some(&Value::Int(0)));
        assert_eq!(record.get("owner"), Some(&Value::Reference(None)));
        let stats = record.get("stats").and_then(Value::as_record).unwrap();
        assert_eq!(stats.get("weight"), Some(&Value::Float(0.0)));
    }

    #[test]
    fn test_unknown_reference_rejected() {
        let err = SchemaRegistry::from_toml_str(
            r#"
            [[types]]
            name = "A"
            [[types.fields]]
            name = "b"
            kind = { record = "B" }
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_supertype_loop_terminates() {
        let registry = SchemaRegistry::new()
            .with_type(
                TypeDescriptor::class("A")
                    .extends("B")
                    .field(FieldDescriptor::scalar("a", ScalarKind::Int)),
            )
            .with_type(
                TypeDescriptor::class("B")
                    .extends("A")
                    .field(FieldDescriptor::new(
                        "link",
                        FieldKind::Reference(RefTarget::hard("A")),
                    )),
            );
        assert_eq!(registry.layout("A").unwrap().len(), 2);
        assert!(!registry.is_subtype_of("A", "C"));
    }
}
