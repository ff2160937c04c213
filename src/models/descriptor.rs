//! Type descriptor table.
//!
//! A [`TypeDescriptor`] is built once per record type and consumed by every
//! mapping component. Field markers are resolved into typed flags here so the
//! traversal never re-queries metadata.
//!
//! # Column naming
//!
//! | Marker | Effect |
//! |--------|--------|
//! | `column` | Field emits a leaf column; a non-empty value overrides the name |
//! | `expand` | Field is traversed recursively (records, references, containers) |
//! | `prefix` | Prefix for expanded columns, default `{field}_` |
//!
//! A field emits a leaf column when it carries `column` or does not carry
//! `expand`. Expanding a field does not suppress an explicit `column`.

use serde::{Deserialize, Serialize};

/// Leaf scalar kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    /// `true` / `false`.
    Bool,
    /// Signed 64-bit integer.
    Int,
    /// 64-bit float.
    Float,
    /// Free text.
    Text,
    /// Enumerated name, restricted to the listed variants (any name when empty).
    Enum(Vec<String>),
}

/// Target of a reference field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RefTarget {
    /// Declared class of the referenced record.
    pub class: String,
    /// Soft references hold a path and may need a load to resolve.
    #[serde(default)]
    pub soft: bool,
}

impl RefTarget {
    /// Hard reference to `class`.
    #[must_use]
    pub fn hard(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            soft: false,
        }
    }

    /// Soft (path) reference to `class`.
    #[must_use]
    pub fn soft(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            soft: true,
        }
    }
}

/// Kind of a list element or map value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// Leaf scalar element.
    Scalar(ScalarKind),
    /// Record held by value.
    Record(String),
    /// Reference to a record.
    Reference(RefTarget),
}

/// Kind of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Leaf scalar.
    Scalar(ScalarKind),
    /// Reference to a record.
    Reference(RefTarget),
    /// Nested record held by value.
    Record(String),
    /// Ordered list.
    List(ElementKind),
    /// Unordered set of scalars.
    Set(ScalarKind),
    /// Keyed map.
    Map {
        /// Key kind.
        key: ScalarKind,
        /// Value kind.
        value: ElementKind,
    },
}

impl FieldKind {
    /// Returns whether this is a list, map or set.
    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(self, Self::List(_) | Self::Set(_) | Self::Map { .. })
    }

    /// Short human-readable name used in diagnostics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Reference(_) => "reference",
            Self::Record(_) => "record",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Map { .. } => "map",
        }
    }
}

impl From<&ElementKind> for FieldKind {
    fn from(element: &ElementKind) -> Self {
        match element {
            ElementKind::Scalar(kind) => Self::Scalar(kind.clone()),
            ElementKind::Record(name) => Self::Record(name.clone()),
            ElementKind::Reference(target) => Self::Reference(target.clone()),
        }
    }
}

/// Whether a record type has identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Stored object with identity; may be referenced and may cycle.
    #[default]
    Class,
    /// Plain value type; nested by value only.
    Struct,
}

/// Per-field descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Field kind.
    pub kind: FieldKind,
    /// Leaf column marker with optional name override.
    #[serde(default)]
    pub column: Option<String>,
    /// Expand marker.
    #[serde(default)]
    pub expand: bool,
    /// Prefix override for expanded columns.
    #[serde(default)]
    pub prefix: Option<String>,
}

impl FieldDescriptor {
    /// Creates a plain field (leaf column named after the field).
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            column: None,
            expand: false,
            prefix: None,
        }
    }

    /// Shorthand for a scalar field.
    #[must_use]
    pub fn scalar(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self::new(name, FieldKind::Scalar(kind))
    }

    /// Marks the field as a leaf column named `column` (empty keeps the field name).
    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Sets the expand marker.
    #[must_use]
    pub const fn expanded(mut self) -> Self {
        self.expand = true;
        self
    }

    /// Overrides the prefix of expanded columns.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Whether the field produces a leaf column of its own.
    #[must_use]
    pub const fn emits_column(&self) -> bool {
        self.column.is_some() || !self.expand
    }

    /// Column key, without any accumulated prefix.
    #[must_use]
    pub fn column_key(&self) -> &str {
        match self.column.as_deref() {
            Some(column) if !column.is_empty() => column,
            _ => &self.name,
        }
    }

    /// Prefix contributed by expanding this field.
    #[must_use]
    pub fn expand_prefix(&self) -> String {
        match self.prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => prefix.to_string(),
            _ => format!("{}_", self.name),
        }
    }
}

/// Descriptor of one record type (own fields only; see `supertype`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Type name.
    pub name: String,
    /// Class or struct.
    #[serde(default)]
    pub kind: RecordKind,
    /// Class-level opt-in marker.
    #[serde(default)]
    pub exportable: bool,
    /// Abstract types cannot be instantiated.
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    /// Deprecated types are hidden from discovery.
    #[serde(default)]
    pub deprecated: bool,
    /// Base type whose fields follow this type's own fields.
    #[serde(default)]
    pub supertype: Option<String>,
    /// Own fields in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    fn with_kind(name: impl Into<String>, kind: RecordKind) -> Self {
        Self {
            name: name.into(),
            kind,
            exportable: false,
            is_abstract: false,
            deprecated: false,
            supertype: None,
            fields: Vec::new(),
        }
    }

    /// Starts a class descriptor.
    #[must_use]
    pub fn class(name: impl Into<String>) -> Self {
        Self::with_kind(name, RecordKind::Class)
    }

    /// Starts a struct descriptor.
    #[must_use]
    pub fn structure(name: impl Into<String>) -> Self {
        Self::with_kind(name, RecordKind::Struct)
    }

    /// Sets the exportable marker.
    #[must_use]
    pub const fn exportable(mut self) -> Self {
        self.exportable = true;
        self
    }

    /// Marks the type abstract.
    #[must_use]
    pub const fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Marks the type deprecated.
    #[must_use]
    pub const fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Sets the supertype.
    #[must_use]
    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.supertype = Some(supertype.into());
        self
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }
}
