//! Schema walker: the column set of a type, without an instance.

use crate::mapping::ColumnSet;
use crate::models::{FieldKind, RecordKind};
use crate::storage::TypeRegistry;
use crate::{Error, Result};

/// Enumerates columns from type metadata alone.
pub struct SchemaWalker<'a> {
    registry: &'a dyn TypeRegistry,
}

impl<'a> SchemaWalker<'a> {
    /// Creates a walker over `registry`.
    #[must_use]
    pub fn new(registry: &'a dyn TypeRegistry) -> Self {
        Self { registry }
    }

    /// Returns the ordered, unique column names of `type_name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RejectedType`] if the type is unknown or not exportable.
    pub fn columns_for(&self, type_name: &str) -> Result<Vec<String>> {
        Ok(self.placeholder_row(type_name)?.into_names())
    }

    /// Returns the columns of `type_name`, each with an empty value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RejectedType`] if the type is unknown or not exportable.
    pub fn placeholder_row(&self, type_name: &str) -> Result<ColumnSet> {
        if !self.registry.is_exportable(type_name) {
            return Err(Error::RejectedType {
                type_name: type_name.to_string(),
            });
        }
        let mut columns = ColumnSet::new();
        self.walk(type_name, "", &mut columns, &mut Vec::new());
        Ok(columns)
    }

    /// Emits placeholder columns for `type_name` under `prefix`.
    ///
    /// `stack` holds the types currently being expanded; a type already on
    /// it is not entered again.
    pub(crate) fn walk(
        &self,
        type_name: &str,
        prefix: &str,
        out: &mut ColumnSet,
        stack: &mut Vec<String>,
    ) {
        if stack.iter().any(|t| t == type_name) {
            tracing::trace!(type_name, prefix, "Skipping re-entrant expansion");
            return;
        }
        let Some(layout) = self.registry.layout(type_name) else {
            return;
        };

        stack.push(type_name.to_string());
        for field in layout {
            if field.emits_column() {
                out.insert(format!("{prefix}{}", field.column_key()), String::new());
            }
            if !field.expand {
                continue;
            }
            let target = match &field.kind {
                FieldKind::Record(target) => target,
                FieldKind::Reference(target) => &target.class,
                // Containers have no elements without an instance.
                _ => continue,
            };
            if self.registry.can_expand(target) {
                let nested = format!("{prefix}{}", field.expand_prefix());
                self.walk(target, &nested, out, stack);
            }
        }
        stack.pop();
    }

    /// Names of the exportable class types, sorted.
    ///
    /// Abstract and deprecated types are left out.
    #[must_use]
    pub fn exportable_types(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .registry
            .type_names()
            .into_iter()
            .filter(|name| {
                self.registry.descriptor(name).is_some_and(|d| {
                    d.exportable && d.kind == RecordKind::Class && !d.is_abstract && !d.deprecated
                })
            })
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ElementKind, FieldDescriptor, RefTarget, ScalarKind, TypeDescriptor};
    use crate::storage::SchemaRegistry;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new()
            .with_type(
                TypeDescriptor::class("Base")
                    .exportable()
                    .field(FieldDescriptor::scalar("id", ScalarKind::Int)),
            )
            .with_type(
                TypeDescriptor::class("Hero")
                    .exportable()
                    .extends("Base")
                    .field(FieldDescriptor::scalar("name", ScalarKind::Text).with_column("Name"))
                    .field(
                        FieldDescriptor::new("stats", FieldKind::Record("Stats".to_string()))
                            .expanded(),
                    )
                    .field(
                        FieldDescriptor::new("rival", FieldKind::Reference(RefTarget::hard("Hero")))
                            .with_column("")
                            .expanded()
                            .with_prefix("Rival."),
                    )
                    .field(
                        FieldDescriptor::new(
                            "inventory",
                            FieldKind::List(ElementKind::Scalar(ScalarKind::Text)),
                        )
                        .expanded(),
                    ),
            )
            .with_type(
                TypeDescriptor::structure("Stats")
                    .field(FieldDescriptor::scalar("hp", ScalarKind::Int))
                    .field(FieldDescriptor::scalar("mp", ScalarKind::Int)),
            )
            .with_type(TypeDescriptor::class("Hidden").exportable().deprecated())
            .with_type(TypeDescriptor::class("Plain"))
    }

    #[test]
    fn test_columns_for_order() {
        let registry = registry();
        let walker = SchemaWalker::new(&registry);
        let columns = walker.columns_for("Hero").unwrap();
        assert_eq!(
            columns,
            vec!["Name", "stats_hp", "stats_mp", "rival", "id"]
        );
    }

    #[test]
    fn test_columns_for_rejects_unmarked() {
        let registry = registry();
        let walker = SchemaWalker::new(&registry);
        assert!(matches!(
            walker.columns_for("Plain"),
            Err(Error::RejectedType { .. })
        ));
        assert!(walker.columns_for("Missing").is_err());
    }

    #[test]
    fn test_exportable_types_filters() {
        let registry = registry();
        let walker = SchemaWalker::new(&registry);
        assert_eq!(walker.exportable_types(), vec!["Base", "Hero"]);
    }
}
