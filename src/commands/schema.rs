//! Schema discovery command handlers.

use sheetsync::mapping::SchemaWalker;
use sheetsync::{Result, SchemaRegistry};

/// Lists exportable types.
pub fn cmd_types(registry: &SchemaRegistry) -> Result<()> {
    let types = SchemaWalker::new(registry).exportable_types();
    if types.is_empty() {
        println!("No exportable types.");
    }
    for name in types {
        println!("{name}");
    }
    Ok(())
}

/// Prints the columns of a type, one per line.
pub fn cmd_columns(registry: &SchemaRegistry, type_name: &str) -> Result<()> {
    for column in SchemaWalker::new(registry).columns_for(type_name)? {
        println!("{column}");
    }
    Ok(())
}
