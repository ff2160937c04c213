//! Import and export command handlers.

use std::path::Path;

use super::ImportArgs;
use sheetsync::config::{SyncConfig, WriteBackScope};
use sheetsync::io::{ExportService, ImportReport, ImportService};
use sheetsync::{Error, MemoryStore, ObjectId, ObjectStore, Result, SchemaRegistry, SyncIssue};

/// Executes the export command.
pub fn cmd_export(
    registry: &SchemaRegistry,
    store: &MemoryStore,
    object: &str,
    file: &Path,
) -> Result<()> {
    let report =
        ExportService::new(registry, store).export_to_file(&ObjectId::new(object), file)?;
    println!(
        "Exported {} columns to {}",
        report.columns.len(),
        file.display()
    );
    print_issues(&report.issues);
    Ok(())
}

/// Executes the template command.
pub fn cmd_template(registry: &SchemaRegistry, type_name: &str, file: &Path) -> Result<()> {
    let store = MemoryStore::new();
    let report = ExportService::new(registry, &store).write_template(type_name, file)?;
    println!(
        "Wrote {} columns for {type_name} to {}",
        report.columns.len(),
        file.display()
    );
    Ok(())
}

/// Executes the import command.
pub fn cmd_import(
    registry: &SchemaRegistry,
    store: &mut MemoryStore,
    config: &SyncConfig,
    args: ImportArgs,
) -> Result<()> {
    let mut config = config.clone();
    if let Some(scope) = args.scope.as_deref() {
        config.write_back_scope = WriteBackScope::parse(scope)
            .ok_or_else(|| Error::InvalidInput(format!("unknown scope '{scope}'")))?;
    }
    let save = config.save_on_import && !args.no_save;
    config.save_on_import = save;

    let mut service = ImportService::new(registry, &mut *store, &config);
    let report = match (args.object, args.path, args.type_name) {
        (Some(object), _, _) => service.import_file_into(&args.file, &ObjectId::new(object))?,
        (None, Some(path), Some(type_name)) => {
            service.import_file_to_path(&args.file, &path, &type_name, save)?
        },
        (None, None, Some(type_name)) => service.import_file_to_new(&args.file, &type_name)?,
        _ => {
            return Err(Error::InvalidInput(
                "import needs --object, --path with --type, or --type".to_string(),
            ));
        },
    };

    print_report(&report);
    if !report.saved {
        if let Some(object) = store.object(&report.target) {
            let json = serde_json::to_string_pretty(&object.record)
                .map_err(|e| Error::operation("render_record", e))?;
            println!("{json}");
        }
    }
    Ok(())
}

/// Executes the create command.
pub fn cmd_create(
    registry: &SchemaRegistry,
    store: &mut MemoryStore,
    config: &SyncConfig,
    path: &str,
    type_name: &str,
    save: bool,
) -> Result<()> {
    let id = ImportService::new(registry, &mut *store, config).create_record(path, type_name, save)?;
    if save {
        println!("Created {id}");
    } else {
        println!("Created {id} (not saved)");
    }
    Ok(())
}

fn print_report(report: &ImportReport) {
    let action = if report.created { "Created" } else { "Updated" };
    println!(
        "{action} {}: {} cells applied, {} unknown columns skipped{}",
        report.target,
        report.applied,
        report.skipped_unknown,
        if report.saved { ", saved" } else { "" }
    );
    print_issues(&report.issues);
}

fn print_issues(issues: &[SyncIssue]) {
    for issue in issues {
        eprintln!("  {issue}");
    }
}
