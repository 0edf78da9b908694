//! Backup export and import commands.

use outpost_core::{LocalDb, StoreConfig};
use std::fs;
use std::path::Path;
use tracing::info;

/// Writes a full backup of the store to `output_path`.
pub fn export(
    db_path: &Path,
    namespace: &str,
    output_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Exporting backup of {:?}", db_path);

    let db = super::open(db_path, namespace)?;
    let json = db.export_backup()?;
    fs::write(output_path, &json)?;

    let stats = db.stats();
    println!("✓ Backup exported");
    println!("  Path: {:?}", output_path);
    println!("  Size: {} bytes", json.len());
    println!("  Records: {}", stats.total_records());
    Ok(())
}

/// Restores a backup into the store, creating the store if needed.
///
/// Collections present in the backup replace the stored ones; the rest
/// are left untouched.
pub fn import(
    db_path: &Path,
    namespace: &str,
    input_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Importing backup from {:?}", input_path);

    let json = fs::read_to_string(input_path)?;
    let db = LocalDb::open_with_config(db_path, StoreConfig::new().namespace(namespace))?;
    let report = db.import_backup(&json)?;

    println!("✓ Backup imported");
    for (kind, count) in &report.collections {
        println!("  {:<16} {}", kind.slot(), count);
    }
    if report.settings {
        println!("  settings restored");
    }
    for field in &report.skipped {
        println!("  skipped {field}: not an array");
    }
    println!("  Total: {} records", report.total_records());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use outpost_core::Meter;

    #[test]
    fn export_then_import_into_new_store() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        let target = dir.path().join("target");
        let file = dir.path().join("backup.json");

        {
            let db = LocalDb::open(&source).unwrap();
            db.meters().add(Meter::new("Agua", "water")).unwrap();
        }

        export(&source, "outpost", &file).unwrap();
        import(&target, "outpost", &file).unwrap();

        let db = LocalDb::open(&target).unwrap();
        assert_eq!(db.meters().count(), 1);
    }

    #[test]
    fn import_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("backup.json");
        fs::write(&file, "not json").unwrap();

        assert!(import(&dir.path().join("db"), "outpost", &file).is_err());
    }

    #[test]
    fn export_requires_existing_store() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(export(&missing, "outpost", &dir.path().join("out.json")).is_err());
    }
}
