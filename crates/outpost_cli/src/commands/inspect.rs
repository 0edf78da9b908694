//! Inspect command implementation.

use outpost_core::{LocalDb, StoreStats};
use serde_json::{json, Value};
use std::path::Path;

/// Runs the inspect command.
pub fn run(path: &Path, namespace: &str, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let db = super::open(path, namespace)?;
    let stats = db.stats();

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&to_json(&db, &stats))?),
        _ => print_text_output(path, &db, &stats),
    }
    Ok(())
}

fn to_json(db: &LocalDb, stats: &StoreStats) -> Value {
    let collections: Vec<Value> = stats
        .collections
        .iter()
        .map(|c| {
            json!({
                "collection": c.kind.slot(),
                "table": c.kind.table(),
                "total": c.total,
                "unsynced": c.unsynced,
                "recovery": c.recovery.as_ref().map(ToString::to_string),
            })
        })
        .collect();

    json!({
        "namespace": db.config().namespace,
        "bytes": stats.bytes,
        "records": stats.total_records(),
        "unsynced": stats.total_unsynced(),
        "pendingTombstones": stats.pending_tombstones,
        "clean": stats.is_clean(),
        "collections": collections,
    })
}

fn print_text_output(path: &Path, db: &LocalDb, stats: &StoreStats) {
    println!("Outpost Store Inspection");
    println!("========================");
    println!();
    println!("Path:      {}", path.display());
    println!("Namespace: {}", db.config().namespace);
    println!("Size:      {}", format_size(stats.bytes));
    println!();
    println!("Collections:");
    for c in &stats.collections {
        print!("  {:<16} {:>6} records, {:>5} unsynced", c.kind.slot(), c.total, c.unsynced);
        match &c.recovery {
            Some(reason) => println!("  [recovered: {reason}]"),
            None => println!(),
        }
    }
    println!();
    println!("Pending deletions: {}", stats.pending_tombstones);
    println!(
        "Sync state:        {}",
        if stats.is_clean() { "clean" } else { "dirty" }
    );
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} bytes")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
