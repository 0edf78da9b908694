//! Commands listing work waiting for the sync driver.

use outpost_core::{CollectionKind, LocalDb, SyncRecord};
use serde_json::{json, Value};
use std::path::Path;

/// Lists unsynced records, optionally for one collection.
pub fn run(
    path: &Path,
    namespace: &str,
    collection: Option<&str>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = super::open(path, namespace)?;
    let kinds = select(collection)?;
    let report = unsynced_report(&db, &kinds);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => {
            for (kind, ids) in report.as_object().into_iter().flatten() {
                let ids = ids.as_array().map(Vec::as_slice).unwrap_or_default();
                println!("{kind}: {} unsynced", ids.len());
                for id in ids {
                    println!("  {}", id.as_str().unwrap_or_default());
                }
            }
        }
    }
    Ok(())
}

/// Lists queued deletions.
pub fn tombstones(
    path: &Path,
    namespace: &str,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = super::open(path, namespace)?;
    let queue = db.tombstones().peek_all();

    match format {
        "json" => {
            let rows: Vec<Value> = queue
                .iter()
                .map(|t| json!({ "id": t.id, "table": t.table, "timestamp": t.timestamp }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        _ => {
            println!("{} pending deletion(s)", queue.len());
            for t in &queue {
                println!("  {:<20} {:<40} {}", t.table, t.id, t.timestamp);
            }
        }
    }
    Ok(())
}

fn select(collection: Option<&str>) -> Result<Vec<CollectionKind>, Box<dyn std::error::Error>> {
    match collection {
        None => Ok(CollectionKind::ALL.to_vec()),
        Some(name) => CollectionKind::from_name(name)
            .map(|k| vec![k])
            .ok_or_else(|| format!("Unknown collection: {name}").into()),
    }
}

fn unsynced_report(db: &LocalDb, kinds: &[CollectionKind]) -> Value {
    let mut report = serde_json::Map::new();
    for &kind in kinds {
        let ids: Vec<Value> = db
            .unsynced(kind)
            .iter()
            .map(|d| Value::from(d.id()))
            .collect();
        report.insert(kind.slot().to_owned(), Value::Array(ids));
    }
    Value::Object(report)
}
