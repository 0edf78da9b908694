//! CLI command implementations.

pub mod backup;
pub mod inspect;
pub mod pending;

use outpost_core::{LocalDb, StoreConfig};
use std::path::Path;

/// Opens the store at `path` under `namespace`.
///
/// Refuses to create a new directory so a mistyped path is reported
/// instead of silently opening an empty store.
pub fn open(path: &Path, namespace: &str) -> Result<LocalDb, Box<dyn std::error::Error>> {
    if !path.is_dir() {
        return Err(format!("No store found at {}", path.display()).into());
    }
    Ok(LocalDb::open_with_config(
        path,
        StoreConfig::new().namespace(namespace),
    )?)
}
