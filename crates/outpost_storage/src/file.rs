//! File-based storage backend for persistent storage.

use crate::backend::{validate_key, KvBackend};
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A directory-based storage backend.
///
/// Each key is stored as one file named after the key inside the backend
/// directory. Values survive process restarts.
///
/// # Durability
///
/// `put` writes the new value to a hidden temporary file, calls
/// `File::sync_all()`, then renames it over the target. A crash leaves
/// either the old or the new value, never a torn one.
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads.
/// Internal locking serializes writers within one process. Nothing
/// coordinates separate processes sharing a directory.
///
/// # Example
///
/// ```no_run
/// use outpost_storage::{KvBackend, FileBackend};
/// use std::path::Path;
///
/// let backend = FileBackend::open(Path::new("outpost-data")).unwrap();
/// backend.put("outpost_entries", b"[]").unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    dir: PathBuf,
    lock: RwLock<()>,
}

impl FileBackend {
    /// Opens a backend rooted at an existing directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist or is not a directory.
    pub fn open(dir: &Path) -> StorageResult<Self> {
        let meta = fs::metadata(dir)?;
        if !meta.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", dir.display()),
            )
            .into());
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            lock: RwLock::new(()),
        })
    }

    /// Opens a backend, creating the directory and its parents if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created.
    pub fn open_with_create_dirs(dir: &Path) -> StorageResult<Self> {
        fs::create_dir_all(dir)?;
        Self::open(dir)
    }

    /// Returns the backend directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        // Valid keys never start with '.', so temp files cannot shadow a key
        self.dir.join(format!(".{key}.tmp"))
    }
}

impl KvBackend for FileBackend {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_key(key)?;
        let _guard = self.lock.read();

        match fs::read(self.value_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        validate_key(key)?;
        let _guard = self.lock.write();

        let temp = self.temp_path(key);
        let result = (|| -> io::Result<()> {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp)?;
            file.write_all(value)?;
            file.sync_all()?;
            fs::rename(&temp, self.value_path(key))
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }

        // Persist the rename itself where the platform allows it
        if let Ok(dir) = File::open(&self.dir) {
            let _ = dir.sync_all();
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        let _guard = self.lock.write();

        match fs::remove_file(self.value_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let _guard = self.lock.read();

        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if validate_key(name).is_ok() {
                    keys.push(name.to_owned());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn size(&self) -> StorageResult<u64> {
        let mut total = 0;
        for key in self.keys()? {
            match fs::metadata(self.value_path(&key)) {
                Ok(meta) => total += meta.len(),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(total)
    }
}
