//! # Outpost Storage
//!
//! Key-value storage backends for Outpost.
//!
//! This crate provides the lowest-level storage abstraction for Outpost.
//! Storage backends are **opaque byte stores** - they do not interpret
//! the values they hold. Every collection, the tombstone queue, settings
//! and drafts each occupy one key.
//!
//! ## Design Principles
//!
//! - Backends are simple keyed byte stores (get, put, remove)
//! - A `put` replaces the whole value; partial writes are never observable
//! - No transactions across keys
//! - Must be `Send + Sync` so one store can be shared
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral storage, with an optional quota
//! - [`FileBackend`] - One file per key inside a directory
//!
//! ## Example
//!
//! ```rust
//! use outpost_storage::{KvBackend, InMemoryBackend};
//!
//! let backend = InMemoryBackend::new();
//! backend.put("outpost_entries", b"[]").unwrap();
//! assert_eq!(backend.get("outpost_entries").unwrap(), Some(b"[]".to_vec()));
//! assert_eq!(backend.get("missing").unwrap(), None);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::{validate_key, KvBackend};
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
