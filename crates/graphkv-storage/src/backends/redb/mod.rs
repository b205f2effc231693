//! Redb storage backend.
//!
//! This module provides a storage backend implementation using Redb,
//! a pure-Rust embedded database with ACID transactions.
//!
//! Each keyspace is a redb table keyed by [`OrderedKey<C>`](tables::OrderedKey),
//! so the keyspace comparator is installed into the engine and governs every
//! seek and range read.
//!
//! # Example
//!
//! ```ignore
//! use graphkv_storage::backends::RedbEngine;
//! use graphkv_storage::{Keyspace, Lexicographic, RawIterator, ReadBounds, StorageEngine, Transaction};
//!
//! let engine = RedbEngine::in_memory()?;
//! let space = Keyspace::<Lexicographic>::new("nodes");
//!
//! let mut tx = engine.begin_write()?;
//! tx.put(&space, b"node:1", b"Alice")?;
//! tx.commit()?;
//!
//! let tx = engine.begin_read()?;
//! let mut iter = tx.iterator(&space, ReadBounds::unbounded())?;
//! iter.seek_to_first();
//! assert_eq!(iter.key(), Some(&b"node:1"[..]));
//! ```
//!
//! # Configuration
//!
//! ```ignore
//! use graphkv_storage::backends::redb::{RedbConfig, RedbEngine};
//!
//! let config = RedbConfig::new()
//!     .cache_size(100 * 1024 * 1024)
//!     .iterator_batch_size(256);
//!
//! let engine = RedbEngine::open_with_config("graph.redb", config)?;
//! ```

mod engine;
pub mod tables;
mod transaction;

pub use engine::{RedbConfig, RedbEngine, DEFAULT_ITERATOR_BATCH_SIZE};
pub use transaction::{RedbIterator, RedbTransaction};
