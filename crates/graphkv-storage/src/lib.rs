//! `graphkv` Storage
//!
//! This crate defines the contract `graphkv` requires of an embedded,
//! byte-ordered key-value engine, and a backend implementing it on redb.
//!
//! # Overview
//!
//! The engine is deliberately minimal: single-valued byte keys, snapshot
//! transactions, and a bidirectional iterator with `seek`, `seek_to_first`,
//! `seek_to_last`, `next` and `prev`. Everything richer (logical databases,
//! multiple values per key, positionable cursors) is built on top of it in
//! `graphkv-core`.
//!
//! # Core Traits
//!
//! - [`StorageEngine`] - Entry point for creating transactions
//! - [`Transaction`] - Get/put/delete and bounded iterators
//! - [`RawIterator`] - Linear iteration with latched fault status
//! - [`KeyComparator`] - Key ordering installed into the engine
//!
//! # Error Handling
//!
//! All fallible operations return [`StorageResult<T>`], an alias for
//! `Result<T, StorageError>`.
//!
//! # Modules
//!
//! - [`engine`] - Storage engine traits and abstractions
//! - [`backends`] - Concrete storage backend implementations

#![deny(clippy::unwrap_used)]

pub mod backends;
pub mod engine;

pub use engine::{
    KeyComparator, KeyValue, Keyspace, Lexicographic, RawIterator, ReadBounds, StorageEngine,
    StorageError, StorageResult, Transaction,
};
