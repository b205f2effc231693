//! Storage engine traits and abstractions.
//!
//! This module defines the contract that embedded engines must satisfy:
//!
//! - [`StorageEngine`] - Main entry point for creating transactions
//! - [`Transaction`] - Snapshot-scoped get/put/delete and bounded iteration
//! - [`RawIterator`] - Bidirectional, seekable iteration over physical keys
//! - [`KeyComparator`] - The key ordering installed into the engine
//!
//! # Error Handling
//!
//! All fallible operations return [`StorageResult<T>`] which is an alias for
//! `Result<T, StorageError>`. Iterator movement is infallible; faults are
//! latched and reported through [`RawIterator::status`].

mod error;
mod traits;

pub use error::{StorageError, StorageResult};
pub use traits::{
    KeyComparator, KeyValue, Keyspace, Lexicographic, RawIterator, ReadBounds, StorageEngine,
    Transaction,
};
