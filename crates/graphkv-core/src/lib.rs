//! `graphkv` Core
//!
//! Logical databases, the physical key codec and positionable cursors,
//! layered over the byte-ordered engine contract of `graphkv-storage`.
//!
//! # Overview
//!
//! - **Logical databases**: [`LogicalDatabase`] names a one-byte prefix in
//!   a shared keyspace, either single-valued or multivalued
//! - **Key codec**: [`encoding::keys`] lays out `(prefix, key, value)` so that
//!   one engine key holds one pair, with boundary keys bracketing each key
//!   and each database
//! - **Ordering**: [`MultivaluedOrder`] and [`SingleValuedOrder`] are
//!   installed as the engine comparator, with pluggable key and value orders
//! - **Cursors**: [`ResultSet`] turns a raw iterator into a bidirectional,
//!   positionable cursor that fetches neighbours only when asked
//!
//! # Example
//!
//! ```
//! use graphkv_core::{MultivaluedDatabase, Utf8};
//! use graphkv_storage::backends::RedbEngine;
//! use graphkv_storage::{Lexicographic, StorageEngine, Transaction};
//!
//! let engine = RedbEngine::in_memory().unwrap();
//! let links = MultivaluedDatabase::<Lexicographic, Lexicographic>::new("links", 0x02);
//!
//! let mut tx = engine.begin_write().unwrap();
//! links.put(&mut tx, b"a", b"x").unwrap();
//! links.put(&mut tx, b"a", b"y").unwrap();
//! tx.commit().unwrap();
//!
//! let tx = engine.begin_read().unwrap();
//! let mut values = links.values_of(&tx, b"a", Utf8).unwrap();
//! assert_eq!(values.next().unwrap(), "x");
//! assert_eq!(values.next().unwrap(), "y");
//! assert!(!values.has_next().unwrap());
//! ```
//!
//! # Modules
//!
//! - [`encoding`] - Key codec, orderings and value converters
//! - [`cursor`] - Result sets and projections
//! - [`database`] - Logical databases and the [`Catalog`]
//! - [`error`] - Error types ([`LogicalError`])

#![deny(clippy::unwrap_used)]

pub mod cursor;
pub mod database;
pub mod encoding;
pub mod error;

pub use cursor::{CursorState, GotoResult, Projection, ResultSet, Slot};
pub use database::{
    Catalog, DatabaseInfo, LogicalDatabase, MultivaluedDatabase, SingleValuedDatabase,
};
pub use encoding::{
    ByteConverter, MultivaluedOrder, PhysicalOrder, RawBytes, SingleValuedOrder, U64BigEndian,
    Utf8,
};
pub use error::{LogicalError, LogicalResult};
