//! `graphkv` - Graph Storage over an Ordered Key-Value Engine
//!
//! `graphkv` stores the atoms of a hypergraph, the links between them, the
//! incidence set of every atom and user-defined sorted indexes, all inside
//! one embedded, byte-ordered key-value engine.
//!
//! # Features
//!
//! - **Raw data and links**: per-handle records in single-valued databases
//! - **Incidence sets**: the links pointing at each atom, kept sorted
//! - **Sorted indexes**: keys to sets of values with range queries, optionally
//!   searchable by value
//! - **Cursors**: every set is read through a bidirectional, positionable
//!   [`RecordCursor`] that fetches lazily
//!
//! # Quick Start
//!
//! ```
//! use graphkv::{GraphStore, Handle, HandleConverter, Transaction, Utf8};
//!
//! let store = GraphStore::in_memory().unwrap();
//! let names = store.create_index("by_name", 0x10, Utf8, HandleConverter).unwrap();
//!
//! let mut tx = store.begin_write().unwrap();
//! names.add_entry(&mut tx, &"alice".to_string(), &Handle::new(1)).unwrap();
//! names.add_entry(&mut tx, &"alice".to_string(), &Handle::new(5)).unwrap();
//! names.add_entry(&mut tx, &"bob".to_string(), &Handle::new(2)).unwrap();
//! tx.commit().unwrap();
//!
//! let tx = store.begin_read().unwrap();
//! let mut alices = names.find(&tx, &"alice".to_string()).unwrap();
//! assert_eq!(alices.collect_remaining().unwrap(), vec![Handle::new(1), Handle::new(5)]);
//! assert_eq!(names.count(&tx).unwrap(), 2);
//! ```
//!
//! # Modules
//!
//! - [`store`] - The [`GraphStore`] and its standard databases
//! - [`incidence`] - Incidence sets ([`IncidenceIndex`])
//! - [`index`] - Sorted indexes ([`Index`], [`BidirectionalIndex`])
//! - [`cursor`] - The [`RecordCursor`] returned by every lookup
//! - [`handle`] - Atom handles and the link record format
//! - [`config`] - Store configuration ([`Config`], [`StoreBuilder`])
//! - [`error`] - Error types ([`GraphError`])

#![deny(clippy::unwrap_used)]

pub mod config;
pub mod cursor;
pub mod error;
pub mod handle;
pub mod incidence;
pub mod index;
pub mod store;

pub use config::{Config, StoreBuilder};
pub use cursor::RecordCursor;
pub use error::{GraphError, GraphResult};
pub use handle::{Handle, HandleConverter};
pub use incidence::{IncidenceCursor, IncidenceIndex};
pub use index::{BidirectionalIndex, Index, KeyCursor, RangeCursor, ValueCursor};
pub use store::GraphStore;

pub use graphkv_core::{
    ByteConverter, CursorState, DatabaseInfo, GotoResult, RawBytes, U64BigEndian, Utf8,
};
pub use graphkv_storage::{KeyComparator, Lexicographic, StorageEngine, Transaction};
