//! The graph store.
//!
//! A [`GraphStore`] owns the engine and the catalog of logical databases.
//! Three databases are always present:
//!
//! | name        | prefix | kind          | contents                         |
//! |-------------|--------|---------------|----------------------------------|
//! | `primitive` | `0x00` | single-valued | raw data of atoms                |
//! | `data`      | `0x01` | single-valued | link records (arrays of handles) |
//! | `incidence` | `0x02` | multivalued   | links pointing at each atom      |
//!
//! Indexes created through the store get their own prefixes.

use std::path::Path;
use std::sync::RwLock;

use graphkv_core::{ByteConverter, Catalog, DatabaseInfo, MultivaluedDatabase, SingleValuedDatabase};
use graphkv_storage::backends::RedbEngine;
use graphkv_storage::{KeyComparator, Lexicographic, StorageEngine, Transaction};
use tracing::{debug, info, warn};

use crate::config::{Config, StoreBuilder};
use crate::error::{GraphError, GraphResult};
use crate::handle::{decode_link, encode_link, Handle};
use crate::incidence::IncidenceIndex;
use crate::index::{BidirectionalIndex, Index};

/// Prefix of the raw data database.
pub const PRIMITIVE_PREFIX: u8 = 0x00;
/// Prefix of the link record database.
pub const DATA_PREFIX: u8 = 0x01;
/// Prefix of the incidence database.
pub const INCIDENCE_PREFIX: u8 = 0x02;

/// Graph storage over an ordered key-value engine.
///
/// # Example
///
/// ```
/// use graphkv::{GraphStore, Handle};
///
/// let store = GraphStore::in_memory().unwrap();
/// let (atom, link) = (Handle::new(1), Handle::new(2));
///
/// store
///     .write(|tx| {
///         store.store_data(tx, atom, b"hello")?;
///         store.store_link(tx, link, &[atom])?;
///         store.incidence().add_link(tx, atom, link)
///     })
///     .unwrap();
///
/// let links = store.read(|tx| store.incidence().cardinality(tx, atom)).unwrap();
/// assert_eq!(links, 1);
/// ```
pub struct GraphStore<E: StorageEngine = RedbEngine> {
    engine: E,
    config: Option<Config>,
    catalog: RwLock<Catalog>,
    primitive: SingleValuedDatabase,
    data: SingleValuedDatabase,
    incidence: IncidenceIndex,
}

impl GraphStore<RedbEngine> {
    /// Open or create a file-backed store with default options.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Open`] if the database cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> GraphResult<Self> {
        StoreBuilder::new().path(path).open()
    }

    /// Create an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Open`] if the engine cannot be created.
    pub fn in_memory() -> GraphResult<Self> {
        StoreBuilder::in_memory().open()
    }

    /// Returns a builder for a store with custom options.
    #[must_use]
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    /// Open a store with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Config`] for inconsistent options and
    /// [`GraphError::Open`] if the engine cannot be opened.
    pub fn open_with_config(config: Config) -> GraphResult<Self> {
        config.validate()?;

        let engine_config = config.engine_config();
        let engine = match &config.path {
            Some(path) if !config.in_memory => RedbEngine::open_with_config(path, engine_config),
            _ => RedbEngine::in_memory_with_config(engine_config),
        }
        .map_err(|e| GraphError::Open(e.to_string()))?;

        let mut store = Self::with_engine(engine)?;
        store.config = Some(config);
        Ok(store)
    }
}

impl<E: StorageEngine> GraphStore<E> {
    /// Build a store over an already opened engine.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Catalog`] if the standard databases cannot be
    /// registered.
    pub fn with_engine(engine: E) -> GraphResult<Self> {
        let primitive = SingleValuedDatabase::new("primitive", PRIMITIVE_PREFIX);
        let data = SingleValuedDatabase::new("data", DATA_PREFIX);
        let incidence = MultivaluedDatabase::new("incidence", INCIDENCE_PREFIX);

        let mut catalog = Catalog::new();
        catalog.register(&primitive)?;
        catalog.register(&data)?;
        catalog.register(&incidence)?;
        info!(databases = catalog.len(), "opened graph store");

        Ok(Self {
            engine,
            config: None,
            catalog: RwLock::new(catalog),
            primitive,
            data,
            incidence: IncidenceIndex::new(incidence),
        })
    }

    /// The configuration the store was opened with, if any.
    #[must_use]
    pub const fn config(&self) -> Option<&Config> {
        self.config.as_ref()
    }

    /// The underlying engine.
    #[must_use]
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Begin a read-only transaction.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the engine cannot start one.
    pub fn begin_read(&self) -> GraphResult<E::Transaction<'_>> {
        Ok(self.engine.begin_read()?)
    }

    /// Begin a read-write transaction.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the engine cannot start one.
    pub fn begin_write(&self) -> GraphResult<E::Transaction<'_>> {
        Ok(self.engine.begin_write()?)
    }

    /// Run `f` in a read-only transaction.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or a storage error.
    pub fn read<'s, R, F>(&'s self, f: F) -> GraphResult<R>
    where
        F: FnOnce(&E::Transaction<'s>) -> GraphResult<R>,
    {
        let tx = self.begin_read()?;
        let result = f(&tx)?;
        tx.rollback()?;
        Ok(result)
    }

    /// Run `f` in a read-write transaction, committing if it succeeds and
    /// rolling back if it fails.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or a storage error if the commit fails.
    pub fn write<'s, R, F>(&'s self, f: F) -> GraphResult<R>
    where
        F: FnOnce(&mut E::Transaction<'s>) -> GraphResult<R>,
    {
        let mut tx = self.begin_write()?;
        match f(&mut tx) {
            Ok(result) => {
                tx.commit()?;
                Ok(result)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback() {
                    warn!(error = %rollback, "rollback after failed write also failed");
                }
                Err(err)
            }
        }
    }

    /// Flush committed data to durable storage.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the engine fails.
    pub fn flush(&self) -> GraphResult<()> {
        Ok(self.engine.flush()?)
    }

    /// Store the raw data of `handle`, replacing any previous data.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the write fails.
    pub fn store_data<T: Transaction>(&self, tx: &mut T, handle: Handle, data: &[u8]) -> GraphResult<()> {
        self.primitive.put(tx, &handle.to_bytes(), data)?;
        Ok(())
    }

    /// The raw data of `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the read fails.
    pub fn get_data<T: Transaction>(&self, tx: &T, handle: Handle) -> GraphResult<Option<Vec<u8>>> {
        Ok(self.primitive.get(tx, &handle.to_bytes())?)
    }

    /// Remove the raw data of `handle`. Returns whether there was any.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the write fails.
    pub fn remove_data<T: Transaction>(&self, tx: &mut T, handle: Handle) -> GraphResult<bool> {
        Ok(self.primitive.delete(tx, &handle.to_bytes(), None)? > 0)
    }

    /// Whether `handle` has raw data.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the read fails.
    pub fn contains_data<T: Transaction>(&self, tx: &T, handle: Handle) -> GraphResult<bool> {
        Ok(self.primitive.contains(tx, &handle.to_bytes(), None)?)
    }

    /// Store `handle` as a link to `targets`, replacing any previous link.
    ///
    /// Incidence sets are not touched; maintain them through
    /// [`incidence`](Self::incidence).
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the write fails.
    pub fn store_link<T: Transaction>(
        &self,
        tx: &mut T,
        handle: Handle,
        targets: &[Handle],
    ) -> GraphResult<()> {
        self.data.put(tx, &handle.to_bytes(), &encode_link(targets))?;
        Ok(())
    }

    /// The targets of the link `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::CorruptRecord`] if the stored record is not an
    /// array of handles.
    pub fn get_link<T: Transaction>(&self, tx: &T, handle: Handle) -> GraphResult<Option<Vec<Handle>>> {
        self.data.get(tx, &handle.to_bytes())?.as_deref().map(decode_link).transpose()
    }

    /// Remove the link `handle`. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the write fails.
    pub fn remove_link<T: Transaction>(&self, tx: &mut T, handle: Handle) -> GraphResult<bool> {
        Ok(self.data.delete(tx, &handle.to_bytes(), None)? > 0)
    }

    /// Whether `handle` is a stored link.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the read fails.
    pub fn contains_link<T: Transaction>(&self, tx: &T, handle: Handle) -> GraphResult<bool> {
        Ok(self.data.contains(tx, &handle.to_bytes(), None)?)
    }

    /// The incidence sets of the store.
    #[must_use]
    pub const fn incidence(&self) -> &IncidenceIndex {
        &self.incidence
    }

    /// Create an index with lexicographically ordered keys and values.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Catalog`] if `name` or `prefix` is taken.
    pub fn create_index<KC, VC>(
        &self,
        name: &str,
        prefix: u8,
        keys: KC,
        values: VC,
    ) -> GraphResult<Index<KC, VC>>
    where
        KC: ByteConverter,
        VC: ByteConverter,
    {
        self.create_ordered_index::<Lexicographic, Lexicographic, KC, VC>(name, prefix, keys, values)
    }

    /// Create an index whose keys are ordered by `K` and values by `V`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Catalog`] if `name` or `prefix` is taken.
    pub fn create_ordered_index<K, V, KC, VC>(
        &self,
        name: &str,
        prefix: u8,
        keys: KC,
        values: VC,
    ) -> GraphResult<Index<KC, VC, K, V>>
    where
        K: KeyComparator,
        V: KeyComparator,
        KC: ByteConverter,
        VC: ByteConverter,
    {
        let db = MultivaluedDatabase::<K, V>::new(name, prefix);
        self.register(vec![db.info()])?;
        debug!(name, prefix, "created index");
        Ok(Index::new(db, keys, values))
    }

    /// Create an index that can also be searched by value.
    ///
    /// The inverse database takes `inverse_prefix` and the name
    /// `<name>.inverse`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Catalog`] if a name or prefix is taken.
    pub fn create_bidirectional_index<KC, VC>(
        &self,
        name: &str,
        prefix: u8,
        inverse_prefix: u8,
        keys: KC,
        values: VC,
    ) -> GraphResult<BidirectionalIndex<KC, VC>>
    where
        KC: ByteConverter,
        VC: ByteConverter,
    {
        self.create_ordered_bidirectional_index::<Lexicographic, Lexicographic, KC, VC>(
            name,
            prefix,
            inverse_prefix,
            keys,
            values,
        )
    }

    /// Create a bidirectional index with keys ordered by `K` and values by
    /// `V`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Catalog`] if a name or prefix is taken.
    pub fn create_ordered_bidirectional_index<K, V, KC, VC>(
        &self,
        name: &str,
        prefix: u8,
        inverse_prefix: u8,
        keys: KC,
        values: VC,
    ) -> GraphResult<BidirectionalIndex<KC, VC, K, V>>
    where
        K: KeyComparator,
        V: KeyComparator,
        KC: ByteConverter,
        VC: ByteConverter,
    {
        let db = MultivaluedDatabase::<K, V>::new(name, prefix);
        let inverse = MultivaluedDatabase::<V, K>::new(format!("{name}.inverse"), inverse_prefix);
        self.register(vec![db.info(), inverse.info()])?;
        debug!(name, prefix, inverse_prefix, "created bidirectional index");
        Ok(BidirectionalIndex::new(db, inverse, keys, values))
    }

    /// Register several databases, all or none.
    fn register(&self, infos: Vec<DatabaseInfo>) -> GraphResult<()> {
        let mut catalog =
            self.catalog.write().map_err(|e| GraphError::lock_poisoned(e.to_string()))?;

        let mut staged = Catalog::new();
        for info in &infos {
            catalog.check(info)?;
            staged.insert(info.clone())?;
        }
        for info in infos {
            catalog.insert(info)?;
        }
        Ok(())
    }

    /// Every registered logical database, in prefix order.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::LockPoisoned`] if the catalog lock is poisoned.
    pub fn databases(&self) -> GraphResult<Vec<DatabaseInfo>> {
        let catalog = self.catalog.read().map_err(|e| GraphError::lock_poisoned(e.to_string()))?;
        Ok(catalog.iter().cloned().collect())
    }
}
