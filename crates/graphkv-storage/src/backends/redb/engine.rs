//! The redb engine and its configuration.

use std::fs;
use std::path::Path;

use redb::backends::InMemoryBackend;
use redb::{Builder, Database};
use tracing::info;

use crate::engine::{StorageEngine, StorageError, StorageResult};

use super::transaction::RedbTransaction;

/// Default number of entries an iterator buffers per engine round trip.
pub const DEFAULT_ITERATOR_BATCH_SIZE: usize = 1000;

/// Options for opening a [`RedbEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedbConfig {
    /// Largest database file the engine agrees to open, in bytes.
    pub max_size: Option<u64>,
    /// Page cache size in bytes. Redb picks its own default when unset.
    pub cache_size: Option<usize>,
    /// Entries an iterator loads per batch. Never zero.
    pub iterator_batch_size: usize,
}

impl Default for RedbConfig {
    fn default() -> Self {
        Self { max_size: None, cache_size: None, iterator_batch_size: DEFAULT_ITERATOR_BATCH_SIZE }
    }
}

impl RedbConfig {
    /// The default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to open files larger than `size` bytes.
    #[must_use]
    pub const fn max_size(mut self, size: u64) -> Self {
        self.max_size = Some(size);
        self
    }

    /// Set the page cache size.
    #[must_use]
    pub const fn cache_size(mut self, size: usize) -> Self {
        self.cache_size = Some(size);
        self
    }

    /// Set the iterator batch size. Zero is treated as one.
    #[must_use]
    pub const fn iterator_batch_size(mut self, size: usize) -> Self {
        self.iterator_batch_size = if size == 0 { 1 } else { size };
        self
    }

    fn builder(&self) -> Builder {
        let mut builder = Database::builder();
        if let Some(cache_size) = self.cache_size {
            builder.set_cache_size(cache_size);
        }
        builder
    }

    fn check_file(&self, path: &Path) -> StorageResult<()> {
        let Some(max) = self.max_size else {
            return Ok(());
        };
        match fs::metadata(path) {
            Ok(meta) if meta.len() > max => Err(StorageError::Open(format!(
                "{} is {} bytes, above the configured maximum of {max}",
                path.display(),
                meta.len()
            ))),
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

/// A storage engine backed by redb.
///
/// Every [`Keyspace`](crate::engine::Keyspace) is a redb table ordered by the
/// keyspace comparator, so seeks and range reads follow it natively.
///
/// # Example
///
/// ```ignore
/// use graphkv_storage::backends::RedbEngine;
/// use graphkv_storage::{Keyspace, Lexicographic, StorageEngine, Transaction};
///
/// let engine = RedbEngine::open("graph.redb")?;
/// let space = Keyspace::<Lexicographic>::new("nodes");
///
/// let mut tx = engine.begin_write()?;
/// tx.put(&space, b"node:1", b"Alice")?;
/// tx.commit()?;
/// ```
pub struct RedbEngine {
    db: Database,
    config: RedbConfig,
}

impl RedbEngine {
    /// Open or create the database file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the file cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::open_with_config(path, RedbConfig::default())
    }

    /// Open or create the database file at `path` with `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the file cannot be opened or created,
    /// or is larger than `config.max_size`.
    pub fn open_with_config(path: impl AsRef<Path>, config: RedbConfig) -> StorageResult<Self> {
        let path = path.as_ref();
        config.check_file(path)?;
        let db = config.builder().create(path).map_err(|e| StorageError::Open(e.to_string()))?;
        info!(path = %path.display(), batch = config.iterator_batch_size, "opened redb engine");
        Ok(Self { db, config })
    }

    /// A database that lives in memory and vanishes on drop.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the database cannot be created.
    pub fn in_memory() -> StorageResult<Self> {
        Self::in_memory_with_config(RedbConfig::default())
    }

    /// An in-memory database with `config`. `max_size` does not apply.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the database cannot be created.
    pub fn in_memory_with_config(config: RedbConfig) -> StorageResult<Self> {
        let db = config
            .builder()
            .create_with_backend(InMemoryBackend::new())
            .map_err(|e| StorageError::Open(e.to_string()))?;
        Ok(Self { db, config })
    }

    /// The redb database.
    #[must_use]
    pub const fn inner(&self) -> &Database {
        &self.db
    }

    /// The configuration the engine was opened with.
    #[must_use]
    pub const fn config(&self) -> &RedbConfig {
        &self.config
    }

    /// Entries per iterator batch.
    #[must_use]
    pub const fn iterator_batch_size(&self) -> usize {
        self.config.iterator_batch_size
    }
}

impl StorageEngine for RedbEngine {
    type Transaction<'a> = RedbTransaction;

    fn begin_read(&self) -> StorageResult<Self::Transaction<'_>> {
        self.db
            .begin_read()
            .map(|tx| RedbTransaction::new_read(tx, self.iterator_batch_size()))
            .map_err(|e| StorageError::Transaction(e.to_string()))
    }

    fn begin_write(&self) -> StorageResult<Self::Transaction<'_>> {
        self.db
            .begin_write()
            .map(|tx| RedbTransaction::new_write(tx, self.iterator_batch_size()))
            .map_err(|e| StorageError::Transaction(e.to_string()))
    }

    fn flush(&self) -> StorageResult<()> {
        // Committed write transactions are already durable.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Keyspace, Lexicographic, Transaction};

    #[test]
    fn test_builder_setters() {
        let config = RedbConfig::new().max_size(1 << 30).cache_size(1 << 20).iterator_batch_size(16);
        assert_eq!(config.max_size, Some(1 << 30));
        assert_eq!(config.cache_size, Some(1 << 20));
        assert_eq!(config.iterator_batch_size, 16);
        assert_eq!(RedbConfig::new().iterator_batch_size(0).iterator_batch_size, 1);
    }

    #[test]
    fn test_in_memory_keeps_config() {
        let config = RedbConfig::new().iterator_batch_size(3);
        let engine = RedbEngine::in_memory_with_config(config).expect("failed to create engine");
        assert_eq!(engine.config(), &config);
        assert_eq!(engine.iterator_batch_size(), 3);

        let tx = engine.begin_read().expect("failed to begin read");
        assert!(tx.is_read_only());
    }

    #[test]
    fn test_put_then_get() {
        let engine = RedbEngine::in_memory().expect("failed to create engine");
        let space = Keyspace::<Lexicographic>::new("test");

        let mut tx = engine.begin_write().expect("failed to begin write");
        tx.put(&space, b"key", b"value").expect("failed to put");
        tx.commit().expect("failed to commit");

        let tx = engine.begin_read().expect("failed to begin read");
        assert_eq!(tx.get(&space, b"key").expect("failed to get"), Some(b"value".to_vec()));
    }

    #[test]
    fn test_max_size_rejects_large_files() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("big.redb");
        drop(RedbEngine::open(&path).expect("failed to create file"));

        let err = RedbEngine::open_with_config(&path, RedbConfig::new().max_size(1))
            .err()
            .expect("file is larger than one byte");
        assert!(matches!(err, StorageError::Open(_)));
        assert!(RedbEngine::open_with_config(&path, RedbConfig::new().max_size(u64::MAX)).is_ok());
    }
}
