//! Store configuration.

use std::path::{Path, PathBuf};

use graphkv_storage::backends::redb::{RedbConfig, DEFAULT_ITERATOR_BATCH_SIZE};

use crate::error::{GraphError, GraphResult};
use crate::store::GraphStore;

/// Configuration options for opening a graph store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the database file. Ignored for in-memory stores.
    pub path: Option<PathBuf>,
    /// Keep everything in memory.
    pub in_memory: bool,
    /// Engine cache size in bytes.
    pub cache_size: Option<usize>,
    /// Maximum size of the database file in bytes.
    pub max_size: Option<u64>,
    /// Entries buffered per engine round trip by each cursor.
    pub iterator_batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: None,
            in_memory: false,
            cache_size: None,
            max_size: None,
            iterator_batch_size: DEFAULT_ITERATOR_BATCH_SIZE,
        }
    }
}

impl Config {
    /// Create a new configuration for a file-backed store at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: Some(path.into()), ..Self::default() }
    }

    /// Create a configuration for an in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self { in_memory: true, ..Self::default() }
    }

    /// Check that the options are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Config`] if a file-backed store has no path, if
    /// an in-memory store was given one, or if a size is zero.
    pub fn validate(&self) -> GraphResult<()> {
        match (self.in_memory, &self.path) {
            (false, None) => return Err(GraphError::config("a file-backed store needs a path")),
            (true, Some(path)) => {
                return Err(GraphError::config(format!(
                    "in-memory store cannot use path {}",
                    path.display()
                )))
            }
            _ => {}
        }
        if self.iterator_batch_size == 0 {
            return Err(GraphError::config("iterator batch size must be at least 1"));
        }
        if self.cache_size == Some(0) {
            return Err(GraphError::config("cache size must be positive"));
        }
        if self.max_size == Some(0) {
            return Err(GraphError::config("max size must be positive"));
        }
        Ok(())
    }

    pub(crate) fn engine_config(&self) -> RedbConfig {
        let mut config = RedbConfig::new().iterator_batch_size(self.iterator_batch_size);
        if let Some(cache_size) = self.cache_size {
            config = config.cache_size(cache_size);
        }
        if let Some(max_size) = self.max_size {
            config = config.max_size(max_size);
        }
        config
    }
}

/// Builder for opening a [`GraphStore`].
///
/// # Example
///
/// ```ignore
/// use graphkv::StoreBuilder;
///
/// let store = StoreBuilder::new()
///     .path("graph.redb")
///     .cache_size(64 * 1024 * 1024)
///     .open()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct StoreBuilder {
    config: Config,
}

impl StoreBuilder {
    /// Create a builder with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for an in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self { config: Config::in_memory() }
    }

    /// Set the database file path.
    #[must_use]
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the engine cache size in bytes.
    #[must_use]
    pub const fn cache_size(mut self, size: usize) -> Self {
        self.config.cache_size = Some(size);
        self
    }

    /// Set the maximum database size in bytes.
    #[must_use]
    pub const fn max_size(mut self, size: u64) -> Self {
        self.config.max_size = Some(size);
        self
    }

    /// Set how many entries a cursor buffers per engine round trip.
    #[must_use]
    pub const fn iterator_batch_size(mut self, size: usize) -> Self {
        self.config.iterator_batch_size = size;
        self
    }

    /// The configuration built so far.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Open the store.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Config`] for inconsistent options and
    /// [`GraphError::Open`] if the engine cannot be opened.
    pub fn open(self) -> GraphResult<GraphStore> {
        GraphStore::open_with_config(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(Config::new("graph.redb").validate().is_ok());
        assert!(Config::in_memory().validate().is_ok());
        assert!(matches!(Config::default().validate(), Err(GraphError::Config(_))));

        let mut config = Config::in_memory();
        config.path = Some(PathBuf::from("graph.redb"));
        assert!(config.validate().is_err());

        let config = StoreBuilder::in_memory().iterator_batch_size(0).config().clone();
        assert!(config.validate().is_err());

        let config = StoreBuilder::in_memory().cache_size(0).config().clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder() {
        let builder = StoreBuilder::new().path("graph.redb").cache_size(1024).max_size(1 << 20);
        let config = builder.config();
        assert_eq!(config.path.as_deref(), Some(Path::new("graph.redb")));
        assert_eq!(config.cache_size, Some(1024));
        assert_eq!(config.max_size, Some(1 << 20));
        assert!(!config.in_memory);

        let engine = config.engine_config();
        assert_eq!(engine.cache_size, Some(1024));
        assert_eq!(engine.iterator_batch_size, DEFAULT_ITERATOR_BATCH_SIZE);
    }
}
