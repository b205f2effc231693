//! Incidence sets: for every atom, the links that point at it.

use graphkv_core::cursor::KeyValues;
use graphkv_core::{MultivaluedDatabase, MultivaluedOrder};
use graphkv_storage::Transaction;

use crate::cursor::RecordCursor;
use crate::error::GraphResult;
use crate::handle::{Handle, HandleConverter};

/// Cursor over the links incident to one atom, in handle order.
pub type IncidenceCursor<'t, T> =
    RecordCursor<<T as Transaction>::Iterator<'t, MultivaluedOrder>, KeyValues<HandleConverter>>;

/// The incidence database of a store.
///
/// Each target handle is a multivalued key whose values are the handles of
/// the links pointing at it.
#[derive(Debug, Clone)]
pub struct IncidenceIndex {
    db: MultivaluedDatabase,
}

impl IncidenceIndex {
    pub(crate) fn new(db: MultivaluedDatabase) -> Self {
        Self { db }
    }

    /// The underlying logical database.
    #[must_use]
    pub const fn database(&self) -> &MultivaluedDatabase {
        &self.db
    }

    /// Record that `link` points at `target`. Recording it twice has no
    /// effect.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`](crate::GraphError::Storage) if the
    /// write fails.
    pub fn add_link<T: Transaction>(&self, tx: &mut T, target: Handle, link: Handle) -> GraphResult<()> {
        self.db.put(tx, &target.to_bytes(), &link.to_bytes())?;
        Ok(())
    }

    /// Forget that `link` points at `target`. Returns whether it was
    /// recorded.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`](crate::GraphError::Storage) if the
    /// write fails.
    pub fn remove_link<T: Transaction>(
        &self,
        tx: &mut T,
        target: Handle,
        link: Handle,
    ) -> GraphResult<bool> {
        Ok(self.db.delete(tx, &target.to_bytes(), Some(&link.to_bytes()))? > 0)
    }

    /// Drop the whole incidence set of `target`, returning its former size.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`](crate::GraphError::Storage) if the
    /// write fails.
    pub fn remove_all<T: Transaction>(&self, tx: &mut T, target: Handle) -> GraphResult<u64> {
        Ok(self.db.delete(tx, &target.to_bytes(), None)?)
    }

    /// Open a cursor over the links pointing at `target`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`](crate::GraphError::Storage) if the
    /// engine fails.
    pub fn links<'t, T: Transaction>(
        &self,
        tx: &'t T,
        target: Handle,
    ) -> GraphResult<IncidenceCursor<'t, T>> {
        RecordCursor::open(self.db.values_of(tx, &target.to_bytes(), HandleConverter))
    }

    /// Number of links pointing at `target`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`](crate::GraphError::Storage) if the
    /// engine fails.
    pub fn cardinality<T: Transaction>(&self, tx: &T, target: Handle) -> GraphResult<u64> {
        self.links(tx, target)?.count()
    }

    /// Whether `link` points at `target`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`](crate::GraphError::Storage) if the
    /// engine fails.
    pub fn contains<T: Transaction>(&self, tx: &T, target: Handle, link: Handle) -> GraphResult<bool> {
        Ok(self.db.contains(tx, &target.to_bytes(), Some(&link.to_bytes()))?)
    }
}
