//! Sorted multivalued indexes.
//!
//! An [`Index`] maps keys to sets of values inside one multivalued logical
//! database. Keys are ordered by `K` and the values of each key by `V`; the
//! converters `KC` and `VC` turn application items into the stored bytes.
//!
//! A [`BidirectionalIndex`] also keeps an inverse database, so the keys
//! holding a value can be found without a scan.

use std::ops::Deref;

use graphkv_core::cursor::{DatabaseKeys, DatabaseValues, KeyValues};
use graphkv_core::{ByteConverter, MultivaluedDatabase, MultivaluedOrder};
use graphkv_storage::{KeyComparator, Lexicographic, ReadBounds, Transaction};

use crate::cursor::RecordCursor;
use crate::error::GraphResult;

type Iter<'t, T, K, V> = <T as Transaction>::Iterator<'t, MultivaluedOrder<K, V>>;

/// Cursor over the values of one key.
pub type ValueCursor<'t, T, VC, K = Lexicographic, V = Lexicographic> =
    RecordCursor<Iter<'t, T, K, V>, KeyValues<VC>>;

/// Cursor over the distinct keys of an index.
pub type KeyCursor<'t, T, KC, K = Lexicographic, V = Lexicographic> =
    RecordCursor<Iter<'t, T, K, V>, DatabaseKeys<KC>>;

/// Cursor over values across a range of keys.
pub type RangeCursor<'t, T, VC, K = Lexicographic, V = Lexicographic> =
    RecordCursor<Iter<'t, T, K, V>, DatabaseValues<VC>>;

/// A sorted index from keys to sets of values.
#[derive(Debug, Clone)]
pub struct Index<KC, VC, K = Lexicographic, V = Lexicographic>
where
    K: KeyComparator,
    V: KeyComparator,
{
    db: MultivaluedDatabase<K, V>,
    inverse: Option<MultivaluedDatabase<V, K>>,
    keys: KC,
    values: VC,
}

impl<KC, VC, K, V> Index<KC, VC, K, V>
where
    KC: ByteConverter,
    VC: ByteConverter,
    K: KeyComparator,
    V: KeyComparator,
{
    pub(crate) fn new(db: MultivaluedDatabase<K, V>, keys: KC, values: VC) -> Self {
        Self { db, inverse: None, keys, values }
    }

    /// The index name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.db.name()
    }

    /// The underlying logical database.
    #[must_use]
    pub const fn database(&self) -> &MultivaluedDatabase<K, V> {
        &self.db
    }

    /// Add `value` to `key`. Adding it twice has no effect.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Encoding`](crate::GraphError::Encoding) if the
    /// key is too large, or a storage error if the write fails.
    pub fn add_entry<T: Transaction>(
        &self,
        tx: &mut T,
        key: &KC::Item,
        value: &VC::Item,
    ) -> GraphResult<()> {
        let key = self.keys.to_bytes(key)?;
        let value = self.values.to_bytes(value)?;
        self.db.put(tx, &key, &value)?;
        if let Some(inverse) = &self.inverse {
            inverse.put(tx, &value, &key)?;
        }
        Ok(())
    }

    /// Remove `value` from `key`. Returns whether it was present.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write fails.
    pub fn remove_entry<T: Transaction>(
        &self,
        tx: &mut T,
        key: &KC::Item,
        value: &VC::Item,
    ) -> GraphResult<bool> {
        let key = self.keys.to_bytes(key)?;
        let value = self.values.to_bytes(value)?;
        let removed = self.db.delete(tx, &key, Some(&value))? > 0;
        if let Some(inverse) = &self.inverse {
            inverse.delete(tx, &value, Some(&key))?;
        }
        Ok(removed)
    }

    /// Remove every value of `key`, returning how many there were.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write fails.
    pub fn remove_all_entries<T: Transaction>(&self, tx: &mut T, key: &KC::Item) -> GraphResult<u64> {
        let key = self.keys.to_bytes(key)?;
        if let Some(inverse) = &self.inverse {
            let values = {
                let mut cursor = self.db.cursor(&*tx, &key)?;
                cursor.remaining()?
            };
            for value in values {
                inverse.delete(tx, &value, Some(&key))?;
            }
        }
        Ok(self.db.delete(tx, &key, None)?)
    }

    /// The smallest value of `key`.
    ///
    /// # Errors
    ///
    /// Returns a storage or encoding error.
    pub fn find_first<T: Transaction>(&self, tx: &T, key: &KC::Item) -> GraphResult<Option<VC::Item>> {
        let key = self.keys.to_bytes(key)?;
        match self.db.first_value(tx, &key)? {
            Some(bytes) => Ok(Some(self.values.from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// The largest value of `key`.
    ///
    /// # Errors
    ///
    /// Returns a storage or encoding error.
    pub fn find_last<T: Transaction>(&self, tx: &T, key: &KC::Item) -> GraphResult<Option<VC::Item>> {
        let mut cursor = self.find(tx, key)?;
        cursor.go_after_last()?;
        if cursor.has_prev()? {
            Ok(Some(cursor.prev()?))
        } else {
            Ok(None)
        }
    }

    /// Open a cursor over the values of `key`.
    ///
    /// # Errors
    ///
    /// Returns a storage or encoding error.
    pub fn find<'t, T: Transaction>(
        &self,
        tx: &'t T,
        key: &KC::Item,
    ) -> GraphResult<ValueCursor<'t, T, VC, K, V>> {
        let key = self.keys.to_bytes(key)?;
        RecordCursor::open(self.db.values_of(tx, &key, self.values.clone()))
    }

    /// Open a cursor over the distinct keys of the index.
    ///
    /// The cursor supports [`go_to`](RecordCursor::go_to).
    ///
    /// # Errors
    ///
    /// Returns a storage error if the engine fails.
    pub fn scan_keys<'t, T: Transaction>(&self, tx: &'t T) -> GraphResult<KeyCursor<'t, T, KC, K, V>> {
        RecordCursor::open(self.db.keys(tx, self.keys.clone()))
    }

    /// Open a cursor over every value, in key order.
    ///
    /// Values of different keys are interleaved, so this cursor cannot be
    /// positioned with [`go_to`](RecordCursor::go_to).
    ///
    /// # Errors
    ///
    /// Returns a storage error if the engine fails.
    pub fn scan_values<'t, T: Transaction>(
        &self,
        tx: &'t T,
    ) -> GraphResult<RangeCursor<'t, T, VC, K, V>> {
        RecordCursor::open(self.db.values(tx, self.values.clone()))
    }

    /// Number of distinct keys.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the engine fails.
    pub fn count<T: Transaction>(&self, tx: &T) -> GraphResult<u64> {
        self.scan_keys(tx)?.count()
    }

    /// Number of values of `key`.
    ///
    /// # Errors
    ///
    /// Returns a storage or encoding error.
    pub fn count_key<T: Transaction>(&self, tx: &T, key: &KC::Item) -> GraphResult<u64> {
        self.find(tx, key)?.count()
    }

    /// Total number of entries across all keys.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the engine fails.
    pub fn count_entries<T: Transaction>(&self, tx: &T) -> GraphResult<u64> {
        self.scan_values(tx)?.count()
    }

    /// Values of every key strictly below `key`, in key order.
    ///
    /// # Errors
    ///
    /// Returns a storage or encoding error.
    pub fn find_lt<'t, T: Transaction>(
        &self,
        tx: &'t T,
        key: &KC::Item,
    ) -> GraphResult<RangeCursor<'t, T, VC, K, V>> {
        let bounds = self.db.bounds_below(&self.keys.to_bytes(key)?, false)?;
        self.range(tx, bounds)
    }

    /// Values of every key up to and including `key`, in key order.
    ///
    /// # Errors
    ///
    /// Returns a storage or encoding error.
    pub fn find_lte<'t, T: Transaction>(
        &self,
        tx: &'t T,
        key: &KC::Item,
    ) -> GraphResult<RangeCursor<'t, T, VC, K, V>> {
        let bounds = self.db.bounds_below(&self.keys.to_bytes(key)?, true)?;
        self.range(tx, bounds)
    }

    /// Values of every key strictly above `key`, in key order.
    ///
    /// # Errors
    ///
    /// Returns a storage or encoding error.
    pub fn find_gt<'t, T: Transaction>(
        &self,
        tx: &'t T,
        key: &KC::Item,
    ) -> GraphResult<RangeCursor<'t, T, VC, K, V>> {
        let bounds = self.db.bounds_above(&self.keys.to_bytes(key)?, false)?;
        self.range(tx, bounds)
    }

    /// Values of every key from `key` upwards, in key order.
    ///
    /// # Errors
    ///
    /// Returns a storage or encoding error.
    pub fn find_gte<'t, T: Transaction>(
        &self,
        tx: &'t T,
        key: &KC::Item,
    ) -> GraphResult<RangeCursor<'t, T, VC, K, V>> {
        let bounds = self.db.bounds_above(&self.keys.to_bytes(key)?, true)?;
        self.range(tx, bounds)
    }

    fn range<'t, T: Transaction>(
        &self,
        tx: &'t T,
        bounds: ReadBounds,
    ) -> GraphResult<RangeCursor<'t, T, VC, K, V>> {
        RecordCursor::open(self.db.values_in(tx, bounds, self.values.clone()))
    }
}

/// An index that can also be searched by value.
///
/// Dereferences to its [`Index`]; every write through it maintains the
/// inverse database as well.
#[derive(Debug, Clone)]
pub struct BidirectionalIndex<KC, VC, K = Lexicographic, V = Lexicographic>
where
    K: KeyComparator,
    V: KeyComparator,
{
    index: Index<KC, VC, K, V>,
    inverse: MultivaluedDatabase<V, K>,
}

impl<KC, VC, K, V> BidirectionalIndex<KC, VC, K, V>
where
    KC: ByteConverter,
    VC: ByteConverter,
    K: KeyComparator,
    V: KeyComparator,
{
    pub(crate) fn new(
        db: MultivaluedDatabase<K, V>,
        inverse: MultivaluedDatabase<V, K>,
        keys: KC,
        values: VC,
    ) -> Self {
        let index = Index { db, inverse: Some(inverse.clone()), keys, values };
        Self { index, inverse }
    }

    /// The inverse logical database, keyed by value.
    #[must_use]
    pub const fn inverse_database(&self) -> &MultivaluedDatabase<V, K> {
        &self.inverse
    }

    /// Open a cursor over the keys holding `value`.
    ///
    /// # Errors
    ///
    /// Returns a storage or encoding error.
    pub fn find_by_value<'t, T: Transaction>(
        &self,
        tx: &'t T,
        value: &VC::Item,
    ) -> GraphResult<RecordCursor<<T as Transaction>::Iterator<'t, MultivaluedOrder<V, K>>, KeyValues<KC>>>
    {
        let value = self.index.values.to_bytes(value)?;
        RecordCursor::open(self.inverse.values_of(tx, &value, self.index.keys.clone()))
    }

    /// The smallest key holding `value`.
    ///
    /// # Errors
    ///
    /// Returns a storage or encoding error.
    pub fn find_first_by_value<T: Transaction>(
        &self,
        tx: &T,
        value: &VC::Item,
    ) -> GraphResult<Option<KC::Item>> {
        let value = self.index.values.to_bytes(value)?;
        match self.inverse.first_value(tx, &value)? {
            Some(bytes) => Ok(Some(self.index.keys.from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Number of keys holding `value`.
    ///
    /// # Errors
    ///
    /// Returns a storage or encoding error.
    pub fn count_keys<T: Transaction>(&self, tx: &T, value: &VC::Item) -> GraphResult<u64> {
        self.find_by_value(tx, value)?.count()
    }
}

impl<KC, VC, K, V> Deref for BidirectionalIndex<KC, VC, K, V>
where
    K: KeyComparator,
    V: KeyComparator,
{
    type Target = Index<KC, VC, K, V>;

    fn deref(&self) -> &Self::Target {
        &self.index
    }
}
