//! Core storage engine traits.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::StorageResult;

/// A key-value pair as owned byte vectors.
pub type KeyValue = (Vec<u8>, Vec<u8>);

/// An ordering over physical keys, installed into the engine.
///
/// The engine calls [`compare`](Self::compare) during every insert, seek and
/// scan of a keyspace created with this comparator. Implementations must be a
/// total order and must never panic.
///
/// [`name`](Self::name) is persisted by engines that record key types. It
/// identifies the ordering across restarts, so two comparators with different
/// behaviour must never share a name.
pub trait KeyComparator: fmt::Debug + Send + Sync + 'static {
    /// A stable identifier for this ordering.
    fn name() -> String;

    /// Compare two keys.
    fn compare(left: &[u8], right: &[u8]) -> Ordering;
}

/// Unsigned byte-wise lexicographic ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lexicographic;

impl KeyComparator for Lexicographic {
    fn name() -> String {
        "lexicographic".to_string()
    }

    fn compare(left: &[u8], right: &[u8]) -> Ordering {
        left.cmp(right)
    }
}

/// A named physical keyspace whose keys are ordered by `C`.
pub struct Keyspace<C: KeyComparator = Lexicographic> {
    name: String,
    _order: PhantomData<fn() -> C>,
}

impl<C: KeyComparator> Keyspace<C> {
    /// Create a keyspace descriptor.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), _order: PhantomData }
    }

    /// The physical name of the keyspace.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compare two keys with this keyspace's ordering.
    #[must_use]
    pub fn compare(&self, left: &[u8], right: &[u8]) -> Ordering {
        C::compare(left, right)
    }
}

impl<C: KeyComparator> Clone for Keyspace<C> {
    fn clone(&self) -> Self {
        Self::new(self.name.clone())
    }
}

impl<C: KeyComparator> fmt::Debug for Keyspace<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyspace").field("name", &self.name).field("order", &C::name()).finish()
    }
}

/// Bounds restricting the keys an iterator can reach.
///
/// The lower bound is inclusive and the upper bound is exclusive. Seeks
/// outside the bounds clamp to them; an iterator never becomes valid on a
/// key outside its bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadBounds {
    /// Smallest reachable key, inclusive.
    pub lower: Option<Vec<u8>>,
    /// First unreachable key, exclusive.
    pub upper: Option<Vec<u8>>,
}

impl ReadBounds {
    /// Bounds covering the whole keyspace.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self { lower: None, upper: None }
    }

    /// Bounds covering `[lower, upper)`.
    #[must_use]
    pub const fn between(lower: Vec<u8>, upper: Vec<u8>) -> Self {
        Self { lower: Some(lower), upper: Some(upper) }
    }

    /// Set the inclusive lower bound.
    #[must_use]
    pub fn lower(mut self, key: Vec<u8>) -> Self {
        self.lower = Some(key);
        self
    }

    /// Set the exclusive upper bound.
    #[must_use]
    pub fn upper(mut self, key: Vec<u8>) -> Self {
        self.upper = Some(key);
        self
    }

    /// Whether `key` lies within these bounds under ordering `C`.
    #[must_use]
    pub fn contains<C: KeyComparator>(&self, key: &[u8]) -> bool {
        let above_lower =
            self.lower.as_deref().map_or(true, |lower| C::compare(key, lower) != Ordering::Less);
        let below_upper =
            self.upper.as_deref().map_or(true, |upper| C::compare(key, upper) == Ordering::Less);
        above_lower && below_upper
    }
}

/// A storage engine that provides snapshot-scoped transactions.
///
/// Implementations must be `Send + Sync` so that a single engine can be
/// shared between threads; each transaction and each iterator is confined to
/// the thread that opened it.
pub trait StorageEngine: Send + Sync {
    /// The transaction type for this engine.
    type Transaction<'a>: Transaction
    where
        Self: 'a;

    /// Begin a read-only transaction over a consistent snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Transaction`](super::StorageError::Transaction) if the transaction cannot start.
    fn begin_read(&self) -> StorageResult<Self::Transaction<'_>>;

    /// Begin a read-write transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Transaction`](super::StorageError::Transaction) if the transaction cannot start.
    fn begin_write(&self) -> StorageResult<Self::Transaction<'_>>;

    /// Flush buffered writes to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to persist its state.
    fn flush(&self) -> StorageResult<()>;
}

impl<E: StorageEngine> StorageEngine for Arc<E> {
    type Transaction<'a>
        = E::Transaction<'a>
    where
        Self: 'a;

    fn begin_read(&self) -> StorageResult<Self::Transaction<'_>> {
        (**self).begin_read()
    }

    fn begin_write(&self) -> StorageResult<Self::Transaction<'_>> {
        (**self).begin_write()
    }

    fn flush(&self) -> StorageResult<()> {
        (**self).flush()
    }
}

/// A transaction scoping reads to a snapshot and buffering writes.
pub trait Transaction {
    /// The iterator type produced for keyspaces ordered by `C`.
    type Iterator<'a, C: KeyComparator>: RawIterator
    where
        Self: 'a;

    /// Get the record stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to read.
    fn get<C: KeyComparator>(
        &self,
        space: &Keyspace<C>,
        key: &[u8],
    ) -> StorageResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous record.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadOnly`](super::StorageError::ReadOnly) on a read-only transaction.
    fn put<C: KeyComparator>(
        &mut self,
        space: &Keyspace<C>,
        key: &[u8],
        value: &[u8],
    ) -> StorageResult<()>;

    /// Remove `key`, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadOnly`](super::StorageError::ReadOnly) on a read-only transaction.
    fn delete<C: KeyComparator>(&mut self, space: &Keyspace<C>, key: &[u8]) -> StorageResult<bool>;

    /// Open an iterator over `space`, restricted to `bounds`.
    ///
    /// The iterator starts unpositioned (invalid); call one of the seek
    /// methods before reading.
    ///
    /// # Errors
    ///
    /// Returns an error if the iterator cannot be created.
    fn iterator<C: KeyComparator>(
        &self,
        space: &Keyspace<C>,
        bounds: ReadBounds,
    ) -> StorageResult<Self::Iterator<'_, C>>;

    /// Commit the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Transaction`](super::StorageError::Transaction) if the commit fails.
    fn commit(self) -> StorageResult<()>;

    /// Roll the transaction back. Dropping an uncommitted transaction has
    /// the same effect.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to discard the transaction.
    fn rollback(self) -> StorageResult<()>;

    /// Whether this transaction rejects writes.
    fn is_read_only(&self) -> bool;
}

/// A bidirectional iterator over physical keys.
///
/// Movement never fails directly. When the engine reports a failure the
/// iterator becomes invalid and [`status`](Self::status) returns the error,
/// so callers must check `status()` whenever `is_valid()` turns false.
pub trait RawIterator {
    /// Position at the first key `>= target`, clamped to the lower bound.
    fn seek(&mut self, target: &[u8]);

    /// Position at the first key within bounds.
    fn seek_to_first(&mut self);

    /// Position at the last key within bounds.
    fn seek_to_last(&mut self);

    /// Step forward. An invalid iterator stays invalid.
    fn next(&mut self);

    /// Step backward. An invalid iterator stays invalid.
    fn prev(&mut self);

    /// Whether the iterator is positioned on an entry.
    fn is_valid(&self) -> bool;

    /// The latched failure, if any.
    ///
    /// # Errors
    ///
    /// Returns the error that invalidated the iterator.
    fn status(&self) -> StorageResult<()>;

    /// The key of the current entry.
    fn key(&self) -> Option<&[u8]>;

    /// The record of the current entry.
    fn value(&self) -> Option<&[u8]>;

    /// Release the iterator's resources. Calling it again has no effect, and
    /// a closed iterator is never valid.
    fn close(&mut self);
}

