//! Redb transaction implementation.
//!
//! This module provides the `RedbTransaction` type which implements the
//! `Transaction` trait for both read-only and read-write transactions.
//!
//! # Batched Iterators
//!
//! [`RedbIterator`] never materializes a whole keyspace. It loads entries in
//! batches (default 1000) and fetches the next batch in either direction on
//! demand, continuing from the edge of the current batch with an exclusive
//! bound.

use std::fmt;
use std::ops::Bound;

use redb::{ReadTransaction, ReadableTable, TableError, WriteTransaction};
use tracing::trace;

use crate::engine::{
    KeyComparator, KeyValue, Keyspace, RawIterator, ReadBounds, StorageError, StorageResult,
    Transaction,
};

use super::tables::{table_definition, OrderedKey, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

#[allow(clippy::large_enum_variant)]
enum Kind {
    Read(ReadTransaction),
    Write(WriteTransaction),
}

/// A transaction for the Redb storage engine.
///
/// Wraps either a read-only or a read-write Redb transaction. Iterators
/// opened from a write transaction observe that transaction's own writes.
pub struct RedbTransaction {
    kind: Kind,
    batch_size: usize,
}

impl RedbTransaction {
    /// Create a new read-only transaction.
    pub const fn new_read(tx: ReadTransaction, batch_size: usize) -> Self {
        Self { kind: Kind::Read(tx), batch_size }
    }

    /// Create a new read-write transaction.
    pub const fn new_write(tx: WriteTransaction, batch_size: usize) -> Self {
        Self { kind: Kind::Write(tx), batch_size }
    }

    /// Fetch up to `limit` entries of `space` within `(lower, upper)`.
    ///
    /// Entries are returned in ascending order. A backward fetch returns the
    /// `limit` entries closest to `upper`.
    fn fetch<C: KeyComparator>(
        &self,
        space: &Keyspace<C>,
        lower: Bound<&[u8]>,
        upper: Bound<&[u8]>,
        limit: usize,
        direction: Direction,
    ) -> StorageResult<Vec<KeyValue>> {
        if range_is_empty::<C>(lower, upper) {
            return Ok(Vec::new());
        }

        let definition = table_definition(space);
        match &self.kind {
            Kind::Read(tx) => match tx.open_table(definition) {
                Ok(table) => collect_range(&table, lower, upper, limit, direction),
                // No table yet means no entries.
                Err(TableError::TableDoesNotExist(_)) => Ok(Vec::new()),
                Err(e) => Err(table_error(e)),
            },
            Kind::Write(tx) => match tx.open_table(definition) {
                Ok(table) => collect_range(&table, lower, upper, limit, direction),
                Err(e) => Err(table_error(e)),
            },
        }
    }
}

impl Transaction for RedbTransaction {
    type Iterator<'a, C: KeyComparator>
        = RedbIterator<'a, C>
    where
        Self: 'a;

    fn get<C: KeyComparator>(
        &self,
        space: &Keyspace<C>,
        key: &[u8],
    ) -> StorageResult<Option<Vec<u8>>> {
        let definition = table_definition(space);
        match &self.kind {
            Kind::Read(tx) => match tx.open_table(definition) {
                Ok(table) => lookup(&table, key),
                Err(TableError::TableDoesNotExist(_)) => Ok(None),
                Err(e) => Err(table_error(e)),
            },
            Kind::Write(tx) => match tx.open_table(definition) {
                Ok(table) => lookup(&table, key),
                Err(e) => Err(table_error(e)),
            },
        }
    }

    fn put<C: KeyComparator>(
        &mut self,
        space: &Keyspace<C>,
        key: &[u8],
        value: &[u8],
    ) -> StorageResult<()> {
        match &self.kind {
            Kind::Read(_) => Err(StorageError::ReadOnly),
            Kind::Write(tx) => {
                let mut table = tx.open_table(table_definition(space)).map_err(table_error)?;
                table.insert(key, value).map_err(internal)?;
                Ok(())
            }
        }
    }

    fn delete<C: KeyComparator>(&mut self, space: &Keyspace<C>, key: &[u8]) -> StorageResult<bool> {
        match &self.kind {
            Kind::Read(_) => Err(StorageError::ReadOnly),
            Kind::Write(tx) => {
                let mut table = tx.open_table(table_definition(space)).map_err(table_error)?;
                let removed = table.remove(key).map_err(internal)?;
                Ok(removed.is_some())
            }
        }
    }

    fn iterator<C: KeyComparator>(
        &self,
        space: &Keyspace<C>,
        bounds: ReadBounds,
    ) -> StorageResult<Self::Iterator<'_, C>> {
        Ok(RedbIterator::new(self, space.clone(), bounds, self.batch_size))
    }

    fn commit(self) -> StorageResult<()> {
        match self.kind {
            Kind::Read(_) => Ok(()),
            Kind::Write(tx) => tx.commit().map_err(|e| StorageError::Transaction(e.to_string())),
        }
    }

    fn rollback(self) -> StorageResult<()> {
        match self.kind {
            Kind::Read(_) => Ok(()),
            Kind::Write(tx) => tx.abort().map_err(|e| StorageError::Transaction(e.to_string())),
        }
    }

    fn is_read_only(&self) -> bool {
        matches!(self.kind, Kind::Read(_))
    }
}

fn lookup<C, T>(table: &T, key: &[u8]) -> StorageResult<Option<Vec<u8>>>
where
    C: KeyComparator,
    T: ReadableTable<OrderedKey<C>, Record>,
{
    let value = table.get(key).map_err(internal)?;
    Ok(value.map(|guard| guard.value().to_vec()))
}

fn collect_range<C, T>(
    table: &T,
    lower: Bound<&[u8]>,
    upper: Bound<&[u8]>,
    limit: usize,
    direction: Direction,
) -> StorageResult<Vec<KeyValue>>
where
    C: KeyComparator,
    T: ReadableTable<OrderedKey<C>, Record>,
{
    let bounds: (Bound<&[u8]>, Bound<&[u8]>) = (lower, upper);
    let range = table.range::<&[u8]>(bounds).map_err(internal)?;
    let mut entries = Vec::with_capacity(limit.min(1024));

    match direction {
        Direction::Forward => {
            for item in range {
                if entries.len() >= limit {
                    break;
                }
                let (k, v) = item.map_err(internal)?;
                entries.push((k.value().to_vec(), v.value().to_vec()));
            }
        }
        Direction::Backward => {
            for item in range.rev() {
                if entries.len() >= limit {
                    break;
                }
                let (k, v) = item.map_err(internal)?;
                entries.push((k.value().to_vec(), v.value().to_vec()));
            }
            entries.reverse();
        }
    }

    Ok(entries)
}

/// Whether no key can satisfy both bounds under ordering `C`.
fn range_is_empty<C: KeyComparator>(lower: Bound<&[u8]>, upper: Bound<&[u8]>) -> bool {
    let (start, start_inclusive) = match lower {
        Bound::Included(k) => (k, true),
        Bound::Excluded(k) => (k, false),
        Bound::Unbounded => return false,
    };
    let (end, end_inclusive) = match upper {
        Bound::Included(k) => (k, true),
        Bound::Excluded(k) => (k, false),
        Bound::Unbounded => return false,
    };
    match C::compare(start, end) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Equal => !(start_inclusive && end_inclusive),
        std::cmp::Ordering::Less => false,
    }
}

fn table_error(e: TableError) -> StorageError {
    match e {
        TableError::TableTypeMismatch { .. } => StorageError::KeyspaceMismatch(e.to_string()),
        other => StorageError::Internal(other.to_string()),
    }
}

fn internal(e: impl fmt::Display) -> StorageError {
    StorageError::Internal(e.to_string())
}

fn lower_of(bounds: &ReadBounds) -> Bound<&[u8]> {
    bounds.lower.as_deref().map_or(Bound::Unbounded, Bound::Included)
}

fn upper_of(bounds: &ReadBounds) -> Bound<&[u8]> {
    bounds.upper.as_deref().map_or(Bound::Unbounded, Bound::Excluded)
}

/// A bounded, bidirectional iterator over one keyspace of a Redb transaction.
///
/// # Memory Guarantees
///
/// At any time the iterator holds at most `batch_size` entries.
pub struct RedbIterator<'a, C: KeyComparator> {
    /// Transaction used to fetch further batches.
    tx: &'a RedbTransaction,
    space: Keyspace<C>,
    bounds: ReadBounds,
    /// Current batch, ascending.
    batch: Vec<KeyValue>,
    /// Position within the current batch; `None` when invalid.
    position: Option<usize>,
    batch_size: usize,
    /// Whether entries may exist after the current batch.
    more_forward: bool,
    /// Whether entries may exist before the current batch.
    more_backward: bool,
    /// Latched engine failure.
    fault: Option<String>,
    closed: bool,
}

impl<'a, C: KeyComparator> RedbIterator<'a, C> {
    fn new(
        tx: &'a RedbTransaction,
        space: Keyspace<C>,
        bounds: ReadBounds,
        batch_size: usize,
    ) -> Self {
        Self {
            tx,
            space,
            bounds,
            batch: Vec::new(),
            position: None,
            batch_size: batch_size.max(1),
            more_forward: false,
            more_backward: false,
            fault: None,
            closed: false,
        }
    }

    /// Replace the batch after a positioning fetch.
    ///
    /// `more_behind` tells whether entries may exist on the side opposite to
    /// `direction`.
    fn install(
        &mut self,
        fetched: StorageResult<Vec<KeyValue>>,
        direction: Direction,
        more_behind: bool,
    ) {
        match fetched {
            Ok(batch) => {
                let full = batch.len() >= self.batch_size;
                match direction {
                    Direction::Forward => {
                        self.more_forward = full;
                        self.more_backward = more_behind;
                        self.position = if batch.is_empty() { None } else { Some(0) };
                    }
                    Direction::Backward => {
                        self.more_backward = full;
                        self.more_forward = more_behind;
                        self.position = batch.len().checked_sub(1);
                    }
                }
                self.batch = batch;
            }
            Err(e) => self.fail(&e),
        }
    }

    fn fail(&mut self, e: &StorageError) {
        self.fault = Some(e.to_string());
        self.batch.clear();
        self.position = None;
    }

    fn invalidate(&mut self) {
        self.batch.clear();
        self.position = None;
    }
}

impl<C: KeyComparator> RawIterator for RedbIterator<'_, C> {
    fn seek(&mut self, target: &[u8]) {
        if self.closed {
            return;
        }
        self.fault = None;

        let start = match self.bounds.lower.as_deref() {
            Some(lower) if C::compare(target, lower).is_lt() => lower,
            _ => target,
        };
        let fetched = self.tx.fetch(
            &self.space,
            Bound::Included(start),
            upper_of(&self.bounds),
            self.batch_size,
            Direction::Forward,
        );
        self.install(fetched, Direction::Forward, true);
    }

    fn seek_to_first(&mut self) {
        if self.closed {
            return;
        }
        self.fault = None;

        let fetched = self.tx.fetch(
            &self.space,
            lower_of(&self.bounds),
            upper_of(&self.bounds),
            self.batch_size,
            Direction::Forward,
        );
        self.install(fetched, Direction::Forward, false);
    }

    fn seek_to_last(&mut self) {
        if self.closed {
            return;
        }
        self.fault = None;

        let fetched = self.tx.fetch(
            &self.space,
            lower_of(&self.bounds),
            upper_of(&self.bounds),
            self.batch_size,
            Direction::Backward,
        );
        self.install(fetched, Direction::Backward, false);
    }

    fn next(&mut self) {
        let Some(pos) = self.position else {
            return;
        };

        if pos + 1 < self.batch.len() {
            self.position = Some(pos + 1);
            return;
        }
        if !self.more_forward {
            self.invalidate();
            return;
        }

        let fetched = match self.batch.last() {
            Some((after, _)) => self.tx.fetch(
                &self.space,
                Bound::Excluded(after.as_slice()),
                upper_of(&self.bounds),
                self.batch_size,
                Direction::Forward,
            ),
            None => Ok(Vec::new()),
        };

        match fetched {
            Ok(batch) if batch.is_empty() => {
                self.more_forward = false;
                self.invalidate();
            }
            Ok(batch) => {
                self.more_forward = batch.len() >= self.batch_size;
                self.more_backward = true;
                self.batch = batch;
                self.position = Some(0);
            }
            Err(e) => self.fail(&e),
        }
    }

    fn prev(&mut self) {
        let Some(pos) = self.position else {
            return;
        };

        if pos > 0 {
            self.position = Some(pos - 1);
            return;
        }
        if !self.more_backward {
            self.invalidate();
            return;
        }

        let fetched = match self.batch.first() {
            Some((before, _)) => self.tx.fetch(
                &self.space,
                lower_of(&self.bounds),
                Bound::Excluded(before.as_slice()),
                self.batch_size,
                Direction::Backward,
            ),
            None => Ok(Vec::new()),
        };

        match fetched {
            Ok(batch) if batch.is_empty() => {
                self.more_backward = false;
                self.invalidate();
            }
            Ok(batch) => {
                self.more_backward = batch.len() >= self.batch_size;
                self.more_forward = true;
                self.position = batch.len().checked_sub(1);
                self.batch = batch;
            }
            Err(e) => self.fail(&e),
        }
    }

    fn is_valid(&self) -> bool {
        self.key().is_some()
    }

    fn status(&self) -> StorageResult<()> {
        match &self.fault {
            Some(message) => Err(StorageError::Internal(message.clone())),
            None => Ok(()),
        }
    }

    fn key(&self) -> Option<&[u8]> {
        self.position.and_then(|pos| self.batch.get(pos)).map(|(k, _)| k.as_slice())
    }

    fn value(&self) -> Option<&[u8]> {
        self.position.and_then(|pos| self.batch.get(pos)).map(|(_, v)| v.as_slice())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.batch = Vec::new();
        self.position = None;
        trace!(keyspace = self.space.name(), "closed iterator");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Lexicographic;

    #[test]
    fn test_range_is_empty() {
        let a: &[u8] = b"a";
        let b: &[u8] = b"b";
        assert!(!range_is_empty::<Lexicographic>(Bound::Included(a), Bound::Excluded(b)));
        assert!(range_is_empty::<Lexicographic>(Bound::Included(b), Bound::Excluded(a)));
        assert!(range_is_empty::<Lexicographic>(Bound::Included(a), Bound::Excluded(a)));
        assert!(!range_is_empty::<Lexicographic>(Bound::Included(a), Bound::Included(a)));
        assert!(!range_is_empty::<Lexicographic>(Bound::Unbounded, Bound::Excluded(a)));
    }

    #[test]
    fn test_bounds_conversion() {
        let bounds = ReadBounds::between(b"a".to_vec(), b"z".to_vec());
        assert_eq!(lower_of(&bounds), Bound::Included(&b"a"[..]));
        assert_eq!(upper_of(&bounds), Bound::Excluded(&b"z"[..]));
        assert_eq!(lower_of(&ReadBounds::unbounded()), Bound::Unbounded);
    }
}
