//! Logical databases carved out of shared physical keyspaces.
//!
//! A [`LogicalDatabase`] is a named prefix inside the keyspace of its
//! ordering. Single-valued databases map each key to one record; multivalued
//! databases store every (key, value) pair as its own physical key and keep
//! the record empty.

use std::collections::BTreeMap;
use std::fmt;

use graphkv_storage::{Keyspace, Lexicographic, RawIterator, ReadBounds, Transaction};
use tracing::debug;

use crate::cursor::{DatabaseEntries, DatabaseKeys, DatabaseValues, KeyValues, ResultSet};
use crate::encoding::keys::{
    database_first_bound, database_last_bound, decode_value, encode, encode_single, first_bound,
    last_bound, single_upper_bound,
};
use crate::encoding::{ByteConverter, MultivaluedOrder, PhysicalOrder, RawBytes, SingleValuedOrder};
use crate::error::{LogicalError, LogicalResult};

/// A single-valued database with keys ordered by `K`.
pub type SingleValuedDatabase<K = Lexicographic> = LogicalDatabase<SingleValuedOrder<K>>;

/// A multivalued database with keys ordered by `K` and values by `V`.
pub type MultivaluedDatabase<K = Lexicographic, V = Lexicographic> =
    LogicalDatabase<MultivaluedOrder<K, V>>;

/// A named region of a physical keyspace.
///
/// Databases sharing an ordering share one keyspace; the prefix keeps their
/// keys apart.
pub struct LogicalDatabase<O: PhysicalOrder> {
    name: String,
    prefix: u8,
    multivalued: bool,
    keyspace: Keyspace<O>,
}

impl<O: PhysicalOrder> Clone for LogicalDatabase<O> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            prefix: self.prefix,
            multivalued: self.multivalued,
            keyspace: self.keyspace.clone(),
        }
    }
}

impl<O: PhysicalOrder> fmt::Debug for LogicalDatabase<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogicalDatabase")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("multivalued", &self.multivalued)
            .field("keyspace", &self.keyspace.name())
            .finish()
    }
}

impl<O: PhysicalOrder> LogicalDatabase<O> {
    /// Describe the database `name` occupying `prefix`.
    pub fn new(name: impl Into<String>, prefix: u8) -> Self {
        Self {
            name: name.into(),
            prefix,
            multivalued: O::MULTIVALUED,
            keyspace: Keyspace::new(O::name()),
        }
    }

    /// The database name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The prefix byte of every physical key of this database.
    #[must_use]
    pub const fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Whether a key may hold many values.
    #[must_use]
    pub const fn is_multivalued(&self) -> bool {
        self.multivalued
    }

    /// The physical keyspace holding this database.
    #[must_use]
    pub const fn keyspace(&self) -> &Keyspace<O> {
        &self.keyspace
    }

    /// Catalog entry describing this database.
    #[must_use]
    pub fn info(&self) -> DatabaseInfo {
        DatabaseInfo {
            name: self.name.clone(),
            prefix: self.prefix,
            multivalued: self.multivalued,
            keyspace: self.keyspace.name().to_string(),
        }
    }

    /// The physical key for `key`, and for `value` in a multivalued database.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::InvalidScope`] if a value is given to a
    /// single-valued database or omitted for a multivalued one, and
    /// [`LogicalError::KeyTooLarge`] if a multivalued key exceeds 255 bytes.
    pub fn scope_key(&self, key: &[u8], value: Option<&[u8]>) -> LogicalResult<Vec<u8>> {
        match (self.multivalued, value) {
            (true, Some(value)) => encode(self.prefix, key, value),
            (false, None) => Ok(encode_single(self.prefix, key)),
            (true, None) => Err(LogicalError::invalid_scope(format!(
                "multivalued database '{}' requires a value",
                self.name
            ))),
            (false, Some(_)) => Err(LogicalError::invalid_scope(format!(
                "single-valued database '{}' does not take a value",
                self.name
            ))),
        }
    }

    fn require_multivalued(&self, operation: &str) -> LogicalResult<()> {
        if self.multivalued {
            Ok(())
        } else {
            Err(LogicalError::invalid_scope(format!(
                "{operation} needs a multivalued database, '{}' is single-valued",
                self.name
            )))
        }
    }

    fn require_single_valued(&self, operation: &str) -> LogicalResult<()> {
        if self.multivalued {
            Err(LogicalError::invalid_scope(format!(
                "{operation} needs a single-valued database, '{}' is multivalued",
                self.name
            )))
        } else {
            Ok(())
        }
    }

    /// Bounds covering every value of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::InvalidScope`] on a single-valued database.
    pub fn key_bounds(&self, key: &[u8]) -> LogicalResult<ReadBounds> {
        self.require_multivalued("a per-key range")?;
        Ok(ReadBounds::between(first_bound(self.prefix, key)?, last_bound(self.prefix, key)?))
    }

    /// Bounds covering the whole database.
    #[must_use]
    pub fn database_bounds(&self) -> ReadBounds {
        if self.multivalued {
            ReadBounds::between(database_first_bound(self.prefix), database_last_bound(self.prefix))
        } else {
            ReadBounds {
                lower: Some(vec![self.prefix]),
                upper: single_upper_bound(self.prefix),
            }
        }
    }

    /// Bounds covering the values of keys below `key`, including `key`'s own
    /// values when `inclusive`.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::InvalidScope`] on a single-valued database.
    pub fn bounds_below(&self, key: &[u8], inclusive: bool) -> LogicalResult<ReadBounds> {
        self.require_multivalued("a key range")?;
        let upper = if inclusive { last_bound(self.prefix, key)? } else { first_bound(self.prefix, key)? };
        Ok(ReadBounds::between(database_first_bound(self.prefix), upper))
    }

    /// Bounds covering the values of keys above `key`, including `key`'s own
    /// values when `inclusive`.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::InvalidScope`] on a single-valued database.
    pub fn bounds_above(&self, key: &[u8], inclusive: bool) -> LogicalResult<ReadBounds> {
        self.require_multivalued("a key range")?;
        let lower = if inclusive { first_bound(self.prefix, key)? } else { last_bound(self.prefix, key)? };
        Ok(ReadBounds::between(lower, database_last_bound(self.prefix)))
    }

    /// Store a pair.
    ///
    /// In a single-valued database `value` becomes the record of `key`,
    /// replacing any previous one. In a multivalued database `value` is added
    /// to the values of `key`; adding it twice has no effect.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::KeyTooLarge`] for oversized multivalued keys
    /// and [`LogicalError::StorageFault`] if the write fails.
    pub fn put<T: Transaction>(&self, tx: &mut T, key: &[u8], value: &[u8]) -> LogicalResult<()> {
        if self.multivalued {
            tx.put(&self.keyspace, &encode(self.prefix, key, value)?, &[])?;
        } else {
            tx.put(&self.keyspace, &encode_single(self.prefix, key), value)?;
        }
        Ok(())
    }

    /// Remove `value` from `key`, or the whole key when `value` is `None`.
    ///
    /// Returns the number of physical entries removed.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::InvalidScope`] if a value is given to a
    /// single-valued database, and [`LogicalError::StorageFault`] if the
    /// engine fails.
    pub fn delete<T: Transaction>(
        &self,
        tx: &mut T,
        key: &[u8],
        value: Option<&[u8]>,
    ) -> LogicalResult<u64> {
        if self.multivalued && value.is_none() {
            let doomed = self.collect_keys(tx, self.key_bounds(key)?)?;
            let mut removed = 0;
            for physical in doomed {
                if tx.delete(&self.keyspace, &physical)? {
                    removed += 1;
                }
            }
            return Ok(removed);
        }

        let physical = self.scope_key(key, value)?;
        Ok(u64::from(tx.delete(&self.keyspace, &physical)?))
    }

    /// Remove every entry of this database.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::StorageFault`] if the engine fails.
    pub fn clear<T: Transaction>(&self, tx: &mut T) -> LogicalResult<u64> {
        let doomed = self.collect_keys(tx, self.database_bounds())?;
        let mut removed = 0;
        for physical in doomed {
            if tx.delete(&self.keyspace, &physical)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn collect_keys<T: Transaction>(&self, tx: &T, bounds: ReadBounds) -> LogicalResult<Vec<Vec<u8>>> {
        let mut iter = tx.iterator(&self.keyspace, bounds)?;
        let mut keys = Vec::new();
        iter.seek_to_first();
        while let Some(key) = iter.key() {
            keys.push(key.to_vec());
            iter.next();
        }
        iter.status()?;
        iter.close();
        Ok(keys)
    }

    /// The record of `key` in a single-valued database.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::InvalidScope`] on a multivalued database.
    pub fn get<T: Transaction>(&self, tx: &T, key: &[u8]) -> LogicalResult<Option<Vec<u8>>> {
        self.require_single_valued("get")?;
        Ok(tx.get(&self.keyspace, &encode_single(self.prefix, key))?)
    }

    /// The smallest value of `key` in a multivalued database.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::InvalidScope`] on a single-valued database.
    pub fn first_value<T: Transaction>(&self, tx: &T, key: &[u8]) -> LogicalResult<Option<Vec<u8>>> {
        let mut iter = tx.iterator(&self.keyspace, self.key_bounds(key)?)?;
        iter.seek_to_first();
        let first = match iter.key() {
            Some(physical) => Some(decode_value(physical)?.to_vec()),
            None => {
                iter.status()?;
                None
            }
        };
        iter.close();
        Ok(first)
    }

    /// Whether `key` exists, or holds `value` in a multivalued database.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::InvalidScope`] if a value is given to a
    /// single-valued database.
    pub fn contains<T: Transaction>(
        &self,
        tx: &T,
        key: &[u8],
        value: Option<&[u8]>,
    ) -> LogicalResult<bool> {
        if self.multivalued && value.is_none() {
            return Ok(self.first_value(tx, key)?.is_some());
        }
        let physical = self.scope_key(key, value)?;
        Ok(tx.get(&self.keyspace, &physical)?.is_some())
    }

    /// Open a cursor over the raw values of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::InvalidScope`] on a single-valued database.
    pub fn cursor<'t, T: Transaction>(
        &self,
        tx: &'t T,
        key: &[u8],
    ) -> LogicalResult<ResultSet<T::Iterator<'t, O>, KeyValues<RawBytes>>> {
        self.values_of(tx, key, RawBytes)
    }

    /// Open a cursor over the values of `key`, decoded with `converter`.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::InvalidScope`] on a single-valued database.
    pub fn values_of<'t, T: Transaction, C: ByteConverter>(
        &self,
        tx: &'t T,
        key: &[u8],
        converter: C,
    ) -> LogicalResult<ResultSet<T::Iterator<'t, O>, KeyValues<C>>> {
        let iter = tx.iterator(&self.keyspace, self.key_bounds(key)?)?;
        ResultSet::new(iter, KeyValues::new(self.prefix, key, converter))
    }

    /// Open a cursor over every `(key, value)` pair of the database.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::StorageFault`] if the iterator fails.
    pub fn scan<'t, T: Transaction>(
        &self,
        tx: &'t T,
    ) -> LogicalResult<ResultSet<T::Iterator<'t, O>, DatabaseEntries>> {
        let iter = tx.iterator(&self.keyspace, self.database_bounds())?;
        ResultSet::new(iter, DatabaseEntries::new(self.prefix, self.multivalued))
    }

    /// Open a cursor over the distinct keys of the database.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::StorageFault`] if the iterator fails.
    pub fn keys<'t, T: Transaction, C: ByteConverter>(
        &self,
        tx: &'t T,
        converter: C,
    ) -> LogicalResult<ResultSet<T::Iterator<'t, O>, DatabaseKeys<C>>> {
        let iter = tx.iterator(&self.keyspace, self.database_bounds())?;
        let projection = DatabaseKeys::new(self.prefix, self.multivalued, converter);
        if self.multivalued {
            ResultSet::distinct(iter, projection)
        } else {
            ResultSet::new(iter, projection)
        }
    }

    /// Open a cursor over every value of the database, in key order.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::StorageFault`] if the iterator fails.
    pub fn values<'t, T: Transaction, C: ByteConverter>(
        &self,
        tx: &'t T,
        converter: C,
    ) -> LogicalResult<ResultSet<T::Iterator<'t, O>, DatabaseValues<C>>> {
        self.values_in(tx, self.database_bounds(), converter)
    }

    /// Open a cursor over the values within `bounds`.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::StorageFault`] if the iterator fails.
    pub fn values_in<'t, T: Transaction, C: ByteConverter>(
        &self,
        tx: &'t T,
        bounds: ReadBounds,
        converter: C,
    ) -> LogicalResult<ResultSet<T::Iterator<'t, O>, DatabaseValues<C>>> {
        let iter = tx.iterator(&self.keyspace, bounds)?;
        ResultSet::new(iter, DatabaseValues::new(self.multivalued, converter))
    }
}

/// Description of a registered logical database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseInfo {
    /// Database name.
    pub name: String,
    /// Key prefix.
    pub prefix: u8,
    /// Whether keys hold many values.
    pub multivalued: bool,
    /// Name of the physical keyspace.
    pub keyspace: String,
}

/// Registry of the logical databases of one engine.
///
/// Prefixes are unique across the engine, whatever keyspace a database
/// lives in, and so are names.
#[derive(Debug, Default)]
pub struct Catalog {
    by_prefix: BTreeMap<u8, DatabaseInfo>,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `db`.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::DuplicatePrefix`] or
    /// [`LogicalError::DuplicateName`] if either is taken.
    pub fn register<O: PhysicalOrder>(&mut self, db: &LogicalDatabase<O>) -> LogicalResult<()> {
        self.insert(db.info())
    }

    /// Register the database described by `info`.
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register).
    pub fn insert(&mut self, info: DatabaseInfo) -> LogicalResult<()> {
        self.check(&info)?;
        debug!(name = %info.name, prefix = info.prefix, multivalued = info.multivalued, "registered logical database");
        self.by_prefix.insert(info.prefix, info);
        Ok(())
    }

    /// Check that `info` could be registered without registering it.
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register).
    pub fn check(&self, info: &DatabaseInfo) -> LogicalResult<()> {
        if let Some(existing) = self.by_prefix.get(&info.prefix) {
            return Err(LogicalError::DuplicatePrefix {
                prefix: info.prefix,
                existing: existing.name.clone(),
            });
        }
        if self.find(&info.name).is_some() {
            return Err(LogicalError::DuplicateName(info.name.clone()));
        }
        Ok(())
    }

    /// The database holding `prefix`.
    #[must_use]
    pub fn get(&self, prefix: u8) -> Option<&DatabaseInfo> {
        self.by_prefix.get(&prefix)
    }

    /// The database called `name`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&DatabaseInfo> {
        self.by_prefix.values().find(|info| info.name == name)
    }

    /// Registered databases in prefix order.
    pub fn iter(&self) -> impl Iterator<Item = &DatabaseInfo> {
        self.by_prefix.values()
    }

    /// Number of registered databases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_prefix.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_prefix.is_empty()
    }
}
