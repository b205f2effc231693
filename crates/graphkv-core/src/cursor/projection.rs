//! Projections from physical entries to the items a result set yields.

use std::fmt;

use crate::encoding::keys::{
    decode_key, decode_single, decode_value, encode, encode_single, first_bound,
};
use crate::encoding::ByteConverter;
use crate::error::{LogicalError, LogicalResult};

/// Maps physical entries to result set items and items back to seek keys.
pub trait Projection {
    /// The item yielded for each entry.
    type Item: Clone + PartialEq + fmt::Debug;

    /// Decode the item of the entry stored under `key` with `record`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is malformed or the converter rejects it.
    fn extract(&self, key: &[u8], record: &[u8]) -> LogicalResult<Self::Item>;

    /// The physical key to seek to when positioning on `item`.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::Unsupported`] if items cannot be located by
    /// seeking.
    fn seek_key(&self, item: &Self::Item) -> LogicalResult<Vec<u8>>;
}

/// The values stored under one logical key of a multivalued database.
#[derive(Debug, Clone)]
pub struct KeyValues<C> {
    prefix: u8,
    logical_key: Vec<u8>,
    converter: C,
}

impl<C: ByteConverter> KeyValues<C> {
    /// Project values of `logical_key` in the database with `prefix`.
    pub fn new(prefix: u8, logical_key: impl Into<Vec<u8>>, converter: C) -> Self {
        Self { prefix, logical_key: logical_key.into(), converter }
    }
}

impl<C: ByteConverter> Projection for KeyValues<C> {
    type Item = C::Item;

    fn extract(&self, key: &[u8], _record: &[u8]) -> LogicalResult<C::Item> {
        self.converter.from_bytes(decode_value(key)?)
    }

    fn seek_key(&self, item: &C::Item) -> LogicalResult<Vec<u8>> {
        encode(self.prefix, &self.logical_key, &self.converter.to_bytes(item)?)
    }
}

/// The logical keys of a database.
///
/// Over a multivalued database each key repeats once per value, so this
/// projection is meant for distinct result sets.
#[derive(Debug, Clone)]
pub struct DatabaseKeys<C> {
    prefix: u8,
    multivalued: bool,
    converter: C,
}

impl<C: ByteConverter> DatabaseKeys<C> {
    /// Project the keys of the database with `prefix`.
    pub const fn new(prefix: u8, multivalued: bool, converter: C) -> Self {
        Self { prefix, multivalued, converter }
    }
}

impl<C: ByteConverter> Projection for DatabaseKeys<C> {
    type Item = C::Item;

    fn extract(&self, key: &[u8], _record: &[u8]) -> LogicalResult<C::Item> {
        let logical_key = if self.multivalued { decode_key(key)? } else { decode_single(key)? };
        self.converter.from_bytes(logical_key)
    }

    fn seek_key(&self, item: &C::Item) -> LogicalResult<Vec<u8>> {
        let logical_key = self.converter.to_bytes(item)?;
        if self.multivalued {
            first_bound(self.prefix, &logical_key)
        } else {
            Ok(encode_single(self.prefix, &logical_key))
        }
    }
}

/// The values of a database across all of its keys.
///
/// Values are ordered by key first, so they cannot be located by seeking.
#[derive(Debug, Clone)]
pub struct DatabaseValues<C> {
    multivalued: bool,
    converter: C,
}

impl<C: ByteConverter> DatabaseValues<C> {
    /// Project the values of a database.
    pub const fn new(multivalued: bool, converter: C) -> Self {
        Self { multivalued, converter }
    }
}

impl<C: ByteConverter> Projection for DatabaseValues<C> {
    type Item = C::Item;

    fn extract(&self, key: &[u8], record: &[u8]) -> LogicalResult<C::Item> {
        if self.multivalued {
            self.converter.from_bytes(decode_value(key)?)
        } else {
            self.converter.from_bytes(record)
        }
    }

    fn seek_key(&self, _item: &C::Item) -> LogicalResult<Vec<u8>> {
        Err(LogicalError::Unsupported("positioning a scan over values of many keys".into()))
    }
}

/// Raw `(logical key, value)` pairs of a database.
#[derive(Debug, Clone, Copy)]
pub struct DatabaseEntries {
    prefix: u8,
    multivalued: bool,
}

impl DatabaseEntries {
    /// Project the entries of the database with `prefix`.
    #[must_use]
    pub const fn new(prefix: u8, multivalued: bool) -> Self {
        Self { prefix, multivalued }
    }
}

impl Projection for DatabaseEntries {
    type Item = (Vec<u8>, Vec<u8>);

    fn extract(&self, key: &[u8], record: &[u8]) -> LogicalResult<Self::Item> {
        if self.multivalued {
            Ok((decode_key(key)?.to_vec(), decode_value(key)?.to_vec()))
        } else {
            Ok((decode_single(key)?.to_vec(), record.to_vec()))
        }
    }

    fn seek_key(&self, item: &Self::Item) -> LogicalResult<Vec<u8>> {
        if self.multivalued {
            encode(self.prefix, &item.0, &item.1)
        } else {
            Ok(encode_single(self.prefix, &item.0))
        }
    }
}
