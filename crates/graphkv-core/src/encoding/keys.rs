//! Physical key layout for logical databases.
//!
//! All logical databases share one physical keyspace per ordering. The first
//! byte of every physical key is the owning database's prefix.
//!
//! # Multivalued Layout
//!
//! ```text
//! [prefix: u8][key length: u8][marker: u8][logical key][value]
//! ```
//!
//! The length tag splits the logical key from the value on decode, so values
//! may contain any bytes. The marker byte is reserved by the format:
//!
//! | byte   | marker          | role                                   |
//! |--------|-----------------|----------------------------------------|
//! | `0x00` | `Record`        | a stored (key, value) pair             |
//! | `0x01` | `KeyStart`      | sorts before every value of a key      |
//! | `0x02` | `KeyEnd`        | sorts after every value of a key       |
//! | `0x03` | `DatabaseStart` | sorts before every key of the database |
//! | `0x04` | `DatabaseEnd`   | sorts after every key of the database  |
//!
//! Boundary keys carry no value bytes and are never stored; they exist only
//! as iterator bounds. Since the marker precedes the value, no value encoding
//! can produce a boundary key.
//!
//! # Single-valued Layout
//!
//! ```text
//! [prefix: u8][logical key]
//! ```
//!
//! The record stored under the key is the value.
//!
//! This layout is the on-disk format; changing it requires a migration.

use crate::error::{LogicalError, LogicalResult};

/// Bytes taken by the prefix, length tag and marker.
pub const HEADER_LEN: usize = 3;

/// Longest logical key the one-byte length tag can describe.
pub const MAX_LOGICAL_KEY_LEN: usize = u8::MAX as usize;

/// Reserved marker byte of a multivalued physical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Marker {
    /// A stored (key, value) pair.
    Record = 0x00,
    /// Lower boundary of one logical key.
    KeyStart = 0x01,
    /// Upper boundary of one logical key.
    KeyEnd = 0x02,
    /// Lower boundary of a whole logical database.
    DatabaseStart = 0x03,
    /// Upper boundary of a whole logical database.
    DatabaseEnd = 0x04,
}

impl Marker {
    /// The byte written for this marker.
    #[inline]
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Parse a marker byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Record),
            0x01 => Some(Self::KeyStart),
            0x02 => Some(Self::KeyEnd),
            0x03 => Some(Self::DatabaseStart),
            0x04 => Some(Self::DatabaseEnd),
            _ => None,
        }
    }

    /// Whether this marker bounds a whole database.
    #[must_use]
    pub const fn is_database_boundary(self) -> bool {
        matches!(self, Self::DatabaseStart | Self::DatabaseEnd)
    }
}

/// A multivalued physical key split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalKey<'a> {
    /// Owning database prefix.
    pub prefix: u8,
    /// Record or boundary marker.
    pub marker: Marker,
    /// The logical key; empty for database boundaries.
    pub logical_key: &'a [u8],
    /// The value; empty for every boundary.
    pub value: &'a [u8],
}

impl<'a> PhysicalKey<'a> {
    /// Split a multivalued physical key.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::MalformedKey`] if the header is truncated, the
    /// marker byte is unknown, the length tag overruns the key, or a boundary
    /// key carries value bytes.
    pub fn parse(bytes: &'a [u8]) -> LogicalResult<Self> {
        let [prefix, len, marker, rest @ ..] = bytes else {
            return Err(LogicalError::malformed(format!(
                "expected at least {HEADER_LEN} header bytes, got {}",
                bytes.len()
            )));
        };
        let marker = Marker::from_byte(*marker)
            .ok_or_else(|| LogicalError::malformed(format!("unknown marker {marker:#04x}")))?;
        let len = usize::from(*len);
        if rest.len() < len {
            return Err(LogicalError::malformed(format!(
                "length tag {len} overruns {} remaining bytes",
                rest.len()
            )));
        }
        let (logical_key, value) = rest.split_at(len);
        if marker != Marker::Record && !value.is_empty() {
            return Err(LogicalError::malformed("boundary key carries value bytes"));
        }
        Ok(Self { prefix: *prefix, marker, logical_key, value })
    }

    /// Whether this key is a stored record rather than a boundary.
    #[must_use]
    pub fn is_record(&self) -> bool {
        self.marker == Marker::Record
    }
}

fn check_len(logical_key: &[u8]) -> LogicalResult<u8> {
    u8::try_from(logical_key.len()).map_err(|_| LogicalError::KeyTooLarge {
        len: logical_key.len(),
        max: MAX_LOGICAL_KEY_LEN,
    })
}

fn assemble(prefix: u8, marker: Marker, logical_key: &[u8], value: &[u8]) -> LogicalResult<Vec<u8>> {
    let len = check_len(logical_key)?;
    let mut key = Vec::with_capacity(HEADER_LEN + logical_key.len() + value.len());
    key.push(prefix);
    key.push(len);
    key.push(marker.as_byte());
    key.extend_from_slice(logical_key);
    key.extend_from_slice(value);
    Ok(key)
}

/// Encode a (logical key, value) pair of a multivalued database.
///
/// # Errors
///
/// Returns [`LogicalError::KeyTooLarge`] if the key exceeds 255 bytes.
#[inline]
pub fn encode(prefix: u8, logical_key: &[u8], value: &[u8]) -> LogicalResult<Vec<u8>> {
    assemble(prefix, Marker::Record, logical_key, value)
}

/// Extract the logical key of a multivalued physical key.
///
/// # Errors
///
/// Returns [`LogicalError::MalformedKey`] if the key cannot be parsed.
pub fn decode_key(physical: &[u8]) -> LogicalResult<&[u8]> {
    PhysicalKey::parse(physical).map(|parts| parts.logical_key)
}

/// Extract the value of a multivalued physical key.
///
/// # Errors
///
/// Returns [`LogicalError::MalformedKey`] if the key cannot be parsed or is a
/// boundary key.
pub fn decode_value(physical: &[u8]) -> LogicalResult<&[u8]> {
    let parts = PhysicalKey::parse(physical)?;
    if !parts.is_record() {
        return Err(LogicalError::malformed(format!(
            "{:?} boundary has no value",
            parts.marker
        )));
    }
    Ok(parts.value)
}

/// The boundary sorting before every value of `logical_key`.
///
/// # Errors
///
/// Returns [`LogicalError::KeyTooLarge`] if the key exceeds 255 bytes.
#[inline]
pub fn first_bound(prefix: u8, logical_key: &[u8]) -> LogicalResult<Vec<u8>> {
    assemble(prefix, Marker::KeyStart, logical_key, &[])
}

/// The boundary sorting after every value of `logical_key`.
///
/// # Errors
///
/// Returns [`LogicalError::KeyTooLarge`] if the key exceeds 255 bytes.
#[inline]
pub fn last_bound(prefix: u8, logical_key: &[u8]) -> LogicalResult<Vec<u8>> {
    assemble(prefix, Marker::KeyEnd, logical_key, &[])
}

/// The boundary sorting before every key of the database with `prefix`.
#[must_use]
pub fn database_first_bound(prefix: u8) -> Vec<u8> {
    vec![prefix, 0, Marker::DatabaseStart.as_byte()]
}

/// The boundary sorting after every key of the database with `prefix`.
#[must_use]
pub fn database_last_bound(prefix: u8) -> Vec<u8> {
    vec![prefix, 0, Marker::DatabaseEnd.as_byte()]
}

/// Encode a key of a single-valued database.
#[inline]
#[must_use]
pub fn encode_single(prefix: u8, logical_key: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + logical_key.len());
    key.push(prefix);
    key.extend_from_slice(logical_key);
    key
}

/// Extract the logical key of a single-valued physical key.
///
/// # Errors
///
/// Returns [`LogicalError::MalformedKey`] if the key is empty.
pub fn decode_single(physical: &[u8]) -> LogicalResult<&[u8]> {
    match physical.split_first() {
        Some((_, logical_key)) => Ok(logical_key),
        None => Err(LogicalError::malformed("empty single-valued key")),
    }
}

/// The exclusive upper bound of a single-valued database, if one exists.
///
/// Returns `None` for prefix `0xFF`, whose keys run to the end of the
/// keyspace.
#[must_use]
pub fn single_upper_bound(prefix: u8) -> Option<Vec<u8>> {
    prefix.checked_add(1).map(|next| vec![next])
}
