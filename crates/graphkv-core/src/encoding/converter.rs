//! Pluggable conversions between application values and stored bytes.

use std::fmt;

use crate::error::{LogicalError, LogicalResult};

/// Converts application values to and from the bytes stored in keys.
///
/// Converters used for keys or values of a multivalued database must be
/// consistent with that database's comparator: the byte order of encoded
/// items is the order result sets present them in.
pub trait ByteConverter: Clone + Send + Sync {
    /// The application-level type.
    type Item: Clone + PartialEq + fmt::Debug;

    /// Encode an item.
    ///
    /// # Errors
    ///
    /// Returns an error if the item cannot be represented.
    fn to_bytes(&self, item: &Self::Item) -> LogicalResult<Vec<u8>>;

    /// Decode an item.
    ///
    /// # Errors
    ///
    /// Returns [`LogicalError::Conversion`] if the bytes are not a valid item.
    fn from_bytes(&self, bytes: &[u8]) -> LogicalResult<Self::Item>;
}

/// Identity conversion.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawBytes;

impl ByteConverter for RawBytes {
    type Item = Vec<u8>;

    fn to_bytes(&self, item: &Vec<u8>) -> LogicalResult<Vec<u8>> {
        Ok(item.clone())
    }

    fn from_bytes(&self, bytes: &[u8]) -> LogicalResult<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}

/// UTF-8 strings, ordered byte-wise.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8;

impl ByteConverter for Utf8 {
    type Item = String;

    fn to_bytes(&self, item: &String) -> LogicalResult<Vec<u8>> {
        Ok(item.as_bytes().to_vec())
    }

    fn from_bytes(&self, bytes: &[u8]) -> LogicalResult<String> {
        String::from_utf8(bytes.to_vec()).map_err(|e| LogicalError::Conversion(e.to_string()))
    }
}

/// Unsigned 64-bit integers in big-endian order, so byte order matches
/// numeric order.
#[derive(Debug, Clone, Copy, Default)]
pub struct U64BigEndian;

impl ByteConverter for U64BigEndian {
    type Item = u64;

    fn to_bytes(&self, item: &u64) -> LogicalResult<Vec<u8>> {
        Ok(item.to_be_bytes().to_vec())
    }

    fn from_bytes(&self, bytes: &[u8]) -> LogicalResult<u64> {
        let array: [u8; 8] = bytes.try_into().map_err(|_| {
            LogicalError::Conversion(format!("expected 8 bytes, got {}", bytes.len()))
        })?;
        Ok(u64::from_be_bytes(array))
    }
}
