//! Persistent handles and the link record format.

use std::fmt;

use graphkv_core::{ByteConverter, LogicalError, LogicalResult};

use crate::error::{GraphError, GraphResult};

/// Number of bytes in an encoded handle.
pub const HANDLE_LEN: usize = 8;

/// Identifies an atom of the graph.
///
/// Handles are stored big-endian, so their byte order is their numeric
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(u64);

impl Handle {
    /// Create a handle from its numeric value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The numeric value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// The stored form of the handle.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; HANDLE_LEN] {
        self.0.to_be_bytes()
    }

    /// Read a handle from its stored form.
    ///
    /// Returns `None` unless `bytes` is exactly [`HANDLE_LEN`] long.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let array: [u8; HANDLE_LEN] = bytes.try_into().ok()?;
        Some(Self(u64::from_be_bytes(array)))
    }
}

impl From<u64> for Handle {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Converts handles for incidence sets and indexes.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandleConverter;

impl ByteConverter for HandleConverter {
    type Item = Handle;

    fn to_bytes(&self, item: &Handle) -> LogicalResult<Vec<u8>> {
        Ok(item.to_bytes().to_vec())
    }

    fn from_bytes(&self, bytes: &[u8]) -> LogicalResult<Handle> {
        Handle::from_bytes(bytes).ok_or_else(|| {
            LogicalError::Conversion(format!("expected {HANDLE_LEN} handle bytes, got {}", bytes.len()))
        })
    }
}

/// Encode the targets of a link as consecutive stored handles.
#[must_use]
pub fn encode_link(targets: &[Handle]) -> Vec<u8> {
    let mut record = Vec::with_capacity(targets.len() * HANDLE_LEN);
    for target in targets {
        record.extend_from_slice(&target.to_bytes());
    }
    record
}

/// Decode a link record.
///
/// # Errors
///
/// Returns [`GraphError::CorruptRecord`] if the record length is not a
/// multiple of [`HANDLE_LEN`].
pub fn decode_link(record: &[u8]) -> GraphResult<Vec<Handle>> {
    if record.len() % HANDLE_LEN != 0 {
        return Err(GraphError::corrupt(format!(
            "link record of {} bytes is not a whole number of handles",
            record.len()
        )));
    }
    Ok(record
        .chunks_exact(HANDLE_LEN)
        .filter_map(Handle::from_bytes)
        .collect())
}
