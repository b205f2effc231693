//! Physical key encoding and ordering.
//!
//! - [`keys`] - The byte layout of physical keys and boundary keys
//! - [`order`] - Comparators installed into the engine for each layout
//! - [`converter`] - Conversions between application values and bytes
//!
//! # Example
//!
//! ```
//! use std::cmp::Ordering;
//!
//! use graphkv_core::encoding::keys::{decode_key, decode_value, encode, first_bound, last_bound};
//! use graphkv_core::encoding::order::MultivaluedOrder;
//! use graphkv_storage::KeyComparator;
//!
//! let key = encode(0x02, b"atom:1", b"link:7").unwrap();
//! assert_eq!(decode_key(&key).unwrap(), b"atom:1");
//! assert_eq!(decode_value(&key).unwrap(), b"link:7");
//!
//! let start = first_bound(0x02, b"atom:1").unwrap();
//! let end = last_bound(0x02, b"atom:1").unwrap();
//! assert_eq!(<MultivaluedOrder>::compare(&start, &key), Ordering::Less);
//! assert_eq!(<MultivaluedOrder>::compare(&end, &key), Ordering::Greater);
//! ```

pub mod converter;
pub mod keys;
pub mod order;


pub use converter::{ByteConverter, RawBytes, U64BigEndian, Utf8};
pub use keys::{
    decode_key, decode_single, decode_value, encode, encode_single, first_bound, last_bound,
    Marker, PhysicalKey, MAX_LOGICAL_KEY_LEN,
};
pub use order::{MultivaluedOrder, PhysicalOrder, SingleValuedOrder};
