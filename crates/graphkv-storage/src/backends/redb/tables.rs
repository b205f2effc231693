//! Table definitions for the Redb backend.
//!
//! Every [`Keyspace`] maps to one redb table whose key type is
//! [`OrderedKey<C>`]. The key type forwards redb's comparisons to the
//! keyspace comparator, which is how a custom ordering gets installed into
//! the engine. redb records the key type name with the table, so reopening a
//! table with a different comparator fails with a type mismatch.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

use redb::{Key, TableDefinition, TypeName, Value};

use crate::engine::{KeyComparator, Keyspace};

/// Prefix of the type name recorded by redb for ordered keys.
pub const ORDERED_KEY_TYPE_PREFIX: &str = "graphkv::ordered";

/// A byte-string key ordered by the comparator `C`.
pub struct OrderedKey<C>(PhantomData<C>);

impl<C: KeyComparator> fmt::Debug for OrderedKey<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OrderedKey<{}>", C::name())
    }
}

impl<C: KeyComparator> Value for OrderedKey<C> {
    type SelfType<'a>
        = &'a [u8]
    where
        Self: 'a;
    type AsBytes<'a>
        = &'a [u8]
    where
        Self: 'a;

    fn fixed_width() -> Option<usize> {
        None
    }

    fn from_bytes<'a>(data: &'a [u8]) -> &'a [u8]
    where
        Self: 'a,
    {
        data
    }

    fn as_bytes<'a, 'b: 'a>(value: &'a &'b [u8]) -> &'a [u8]
    where
        Self: 'b,
    {
        value
    }

    fn type_name() -> TypeName {
        TypeName::new(&type_name_for::<C>())
    }
}

impl<C: KeyComparator> Key for OrderedKey<C> {
    fn compare(data1: &[u8], data2: &[u8]) -> Ordering {
        C::compare(data1, data2)
    }
}

/// The record type stored under every key.
pub type Record = &'static [u8];

/// The redb table backing `space`.
#[must_use]
pub fn table_definition<C: KeyComparator>(
    space: &Keyspace<C>,
) -> TableDefinition<'_, OrderedKey<C>, Record> {
    TableDefinition::new(space.name())
}

/// The key type name redb records for tables ordered by `C`.
#[must_use]
pub fn type_name_for<C: KeyComparator>() -> String {
    format!("{ORDERED_KEY_TYPE_PREFIX}<{}>", C::name())
}
