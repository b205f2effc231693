//! Orderings installed into the engine for logical databases.
//!
//! [`MultivaluedOrder`] ranks physical keys by prefix, then logical key, then
//! value, with boundary markers placed around the real entries. This is what
//! lets the engine's own bounded iteration restrict a scan to one logical key
//! or one logical database.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

use graphkv_storage::{KeyComparator, Lexicographic};

use super::keys::{Marker, PhysicalKey};

/// A key ordering for one physical layout.
pub trait PhysicalOrder: KeyComparator {
    /// Whether keys under this ordering use the multivalued layout.
    const MULTIVALUED: bool;
}

/// Ordering for single-valued databases: prefix byte, then the logical key
/// compared with `K`.
///
/// The bare prefix, which is also the lower bound of a database scan, sorts
/// before every other key of its prefix whatever `K` says about empty keys.
pub struct SingleValuedOrder<K = Lexicographic>(PhantomData<fn() -> K>);

impl<K: KeyComparator> fmt::Debug for SingleValuedOrder<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&<Self as KeyComparator>::name())
    }
}

impl<K: KeyComparator> KeyComparator for SingleValuedOrder<K> {
    fn name() -> String {
        format!("single-valued({})", K::name())
    }

    fn compare(left: &[u8], right: &[u8]) -> Ordering {
        match (left.split_first(), right.split_first()) {
            (Some((lp, lk)), Some((rp, rk))) => {
                lp.cmp(rp).then_with(|| match (lk.is_empty(), rk.is_empty()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    (false, false) => K::compare(lk, rk),
                })
            }
            _ => left.len().cmp(&right.len()),
        }
    }
}

impl<K: KeyComparator> PhysicalOrder for SingleValuedOrder<K> {
    const MULTIVALUED: bool = false;
}

/// Ordering for multivalued databases.
///
/// Keys compare by:
///
/// 1. prefix byte;
/// 2. database boundaries, which sort before or after everything else of
///    their prefix;
/// 3. logical key, using `K`;
/// 4. key boundaries: `KeyStart` before every value, `KeyEnd` after;
/// 5. value, using `V`.
///
/// Keys that do not parse fall back to raw byte order. The codec never
/// produces such keys.
pub struct MultivaluedOrder<K = Lexicographic, V = Lexicographic>(PhantomData<fn() -> (K, V)>);

impl<K: KeyComparator, V: KeyComparator> fmt::Debug for MultivaluedOrder<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&<Self as KeyComparator>::name())
    }
}

impl<K: KeyComparator, V: KeyComparator> KeyComparator for MultivaluedOrder<K, V> {
    fn name() -> String {
        format!("multivalued({},{})", K::name(), V::name())
    }

    fn compare(left: &[u8], right: &[u8]) -> Ordering {
        match (PhysicalKey::parse(left), PhysicalKey::parse(right)) {
            (Ok(l), Ok(r)) => compare_parts::<K, V>(&l, &r),
            // Mixing parsed and unparsed keys is not transitive. The codec
            // only writes parseable keys into a multivalued keyspace.
            _ => left.cmp(right),
        }
    }
}

impl<K: KeyComparator, V: KeyComparator> PhysicalOrder for MultivaluedOrder<K, V> {
    const MULTIVALUED: bool = true;
}

fn compare_parts<K: KeyComparator, V: KeyComparator>(
    left: &PhysicalKey<'_>,
    right: &PhysicalKey<'_>,
) -> Ordering {
    left.prefix.cmp(&right.prefix).then_with(|| {
        use Marker::{DatabaseEnd, DatabaseStart, KeyEnd, KeyStart};

        match (left.marker, right.marker) {
            (DatabaseStart, DatabaseStart) | (DatabaseEnd, DatabaseEnd) => Ordering::Equal,
            (DatabaseStart, _) | (_, DatabaseEnd) => Ordering::Less,
            (DatabaseEnd, _) | (_, DatabaseStart) => Ordering::Greater,
            (l_marker, r_marker) => {
                K::compare(left.logical_key, right.logical_key).then_with(|| {
                    match (l_marker, r_marker) {
                        (KeyStart, KeyStart) | (KeyEnd, KeyEnd) => Ordering::Equal,
                        (KeyStart, _) | (_, KeyEnd) => Ordering::Less,
                        (KeyEnd, _) | (_, KeyStart) => Ordering::Greater,
                        _ => V::compare(left.value, right.value),
                    }
                })
            }
        }
    })
}
