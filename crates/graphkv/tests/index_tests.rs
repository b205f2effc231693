//! Integration tests for sorted and bidirectional indexes.

use std::cmp::Ordering;

use graphkv::{
    GotoResult, GraphError, GraphResult, GraphStore, Handle, HandleConverter, Index,
    KeyComparator, Lexicographic, RecordCursor, Transaction, U64BigEndian, Utf8,
};
use graphkv_core::Projection;
use graphkv_storage::RawIterator;

/// Orders bytes from largest to smallest.
#[derive(Debug)]
struct Descending;

impl KeyComparator for Descending {
    fn name() -> String {
        "descending".to_string()
    }

    fn compare(left: &[u8], right: &[u8]) -> Ordering {
        right.cmp(left)
    }
}

fn store() -> GraphStore {
    GraphStore::in_memory().expect("failed to open store")
}

fn s(value: &str) -> String {
    value.to_string()
}

fn collect<I: RawIterator, P: Projection>(cursor: GraphResult<RecordCursor<I, P>>) -> Vec<P::Item> {
    cursor.expect("failed to open cursor").collect_remaining().expect("failed to read forward")
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| s(item)).collect()
}

/// An index of numbers to letters, filled with `entries`.
fn numbers(store: &GraphStore, entries: &[(u64, &str)]) -> Index<U64BigEndian, Utf8> {
    let index = store.create_index("numbers", 0x10, U64BigEndian, Utf8).expect("failed to create index");
    store
        .write(|tx| {
            for (key, value) in entries {
                index.add_entry(tx, key, &s(value))?;
            }
            Ok(())
        })
        .expect("failed to fill index");
    index
}

#[test]
fn test_find_and_counts() {
    let store = store();
    let index = numbers(&store, &[(2, "b"), (2, "a"), (2, "c"), (5, "x"), (9, "y"), (9, "y")]);

    let tx = store.begin_read().expect("failed to begin read");
    let mut found = index.find(&tx, &2).expect("failed to find");
    assert_eq!(found.collect_remaining().expect("forward"), strings(&["a", "b", "c"]));
    assert_eq!(found.go_to(&s("b"), true).expect("go_to"), GotoResult::Found);
    assert_eq!(found.next().expect("next"), "c");

    assert_eq!(index.find_first(&tx, &2).expect("first"), Some(s("a")));
    assert_eq!(index.find_last(&tx, &2).expect("last"), Some(s("c")));
    assert_eq!(index.find_first(&tx, &3).expect("first"), None);
    assert_eq!(index.find_last(&tx, &3).expect("last"), None);

    assert_eq!(index.count(&tx).expect("count"), 3);
    assert_eq!(index.count_entries(&tx).expect("count"), 5);
    assert_eq!(index.count_key(&tx, &2).expect("count"), 3);
    assert_eq!(index.count_key(&tx, &9).expect("count"), 1);
    assert_eq!(index.count_key(&tx, &4).expect("count"), 0);
    assert!(index.find(&tx, &4).expect("find").is_empty());
}

#[test]
fn test_remove_entries() {
    let store = store();
    let index = numbers(&store, &[(1, "a"), (1, "b"), (2, "c")]);

    store
        .write(|tx| {
            assert!(index.remove_entry(tx, &1, &s("a"))?);
            assert!(!index.remove_entry(tx, &1, &s("a"))?);
            assert!(!index.remove_entry(tx, &7, &s("a"))?);
            Ok(())
        })
        .expect("failed to write");

    let tx = store.begin_read().expect("failed to begin read");
    assert_eq!(index.count_key(&tx, &1).expect("count"), 1);
    drop(tx);

    let removed = store.write(|tx| index.remove_all_entries(tx, &1)).expect("failed to write");
    assert_eq!(removed, 1);
    assert_eq!(store.write(|tx| index.remove_all_entries(tx, &1)).expect("write"), 0);

    let tx = store.begin_read().expect("failed to begin read");
    assert_eq!(index.count(&tx).expect("count"), 1);
    assert_eq!(index.count_entries(&tx).expect("count"), 1);
    assert_eq!(index.find_first(&tx, &2).expect("first"), Some(s("c")));
}

#[test]
fn test_scan_keys_is_distinct_and_positionable() {
    let store = store();
    let index = numbers(&store, &[(10, "a"), (10, "b"), (20, "c"), (30, "d"), (30, "e")]);

    let tx = store.begin_read().expect("failed to begin read");
    let mut keys = index.scan_keys(&tx).expect("failed to scan");
    assert_eq!(keys.collect_remaining().expect("forward"), vec![10, 20, 30]);

    assert_eq!(keys.go_to(&20, true).expect("go_to"), GotoResult::Found);
    assert_eq!(keys.prev().expect("prev"), 10);
    assert_eq!(keys.go_to(&25, false).expect("go_to"), GotoResult::Close);
    assert_eq!(keys.current().expect("current"), 30);
    assert_eq!(keys.prev().expect("prev"), 20);
    assert_eq!(keys.go_to(&31, false).expect("go_to"), GotoResult::Nothing);
    assert_eq!(keys.current().expect("current"), 10);

    let mut values = index.scan_values(&tx).expect("failed to scan");
    assert_eq!(values.collect_remaining().expect("forward"), strings(&["a", "b", "c", "d", "e"]));
    assert!(matches!(values.go_to(&s("c"), true), Err(GraphError::Cursor(_))));
}

#[test]
fn test_range_queries() {
    let store = store();
    let index = numbers(&store, &[(2, "a"), (3, "b"), (3, "c"), (5, "d")]);
    let tx = store.begin_read().expect("failed to begin read");

    assert_eq!(collect(index.find_lt(&tx, &3)), strings(&["a"]));
    assert_eq!(collect(index.find_lte(&tx, &3)), strings(&["a", "b", "c"]));
    assert_eq!(collect(index.find_gt(&tx, &3)), strings(&["d"]));
    assert_eq!(collect(index.find_gte(&tx, &3)), strings(&["b", "c", "d"]));

    // Keys absent from the index still split the range.
    assert_eq!(collect(index.find_lte(&tx, &4)), strings(&["a", "b", "c"]));
    assert_eq!(collect(index.find_gt(&tx, &4)), strings(&["d"]));
    assert!(collect(index.find_lt(&tx, &2)).is_empty());
    assert!(collect(index.find_gt(&tx, &5)).is_empty());
}

#[test]
fn test_ranges_on_empty_index() {
    let store = store();
    let index = numbers(&store, &[]);
    let tx = store.begin_read().expect("failed to begin read");

    assert!(index.find_lte(&tx, &2).expect("range").is_empty());
    assert!(index.find_gte(&tx, &2).expect("range").is_empty());
    assert_eq!(index.count(&tx).expect("count"), 0);
    assert_eq!(index.count_entries(&tx).expect("count"), 0);
}

#[test]
fn test_custom_orders() {
    let store = store();
    let index = store
        .create_ordered_index::<Descending, Lexicographic, _, _>("ranked", 0x11, U64BigEndian, Utf8)
        .expect("failed to create index");

    store
        .write(|tx| {
            for (key, value) in [(1u64, "low"), (7, "high"), (4, "mid")] {
                index.add_entry(tx, &key, &s(value))?;
            }
            Ok(())
        })
        .expect("failed to write");

    let tx = store.begin_read().expect("failed to begin read");
    let mut keys = index.scan_keys(&tx).expect("failed to scan");
    assert_eq!(keys.collect_remaining().expect("forward"), vec![7, 4, 1]);

    // "Below" follows the installed order, so it means numerically greater.
    let mut below = index.find_lt(&tx, &4).expect("failed to open range");
    assert_eq!(below.collect_remaining().expect("forward"), strings(&["high"]));
}

#[test]
fn test_bidirectional_index() {
    let store = store();
    let index = store
        .create_bidirectional_index("types", 0x20, 0x21, Utf8, HandleConverter)
        .expect("failed to create index");

    store
        .write(|tx| {
            index.add_entry(tx, &s("person"), &Handle::new(1))?;
            index.add_entry(tx, &s("person"), &Handle::new(2))?;
            index.add_entry(tx, &s("robot"), &Handle::new(2))?;
            index.add_entry(tx, &s("robot"), &Handle::new(3))?;
            Ok(())
        })
        .expect("failed to write");

    let tx = store.begin_read().expect("failed to begin read");
    let mut owners = index.find_by_value(&tx, &Handle::new(2)).expect("failed to find");
    assert_eq!(owners.collect_remaining().expect("forward"), strings(&["person", "robot"]));
    assert_eq!(index.find_first_by_value(&tx, &Handle::new(3)).expect("first"), Some(s("robot")));
    assert_eq!(index.find_first_by_value(&tx, &Handle::new(9)).expect("first"), None);
    assert_eq!(index.count_keys(&tx, &Handle::new(2)).expect("count"), 2);
    assert_eq!(index.count(&tx).expect("count"), 2);
    drop(owners);
    drop(tx);

    store
        .write(|tx| {
            index.remove_entry(tx, &s("person"), &Handle::new(2))?;
            index.remove_all_entries(tx, &s("robot"))?;
            Ok(())
        })
        .expect("failed to write");

    let tx = store.begin_read().expect("failed to begin read");
    assert_eq!(index.count_keys(&tx, &Handle::new(2)).expect("count"), 0);
    assert_eq!(index.count_keys(&tx, &Handle::new(3)).expect("count"), 0);
    assert_eq!(index.find_first_by_value(&tx, &Handle::new(1)).expect("first"), Some(s("person")));
    assert_eq!(index.count_key(&tx, &s("person")).expect("count"), 1);
}

#[test]
fn test_prefix_and_name_conflicts() {
    let store = store();
    store.create_index("a", 0x10, Utf8, Utf8).expect("failed to create index");

    let err = store.create_index("b", 0x02, Utf8, Utf8).err().expect("prefix of incidence");
    assert!(matches!(err, GraphError::Catalog(_)));
    let err = store.create_index("a", 0x30, Utf8, Utf8).err().expect("name taken");
    assert!(matches!(err, GraphError::Catalog(_)));
    let err = store
        .create_bidirectional_index("c", 0x31, 0x31, Utf8, Utf8)
        .err()
        .expect("same prefix twice");
    assert!(matches!(err, GraphError::Catalog(_)));

    // A rejected bidirectional index registers nothing.
    store.create_index("c", 0x31, Utf8, Utf8).expect("prefix still free");

    let prefixes: Vec<u8> = store
        .databases()
        .expect("failed to list")
        .into_iter()
        .map(|info| info.prefix)
        .collect();
    assert_eq!(prefixes, vec![0x00, 0x01, 0x02, 0x10, 0x31]);
}

#[test]
fn test_oversized_keys_are_rejected() {
    let store = store();
    let index = store.create_index("names", 0x10, Utf8, Utf8).expect("failed to create index");

    let mut tx = store.begin_write().expect("failed to begin write");
    let err = index.add_entry(&mut tx, &"k".repeat(256), &s("v")).expect_err("too large");
    assert!(matches!(err, GraphError::Encoding(_)));
    index.add_entry(&mut tx, &"k".repeat(255), &s("v")).expect("failed to add");
    tx.commit().expect("failed to commit");
}

mod properties {
    use std::collections::{BTreeMap, BTreeSet};

    use proptest::prelude::*;

    use super::{numbers, store};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn scans_match_a_sorted_model(entries in prop::collection::vec((0u64..16, "[a-d]"), 0..40)) {
            let mut model: BTreeMap<u64, BTreeSet<String>> = BTreeMap::new();
            for (key, value) in &entries {
                model.entry(*key).or_default().insert(value.clone());
            }
            let pairs: Vec<(u64, &str)> = entries.iter().map(|(k, v)| (*k, v.as_str())).collect();

            let store = store();
            let index = numbers(&store, &pairs);
            let tx = store.begin_read().expect("failed to begin read");

            let keys = index.scan_keys(&tx).expect("scan").collect_remaining().expect("forward");
            prop_assert_eq!(keys, model.keys().copied().collect::<Vec<_>>());

            let values = index.scan_values(&tx).expect("scan").collect_remaining().expect("forward");
            let expected: Vec<String> = model.values().flat_map(|set| set.iter().cloned()).collect();
            prop_assert_eq!(values, expected);

            let total: usize = model.values().map(BTreeSet::len).sum();
            prop_assert_eq!(index.count_entries(&tx).expect("count"), total as u64);

            for (key, set) in &model {
                prop_assert_eq!(index.count_key(&tx, key).expect("count"), set.len() as u64);
            }
        }
    }
}
