//! Logical database and cursor tests against the redb backend.

use std::cmp::Ordering;

use graphkv_core::{
    CursorState, GotoResult, LogicalError, MultivaluedDatabase, Projection, RawBytes, ResultSet,
    SingleValuedDatabase, U64BigEndian, Utf8,
};
use graphkv_storage::backends::{RedbConfig, RedbEngine};
use graphkv_storage::{KeyComparator, Lexicographic, RawIterator, StorageEngine, Transaction};

type Multi = MultivaluedDatabase<Lexicographic, Lexicographic>;
type Single = SingleValuedDatabase<Lexicographic>;

/// Orders values by descending bytes.
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

fn engine() -> RedbEngine {
    RedbEngine::in_memory().expect("failed to create engine")
}

fn fill(engine: &RedbEngine, db: &Multi, pairs: &[(&str, &str)]) {
    let mut tx = engine.begin_write().expect("failed to begin write");
    for (key, value) in pairs {
        db.put(&mut tx, key.as_bytes(), value.as_bytes()).expect("failed to put");
    }
    tx.commit().expect("failed to commit");
}

fn assert_empty<I: RawIterator, P: Projection>(cursor: &mut ResultSet<I, P>) {
    assert_eq!(cursor.state(), CursorState::Empty);
    assert!(!cursor.has_next().expect("has_next"));
    assert!(!cursor.has_prev().expect("has_prev"));
    assert!(matches!(cursor.current(), Err(LogicalError::NoCurrentElement)));
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[test]
fn test_values_per_key_stay_in_their_range() {
    let engine = engine();
    let db = Multi::new("incidence", 0x02);
    fill(&engine, &db, &[("K1", "a"), ("K1", "b"), ("K1", "c"), ("K2", "x")]);

    let tx = engine.begin_read().expect("failed to begin read");

    let mut k1 = db.values_of(&tx, b"K1", Utf8).expect("failed to open cursor");
    assert_eq!(k1.remaining().expect("forward"), strings(&["a", "b", "c"]));

    let mut backward = Vec::new();
    k1.go_after_last().expect("failed to go after last");
    while k1.has_prev().expect("has_prev") {
        backward.push(k1.prev().expect("prev"));
    }
    assert_eq!(backward, strings(&["c", "b", "a"]));

    let mut k2 = db.values_of(&tx, b"K2", Utf8).expect("failed to open cursor");
    assert_eq!(k2.remaining().expect("forward"), strings(&["x"]));

    let mut all = db.scan(&tx).expect("failed to open scan");
    let entries = all.remaining().expect("scan");
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[3], (b"K2".to_vec(), b"x".to_vec()));
}

#[test]
fn test_remove_value_then_goto() {
    let engine = engine();
    let db = Multi::new("incidence", 0x02);
    fill(&engine, &db, &[("K1", "a"), ("K1", "b"), ("K1", "c"), ("K2", "x")]);

    let mut tx = engine.begin_write().expect("failed to begin write");
    assert_eq!(db.delete(&mut tx, b"K1", Some(b"b")).expect("failed to delete"), 1);
    assert_eq!(db.delete(&mut tx, b"K1", Some(b"b")).expect("failed to delete"), 0);
    tx.commit().expect("failed to commit");

    let tx = engine.begin_read().expect("failed to begin read");
    let mut cursor = db.values_of(&tx, b"K1", Utf8).expect("failed to open cursor");
    assert_eq!(cursor.remaining().expect("forward"), strings(&["a", "c"]));

    let b = "b".to_string();
    assert_eq!(cursor.go_to(&b, false).expect("go_to"), GotoResult::Close);
    assert_eq!(cursor.current().expect("current"), "c");

    assert_eq!(cursor.go_to(&b, true).expect("go_to"), GotoResult::Nothing);
    assert_eq!(cursor.current().expect("current"), "a");
    assert!(!cursor.has_prev().expect("has_prev"));
    assert_eq!(cursor.next().expect("next"), "c");
}

#[test]
fn test_goto_found_and_neighbours() {
    let engine = engine();
    let db = Multi::new("incidence", 0x02);
    fill(&engine, &db, &[("k", "a"), ("k", "c"), ("k", "e"), ("l", "b")]);

    let tx = engine.begin_read().expect("failed to begin read");
    let mut cursor = db.values_of(&tx, b"k", Utf8).expect("failed to open cursor");

    assert_eq!(cursor.go_to(&"c".to_string(), true).expect("go_to"), GotoResult::Found);
    assert_eq!(cursor.prev().expect("prev"), "a");
    assert_eq!(cursor.next().expect("next"), "c");
    assert_eq!(cursor.next().expect("next"), "e");
    assert!(!cursor.has_next().expect("has_next"));

    // Past the last value of "k": the cursor must not leak into "l".
    assert_eq!(cursor.go_to(&"f".to_string(), false).expect("go_to"), GotoResult::Nothing);
    assert_eq!(cursor.current().expect("current"), "a");
}

#[test]
fn test_empty_key_is_stable() {
    let engine = engine();
    let db = Multi::new("incidence", 0x02);
    fill(&engine, &db, &[("other", "v")]);

    let tx = engine.begin_read().expect("failed to begin read");
    let mut cursor = db.values_of(&tx, b"missing", RawBytes).expect("failed to open cursor");

    assert_empty(&mut cursor);
    cursor.go_after_last().expect("go_after_last");
    assert_empty(&mut cursor);
    assert_eq!(cursor.go_to(&b"v".to_vec(), false).expect("go_to"), GotoResult::Nothing);
    assert_empty(&mut cursor);
    cursor.go_before_first().expect("go_before_first");
    assert_empty(&mut cursor);
    assert_eq!(cursor.count().expect("count"), 0);
}

#[test]
fn test_close_is_idempotent() {
    let engine = engine();
    let db = Multi::new("incidence", 0x02);
    fill(&engine, &db, &[("k", "a"), ("k", "b")]);

    let tx = engine.begin_read().expect("failed to begin read");
    let mut first = db.values_of(&tx, b"k", Utf8).expect("failed to open cursor");
    let mut second = db.values_of(&tx, b"k", Utf8).expect("failed to open cursor");

    assert_eq!(first.next().expect("next"), "a");
    first.close();
    first.close();
    assert!(first.is_closed());
    assert!(matches!(first.has_next(), Err(LogicalError::Closed)));

    assert_eq!(second.remaining().expect("forward"), strings(&["a", "b"]));
}

#[test]
fn test_count_positions_on_first() {
    let engine = engine();
    let db = Multi::new("incidence", 0x02);
    fill(&engine, &db, &[("k", "a"), ("k", "b"), ("k", "c")]);

    let tx = engine.begin_read().expect("failed to begin read");
    let mut cursor = db.values_of(&tx, b"k", Utf8).expect("failed to open cursor");
    cursor.go_after_last().expect("go_after_last");

    assert_eq!(cursor.count().expect("count"), 3);
    assert_eq!(cursor.current().expect("current"), "a");
    assert_eq!(cursor.next().expect("next"), "b");
}

#[test]
fn test_custom_value_order() {
    let engine = engine();
    let db = MultivaluedDatabase::<Lexicographic, Descending>::new("reversed", 0x05);

    let mut tx = engine.begin_write().expect("failed to begin write");
    for value in ["a", "c", "b"] {
        db.put(&mut tx, b"k", value.as_bytes()).expect("failed to put");
    }
    tx.commit().expect("failed to commit");

    let tx = engine.begin_read().expect("failed to begin read");
    let mut cursor = db.values_of(&tx, b"k", Utf8).expect("failed to open cursor");
    assert_eq!(cursor.remaining().expect("forward"), strings(&["c", "b", "a"]));
    assert_eq!(db.first_value(&tx, b"k").expect("first value"), Some(b"c".to_vec()));
}

#[test]
fn test_numeric_values() {
    let engine = engine();
    let db = Multi::new("numbers", 0x06);

    let mut tx = engine.begin_write().expect("failed to begin write");
    for n in [300u64, 2, 70_000, 5] {
        db.put(&mut tx, b"k", &n.to_be_bytes()).expect("failed to put");
    }
    tx.commit().expect("failed to commit");

    let tx = engine.begin_read().expect("failed to begin read");
    let mut cursor = db.values_of(&tx, b"k", U64BigEndian).expect("failed to open cursor");
    assert_eq!(cursor.remaining().expect("forward"), vec![2, 5, 300, 70_000]);
}

#[test]
fn test_distinct_keys() {
    let engine = engine();
    let db = Multi::new("index", 0x07);
    fill(&engine, &db, &[("a", "1"), ("a", "2"), ("b", "1"), ("c", "1"), ("c", "2"), ("c", "3")]);

    let tx = engine.begin_read().expect("failed to begin read");
    let mut keys = db.keys(&tx, Utf8).expect("failed to open keys");
    assert!(keys.is_distinct());
    assert_eq!(keys.remaining().expect("forward"), strings(&["a", "b", "c"]));
    assert_eq!(keys.prev().expect("prev"), "b");
    assert_eq!(keys.prev().expect("prev"), "a");
    assert_eq!(keys.count().expect("count"), 3);

    let mut values = db.values(&tx, Utf8).expect("failed to open values");
    assert_eq!(values.count().expect("count"), 6);
}

#[test]
fn test_delete_whole_key() {
    let engine = engine();
    let db = Multi::new("incidence", 0x02);
    fill(&engine, &db, &[("k", "a"), ("k", "b"), ("k", "c"), ("l", "a")]);

    let mut tx = engine.begin_write().expect("failed to begin write");
    assert_eq!(db.delete(&mut tx, b"k", None).expect("failed to delete"), 3);
    tx.commit().expect("failed to commit");

    let tx = engine.begin_read().expect("failed to begin read");
    assert!(!db.contains(&tx, b"k", None).expect("contains"));
    assert!(db.contains(&tx, b"l", Some(b"a")).expect("contains"));
    assert!(!db.contains(&tx, b"l", Some(b"b")).expect("contains"));
}

#[test]
fn test_databases_share_keyspace_without_mixing() {
    let engine = engine();
    let left = Multi::new("left", 0x02);
    let right = Multi::new("right", 0x03);
    fill(&engine, &left, &[("k", "l1"), ("k", "l2")]);
    fill(&engine, &right, &[("k", "r1")]);

    let tx = engine.begin_read().expect("failed to begin read");
    let mut cursor = left.values_of(&tx, b"k", Utf8).expect("failed to open cursor");
    assert_eq!(cursor.remaining().expect("forward"), strings(&["l1", "l2"]));
    let mut scan = right.scan(&tx).expect("failed to open scan");
    assert_eq!(scan.count().expect("count"), 1);

    let mut tx = engine.begin_write().expect("failed to begin write");
    assert_eq!(left.clear(&mut tx).expect("failed to clear"), 2);
    tx.commit().expect("failed to commit");

    let tx = engine.begin_read().expect("failed to begin read");
    assert!(left.scan(&tx).expect("scan").is_empty());
    assert!(!right.scan(&tx).expect("scan").is_empty());
}

#[test]
fn test_single_valued_database() {
    let engine = engine();
    let db = Single::new("data", 0x01);

    let mut tx = engine.begin_write().expect("failed to begin write");
    db.put(&mut tx, b"h1", b"first").expect("failed to put");
    db.put(&mut tx, b"h1", b"second").expect("failed to put");
    db.put(&mut tx, b"h2", b"other").expect("failed to put");
    tx.commit().expect("failed to commit");

    let tx = engine.begin_read().expect("failed to begin read");
    assert_eq!(db.get(&tx, b"h1").expect("get"), Some(b"second".to_vec()));
    assert!(db.contains(&tx, b"h2", None).expect("contains"));
    assert!(matches!(db.contains(&tx, b"h2", Some(b"x")), Err(LogicalError::InvalidScope(_))));
    assert!(matches!(db.values_of(&tx, b"h1", RawBytes), Err(LogicalError::InvalidScope(_))));
    assert!(matches!(db.first_value(&tx, b"h1"), Err(LogicalError::InvalidScope(_))));

    let mut keys = db.keys(&tx, Utf8).expect("failed to open keys");
    assert!(!keys.is_distinct());
    assert_eq!(keys.remaining().expect("forward"), strings(&["h1", "h2"]));

    let mut records = db.values(&tx, Utf8).expect("failed to open values");
    assert_eq!(records.remaining().expect("forward"), strings(&["second", "other"]));
}

#[test]
fn test_multivalued_rejects_get_and_long_keys() {
    let engine = engine();
    let db = Multi::new("incidence", 0x02);

    let mut tx = engine.begin_write().expect("failed to begin write");
    let long_key = vec![b'k'; 256];
    assert!(matches!(
        db.put(&mut tx, &long_key, b"v"),
        Err(LogicalError::KeyTooLarge { len: 256, max: 255 })
    ));
    db.put(&mut tx, &long_key[..255], b"v").expect("failed to put");
    tx.commit().expect("failed to commit");

    let tx = engine.begin_read().expect("failed to begin read");
    assert!(matches!(db.get(&tx, b"k"), Err(LogicalError::InvalidScope(_))));
    assert_eq!(db.first_value(&tx, &long_key[..255]).expect("first value"), Some(b"v".to_vec()));
}

#[test]
fn test_range_bounds() {
    let engine = engine();
    let db = Multi::new("index", 0x07);
    fill(&engine, &db, &[("a", "1"), ("b", "2"), ("b", "3"), ("c", "4")]);

    let tx = engine.begin_read().expect("failed to begin read");
    let collect = |bounds| {
        let mut cursor = db.values_in(&tx, bounds, Utf8).expect("failed to open cursor");
        cursor.remaining().expect("forward")
    };

    assert_eq!(collect(db.bounds_below(b"b", false).expect("bounds")), strings(&["1"]));
    assert_eq!(collect(db.bounds_below(b"b", true).expect("bounds")), strings(&["1", "2", "3"]));
    assert_eq!(collect(db.bounds_above(b"b", false).expect("bounds")), strings(&["4"]));
    assert_eq!(collect(db.bounds_above(b"b", true).expect("bounds")), strings(&["2", "3", "4"]));
}

#[test]
fn test_cursor_sees_snapshot() {
    let engine = engine();
    let db = Multi::new("incidence", 0x02);
    fill(&engine, &db, &[("k", "a")]);

    let read = engine.begin_read().expect("failed to begin read");
    fill(&engine, &db, &[("k", "b")]);

    let mut cursor = db.cursor(&read, b"k").expect("failed to open cursor");
    assert_eq!(cursor.remaining().expect("forward"), vec![b"a".to_vec()]);
}

#[test]
fn test_single_valued_scan_with_custom_order() {
    let engine = engine();
    type Ranked = SingleValuedDatabase<Descending>;
    let db = Ranked::new("ranked", 0x05);
    // Neighbours share the keyspace, so their keys sit right at the bounds.
    let below = Ranked::new("below", 0x04);
    let above = Ranked::new("above", 0x06);

    let mut tx = engine.begin_write().expect("failed to begin write");
    for (key, value) in [("a", "1"), ("c", "3"), ("b", "2")] {
        db.put(&mut tx, key.as_bytes(), value.as_bytes()).expect("failed to put");
    }
    below.put(&mut tx, b"x", b"below").expect("failed to put");
    above.put(&mut tx, b"", b"above").expect("failed to put");
    tx.commit().expect("failed to commit");

    let tx = engine.begin_read().expect("failed to begin read");
    assert_eq!(db.get(&tx, b"a").expect("get"), Some(b"1".to_vec()));

    let mut keys = db.keys(&tx, Utf8).expect("failed to open keys");
    assert_eq!(keys.remaining().expect("forward"), strings(&["c", "b", "a"]));
    assert_eq!(keys.go_to(&"b".to_string(), true).expect("go_to"), GotoResult::Found);
    assert_eq!(keys.prev().expect("prev"), "c");
    assert_eq!(keys.go_to(&"bb".to_string(), false).expect("go_to"), GotoResult::Close);
    assert_eq!(keys.current().expect("current"), "b");
    assert_eq!(keys.count().expect("count"), 3);

    let mut values = db.values(&tx, Utf8).expect("failed to open values");
    assert_eq!(values.remaining().expect("forward"), strings(&["3", "2", "1"]));
    let mut entries = db.scan(&tx).expect("failed to open scan");
    assert_eq!(entries.count().expect("count"), 3);
    drop(entries);
    drop(values);
    drop(keys);
    drop(tx);

    // The empty key sorts first under any key order.
    let mut tx = engine.begin_write().expect("failed to begin write");
    db.put(&mut tx, b"", b"0").expect("failed to put");
    tx.commit().expect("failed to commit");

    let tx = engine.begin_read().expect("failed to begin read");
    let mut keys = db.keys(&tx, Utf8).expect("failed to open keys");
    assert_eq!(keys.remaining().expect("forward"), strings(&["", "c", "b", "a"]));
}

#[test]
fn test_cursor_walk_across_small_batches() {
    let engine = RedbEngine::in_memory_with_config(RedbConfig::new().iterator_batch_size(2))
        .expect("failed to create engine");
    let db = Multi::new("incidence", 0x02);
    let digits: Vec<String> = (0..10).map(|d| d.to_string()).collect();
    let mut pairs: Vec<(&str, &str)> = digits.iter().map(|d| ("k", d.as_str())).collect();
    pairs.extend([("a", "1"), ("a", "2"), ("a", "3"), ("m", "1"), ("z", "1"), ("z", "2")]);
    fill(&engine, &db, &pairs);

    let tx = engine.begin_read().expect("failed to begin read");
    let mut values = db.values_of(&tx, b"k", Utf8).expect("failed to open cursor");
    assert_eq!(values.next().expect("next"), "0");
    assert_eq!(values.next().expect("next"), "1");
    assert_eq!(values.next().expect("next"), "2");
    assert_eq!(values.prev().expect("prev"), "1");
    assert_eq!(values.go_to(&"5".to_string(), true).expect("go_to"), GotoResult::Found);
    assert_eq!(values.next().expect("next"), "6");
    assert_eq!(values.prev().expect("prev"), "5");
    assert_eq!(values.prev().expect("prev"), "4");
    assert_eq!(values.count().expect("count"), 10);
    assert_eq!(values.current().expect("current"), "0");
    assert_eq!(values.next().expect("next"), "1");
    assert_eq!(values.go_to(&"55".to_string(), false).expect("go_to"), GotoResult::Close);
    assert_eq!(values.current().expect("current"), "6");
    assert_eq!(values.prev().expect("prev"), "5");
    values.go_after_last().expect("failed to go after last");
    assert_eq!(values.prev().expect("prev"), "9");
    assert_eq!(values.prev().expect("prev"), "8");
    assert_eq!(values.next().expect("next"), "9");
    assert!(!values.has_next().expect("has_next"));

    let mut keys = db.keys(&tx, Utf8).expect("failed to open keys");
    assert!(keys.is_distinct());
    assert_eq!(keys.next().expect("next"), "a");
    assert_eq!(keys.next().expect("next"), "k");
    assert_eq!(keys.next().expect("next"), "m");
    assert_eq!(keys.prev().expect("prev"), "k");
    assert_eq!(keys.prev().expect("prev"), "a");
    assert_eq!(keys.go_to(&"l".to_string(), false).expect("go_to"), GotoResult::Close);
    assert_eq!(keys.current().expect("current"), "m");
    assert_eq!(keys.prev().expect("prev"), "k");
    assert_eq!(keys.count().expect("count"), 4);
    assert_eq!(keys.current().expect("current"), "a");
    keys.go_after_last().expect("failed to go after last");
    assert_eq!(keys.prev().expect("prev"), "z");
    assert_eq!(keys.prev().expect("prev"), "m");
    assert_eq!(keys.remaining().expect("forward"), strings(&["z"]));
}
