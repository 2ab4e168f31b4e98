use std::{sync::Arc, thread};

use stripemap::{HashMap, SequenceComparator};

const NUM_THREADS: u64 = 8;
const KEYS_PER_THREAD: u64 = 1000;

#[test]
fn concurrent_writers_on_disjoint_keys_lose_nothing() {
    let map = Arc::new(HashMap::new());

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|t| {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                for i in 0..KEYS_PER_THREAD {
                    let key = t * KEYS_PER_THREAD + i;
                    assert_eq!(map.insert(key, key + 1), 0);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    for key in 0..NUM_THREADS * KEYS_PER_THREAD {
        assert_eq!(map.get(&key), key + 1, "missing or corrupt key {key}");
    }
}

#[test]
fn concurrent_removes_evict_exactly_their_keys() {
    let map = Arc::new(HashMap::new());

    for key in 0..NUM_THREADS * KEYS_PER_THREAD {
        map.insert(key, key + 1);
    }

    // Each thread removes its own range; removals return the stored values.
    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|t| {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                for i in 0..KEYS_PER_THREAD / 2 {
                    let key = t * KEYS_PER_THREAD + i;
                    assert_eq!(map.remove(&key), key + 1);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    for t in 0..NUM_THREADS {
        for i in 0..KEYS_PER_THREAD {
            let key = t * KEYS_PER_THREAD + i;
            if i < KEYS_PER_THREAD / 2 {
                assert!(!map.contains_key(&key));
            } else {
                assert_eq!(map.get(&key), key + 1);
            }
        }
    }
}

#[test]
fn racing_writers_on_one_key_leave_one_entry() {
    // A single bucket serializes every operation; the final value must be
    // one of the raced writes, in full.
    let map = Arc::new(HashMap::<&str, (u64, u64)>::with_num_buckets(1));

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|t| {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                for _ in 0..200 {
                    map.insert("contended", (t, t * 2));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(map.contains_key(&"contended"));
    let (a, b) = map.get(&"contended");
    assert_eq!(b, a * 2, "torn write observed");
}

#[test]
fn readers_observe_complete_values_mid_write() {
    let map = Arc::new(HashMap::<u64, String>::new());

    let writers: Vec<_> = (0..4u64)
        .map(|t| {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                for i in 0..500 {
                    let key = t * 500 + i;
                    map.insert(key, format!("value-{key}"));
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                for key in 0..2000u64 {
                    let value = map.get(&key);
                    // Either absent (default) or fully written, never torn.
                    assert!(
                        value.is_empty() || value == format!("value-{key}"),
                        "unexpected value {value:?} for key {key}"
                    );
                    thread::yield_now();
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    for key in 0..2000u64 {
        assert_eq!(map.get(&key), format!("value-{key}"));
    }
}

#[test]
fn clear_racing_with_inserts_keeps_the_map_consistent() {
    let map = Arc::new(HashMap::<u64, u64>::with_num_buckets(8));

    let writers: Vec<_> = (0..4u64)
        .map(|t| {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                for i in 0..1000 {
                    map.insert(t * 1000 + i, i);
                }
            })
        })
        .collect();

    // Bucket-wise clears interleaved with the inserts. Entries may survive a
    // racing clear; none may be corrupted.
    for _ in 0..10 {
        map.clear();
        thread::yield_now();
    }

    for handle in writers {
        handle.join().unwrap();
    }

    for key in 0..4000u64 {
        if map.contains_key(&key) {
            assert_eq!(map.get(&key), key % 1000);
        }
    }

    // With no writers left, a clear is complete.
    map.clear();
    for key in 0..4000u64 {
        assert!(!map.contains_key(&key));
    }
}

#[test]
fn sequence_keys_unify_absent_and_empty_across_threads() {
    let map = Arc::new(HashMap::<Option<Vec<u8>>, u64, _>::with_comparator(
        SequenceComparator::new(),
    ));

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|t| {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                let key = if t % 2 == 0 { None } else { Some(Vec::new()) };
                for _ in 0..100 {
                    map.insert(key.clone(), t);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // Both spellings of the key resolve to the same single entry.
    let via_none = map.get(&None);
    let via_empty = map.get(&Some(Vec::new()));
    assert_eq!(via_none, via_empty);
    assert!(map.contains_key(&None));

    assert_eq!(map.remove(&Some(Vec::new())), via_none);
    assert!(!map.contains_key(&None));
}

#[test]
fn collected_pairs_are_readable_from_any_thread() {
    let map: Arc<HashMap<u64, u64>> = Arc::new((0..100).map(|i| (i, i * i)).collect());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                for i in 0..100 {
                    assert_eq!(map.get(&i), i * i);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
