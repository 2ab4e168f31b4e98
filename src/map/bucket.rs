//! The unit of lock granularity: a mutex-guarded, unordered run of entries
//! sharing a hash range.

use std::mem;

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::comparator::KeyComparator;

/// A key-value pair plus the cached hash of the key.
///
/// The hash is computed once, outside the bucket lock, and carried with the
/// entry so that scans can reject non-matching entries with an integer
/// compare before invoking the comparator's equality predicate.
pub(crate) struct Entry<K, V> {
    pub(crate) hash: u64,
    pub(crate) key: K,
    pub(crate) value: V,
}

/// One stripe of the map: an exclusively-locked sequence of entries.
///
/// Entries within a bucket are unordered and may be reordered freely;
/// removal swaps the removed slot with the last entry and truncates. All
/// access to the sequence happens with the lock held. The lock is a
/// `parking_lot::Mutex`, which does not poison, so a panic raised by a key
/// comparator mid-scan releases the lock and leaves the bucket usable.
pub(crate) struct Bucket<K, V> {
    entries: Mutex<SmallVec<[Entry<K, V>; 4]>>,
}

impl<K, V> Default for Bucket<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(SmallVec::new()),
        }
    }
}

impl<K, V> Bucket<K, V> {
    /// Inserts `key`/`value`, returning the previous value if the key was
    /// already present.
    ///
    /// On a match the value is overwritten in place and the stored key is
    /// kept; on a miss a new entry is appended. A comparator panic during
    /// the scan commits no mutation.
    pub(crate) fn insert<C>(&self, hash: u64, key: K, value: V, comparator: &C) -> Option<V>
    where
        C: KeyComparator<K>,
    {
        let mut entries = self.entries.lock();

        #[cfg(feature = "logging")]
        let _guard = ComparatorPanicGuard { op: "insert" };

        match find_index(&entries, hash, &key, comparator) {
            Some(i) => Some(mem::replace(&mut entries[i].value, value)),
            None => {
                entries.push(Entry { hash, key, value });
                None
            }
        }
    }

    /// Removes the entry for `key`, returning its value if it was present.
    pub(crate) fn remove<C>(&self, hash: u64, key: &K, comparator: &C) -> Option<V>
    where
        C: KeyComparator<K>,
    {
        let mut entries = self.entries.lock();

        #[cfg(feature = "logging")]
        let _guard = ComparatorPanicGuard { op: "remove" };

        find_index(&entries, hash, key, comparator).map(|i| entries.swap_remove(i).value)
    }

    /// Returns a clone of the value for `key`, if present.
    pub(crate) fn get<C>(&self, hash: u64, key: &K, comparator: &C) -> Option<V>
    where
        C: KeyComparator<K>,
        V: Clone,
    {
        let entries = self.entries.lock();

        #[cfg(feature = "logging")]
        let _guard = ComparatorPanicGuard { op: "get" };

        find_index(&entries, hash, key, comparator).map(|i| entries[i].value.clone())
    }

    /// Returns `true` if an entry for `key` is present.
    pub(crate) fn contains<C>(&self, hash: u64, key: &K, comparator: &C) -> bool
    where
        C: KeyComparator<K>,
    {
        let entries = self.entries.lock();

        #[cfg(feature = "logging")]
        let _guard = ComparatorPanicGuard { op: "contains_key" };

        find_index(&entries, hash, key, comparator).is_some()
    }

    /// Drops every entry in this bucket.
    pub(crate) fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Invokes `visit` for every entry, in storage order, with the lock
    /// held.
    ///
    /// Only used for whole-map enumeration (the `Debug` rendering). The
    /// callback runs inside the critical section, so it must be short and
    /// must not touch the map.
    pub(crate) fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&K, &V),
    {
        let entries = self.entries.lock();

        for entry in entries.iter() {
            visit(&entry.key, &entry.value);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// Scans `entries` for `key`, comparing the cached hash first and invoking
/// the comparator only on a hash match.
fn find_index<K, V, C>(entries: &[Entry<K, V>], hash: u64, key: &K, comparator: &C) -> Option<usize>
where
    C: KeyComparator<K>,
{
    entries
        .iter()
        .position(|entry| entry.hash == hash && comparator.eq(&entry.key, key))
}

/// Logs a comparator panic on the way out of a bucket critical section.
///
/// The panic itself is propagated untouched; the mutex is released by the
/// normal unwind of its guard.
#[cfg(feature = "logging")]
struct ComparatorPanicGuard {
    op: &'static str,
}

#[cfg(feature = "logging")]
impl Drop for ComparatorPanicGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            log::error!(
                "A key comparator panicked during `{}`; the call was aborted with \
                 no change committed and the map remains usable",
                self.op
            );
        }
    }
}
