//! A concurrent hash map sharded into independently-locked buckets.

pub(crate) mod bucket;

use std::{fmt, hash::Hash};

use crossbeam_utils::CachePadded;

use crate::{
    builder::HashMapBuilder,
    comparator::{DefaultComparator, KeyComparator},
};

use self::bucket::Bucket;

/// Buckets allocated per unit of available parallelism by the default
/// constructors.
const BUCKETS_PER_THREAD: usize = 2;

/// A concurrency-safe hash map that partitions lock contention across a
/// fixed array of mutex-guarded buckets.
///
/// Every operation hashes its key, selects one bucket, and runs entirely
/// under that bucket's lock; no global lock is ever held. Operations on keys
/// in different buckets proceed fully in parallel, while operations on the
/// same bucket serialize in lock-acquisition order. `insert`, `remove` and
/// `get` on a single key are individually atomic; there is no multi-key
/// transaction support, and whole-map operations ([`clear`](Self::clear) and
/// the [`Debug`](fmt::Debug) rendering) lock each bucket independently in
/// turn rather than the whole map at once.
///
/// The bucket array is sized once at construction, to a power of two, and
/// never resizes. By default it holds twice as many buckets as the system
/// has hardware threads. More buckets trade memory (one lock and one entry
/// sequence each) for lower contention.
///
/// # Key comparison
///
/// Hashing and equality are delegated to a [`KeyComparator`] chosen at
/// construction. The default, [`DefaultComparator`], uses the key type's own
/// [`Hash`] and [`Eq`] with a **deterministic, unseeded** hash builder, and
/// the bucket index keeps only the low bits of the hash. This makes bucket
/// assignment reproducible but offers no resistance against adversarially
/// chosen keys; callers that need HashDoS protection should supply a
/// randomly seeded hasher through
/// [`DefaultComparator::with_hasher`][crate::DefaultComparator::with_hasher]
/// and [`with_comparator`](Self::with_comparator).
///
/// # The zero-value convention
///
/// Lookup-style operations do not distinguish "absent" from "present": they
/// return the value type's [`Default`] when the key is not found. A caller
/// that stores default-valued entries and needs to tell the two apart can
/// use [`contains_key`](Self::contains_key).
///
/// # Panics
///
/// A panic raised by a user-supplied comparator propagates to the caller of
/// the offending operation. The map is left undamaged: the bucket lock is
/// released during unwind (the locks do not poison) and no partial mutation
/// is committed, so the same map remains usable for every key afterwards.
///
/// # Examples
///
/// ```
/// use std::{sync::Arc, thread};
/// use stripemap::HashMap;
///
/// let map = Arc::new(HashMap::new());
///
/// let handles: Vec<_> = (0..4)
///     .map(|t| {
///         let map = Arc::clone(&map);
///         thread::spawn(move || {
///             for i in 0..100u64 {
///                 map.insert(t * 100 + i, i);
///             }
///         })
///     })
///     .collect();
///
/// for handle in handles {
///     handle.join().unwrap();
/// }
///
/// assert_eq!(map.get(&205), 5);
/// ```
pub struct HashMap<K, V, C = DefaultComparator> {
    buckets: Box<[CachePadded<Bucket<K, V>>]>,
    comparator: C,
}

impl<K, V> HashMap<K, V, DefaultComparator>
where
    K: Hash + Eq,
{
    /// Creates an empty map with the default comparator and a bucket count
    /// equal to the next power of two at or above twice the available
    /// parallelism.
    pub fn new() -> Self {
        Self::with_num_buckets_and_comparator(default_num_buckets(), DefaultComparator::new())
    }
}

impl<K, V> HashMap<K, V, DefaultComparator> {
    /// Returns a [`HashMapBuilder`], which lets a map be created with the
    /// bucket count and comparator set explicitly.
    pub fn builder() -> HashMapBuilder<K, V, DefaultComparator> {
        HashMapBuilder::default()
    }

    /// Creates an empty map with at least `num_buckets` buckets and the
    /// default comparator.
    ///
    /// The bucket count is rounded up to the next power of two and is fixed
    /// for the lifetime of the map.
    ///
    /// # Panics
    ///
    /// Panics if `num_buckets` is 0.
    pub fn with_num_buckets(num_buckets: usize) -> Self {
        Self::with_num_buckets_and_comparator(num_buckets, DefaultComparator::new())
    }
}

impl<K, V, C> HashMap<K, V, C> {
    /// Creates an empty map with the default bucket count, using
    /// `comparator` to hash and compare keys.
    pub fn with_comparator(comparator: C) -> Self {
        Self::with_num_buckets_and_comparator(default_num_buckets(), comparator)
    }

    /// Creates an empty map with at least `num_buckets` buckets, using
    /// `comparator` to hash and compare keys.
    ///
    /// The bucket count is rounded up to the next power of two and is fixed
    /// for the lifetime of the map.
    ///
    /// # Panics
    ///
    /// Panics if `num_buckets` is 0.
    pub fn with_num_buckets_and_comparator(num_buckets: usize, comparator: C) -> Self {
        assert!(num_buckets > 0);

        let actual_num_buckets = num_buckets.next_power_of_two();

        let buckets = (0..actual_num_buckets)
            .map(|_| CachePadded::new(Bucket::default()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            buckets,
            comparator,
        }
    }

    /// Returns the number of buckets in the map.
    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }
}

impl<K, V, C> HashMap<K, V, C>
where
    C: KeyComparator<K>,
{
    /// Inserts a key-value pair, returning the value previously stored for
    /// the key, or `V::default()` if the key was absent.
    ///
    /// If the key was present, its value is overwritten in place and the
    /// stored key is kept. The whole operation runs under the owning
    /// bucket's lock, so it is atomic with respect to every other operation
    /// on the same key.
    pub fn insert(&self, key: K, value: V) -> V
    where
        V: Default,
    {
        let hash = self.comparator.hash(&key);

        self.bucket_for(hash)
            .insert(hash, key, value, &self.comparator)
            .unwrap_or_default()
    }

    /// Removes the entry for `key`, returning its value, or `V::default()`
    /// if the key was absent.
    ///
    /// The removed slot is overwritten with the bucket's last entry and the
    /// sequence shrinks by one; entry order within a bucket is not a
    /// promised property.
    pub fn remove(&self, key: &K) -> V
    where
        V: Default,
    {
        let hash = self.comparator.hash(key);

        self.bucket_for(hash)
            .remove(hash, key, &self.comparator)
            .unwrap_or_default()
    }

    /// Returns a clone of the value stored for `key`, or `V::default()` if
    /// the key is absent.
    ///
    /// Structurally read-only, but still acquires the owning bucket's
    /// exclusive lock; there is no separate read/write lock tier.
    pub fn get(&self, key: &K) -> V
    where
        V: Default + Clone,
    {
        let hash = self.comparator.hash(key);

        self.bucket_for(hash)
            .get(hash, key, &self.comparator)
            .unwrap_or_default()
    }

    /// Returns `true` if the map holds an entry for `key`.
    ///
    /// This is the presence probe for callers that store default-valued
    /// entries and cannot rely on the zero-value convention of
    /// [`get`](Self::get).
    pub fn contains_key(&self, key: &K) -> bool {
        let hash = self.comparator.hash(key);

        self.bucket_for(hash).contains(hash, key, &self.comparator)
    }

    /// Removes every entry from the map.
    ///
    /// Each bucket is locked, emptied and unlocked in turn, so the map as a
    /// whole is **not** cleared atomically: an insert racing with `clear`
    /// may land in an already-emptied bucket and survive the call.
    pub fn clear(&self) {
        for bucket in self.buckets.iter() {
            bucket.clear();
        }
    }

    fn bucket_for(&self, hash: u64) -> &Bucket<K, V> {
        // Power-of-two bucket count: the modulo reduces to a mask, keeping
        // only the low bits of the hash.
        &self.buckets[(hash as usize) & (self.buckets.len() - 1)]
    }

    #[cfg(test)]
    pub(crate) fn entry_count(&self) -> usize {
        self.buckets.iter().map(|b| b.len()).sum()
    }
}

impl<K, V> Default for HashMap<K, V, DefaultComparator>
where
    K: Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for HashMap<K, V, DefaultComparator>
where
    K: Hash + Eq,
{
    /// Creates a map with the default comparator, holding the given pairs.
    ///
    /// Later pairs overwrite earlier ones with an equal key.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map = Self::new();

        for (key, value) in iter {
            let hash = map.comparator.hash(&key);
            map.bucket_for(hash).insert(hash, key, value, &map.comparator);
        }

        map
    }
}

/// Diagnostic rendering of all entries.
///
/// Intended for debugging only. Buckets are enumerated one at a time, each
/// under its own lock, so the output is a deterministic format over a
/// possibly inconsistent snapshot: entries inserted or removed while the
/// rendering is in progress may or may not appear, exactly as with
/// [`clear`](HashMap::clear). Entry order follows bucket storage order and
/// is meaningless.
impl<K, V, C> fmt::Debug for HashMap<K, V, C>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d_map = f.debug_map();

        for bucket in self.buckets.iter() {
            bucket.for_each(|k, v| {
                d_map.entry(k, v);
            });
        }

        d_map.finish()
    }
}

pub(crate) fn available_parallelism() -> usize {
    use std::{num::NonZeroUsize, thread::available_parallelism};
    available_parallelism().map(NonZeroUsize::get).unwrap_or(1)
}

pub(crate) fn default_num_buckets() -> usize {
    (available_parallelism() * BUCKETS_PER_THREAD).next_power_of_two()
}
