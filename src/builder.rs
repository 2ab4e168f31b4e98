use std::marker::PhantomData;

use crate::{
    comparator::DefaultComparator,
    map::{default_num_buckets, HashMap},
};

/// Builds a [`HashMap`] with the configuration knobs set explicitly.
///
/// Both knobs are fixed at construction: the bucket count never changes for
/// the lifetime of the map, and the comparator is never replaced.
///
/// # Examples
///
/// ```rust
/// use stripemap::{AsciiCaseInsensitive, HashMap};
///
/// let map: HashMap<String, u32, _> = HashMap::builder()
///     // 64 buckets, fixed for the map's lifetime.
///     .num_buckets(64)
///     // Fold ASCII case when hashing and comparing keys.
///     .comparator(AsciiCaseInsensitive::new())
///     // Create the map.
///     .build();
///
/// map.insert("Alpha".to_string(), 1);
/// assert_eq!(map.get(&"ALPHA".to_string()), 1);
/// ```
pub struct HashMapBuilder<K, V, C = DefaultComparator> {
    num_buckets: Option<usize>,
    comparator: C,
    map_type: PhantomData<fn() -> (K, V)>,
}

impl<K, V> Default for HashMapBuilder<K, V, DefaultComparator> {
    fn default() -> Self {
        Self {
            num_buckets: None,
            comparator: DefaultComparator::new(),
            map_type: PhantomData,
        }
    }
}

impl<K, V, C> HashMapBuilder<K, V, C> {
    /// Sets the number of buckets of the map.
    ///
    /// The count is rounded up to the next power of two by
    /// [`build`](Self::build).
    ///
    /// # Panics
    ///
    /// Panics if `num_buckets` is 0.
    pub fn num_buckets(mut self, num_buckets: usize) -> Self {
        assert!(num_buckets > 0);

        self.num_buckets = Some(num_buckets);
        self
    }

    /// Sets the key comparator of the map.
    pub fn comparator<C2>(self, comparator: C2) -> HashMapBuilder<K, V, C2> {
        HashMapBuilder {
            num_buckets: self.num_buckets,
            comparator,
            map_type: PhantomData,
        }
    }

    /// Builds a `HashMap<K, V, C>`.
    pub fn build(self) -> HashMap<K, V, C> {
        HashMap::with_num_buckets_and_comparator(
            self.num_buckets.unwrap_or_else(default_num_buckets),
            self.comparator,
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::{comparator::AsciiCaseInsensitive, map::HashMap};

    #[test]
    fn builder_defaults_match_new() {
        let built: HashMap<u32, u32> = HashMap::builder().build();
        let direct: HashMap<u32, u32> = HashMap::new();

        assert_eq!(built.num_buckets(), direct.num_buckets());
    }

    #[test]
    fn builder_sets_bucket_count_and_comparator() {
        let map: HashMap<String, u32, _> = HashMap::builder()
            .num_buckets(5)
            .comparator(AsciiCaseInsensitive::new())
            .build();

        assert_eq!(map.num_buckets(), 8);

        map.insert("Key".to_string(), 1);
        assert!(map.contains_key(&"KEY".to_string()));
    }

    #[test]
    #[should_panic]
    fn zero_bucket_count_is_rejected() {
        let _ = HashMap::<u32, u32>::builder().num_buckets(0);
    }
}
