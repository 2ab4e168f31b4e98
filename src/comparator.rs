//! Pluggable hashing and equality for map keys.
//!
//! A [`HashMap`][crate::HashMap] does not hash or compare keys itself; it
//! delegates both to a [`KeyComparator`]. The default implementation,
//! [`DefaultComparator`], uses the key type's own [`Hash`] and [`Eq`], which
//! is what you want for ordinary keys. Alternate implementations let a map
//! treat keys as equal that the key type itself does not, without wrapping
//! the key in a newtype:
//!
//! - [`AsciiCaseInsensitive`] folds ASCII case on string-like keys.
//! - [`SequenceComparator`] compares optional element sequences
//!   structurally, treating an absent sequence and an empty one as the same
//!   key.

use std::hash::{BuildHasher, BuildHasherDefault, Hash, Hasher};

/// Default hash builder used by [`DefaultComparator`] and the other shipped
/// comparators.
///
/// This is a deterministic, unseeded instance of [`AHasher`]: every map
/// hashes a given key to the same value, across runs and across processes.
/// That makes bucket assignment reproducible, but it also means the default
/// configuration offers no protection against adversarially chosen keys. See
/// the [`HashMap`][crate::HashMap] docs for the full caveat.
///
/// [`AHasher`]: ahash::AHasher
pub type DefaultHashBuilder = BuildHasherDefault<ahash::AHasher>;

/// A strategy for hashing and comparing the keys of a
/// [`HashMap`][crate::HashMap].
///
/// Implementations must uphold the following property:
///
/// ```text
/// eq(k1, k2) -> hash(k1) == hash(k2)
/// ```
///
/// In other words, if two keys compare equal, their hashes must be equal.
/// The map cannot check this; a comparator that violates it will route equal
/// keys to different buckets and the map will silently hold duplicates.
///
/// A comparator is installed when the map is constructed and is never
/// replaced afterwards. Both methods may be called concurrently from many
/// threads, and `eq` is called while a bucket lock is held, so
/// implementations should be cheap and must not call back into the map.
pub trait KeyComparator<K> {
    /// Returns the hash of `key`.
    fn hash(&self, key: &K) -> u64;

    /// Returns `true` if `lhs` and `rhs` are the same key.
    ///
    /// The map only calls this after the cached hashes of both keys already
    /// matched, so a typical implementation does not need its own fast path.
    fn eq(&self, lhs: &K, rhs: &K) -> bool;
}

pub(crate) fn hash_one<S: BuildHasher, T: Hash + ?Sized>(build_hasher: &S, value: &T) -> u64 {
    let mut hasher = build_hasher.build_hasher();
    value.hash(&mut hasher);
    hasher.finish()
}

/// The comparator a map is created with by default: the key type's intrinsic
/// [`Hash`] and [`Eq`] semantics.
///
/// The hash builder can be replaced to use a different hashing algorithm,
/// for example a randomly seeded one:
///
/// ```
/// use std::collections::hash_map::RandomState;
/// use stripemap::{DefaultComparator, HashMap};
///
/// let cmp = DefaultComparator::with_hasher(RandomState::new());
/// let map: HashMap<String, u32, _> = HashMap::with_comparator(cmp);
/// ```
#[derive(Clone, Default)]
pub struct DefaultComparator<S = DefaultHashBuilder> {
    build_hasher: S,
}

impl DefaultComparator {
    /// Creates a comparator using the [`DefaultHashBuilder`].
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S> DefaultComparator<S> {
    /// Creates a comparator using `build_hasher` to hash the keys.
    pub fn with_hasher(build_hasher: S) -> Self {
        Self { build_hasher }
    }
}

impl<K, S> KeyComparator<K> for DefaultComparator<S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn hash(&self, key: &K) -> u64 {
        hash_one(&self.build_hasher, key)
    }

    fn eq(&self, lhs: &K, rhs: &K) -> bool {
        lhs == rhs
    }
}

/// Compares string-like keys ignoring ASCII case.
///
/// `"one"`, `"One"` and `"ONE"` are all the same key under this comparator.
/// Keys are hashed and compared as if every ASCII letter were lowercased;
/// nothing is allocated and the stored key keeps its original spelling (an
/// insert that replaces a value does not replace the key).
///
/// ```
/// use stripemap::{AsciiCaseInsensitive, HashMap};
///
/// let map: HashMap<String, u32, _> = HashMap::with_comparator(AsciiCaseInsensitive::new());
/// map.insert("one".to_string(), 1);
/// map.insert("One".to_string(), 2);
/// assert_eq!(map.get(&"ONE".to_string()), 2);
/// ```
#[derive(Clone, Default)]
pub struct AsciiCaseInsensitive<S = DefaultHashBuilder> {
    build_hasher: S,
}

impl AsciiCaseInsensitive {
    /// Creates a comparator using the [`DefaultHashBuilder`].
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S> AsciiCaseInsensitive<S> {
    /// Creates a comparator using `build_hasher` to hash the folded keys.
    pub fn with_hasher(build_hasher: S) -> Self {
        Self { build_hasher }
    }
}

impl<K, S> KeyComparator<K> for AsciiCaseInsensitive<S>
where
    K: AsRef<str>,
    S: BuildHasher,
{
    fn hash(&self, key: &K) -> u64 {
        let mut hasher = self.build_hasher.build_hasher();
        for b in key.as_ref().bytes() {
            hasher.write_u8(b.to_ascii_lowercase());
        }
        hasher.finish()
    }

    fn eq(&self, lhs: &K, rhs: &K) -> bool {
        lhs.as_ref().eq_ignore_ascii_case(rhs.as_ref())
    }
}

/// Compares optional element sequences structurally.
///
/// Keys are `Option<Vec<T>>`. The hash and equality are those of the element
/// sequence itself, and an absent sequence (`None`) is the same key as an
/// empty one (`Some(vec![])`): both hash alike and compare equal, so an
/// insert with one form overwrites an earlier insert with the other.
#[derive(Clone, Default)]
pub struct SequenceComparator<S = DefaultHashBuilder> {
    build_hasher: S,
}

impl SequenceComparator {
    /// Creates a comparator using the [`DefaultHashBuilder`].
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S> SequenceComparator<S> {
    /// Creates a comparator using `build_hasher` to hash the elements.
    pub fn with_hasher(build_hasher: S) -> Self {
        Self { build_hasher }
    }
}

impl<T, S> KeyComparator<Option<Vec<T>>> for SequenceComparator<S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    fn hash(&self, key: &Option<Vec<T>>) -> u64 {
        let elems: &[T] = key.as_deref().unwrap_or(&[]);
        let mut hasher = self.build_hasher.build_hasher();
        hasher.write_usize(elems.len());
        for elem in elems {
            elem.hash(&mut hasher);
        }
        hasher.finish()
    }

    fn eq(&self, lhs: &Option<Vec<T>>, rhs: &Option<Vec<T>>) -> bool {
        lhs.as_deref().unwrap_or(&[]) == rhs.as_deref().unwrap_or(&[])
    }
}
