#![warn(clippy::all)]
#![warn(rust_2018_idioms)]

//! A lock-striped concurrent hash map.
//!
//! `stripemap` provides [`HashMap`], an associative container that supports
//! high-throughput concurrent reads and writes from many threads without a
//! single global lock. The table is partitioned into a fixed, power-of-two
//! number of buckets, each guarded by its own mutex; every operation runs
//! entirely under exactly one bucket's lock, so operations on different
//! buckets proceed fully in parallel.
//!
//! All methods take `&self`. Share the map across threads with an
//! [`Arc`][std::sync::Arc], or a scoped thread borrow.
//!
//! # Quick start
//!
//! ```
//! use stripemap::HashMap;
//!
//! let map = HashMap::new();
//!
//! // `insert` and `remove` return the previous value, or the value type's
//! // default when the key was absent.
//! assert_eq!(map.insert(1, 2), 0);
//! assert_eq!(map.insert(2, 4), 0);
//! assert_eq!(map.get(&1), 2);
//! assert_eq!(map.remove(&1), 2);
//! assert_eq!(map.remove(&2), 4);
//! assert_eq!(map.remove(&2), 0);
//! ```
//!
//! # Pluggable key comparison
//!
//! Hashing and equality are a strategy, not a fixed property of the key
//! type. Implement [`KeyComparator`] (or use one of the shipped
//! implementations) and pass it to
//! [`HashMap::with_comparator`]:
//!
//! ```
//! use stripemap::{AsciiCaseInsensitive, HashMap};
//!
//! let map: HashMap<String, u32, _> = HashMap::with_comparator(AsciiCaseInsensitive::new());
//!
//! map.insert("one".to_string(), 1);
//! map.insert("One".to_string(), 2);
//!
//! // One entry, last value wins.
//! assert_eq!(map.get(&"ONE".to_string()), 2);
//! ```
//!
//! See the [`comparator`] module for the capability set and its contract.
//!
//! # What this map does not do
//!
//! The bucket array never resizes, there is no `len` or iteration API (any
//! such result would be stale the instant it was produced under concurrent
//! mutation), and whole-map operations ([`HashMap::clear`] and the `Debug`
//! rendering) are bucket-wise atomic only. These are deliberate boundaries;
//! the [`HashMap`] docs spell out each one.
//!
//! # Feature flags
//!
//! - `logging`: emit a [`log`](https://crates.io/crates/log) record when a
//!   user-supplied comparator panics inside a bucket critical section. No
//!   other events are logged.

pub mod comparator;

mod builder;
mod map;

#[cfg(test)]
pub(crate) mod test_util;

pub use builder::HashMapBuilder;
pub use comparator::{
    AsciiCaseInsensitive, DefaultComparator, DefaultHashBuilder, KeyComparator,
    SequenceComparator,
};
pub use map::HashMap;
