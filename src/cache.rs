//! Direct-mapped memoization tables for ZDD computations.
//!
//! Every cache is a plain array where each key hashes to exactly one slot.
//! Collisions simply overwrite the previous entry ("last writer wins"), and a
//! slot holding a different key is a miss, never an error.
//!
//! Keys are compared by *identity* ([`Zdd::ptr_eq`]), not by value: a cache
//! only remembers work done on the very same node objects. Entries hold clones
//! of the handles they were keyed on, so an identity can never be recycled
//! while it is cached.
//!
//! Caches are not shared between threads. Each computation (each
//! [`ZddContext`][crate::zdd::ZddContext], each reduction accumulator) owns its
//! own set.

use crate::node::Node;
use crate::reference::Zdd;
use crate::utils::{mix64, pairing2, MyHash};

/// Identity-based key of a cache slot.
pub trait CacheKey: MyHash {
    /// True if `self` and `other` denote the same operands (by identity).
    fn same(&self, other: &Self) -> bool;
}

/// Operand pair of a binary operation or predicate.
impl MyHash for (Zdd, Zdd) {
    fn hash(&self) -> u64 {
        mix64(pairing2(self.0.hash(), self.1.hash()))
    }
}

impl CacheKey for (Zdd, Zdd) {
    fn same(&self, other: &Self) -> bool {
        self.0.ptr_eq(&other.0) && self.1.ptr_eq(&other.1)
    }
}

/// Triple identifying a node under construction, with its precomputed hash.
#[derive(Debug, Clone)]
pub struct NodeKey {
    pub element: i64,
    pub low: Zdd,
    pub high: Zdd,
    hash: u64,
}

impl NodeKey {
    pub fn new(element: i64, low: Zdd, high: Zdd) -> Self {
        let hash = Node::compute_hash(element, &low, &high);
        Self {
            element,
            low,
            high,
            hash,
        }
    }

    /// Allocates a fresh node for this triple.
    pub fn build(self) -> Zdd {
        Zdd::from_node(Node::new(self.element, self.low, self.high, self.hash))
    }
}

impl MyHash for NodeKey {
    fn hash(&self) -> u64 {
        self.hash
    }
}

impl CacheKey for NodeKey {
    fn same(&self, other: &Self) -> bool {
        self.element == other.element && self.low.ptr_eq(&other.low) && self.high.ptr_eq(&other.high)
    }
}

/// A direct-mapped cache with `2^bits` slots.
pub struct Cache<K, V> {
    entries: Vec<Option<(K, V)>>,
    bitmask: u64,
    hits: usize,
    misses: usize,
    faults: usize,
}

/// Canonicalizes freshly built nodes within its limited capacity.
pub type NodeCache = Cache<NodeKey, Zdd>;

/// Memoizes binary predicates (equality, inclusion).
pub type PredicateCache = Cache<(Zdd, Zdd), bool>;

/// Memoizes binary ZDD-producing operations.
pub type OperationCache = Cache<(Zdd, Zdd), Zdd>;

impl<K, V> Default for Cache<K, V> {
    fn default() -> Self {
        Self::new(CacheConfig::default().bits)
    }
}

impl<K, V> Cache<K, V> {
    /// Creates a new cache with `2^bits` slots.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= CacheConfig::MAX_BITS, "Cache bits must be in range 0..={}, got {}", CacheConfig::MAX_BITS, bits);

        let size = 1usize << bits;
        let bitmask = (size - 1) as u64;

        Self {
            entries: (0..size).map(|_| None).collect(),
            bitmask,
            hits: 0,
            misses: 0,
            faults: 0,
        }
    }

    /// Returns the number of slots in the cache.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Returns the number of cache hits.
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Returns the number of cache misses.
    pub fn misses(&self) -> usize {
        self.misses
    }

    /// Returns the number of cache faults (misses on a slot held by another key).
    pub fn faults(&self) -> usize {
        self.faults
    }

    /// Clears all entries, releasing the handles they hold. This is O(n).
    pub fn clear(&mut self) {
        for entry in &mut self.entries {
            *entry = None;
        }
    }
}

impl<K: MyHash, V> Cache<K, V> {
    #[inline]
    fn index(&self, key: &K) -> usize {
        (key.hash() & self.bitmask) as usize
    }
}

impl<K, V> Cache<K, V>
where
    K: CacheKey,
    V: Clone,
{
    /// Looks up a key in the cache.
    #[inline]
    pub fn get(&mut self, key: &K) -> Option<V> {
        let idx = self.index(key);

        match &self.entries[idx] {
            Some((k, v)) if k.same(key) => {
                self.hits += 1;
                Some(v.clone())
            }
            Some(_) => {
                self.faults += 1;
                self.misses += 1;
                None
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Inserts a key-value pair, overwriting any existing entry at the same slot.
    #[inline]
    pub fn insert(&mut self, key: K, value: V) {
        let idx = self.index(&key);
        self.entries[idx] = Some((key, value));
    }
}

/// Sizing of the per-computation caches.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CacheConfig {
    /// Every cache has `2^bits` slots.
    pub bits: usize,
}

impl CacheConfig {
    pub const MAX_BITS: usize = 24;

    pub fn new(bits: usize) -> Self {
        assert!(bits <= Self::MAX_BITS, "Cache bits must be in range 0..={}, got {}", Self::MAX_BITS, bits);
        Self { bits }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { bits: 10 }
    }
}
