use crate::reference::Zdd;
use crate::utils::{mix64, MyHash};

/// An immutable ZDD node.
///
/// # Fields
///
/// - `element`: element tested at this node
/// - `low`: sets NOT containing `element`
/// - `high`: sets containing `element` (with `element` removed)
///
/// # Invariants
///
/// - **Zero-suppression**: `high` is never [`Zdd::EMPTY`].
/// - **Ordering**: every element below this node is strictly greater than `element`.
///
/// Nodes are not hash-consed: two distinct nodes may denote the same family.
/// The structural hash, however, only depends on the denoted family, so two
/// nodes with different hashes always denote different families.
#[derive(Debug)]
pub struct Node {
    pub element: i64,
    pub low: Zdd,
    pub high: Zdd,
    hash: u64,
    size: u64,
}

impl Node {
    /// Creates a new node. The caller must have already checked the
    /// zero-suppression rule; see [`ZddContext::mk_node`][crate::zdd::ZddContext::mk_node].
    pub(crate) fn new(element: i64, low: Zdd, high: Zdd, hash: u64) -> Self {
        debug_assert!(!high.is_empty(), "ZDD node cannot have high=EMPTY (zero-suppression rule)");
        debug_assert!(
            low.top().map_or(true, |x| x > element) && high.top().map_or(true, |x| x > element),
            "children of node {} must carry strictly greater elements",
            element
        );
        let size = low.size().saturating_add(high.size());
        Self {
            element,
            low,
            high,
            hash,
            size,
        }
    }

    /// Computes the structural hash of `(element, low, high)`.
    pub fn compute_hash(element: i64, low: &Zdd, high: &Zdd) -> u64 {
        mix64((mix64(element as u64), low.hash(), high.hash()).hash())
    }

    /// Returns the precomputed structural hash.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Returns the number of sets in the family rooted at this node,
    /// saturating at `u64::MAX`.
    pub fn size(&self) -> u64 {
        self.size
    }
}
