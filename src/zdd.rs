//! Set algebra over Zero-Suppressed Decision Diagrams.
//!
//! A [`ZddContext`] bundles the memoization caches used by the recursive
//! operations. Unlike a classic ZDD manager, a context owns **no** unique
//! table: nodes live in shared, immutable [`Zdd`] handles, and the
//! [`NodeCache`] only canonicalizes the nodes it happens to still remember.
//! Distinct objects may therefore denote the same family, and all value-level
//! decisions go through the memoized structural [`equals`](ZddContext::equals).
//!
//! A context is cheap to create and is meant to be owned by one computation
//! (one thread) at a time.
//!
//! # Quick Start
//!
//! ```
//! use zcube::zdd::ZddContext;
//!
//! let ctx = ZddContext::default();
//!
//! let s1 = ctx.singleton(1); // {{1}}
//! let s2 = ctx.singleton(2); // {{2}}
//!
//! let union = ctx.union(&s1, &s2); // {{1}, {2}}
//! let joined = ctx.cross_union(&s1, &s2); // {{1, 2}}
//!
//! assert_eq!(ctx.size(&union), 2);
//! assert!(ctx.equals(&joined, &ctx.family_of([2, 1])));
//! ```
//!
//! # Operations
//!
//! Here, P and Q are families of sets.
//!
//! | Operation | Result |
//! |-----------|--------|
//! | `union(P, Q)` | sets in P or Q |
//! | `intersection(P, Q)` | sets in both P and Q |
//! | `difference(P, Q)` | sets in P but not in Q |
//! | `cross_union(P, Q)` | `{p ∪ q : p ∈ P, q ∈ Q}` |
//! | `cross_intersection(P, Q)` | `{p ∩ q : p ∈ P, q ∈ Q}` |
//! | `cross_difference(P, Q)` | `{p \ q : p ∈ P, q ∈ Q}` |
//! | `included(P, Q)` | every set of P is in Q |

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use log::{debug, trace};
use num_bigint::BigUint;

use crate::cache::{CacheConfig, NodeCache, NodeKey, OperationCache, PredicateCache};
use crate::reference::Zdd;

/// Caches of one ZDD computation.
pub struct ZddContext {
    nodes: RefCell<NodeCache>,
    equ: RefCell<PredicateCache>,
    inc: RefCell<PredicateCache>,
    uni: RefCell<OperationCache>,
    int: RefCell<OperationCache>,
    dif: RefCell<OperationCache>,
    cru: RefCell<OperationCache>,
    cri: RefCell<OperationCache>,
    crd: RefCell<OperationCache>,
}

impl ZddContext {
    pub fn new(config: CacheConfig) -> Self {
        let bits = config.bits;
        Self {
            nodes: RefCell::new(NodeCache::new(bits)),
            equ: RefCell::new(PredicateCache::new(bits)),
            inc: RefCell::new(PredicateCache::new(bits)),
            uni: RefCell::new(OperationCache::new(bits)),
            int: RefCell::new(OperationCache::new(bits)),
            dif: RefCell::new(OperationCache::new(bits)),
            cru: RefCell::new(OperationCache::new(bits)),
            cri: RefCell::new(OperationCache::new(bits)),
            crd: RefCell::new(OperationCache::new(bits)),
        }
    }

    /// Drops every memoized entry, releasing the nodes the caches kept alive.
    pub fn clear(&self) {
        self.nodes.borrow_mut().clear();
        self.equ.borrow_mut().clear();
        self.inc.borrow_mut().clear();
        self.uni.borrow_mut().clear();
        self.int.borrow_mut().clear();
        self.dif.borrow_mut().clear();
        self.cru.borrow_mut().clear();
        self.cri.borrow_mut().clear();
        self.crd.borrow_mut().clear();
    }

    /// Logs hit/miss counters of every cache at `debug` level.
    pub fn log_stats(&self, name: &str) {
        let nodes = self.nodes.borrow();
        debug!(
            "{}: node cache hits={} misses={} faults={}",
            name,
            nodes.hits(),
            nodes.misses(),
            nodes.faults()
        );
        for (op, cache) in [("equ", &self.equ), ("inc", &self.inc)] {
            let cache = cache.borrow();
            debug!("{}: {} cache hits={} misses={}", name, op, cache.hits(), cache.misses());
        }
        for (op, cache) in [
            ("uni", &self.uni),
            ("int", &self.int),
            ("dif", &self.dif),
            ("cru", &self.cru),
            ("cri", &self.cri),
            ("crd", &self.crd),
        ] {
            let cache = cache.borrow();
            debug!("{}: {} cache hits={} misses={}", name, op, cache.hits(), cache.misses());
        }
    }
}

impl Default for ZddContext {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

// ========================================================================
// Node Construction
// ========================================================================

impl ZddContext {
    /// Returns the node `(element, low, high)`.
    ///
    /// Enforces zero-suppression: if `high` is EMPTY, returns `low`.
    /// Otherwise reuses a remembered node with the same triple, or allocates
    /// a new one.
    ///
    /// # Preconditions
    ///
    /// Every element in `low` and `high` must be strictly greater than `element`.
    pub fn mk_node(&self, element: i64, low: Zdd, high: Zdd) -> Zdd {
        if high.is_empty() {
            return low;
        }

        let key = NodeKey::new(element, low, high);
        if let Some(z) = self.nodes.borrow_mut().get(&key) {
            return z;
        }

        trace!("mk_node({}, {}, {})", element, key.low, key.high);
        let z = key.clone().build();
        self.nodes.borrow_mut().insert(key, z.clone());
        z
    }

    /// The family `{{x}}`.
    pub fn singleton(&self, x: i64) -> Zdd {
        self.mk_node(x, Zdd::EMPTY, Zdd::UNIT)
    }

    /// The family `{{x1, x2, ...}}` holding a single set.
    ///
    /// Duplicates collapse and order is irrelevant; an empty input yields UNIT.
    pub fn family_of(&self, xs: impl IntoIterator<Item = i64>) -> Zdd {
        let singletons: Vec<Zdd> = xs.into_iter().map(|x| self.singleton(x)).collect();
        self.cross_union_all(&singletons)
    }
}

// ========================================================================
// Predicates
// ========================================================================

/// Memoized structural equality, using `cache` for the pairs already compared.
pub(crate) fn equals_with(cache: &mut PredicateCache, a: &Zdd, b: &Zdd) -> bool {
    if a.ptr_eq(b) {
        return true;
    }
    if a.hash() != b.hash() {
        return false;
    }

    let (f, g) = match (a.node(), b.node()) {
        (Some(f), Some(g)) => (f, g),
        // Terminals are singletons: a terminal only equals itself.
        _ => return false,
    };

    let key = (a.clone(), b.clone());
    if let Some(res) = cache.get(&key) {
        return res;
    }

    let res = f.element == g.element && equals_with(cache, &f.low, &g.low) && equals_with(cache, &f.high, &g.high);

    cache.insert(key, res);
    res
}

/// True iff the empty set is a member of `z` (its all-`low` path ends in UNIT).
fn contains_empty_set(z: &Zdd) -> bool {
    let mut current = z;
    loop {
        match current.node() {
            Some(node) => current = &node.low,
            None => return current.is_unit(),
        }
    }
}

impl ZddContext {
    /// True if `a` and `b` denote the same family of sets.
    pub fn equals(&self, a: &Zdd, b: &Zdd) -> bool {
        equals_with(&mut self.equ.borrow_mut(), a, b)
    }

    /// True if every set of `a` is also a set of `b`.
    pub fn included(&self, a: &Zdd, b: &Zdd) -> bool {
        if self.equals(a, b) || a.is_empty() {
            return true;
        }
        if a.is_unit() {
            return contains_empty_set(b);
        }

        let (f, g) = match (a.node(), b.node()) {
            (Some(f), Some(g)) => (f, g),
            // `a` holds a non-empty set, which no terminal contains.
            _ => return false,
        };

        let key = (a.clone(), b.clone());
        if let Some(res) = self.inc.borrow_mut().get(&key) {
            return res;
        }

        let res = match f.element.cmp(&g.element) {
            // Sets of `a` containing f.element cannot be found in `b`.
            Ordering::Less => false,
            Ordering::Greater => self.included(a, &g.low),
            Ordering::Equal => self.included(&f.low, &g.low) && self.included(&f.high, &g.high),
        };

        self.inc.borrow_mut().insert(key, res);
        res
    }

    /// Number of sets in the family, saturating at `u64::MAX`.
    pub fn size(&self, z: &Zdd) -> u64 {
        z.size()
    }

    /// Exact number of sets in the family.
    pub fn count(&self, z: &Zdd) -> BigUint {
        let mut cache = HashMap::new();
        Self::count_rec(z, &mut cache)
    }

    fn count_rec(z: &Zdd, cache: &mut HashMap<usize, BigUint>) -> BigUint {
        let node = match z.node() {
            Some(node) => node,
            None if z.is_unit() => return BigUint::from(1u32),
            None => return BigUint::ZERO,
        };

        if let Some(count) = cache.get(&z.addr()) {
            return count.clone();
        }

        let count = Self::count_rec(&node.low, cache) + Self::count_rec(&node.high, cache);

        cache.insert(z.addr(), count.clone());
        count
    }
}

// ========================================================================
// Set-Theoretic Operations
// ========================================================================

impl ZddContext {
    /// Union: `F ∪ G`, the sets of either family.
    pub fn union(&self, a: &Zdd, b: &Zdd) -> Zdd {
        if a.is_empty() {
            return b.clone();
        }
        if b.is_empty() || self.equals(a, b) {
            return a.clone();
        }

        let key = (a.clone(), b.clone());
        if let Some(res) = self.uni.borrow_mut().get(&key) {
            return res;
        }

        let res = match (a.node(), b.node()) {
            (None, _) => self.union_unit(b),
            (_, None) => self.union_unit(a),
            (Some(f), Some(g)) => match f.element.cmp(&g.element) {
                Ordering::Less => self.mk_node(f.element, self.union(&f.low, b), f.high.clone()),
                Ordering::Greater => self.mk_node(g.element, self.union(a, &g.low), g.high.clone()),
                Ordering::Equal => self.mk_node(f.element, self.union(&f.low, &g.low), self.union(&f.high, &g.high)),
            },
        };

        self.uni.borrow_mut().insert(key, res.clone());
        res
    }

    /// `{∅} ∪ z`: only the all-`low` path changes.
    fn union_unit(&self, z: &Zdd) -> Zdd {
        let node = match z.node() {
            Some(node) => node,
            None => return Zdd::UNIT,
        };

        let key = (Zdd::UNIT, z.clone());
        if let Some(res) = self.uni.borrow_mut().get(&key) {
            return res;
        }

        let res = self.mk_node(node.element, self.union_unit(&node.low), node.high.clone());

        self.uni.borrow_mut().insert(key, res.clone());
        res
    }

    /// Intersection: `F ∩ G`, the sets of both families.
    pub fn intersection(&self, a: &Zdd, b: &Zdd) -> Zdd {
        if a.is_empty() || b.is_empty() {
            return Zdd::EMPTY;
        }
        if self.equals(a, b) {
            return a.clone();
        }

        let key = (a.clone(), b.clone());
        if let Some(res) = self.int.borrow_mut().get(&key) {
            return res;
        }

        let res = match (a.node(), b.node()) {
            (None, _) | (_, None) => {
                // One side is UNIT: only the empty set may survive.
                let other = if a.is_unit() { b } else { a };
                if contains_empty_set(other) {
                    Zdd::UNIT
                } else {
                    Zdd::EMPTY
                }
            }
            (Some(f), Some(g)) => match f.element.cmp(&g.element) {
                // Sets containing the smaller element cannot match.
                Ordering::Less => self.intersection(&f.low, b),
                Ordering::Greater => self.intersection(a, &g.low),
                Ordering::Equal => self.mk_node(
                    f.element,
                    self.intersection(&f.low, &g.low),
                    self.intersection(&f.high, &g.high),
                ),
            },
        };

        self.int.borrow_mut().insert(key, res.clone());
        res
    }

    /// Difference: `F \ G`, the sets of the first family missing from the second.
    pub fn difference(&self, a: &Zdd, b: &Zdd) -> Zdd {
        if a.is_empty() {
            return Zdd::EMPTY;
        }
        if b.is_empty() {
            return a.clone();
        }
        if self.equals(a, b) {
            return Zdd::EMPTY;
        }

        let key = (a.clone(), b.clone());
        if let Some(res) = self.dif.borrow_mut().get(&key) {
            return res;
        }

        let res = match (a.node(), b.node()) {
            (None, _) => {
                if contains_empty_set(b) {
                    Zdd::EMPTY
                } else {
                    Zdd::UNIT
                }
            }
            (_, None) => self.difference_unit(a),
            (Some(f), Some(g)) => match f.element.cmp(&g.element) {
                Ordering::Less => self.mk_node(f.element, self.difference(&f.low, b), f.high.clone()),
                Ordering::Greater => self.difference(a, &g.low),
                Ordering::Equal => self.mk_node(
                    f.element,
                    self.difference(&f.low, &g.low),
                    self.difference(&f.high, &g.high),
                ),
            },
        };

        self.dif.borrow_mut().insert(key, res.clone());
        res
    }

    /// `z \ {∅}`: only the all-`low` path changes.
    fn difference_unit(&self, z: &Zdd) -> Zdd {
        let node = match z.node() {
            Some(node) => node,
            None => return Zdd::EMPTY,
        };

        let key = (z.clone(), Zdd::UNIT);
        if let Some(res) = self.dif.borrow_mut().get(&key) {
            return res;
        }

        let res = self.mk_node(node.element, self.difference_unit(&node.low), node.high.clone());

        self.dif.borrow_mut().insert(key, res.clone());
        res
    }

    /// Cross-union (join): `{p ∪ q : p ∈ F, q ∈ G}`.
    pub fn cross_union(&self, a: &Zdd, b: &Zdd) -> Zdd {
        if a.is_empty() || b.is_empty() {
            return Zdd::EMPTY;
        }
        if a.is_unit() {
            return b.clone();
        }
        if b.is_unit() {
            return a.clone();
        }

        let (f, g) = match (a.node(), b.node()) {
            (Some(f), Some(g)) => (f, g),
            _ => unreachable!("terminal operands are handled above"),
        };

        let key = (a.clone(), b.clone());
        if let Some(res) = self.cru.borrow_mut().get(&key) {
            return res;
        }

        let res = match f.element.cmp(&g.element) {
            Ordering::Less => self.mk_node(f.element, self.cross_union(&f.low, b), self.cross_union(&f.high, b)),
            Ordering::Greater => self.mk_node(g.element, self.cross_union(a, &g.low), self.cross_union(a, &g.high)),
            Ordering::Equal => {
                // The merged set carries the element if either side did.
                let hh = self.cross_union(&f.high, &g.high);
                let hl = self.cross_union(&f.high, &g.low);
                let lh = self.cross_union(&f.low, &g.high);
                let high = self.union(&hh, &self.union(&hl, &lh));
                self.mk_node(f.element, self.cross_union(&f.low, &g.low), high)
            }
        };

        self.cru.borrow_mut().insert(key, res.clone());
        res
    }

    /// Cross-intersection (meet): `{p ∩ q : p ∈ F, q ∈ G}`.
    pub fn cross_intersection(&self, a: &Zdd, b: &Zdd) -> Zdd {
        if a.is_empty() || b.is_empty() {
            return Zdd::EMPTY;
        }
        if a.is_unit() || b.is_unit() {
            return Zdd::UNIT;
        }

        let (f, g) = match (a.node(), b.node()) {
            (Some(f), Some(g)) => (f, g),
            _ => unreachable!("terminal operands are handled above"),
        };

        let key = (a.clone(), b.clone());
        if let Some(res) = self.cri.borrow_mut().get(&key) {
            return res;
        }

        let res = match f.element.cmp(&g.element) {
            // The smaller element is dropped from every intersection.
            Ordering::Less => self.union(&self.cross_intersection(&f.low, b), &self.cross_intersection(&f.high, b)),
            Ordering::Greater => self.union(&self.cross_intersection(a, &g.low), &self.cross_intersection(a, &g.high)),
            Ordering::Equal => {
                let ll = self.cross_intersection(&f.low, &g.low);
                let lh = self.cross_intersection(&f.low, &g.high);
                let hl = self.cross_intersection(&f.high, &g.low);
                let low = self.union(&ll, &self.union(&lh, &hl));
                self.mk_node(f.element, low, self.cross_intersection(&f.high, &g.high))
            }
        };

        self.cri.borrow_mut().insert(key, res.clone());
        res
    }

    /// Cross-difference: `{p \ q : p ∈ F, q ∈ G}`.
    pub fn cross_difference(&self, a: &Zdd, b: &Zdd) -> Zdd {
        if a.is_empty() || b.is_empty() {
            return Zdd::EMPTY;
        }
        if a.is_unit() {
            return Zdd::UNIT;
        }
        if b.is_unit() {
            return a.clone();
        }

        let (f, g) = match (a.node(), b.node()) {
            (Some(f), Some(g)) => (f, g),
            _ => unreachable!("terminal operands are handled above"),
        };

        let key = (a.clone(), b.clone());
        if let Some(res) = self.crd.borrow_mut().get(&key) {
            return res;
        }

        let res = match f.element.cmp(&g.element) {
            Ordering::Less => self.mk_node(
                f.element,
                self.cross_difference(&f.low, b),
                self.cross_difference(&f.high, b),
            ),
            Ordering::Greater => self.union(&self.cross_difference(a, &g.low), &self.cross_difference(a, &g.high)),
            Ordering::Equal => {
                // The element survives only when removed by nobody.
                let ll = self.cross_difference(&f.low, &g.low);
                let lh = self.cross_difference(&f.low, &g.high);
                let hh = self.cross_difference(&f.high, &g.high);
                let low = self.union(&ll, &self.union(&lh, &hh));
                self.mk_node(f.element, low, self.cross_difference(&f.high, &g.low))
            }
        };

        self.crd.borrow_mut().insert(key, res.clone());
        res
    }
}

// ========================================================================
// N-ary Forms
// ========================================================================

impl ZddContext {
    /// Folds `zdds` with `op`, splitting at the midpoint recursively so that
    /// operands of similar size meet.
    fn fold_balanced(&self, zdds: &[Zdd], identity: Zdd, op: fn(&Self, &Zdd, &Zdd) -> Zdd) -> Zdd {
        match zdds {
            [] => identity,
            [z] => z.clone(),
            [a, b] => op(self, a, b),
            _ => {
                let (left, right) = zdds.split_at(zdds.len() / 2);
                let left = self.fold_balanced(left, identity.clone(), op);
                let right = self.fold_balanced(right, identity, op);
                op(self, &left, &right)
            }
        }
    }

    /// Union of all `zdds`; EMPTY for no operands.
    pub fn union_all(&self, zdds: &[Zdd]) -> Zdd {
        self.fold_balanced(zdds, Zdd::EMPTY, Self::union)
    }

    /// Intersection of all `zdds`; EMPTY for no operands.
    pub fn intersection_all(&self, zdds: &[Zdd]) -> Zdd {
        self.fold_balanced(zdds, Zdd::EMPTY, Self::intersection)
    }

    /// Cross-union of all `zdds`; UNIT for no operands.
    pub fn cross_union_all(&self, zdds: &[Zdd]) -> Zdd {
        self.fold_balanced(zdds, Zdd::UNIT, Self::cross_union)
    }

    /// Cross-intersection of all `zdds`; UNIT for no operands.
    pub fn cross_intersection_all(&self, zdds: &[Zdd]) -> Zdd {
        self.fold_balanced(zdds, Zdd::UNIT, Self::cross_intersection)
    }
}

// ========================================================================
// Inspection
// ========================================================================

impl ZddContext {
    pub fn to_bracket_string(&self, node: &Zdd) -> String {
        let mut visited = HashSet::new();
        Self::node_to_str(node, &mut visited)
    }

    fn node_to_str(node: &Zdd, visited: &mut HashSet<usize>) -> String {
        let n = match node.node() {
            Some(n) => n,
            None if node.is_unit() => return "ε".to_string(),
            None => return "∅".to_string(),
        };

        if !visited.insert(node.addr()) {
            return format!("{}", node);
        }

        format!(
            "{}:(x{}, {}, {})",
            node,
            n.element,
            Self::node_to_str(&n.low, visited),
            Self::node_to_str(&n.high, visited),
        )
    }

    /// Iterates over the member sets of `node`, each as an increasing list of elements.
    pub fn sets(&self, node: &Zdd) -> ZddSets {
        ZddSets::new(node.clone())
    }
}

pub struct ZddSets {
    stack: Vec<(Zdd, Vec<i64>)>,
}

impl ZddSets {
    pub fn new(node: Zdd) -> Self {
        let stack = vec![(node, vec![])];
        ZddSets { stack }
    }
}

impl Iterator for ZddSets {
    type Item = Vec<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, subset)) = self.stack.pop() {
            match node.node() {
                None if node.is_unit() => return Some(subset),
                None => continue,
                Some(n) => {
                    self.stack.push((n.low.clone(), subset.clone()));

                    let mut subset = subset;
                    subset.push(n.element);
                    self.stack.push((n.high.clone(), subset));
                }
            }
        }
        None
    }
}

// ========================================================================
// Stateless Entry Points
// ========================================================================

/// `{{x}}`, built with fresh caches.
pub fn singleton(x: i64) -> Zdd {
    ZddContext::default().singleton(x)
}

/// `{{x1, x2, ...}}`, built with fresh caches.
pub fn family_of(xs: impl IntoIterator<Item = i64>) -> Zdd {
    ZddContext::default().family_of(xs)
}

pub fn union(a: &Zdd, b: &Zdd) -> Zdd {
    ZddContext::default().union(a, b)
}

pub fn union_all(zdds: &[Zdd]) -> Zdd {
    ZddContext::default().union_all(zdds)
}

pub fn intersection(a: &Zdd, b: &Zdd) -> Zdd {
    ZddContext::default().intersection(a, b)
}

pub fn intersection_all(zdds: &[Zdd]) -> Zdd {
    ZddContext::default().intersection_all(zdds)
}

pub fn difference(a: &Zdd, b: &Zdd) -> Zdd {
    ZddContext::default().difference(a, b)
}

pub fn cross_union(a: &Zdd, b: &Zdd) -> Zdd {
    ZddContext::default().cross_union(a, b)
}

pub fn cross_union_all(zdds: &[Zdd]) -> Zdd {
    ZddContext::default().cross_union_all(zdds)
}

pub fn cross_intersection(a: &Zdd, b: &Zdd) -> Zdd {
    ZddContext::default().cross_intersection(a, b)
}

pub fn cross_intersection_all(zdds: &[Zdd]) -> Zdd {
    ZddContext::default().cross_intersection_all(zdds)
}

pub fn cross_difference(a: &Zdd, b: &Zdd) -> Zdd {
    ZddContext::default().cross_difference(a, b)
}

pub fn included(a: &Zdd, b: &Zdd) -> bool {
    ZddContext::default().included(a, b)
}

pub fn equals(a: &Zdd, b: &Zdd) -> bool {
    ZddContext::default().equals(a, b)
}

pub fn size(z: &Zdd) -> u64 {
    z.size()
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    const N: i64 = 128;

    #[test]
    fn test_empty() {
        let ctx = ZddContext::default();
        assert_eq!(ctx.size(&Zdd::EMPTY), 0);
        assert_eq!(ctx.size(&Zdd::UNIT), 1);
    }

    #[test]
    fn test_equal() {
        let ctx = ZddContext::default();
        assert!(ctx.equals(&ctx.singleton(1), &ctx.singleton(1)));
        assert!(!ctx.equals(&ctx.singleton(1), &ctx.singleton(2)));
    }

    #[test]
    fn test_equal_without_node_sharing() {
        // Separate contexts never share nodes, yet the families compare equal.
        let a = ZddContext::default().family_of([1, 2, 3]);
        let b = ZddContext::default().family_of([3, 2, 1]);
        assert!(!a.ptr_eq(&b));
        assert!(equals(&a, &b));
        assert_eq!(a, b);
    }

    #[test]
    fn test_included() {
        let ctx = ZddContext::default();
        let s12 = ctx.family_of([1, 2]);
        let s13 = ctx.family_of([1, 3]);
        let u = ctx.union(&s12, &s13);

        assert!(ctx.included(&s12, &u));
        assert!(ctx.included(&s13, &u));
        assert!(!ctx.included(&u, &s12));
        assert!(!ctx.included(&u, &s13));

        assert!(ctx.included(&Zdd::EMPTY, &s12));
        assert!(!ctx.included(&Zdd::UNIT, &s12));
        assert!(ctx.included(&Zdd::UNIT, &ctx.union(&Zdd::UNIT, &s12)));
        assert!(!ctx.included(&s12, &Zdd::UNIT));
    }

    #[test]
    fn test_set() {
        let ctx = ZddContext::default();
        assert!(ctx.equals(&ctx.family_of([1, 1, 1]), &ctx.singleton(1)));
        assert!(ctx.equals(&ctx.family_of([1, 2, 3]), &ctx.family_of([3, 2, 1])));
        assert!(ctx.family_of(Vec::new()).is_unit());
        assert_eq!(ctx.sets(&ctx.family_of([3, 1, 2])).collect::<Vec<_>>(), vec![vec![1, 2, 3]]);
    }

    #[test]
    fn test_union() {
        let ctx = ZddContext::default();
        let s = |x| ctx.singleton(x);

        assert!(ctx.union_all(&[]).is_empty());
        assert!(ctx.equals(&ctx.union_all(&[s(1)]), &s(1)));
        assert!(ctx.equals(&ctx.union(&s(1), &s(1)), &s(1)));
        assert!(ctx.equals(
            &ctx.union(&Zdd::UNIT, &ctx.family_of([1])),
            &ctx.union(&ctx.family_of([1]), &Zdd::UNIT)
        ));
        assert!(ctx.equals(&ctx.union(&s(1), &s(2)), &ctx.union(&s(2), &s(1))));
        assert!(ctx.equals(
            &ctx.union(&ctx.union(&s(1), &s(2)), &s(3)),
            &ctx.union(&s(1), &ctx.union(&s(2), &s(3)))
        ));
        assert!(ctx.equals(
            &ctx.union(&ctx.union(&s(3), &s(1)), &s(2)),
            &ctx.union(&s(3), &ctx.union(&s(1), &s(2)))
        ));
        assert_eq!(ctx.size(&ctx.union(&ctx.union(&s(1), &s(2)), &s(3))), 3);
    }

    #[test]
    fn test_difference() {
        let ctx = ZddContext::default();
        let set = |xs: &[i64]| ctx.family_of(xs.iter().copied());
        let top = Zdd::UNIT;
        let bot = Zdd::EMPTY;

        assert!(ctx.equals(&ctx.difference(&ctx.union(&top, &set(&[1, 2])), &top), &set(&[1, 2])));
        assert!(ctx.equals(&ctx.difference(&top, &bot), &top));
        assert!(ctx.equals(&ctx.difference(&top, &top), &bot));
        assert!(ctx.equals(&ctx.difference(&top, &set(&[1, 2])), &top));
        assert!(ctx.equals(&ctx.difference(&bot, &set(&[1, 2])), &bot));
        assert!(ctx.equals(&ctx.difference(&set(&[1, 2]), &top), &set(&[1, 2])));
        assert!(ctx.equals(&ctx.difference(&set(&[2]), &set(&[1])), &set(&[2])));
        assert!(ctx.equals(&ctx.difference(&set(&[1, 2]), &set(&[1, 3])), &set(&[1, 2])));
        assert!(ctx.equals(&ctx.difference(&set(&[1, 2]), &set(&[1])), &set(&[1, 2])));
        assert!(ctx.equals(&ctx.difference(&set(&[1]), &set(&[1, 2])), &set(&[1])));
    }

    #[test]
    fn test_cross_difference() {
        let ctx = ZddContext::default();
        let set = |xs: &[i64]| ctx.family_of(xs.iter().copied());
        let top = Zdd::UNIT;
        let bot = Zdd::EMPTY;

        assert!(ctx.equals(&ctx.cross_difference(&set(&[1]), &set(&[2])), &set(&[1])));
        assert!(ctx.equals(&ctx.cross_difference(&set(&[2]), &set(&[1])), &set(&[2])));
        assert!(ctx.equals(&ctx.cross_difference(&bot, &bot), &bot));
        assert!(ctx.equals(&ctx.cross_difference(&top, &top), &top));
        assert!(ctx.equals(&ctx.cross_difference(&set(&[1]), &top), &set(&[1])));
        assert!(ctx.equals(&ctx.cross_difference(&set(&[1]), &set(&[1])), &top));
        assert!(ctx.equals(&ctx.cross_difference(&set(&[1, 2]), &set(&[1])), &set(&[2])));
        assert!(ctx.equals(&ctx.cross_difference(&set(&[1, 2]), &set(&[2])), &set(&[1])));
        assert!(ctx.equals(&ctx.cross_difference(&set(&[2]), &set(&[2, 3])), &top));
        assert!(ctx.equals(&ctx.cross_difference(&set(&[1, 2]), &set(&[2, 3])), &set(&[1])));
        assert!(ctx.equals(&ctx.cross_difference(&set(&[2, 3]), &set(&[1, 3])), &set(&[2])));
        assert!(ctx.equals(
            &ctx.cross_difference(&ctx.union(&set(&[1, 2]), &set(&[2, 3])), &set(&[2])),
            &ctx.union(&set(&[1]), &set(&[3]))
        ));
        assert!(ctx.equals(
            &ctx.cross_difference(&ctx.union(&set(&[1, 2, 3]), &set(&[2, 3, 4])), &set(&[2, 3])),
            &ctx.union(&set(&[1]), &set(&[4]))
        ));
        assert!(ctx.equals(
            &ctx.cross_difference(
                &ctx.union(&set(&[1, 2, 3]), &set(&[2, 3, 4])),
                &ctx.union(&set(&[2]), &set(&[3]))
            ),
            &ctx.union_all(&[set(&[1, 3]), set(&[2, 4]), set(&[1, 2]), set(&[3, 4])])
        ));
        assert!(ctx.equals(
            &ctx.cross_difference(&set(&[1, 2, 3, 4]), &ctx.union(&set(&[2]), &set(&[3]))),
            &ctx.union(&set(&[1, 3, 4]), &set(&[1, 2, 4]))
        ));
    }

    #[test]
    fn test_intersection() {
        let ctx = ZddContext::default();
        let set = |xs: &[i64]| ctx.family_of(xs.iter().copied());
        let top = Zdd::UNIT;
        let bot = Zdd::EMPTY;

        assert!(ctx.equals(&bot, &ctx.intersection(&set(&[1]), &top)));
        assert!(ctx.equals(&bot, &ctx.intersection(&set(&[1]), &set(&[2]))));

        assert!(ctx.equals(&set(&[1]), &ctx.intersection(&set(&[1]), &set(&[1]))));
        assert!(ctx.equals(&set(&[1, 2]), &ctx.intersection(&set(&[1, 2]), &set(&[1, 2]))));
        assert!(ctx.equals(&set(&[1, 2, 3]), &ctx.intersection(&set(&[1, 2, 3]), &set(&[1, 2, 3]))));

        assert!(ctx.equals(
            &ctx.union(&top, &set(&[1])),
            &ctx.intersection(
                &ctx.union_all(&[set(&[1]), set(&[2]), top.clone()]),
                &ctx.union_all(&[set(&[1]), set(&[3]), top.clone()])
            )
        ));
        assert!(ctx.equals(
            &set(&[1]),
            &ctx.intersection(&ctx.union(&set(&[1]), &set(&[2])), &ctx.union(&set(&[1]), &set(&[3])))
        ));
        assert!(ctx.equals(
            &set(&[1, 2]),
            &ctx.intersection(
                &ctx.union(&set(&[1, 2]), &set(&[2, 3])),
                &ctx.union(&set(&[1, 2]), &set(&[3, 4]))
            )
        ));
        assert!(ctx.equals(
            &bot,
            &ctx.intersection(
                &ctx.union(&set(&[1, 2]), &set(&[2, 3])),
                &ctx.union(&set(&[3, 4]), &set(&[5, 6]))
            )
        ));
    }

    #[test]
    fn test_intersection_commutative_associative() {
        let ctx = ZddContext::default();
        let set = |xs: &[i64]| ctx.family_of(xs.iter().copied());

        for l in 0..N {
            let a = ctx.union(&set(&[l, l + 2]), &set(&[l, l + 3]));
            let b = ctx.union(&set(&[l, l + 1]), &set(&[l, l + 2]));
            assert!(ctx.equals(&ctx.intersection(&a, &b), &ctx.intersection(&b, &a)), "commutativity {}", l);
        }

        for l in 0..N {
            let z1 = ctx.union_all(&[set(&[l, l + 1]), set(&[l, l + 2]), set(&[l, l + 3])]);
            let z2 = ctx.union_all(&[set(&[l, l + 2]), set(&[l, l + 3]), set(&[l, l + 4])]);
            let z3 = ctx.union_all(&[set(&[l, l + 3]), set(&[l, l + 4]), set(&[l, l + 5])]);

            assert!(
                ctx.equals(
                    &ctx.intersection(&ctx.intersection(&z1, &z2), &z3),
                    &ctx.intersection(&z1, &ctx.intersection(&z2, &z3))
                ),
                "associativity {}",
                l
            );
        }
    }

    #[test]
    fn test_absorption() {
        let ctx = ZddContext::default();
        let set = |xs: &[i64]| ctx.family_of(xs.iter().copied());
        let a = ctx.union(&set(&[1]), &set(&[1, 2]));
        let b = ctx.union(&set(&[2]), &set(&[3]));
        let c = ctx.union(&set(&[3]), &set(&[4, 5]));

        // (a ∪ b) ∩ (a ∪ c) == a ∪ (b ∩ c)
        let lhs = ctx.intersection(&ctx.union(&a, &b), &ctx.union(&a, &c));
        let rhs = ctx.union(&a, &ctx.intersection(&b, &c));
        assert!(ctx.equals(&lhs, &rhs));
        assert!(ctx.equals(&ctx.intersection(&a, &a), &a));
    }

    #[test]
    fn test_cross_union() {
        let ctx = ZddContext::default();
        let set = |xs: &[i64]| ctx.family_of(xs.iter().copied());

        assert!(ctx.equals(&ctx.union_all(&[set(&[1, 2, 3, 4])]), &ctx.cross_union(&set(&[1, 3]), &set(&[2, 4]))));
        assert!(ctx.equals(
            &ctx.union_all(&[set(&[1, 3]), set(&[1, 4]), set(&[2, 3]), set(&[2, 4])]),
            &ctx.cross_union(&ctx.union(&set(&[1]), &set(&[2])), &ctx.union(&set(&[3]), &set(&[4])))
        ));
        assert!(ctx.equals(
            &ctx.union(&set(&[1, 3]), &set(&[1, 4])),
            &ctx.difference(
                &ctx.union_all(&[
                    set(&[1, 3]),
                    ctx.cross_union(&ctx.singleton(2), &ctx.singleton(5)),
                    set(&[1, 4])
                ]),
                &set(&[2, 5])
            )
        ));
        assert!(ctx.cross_union_all(&[]).is_unit());
    }

    #[test]
    fn test_cross_intersection() {
        let ctx = ZddContext::default();
        let set = |xs: &[i64]| ctx.family_of(xs.iter().copied());
        let top = Zdd::UNIT;

        assert!(ctx.equals(&top, &ctx.cross_intersection_all(&[])));
        assert!(ctx.equals(&top, &ctx.cross_intersection(&set(&[1]), &set(&[2]))));
        assert!(ctx.equals(&set(&[2]), &ctx.cross_intersection(&set(&[1, 2]), &set(&[2, 3]))));
        assert!(ctx.equals(
            &ctx.union(&set(&[2]), &set(&[3])),
            &ctx.cross_intersection(&ctx.union(&set(&[1, 2]), &set(&[3, 4])), &set(&[2, 3]))
        ));
        assert!(ctx.equals(
            &ctx.union_all(&[top.clone(), set(&[2]), set(&[3]), set(&[3, 4]), set(&[5])]),
            &ctx.cross_intersection(
                &ctx.union_all(&[set(&[1, 2]), set(&[3, 4]), set(&[5, 7])]),
                &ctx.union(&set(&[2, 3]), &set(&[3, 4, 5]))
            )
        ));
        assert!(ctx.equals(&set(&[0]), &ctx.cross_intersection(&set(&[0]), &set(&[0, 1]))));
        assert!(ctx.equals(
            &ctx.union(&set(&[0]), &set(&[1])),
            &ctx.union(
                &ctx.cross_intersection(&set(&[0]), &set(&[0, 1])),
                &ctx.cross_intersection(&set(&[1]), &set(&[0, 1]))
            )
        ));
    }

    #[test]
    fn test_negative_elements() {
        let ctx = ZddContext::default();
        let z = ctx.family_of([-5, 3, i64::MIN, i64::MAX]);
        assert_eq!(ctx.sets(&z).collect::<Vec<_>>(), vec![vec![i64::MIN, -5, 3, i64::MAX]]);
    }

    #[test]
    fn test_count_and_sets() {
        let ctx = ZddContext::default();
        let f = ctx.union_all(&[ctx.family_of([1]), ctx.family_of([2, 3]), ctx.family_of([3])]);
        assert_eq!(ctx.size(&f), 3);
        assert_eq!(ctx.count(&f), BigUint::from(3u32));

        let mut sets: Vec<Vec<i64>> = ctx.sets(&f).collect();
        sets.sort();
        assert_eq!(sets, vec![vec![1], vec![2, 3], vec![3]]);
    }

    #[test]
    fn test_count_large_power_set() {
        let ctx = ZddContext::default();
        // Power set of 70 elements: 2^70 sets, overflows u64.
        let singles: Vec<Zdd> = (0..70).map(|x| ctx.union(&Zdd::UNIT, &ctx.singleton(x))).collect();
        let power = ctx.cross_union_all(&singles);
        assert_eq!(ctx.count(&power), BigUint::from(1u32) << 70);
        assert_eq!(ctx.size(&power), u64::MAX);
    }

    #[test]
    fn test_mk_node_zero_suppression() {
        let ctx = ZddContext::default();
        let low = ctx.singleton(2);
        assert!(ctx.mk_node(1, low.clone(), Zdd::EMPTY).ptr_eq(&low));
    }

    #[test]
    fn test_mk_node_reuses_cached() {
        let ctx = ZddContext::default();
        let a = ctx.singleton(1);
        let b = ctx.singleton(1);
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn test_bracket_string() {
        let ctx = ZddContext::default();
        assert_eq!(ctx.to_bracket_string(&Zdd::EMPTY), "∅");
        assert_eq!(ctx.to_bracket_string(&Zdd::UNIT), "ε");
        let s = ctx.to_bracket_string(&ctx.singleton(1));
        assert!(s.ends_with(":(x1, ∅, ε)"), "{}", s);
    }

    #[test]
    fn test_stateless_entry_points() {
        let a = family_of([1, 3]);
        let b = family_of([2, 4]);
        assert!(equals(&cross_union(&a, &b), &family_of([1, 2, 3, 4])));
        assert!(equals(&cross_difference(&singleton(1), &singleton(1)), &Zdd::UNIT));
        assert!(equals(&cross_difference(&family_of([1, 2]), &singleton(1)), &singleton(2)));
        assert!(included(&a, &union(&a, &b)));
        assert_eq!(size(&union_all(&[a.clone(), b.clone(), a])), 2);
    }
}
