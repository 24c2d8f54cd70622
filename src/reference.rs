use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::cache::PredicateCache;
use crate::node::Node;
use crate::zdd;

/// A shared handle to a ZDD.
///
/// Cloning a handle is cheap (a reference-count bump for inner nodes).
/// Handles are `Send + Sync`: a finished ZDD can be shared read-only between
/// threads, only the caches used to build new ZDDs are thread-local.
///
/// # Terminal Values
///
/// - [`Zdd::EMPTY`] (⊥): the empty family, with no sets
/// - [`Zdd::UNIT`] (⊤): the family containing only the empty set, {∅}
///
/// # Equality
///
/// [`Zdd::ptr_eq`] compares *identities*. Since nodes are not globally
/// canonical, two different handles may denote the same family; `==` performs
/// the memoized structural comparison instead.
#[derive(Clone)]
pub struct Zdd(Repr);

#[derive(Clone)]
enum Repr {
    Empty,
    Unit,
    Node(Arc<Node>),
}

impl Zdd {
    /// Empty family (⊥): contains no sets.
    pub const EMPTY: Zdd = Zdd(Repr::Empty);

    /// Family containing only the empty set (⊤): {∅}.
    pub const UNIT: Zdd = Zdd(Repr::Unit);

    const EMPTY_HASH: u64 = 1;
    const UNIT_HASH: u64 = 2;

    pub(crate) fn from_node(node: Node) -> Self {
        Zdd(Repr::Node(Arc::new(node)))
    }

    /// Returns true if this is the empty family.
    pub fn is_empty(&self) -> bool {
        matches!(self.0, Repr::Empty)
    }

    /// Returns true if this is the {∅} family.
    pub fn is_unit(&self) -> bool {
        matches!(self.0, Repr::Unit)
    }

    /// Returns true if this is a terminal (EMPTY or UNIT).
    pub fn is_terminal(&self) -> bool {
        !matches!(self.0, Repr::Node(_))
    }

    /// Access the inner node, if any.
    pub fn node(&self) -> Option<&Node> {
        match &self.0 {
            Repr::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Returns the element at the root, or `None` for terminals.
    pub fn top(&self) -> Option<i64> {
        self.node().map(|node| node.element)
    }

    /// Structural hash: equal families always have equal hashes.
    pub fn hash(&self) -> u64 {
        match &self.0 {
            Repr::Empty => Self::EMPTY_HASH,
            Repr::Unit => Self::UNIT_HASH,
            Repr::Node(node) => node.hash(),
        }
    }

    /// Number of sets in the family, saturating at `u64::MAX`.
    ///
    /// The count is computed once, when the node is built.
    pub fn size(&self) -> u64 {
        match &self.0 {
            Repr::Empty => 0,
            Repr::Unit => 1,
            Repr::Node(node) => node.size(),
        }
    }

    /// Identity comparison: true iff both handles point to the same node
    /// (or are the same terminal).
    pub fn ptr_eq(&self, other: &Zdd) -> bool {
        match (&self.0, &other.0) {
            (Repr::Empty, Repr::Empty) => true,
            (Repr::Unit, Repr::Unit) => true,
            (Repr::Node(a), Repr::Node(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Address of the underlying node, used as identity key in per-call memo tables.
    pub(crate) fn addr(&self) -> usize {
        match &self.0 {
            Repr::Empty => Self::EMPTY_HASH as usize,
            Repr::Unit => Self::UNIT_HASH as usize,
            Repr::Node(node) => Arc::as_ptr(node) as usize,
        }
    }
}

impl Default for Zdd {
    fn default() -> Self {
        Zdd::EMPTY
    }
}

impl PartialEq for Zdd {
    fn eq(&self, other: &Self) -> bool {
        zdd::equals_with(&mut PredicateCache::new(6), self, other)
    }
}

impl Eq for Zdd {}

impl Hash for Zdd {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(Zdd::hash(self));
    }
}

impl Display for Zdd {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Repr::Empty => write!(f, "⊥"),
            Repr::Unit => write!(f, "⊤"),
            Repr::Node(node) => write!(f, "#{:08x}", node.hash() as u32),
        }
    }
}

impl Debug for Zdd {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Repr::Node(node) => write!(f, "Zdd({}: x{}, size {})", self, node.element, node.size()),
            _ => write!(f, "Zdd({})", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminals() {
        assert!(Zdd::EMPTY.is_empty());
        assert!(Zdd::EMPTY.is_terminal());
        assert!(!Zdd::EMPTY.is_unit());
        assert_eq!(Zdd::EMPTY.size(), 0);

        assert!(Zdd::UNIT.is_unit());
        assert!(Zdd::UNIT.is_terminal());
        assert!(!Zdd::UNIT.is_empty());
        assert_eq!(Zdd::UNIT.size(), 1);
    }

    #[test]
    fn test_terminal_identity() {
        assert!(Zdd::EMPTY.ptr_eq(&Zdd::EMPTY));
        assert!(Zdd::UNIT.ptr_eq(&Zdd::UNIT.clone()));
        assert!(!Zdd::EMPTY.ptr_eq(&Zdd::UNIT));
        assert_ne!(Zdd::EMPTY, Zdd::UNIT);
    }

    #[test]
    fn test_distinct_nodes_same_value() {
        let hash = Node::compute_hash(3, &Zdd::EMPTY, &Zdd::UNIT);
        let a = Zdd::from_node(Node::new(3, Zdd::EMPTY, Zdd::UNIT, hash));
        let b = Zdd::from_node(Node::new(3, Zdd::EMPTY, Zdd::UNIT, hash));

        // Not the same object, but the same family.
        assert!(!a.ptr_eq(&b));
        assert!(a.ptr_eq(&a.clone()));
        assert_eq!(a, b);
        assert_eq!(a.top(), Some(3));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Zdd::EMPTY), "⊥");
        assert_eq!(format!("{}", Zdd::UNIT), "⊤");
    }
}
