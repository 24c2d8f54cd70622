use std::fmt::{Display, Formatter};

use crate::tree::Tree;

/// A weighted observation: `coefficient` occurrences of every tree of `tree`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub coefficient: i64,
    pub tree: Tree,
}

impl Term {
    pub fn new(coefficient: i64, tree: Tree) -> Self {
        Self { coefficient, tree }
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "( times {} {} )", self.coefficient, self.tree)
    }
}
