//! Generator algebra of labelled trees.
//!
//! A [`Tree`] describes a family of labelled rooted trees, such as the members
//! of a dimension hierarchy:
//!
//! - `empty()` generates no tree at all,
//! - `unit()` generates the empty tree,
//! - `prefix(label, t)` roots every tree of `t` under a node labelled `label`,
//! - `cross([t1, t2, ...])` merges one tree of each `ti` in every possible way,
//! - `sum([t1, t2, ...])` gathers the trees of every `ti`.
//!
//! Every labelled node gets a 64-bit identity by hashing its label together
//! with the identity of its parent ([`djb2`]), so equal labels at different
//! positions stay distinct. A generated tree is then a set of identities, and
//! a generator evaluates to a ZDD: [`trees`](ZddContext::trees) holds the
//! complete trees, [`subtrees`](ZddContext::subtrees) additionally holds every
//! prefix of them, down to the empty tree.
//!
//! Evaluation and hashing walk the expression with an explicit stack instead
//! of recursing along it.

use std::fmt::{Display, Formatter};

use crate::reference::Zdd;
use crate::utils::djb2;
use crate::zdd::ZddContext;

/// Seed of the root of every tree.
pub const ROOT_SEED: u64 = 1;

/// Generator expression of labelled trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tree {
    Empty,
    Unit,
    Prefix(String, Box<Tree>),
    Cross(Vec<Tree>),
    Sum(Vec<Tree>),
}

impl Tree {
    pub fn empty() -> Tree {
        Tree::Empty
    }

    pub fn unit() -> Tree {
        Tree::Unit
    }

    pub fn prefix(label: impl Into<String>, tree: Tree) -> Tree {
        Tree::Prefix(label.into(), Box::new(tree))
    }

    /// Nests `tree` under the chain of `labels`, outermost first.
    pub fn prefix_path<S: Into<String>>(labels: impl IntoIterator<Item = S>, tree: Tree) -> Tree {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        labels.into_iter().rev().fold(tree, |inner, label| Tree::prefix(label, inner))
    }

    /// The single chain `labels[0] → labels[1] → ...`.
    pub fn path<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Tree {
        Tree::prefix_path(labels, Tree::Unit)
    }

    pub fn cross(trees: impl IntoIterator<Item = Tree>) -> Tree {
        Tree::Cross(trees.into_iter().collect())
    }

    pub fn sum(trees: impl IntoIterator<Item = Tree>) -> Tree {
        Tree::Sum(trees.into_iter().collect())
    }

    /// Resolves every label to its identity, starting from [`ROOT_SEED`].
    pub fn hashed(&self) -> HashedTree {
        enum Step<'a> {
            Visit(&'a Tree, u64),
            Node(u64),
            Cross(usize),
            Sum(usize),
        }

        let mut work = vec![Step::Visit(self, ROOT_SEED)];
        let mut done: Vec<HashedTree> = Vec::new();

        while let Some(step) = work.pop() {
            match step {
                Step::Visit(tree, seed) => match tree {
                    Tree::Empty => done.push(HashedTree::Empty),
                    Tree::Unit => done.push(HashedTree::Unit),
                    Tree::Prefix(label, inner) => {
                        let id = djb2(seed, label);
                        work.push(Step::Node(id));
                        work.push(Step::Visit(inner, id));
                    }
                    Tree::Cross(trees) => {
                        work.push(Step::Cross(trees.len()));
                        work.extend(trees.iter().rev().map(|t| Step::Visit(t, seed)));
                    }
                    Tree::Sum(trees) => {
                        work.push(Step::Sum(trees.len()));
                        work.extend(trees.iter().rev().map(|t| Step::Visit(t, seed)));
                    }
                },
                Step::Node(id) => {
                    let inner = done.pop().unwrap_or(HashedTree::Empty);
                    done.push(HashedTree::Node(id, Box::new(inner)));
                }
                Step::Cross(n) => {
                    let children = done.split_off(done.len() - n);
                    done.push(HashedTree::Cross(children));
                }
                Step::Sum(n) => {
                    let children = done.split_off(done.len() - n);
                    done.push(HashedTree::Sum(children));
                }
            }
        }

        debug_assert_eq!(done.len(), 1);
        done.pop().unwrap_or(HashedTree::Empty)
    }
}

impl Display for Tree {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write_sexp(self, f)
    }
}

impl Sexp for Tree {
    fn open(&self, f: &mut Formatter<'_>) -> Result<Option<&[Tree]>, std::fmt::Error> {
        match self {
            Tree::Empty => f.write_str("bot").map(|_| None),
            Tree::Unit => f.write_str("top").map(|_| None),
            Tree::Prefix(label, inner) => {
                write!(f, "( prefix \"{}\"", label)?;
                Ok(Some(std::slice::from_ref(&**inner)))
            }
            Tree::Cross(trees) => f.write_str("( cross").map(|_| Some(trees.as_slice())),
            Tree::Sum(trees) => f.write_str("( sum").map(|_| Some(trees.as_slice())),
        }
    }
}

impl Drop for Tree {
    fn drop(&mut self) {
        fn detach(tree: &mut Tree, stack: &mut Vec<Tree>) {
            match tree {
                Tree::Prefix(_, inner) => stack.push(std::mem::replace(&mut **inner, Tree::Unit)),
                Tree::Cross(trees) | Tree::Sum(trees) => stack.append(trees),
                Tree::Empty | Tree::Unit => {}
            }
        }

        // Children are dropped from a heap stack, so that deep trees do not exhaust the call stack.
        let mut stack = Vec::new();
        detach(self, &mut stack);
        while let Some(mut tree) = stack.pop() {
            detach(&mut tree, &mut stack);
        }
    }
}

/// A [`Tree`] whose labels were already resolved to identities.
///
/// Evaluates to the same families as the tree it was hashed from, without
/// hashing labels again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashedTree {
    Empty,
    Unit,
    Node(u64, Box<HashedTree>),
    Cross(Vec<HashedTree>),
    Sum(Vec<HashedTree>),
}

impl Display for HashedTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write_sexp(self, f)
    }
}

impl Sexp for HashedTree {
    fn open(&self, f: &mut Formatter<'_>) -> Result<Option<&[HashedTree]>, std::fmt::Error> {
        match self {
            HashedTree::Empty => f.write_str("bot").map(|_| None),
            HashedTree::Unit => f.write_str("top").map(|_| None),
            HashedTree::Node(id, inner) => {
                write!(f, "( node {}", id)?;
                Ok(Some(std::slice::from_ref(&**inner)))
            }
            HashedTree::Cross(trees) => f.write_str("( cross").map(|_| Some(trees.as_slice())),
            HashedTree::Sum(trees) => f.write_str("( sum").map(|_| Some(trees.as_slice())),
        }
    }
}

impl Drop for HashedTree {
    fn drop(&mut self) {
        fn detach(tree: &mut HashedTree, stack: &mut Vec<HashedTree>) {
            match tree {
                HashedTree::Node(_, inner) => stack.push(std::mem::replace(&mut **inner, HashedTree::Unit)),
                HashedTree::Cross(trees) | HashedTree::Sum(trees) => stack.append(trees),
                HashedTree::Empty | HashedTree::Unit => {}
            }
        }

        let mut stack = Vec::new();
        detach(self, &mut stack);
        while let Some(mut tree) = stack.pop() {
            detach(&mut tree, &mut stack);
        }
    }
}

/// S-expression printing of a generator.
trait Sexp: Sized {
    /// Writes the head of the node, and returns its children unless it is a leaf.
    fn open(&self, f: &mut Formatter<'_>) -> Result<Option<&[Self]>, std::fmt::Error>;
}

fn write_sexp<T: Sexp>(root: &T, f: &mut Formatter<'_>) -> std::fmt::Result {
    enum Token<'a, T> {
        Tree(&'a T),
        Text(&'static str),
    }

    let mut stack = vec![Token::Tree(root)];
    while let Some(token) = stack.pop() {
        match token {
            Token::Text(text) => f.write_str(text)?,
            Token::Tree(tree) => {
                if let Some(children) = tree.open(f)? {
                    stack.push(Token::Text(" )"));
                    for child in children.iter().rev() {
                        stack.push(Token::Tree(child));
                        stack.push(Token::Text(" "));
                    }
                }
            }
        }
    }
    Ok(())
}

/// One step of a generator, as seen by the evaluator.
pub enum Shape<'a, T> {
    Empty,
    Unit,
    /// A labelled node with its identity and its inner generator.
    Node(u64, &'a T),
    Cross(&'a [T]),
    Sum(&'a [T]),
}

/// A generator expression that can be evaluated to ZDDs.
pub trait Generator: Sized {
    /// Unfolds the top of the expression, given the identity of its parent.
    fn shape(&self, seed: u64) -> Shape<'_, Self>;
}

impl Generator for Tree {
    fn shape(&self, seed: u64) -> Shape<'_, Self> {
        match self {
            Tree::Empty => Shape::Empty,
            Tree::Unit => Shape::Unit,
            Tree::Prefix(label, inner) => Shape::Node(djb2(seed, label), inner),
            Tree::Cross(trees) => Shape::Cross(trees),
            Tree::Sum(trees) => Shape::Sum(trees),
        }
    }
}

impl Generator for HashedTree {
    fn shape(&self, _seed: u64) -> Shape<'_, Self> {
        match self {
            HashedTree::Empty => Shape::Empty,
            HashedTree::Unit => Shape::Unit,
            HashedTree::Node(id, inner) => Shape::Node(*id, inner),
            HashedTree::Cross(trees) => Shape::Cross(trees),
            HashedTree::Sum(trees) => Shape::Sum(trees),
        }
    }
}

impl ZddContext {
    /// The family of complete trees generated by `tree`.
    pub fn trees<T: Generator>(&self, tree: &T) -> Zdd {
        self.evaluate(tree, false)
    }

    /// The family of every prefix of every tree generated by `tree`,
    /// including the empty tree.
    pub fn subtrees<T: Generator>(&self, tree: &T) -> Zdd {
        self.evaluate(tree, true)
    }

    /// The prefixes of `tree` that belong to `filter`.
    pub fn filtered_subtrees<T: Generator>(&self, filter: &Zdd, tree: &T) -> Zdd {
        self.intersection(filter, &self.subtrees(tree))
    }

    /// Union of the complete trees of every generator.
    pub fn union_trees<T: Generator>(&self, trees: &[T]) -> Zdd {
        let zdds: Vec<Zdd> = trees.iter().map(|t| self.trees(t)).collect();
        self.union_all(&zdds)
    }

    fn evaluate<T: Generator>(&self, tree: &T, prefixes: bool) -> Zdd {
        enum Step<'a, T> {
            Visit(&'a T, u64),
            Node(u64),
            Cross(usize),
            Sum(usize),
        }

        let mut work = vec![Step::Visit(tree, ROOT_SEED)];
        let mut done: Vec<Zdd> = Vec::new();

        while let Some(step) = work.pop() {
            match step {
                Step::Visit(t, seed) => match t.shape(seed) {
                    Shape::Empty => done.push(Zdd::EMPTY),
                    Shape::Unit => done.push(Zdd::UNIT),
                    Shape::Node(id, inner) => {
                        work.push(Step::Node(id));
                        work.push(Step::Visit(inner, id));
                    }
                    Shape::Cross(trees) => {
                        work.push(Step::Cross(trees.len()));
                        work.extend(trees.iter().rev().map(|t| Step::Visit(t, seed)));
                    }
                    Shape::Sum(trees) => {
                        work.push(Step::Sum(trees.len()));
                        work.extend(trees.iter().rev().map(|t| Step::Visit(t, seed)));
                    }
                },
                Step::Node(id) => {
                    let inner = done.pop().unwrap_or(Zdd::EMPTY);
                    let rooted = self.cross_union(&self.singleton(id as i64), &inner);
                    done.push(if prefixes { self.union(&Zdd::UNIT, &rooted) } else { rooted });
                }
                Step::Cross(n) => {
                    let children = done.split_off(done.len() - n);
                    done.push(self.cross_union_all(&children));
                }
                Step::Sum(n) => {
                    let children = done.split_off(done.len() - n);
                    done.push(self.union_all(&children));
                }
            }
        }

        debug_assert_eq!(done.len(), 1);
        done.pop().unwrap_or(Zdd::EMPTY)
    }
}

/// Complete trees of `tree`, with fresh caches.
pub fn trees<T: Generator>(tree: &T) -> Zdd {
    ZddContext::default().trees(tree)
}

/// Prefixes of `tree`, with fresh caches.
pub fn subtrees<T: Generator>(tree: &T) -> Zdd {
    ZddContext::default().subtrees(tree)
}

/// Prefixes of `tree` that belong to `filter`, with fresh caches.
pub fn filtered_subtrees<T: Generator>(filter: &Zdd, tree: &T) -> Zdd {
    ZddContext::default().filtered_subtrees(filter, tree)
}

/// Union of the complete trees of every generator, with fresh caches.
pub fn union_trees<T: Generator>(trees: &[T]) -> Zdd {
    ZddContext::default().union_trees(trees)
}
