//! # zcube: Cubes over Zero-Suppressed Decision Diagrams
//!
//! **`zcube`** aggregates large streams of weighted, hierarchically labelled observations
//! into a single compact total that can be queried at any level of every hierarchy.
//!
//! ## How it works
//!
//! - A **ZDD** ([`Zdd`][crate::reference::Zdd]) represents a family of finite sets of integers as a shared DAG.
//!   Nodes are immutable and shared between threads, but *not* globally canonical: every computation
//!   owns its own small caches ([`ZddContext`][crate::zdd::ZddContext]), so no table is ever shared or locked.
//! - A **number** ([`Number`][crate::number::Number]) is a chain of ZDD digits in base −2. It stores an
//!   integer weight for every set at once, and two numbers are added with a handful of set operations per digit.
//! - A **tree generator** ([`Tree`][crate::tree::Tree]) describes members of dimension hierarchies.
//!   Its labels are hashed into integers, and its prefixes become sets.
//! - The **reduction engine** ([`cube`]) folds `(coefficient, tree)` terms into one number, in parallel.
//!
//! ## Basic Usage
//!
//! ```rust
//! use zcube::cube::{p_sum_subtrees, ReduceConfig};
//! use zcube::term::Term;
//! use zcube::tree::Tree;
//! use zcube::zdd::ZddContext;
//!
//! // 1. Observations: 3 sales of product a/b, 4 sales of product a/c
//! let terms = vec![
//!     Term::new(3, Tree::path(["a", "b"])),
//!     Term::new(4, Tree::path(["a", "c"])),
//! ];
//!
//! // 2. Fold them in parallel
//! let total = p_sum_subtrees(&ReduceConfig::default(), terms).unwrap();
//!
//! // 3. Query at any level of the hierarchy
//! let ctx = ZddContext::default();
//! assert_eq!(ctx.negabinary_value(&total, &ctx.trees(&Tree::path(["a"]))), 7);
//! assert_eq!(ctx.negabinary_value(&total, &ctx.trees(&Tree::path(["a", "b"]))), 3);
//! ```
//!
//! ## Core Components
//!
//! - **[`zdd`]**: The set algebra: union, intersection, difference and their cross variants.
//! - **[`number`]**: Binary and negabinary numbers over ZDD digits.
//! - **[`tree`]**: Tree generators and their evaluation to ZDDs.
//! - **[`cube`]**: Sequential and parallel reductions.
//! - **[`codec`]**: The binary stream format of terms.

pub mod cache;
pub mod codec;
pub mod cube;
pub mod error;
pub mod node;
pub mod number;
pub mod reference;
pub mod term;
pub mod tree;
pub mod utils;
pub mod zdd;
