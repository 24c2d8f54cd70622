//! End-to-end aggregation tests.
//!
//! Numbers are accumulated over the prefixes of dimension paths, then
//! projected back on single members.

use zcube::cube::{self, ReduceConfig};
use zcube::number::{self, Number};
use zcube::reference::Zdd;
use zcube::term::Term;
use zcube::tree::Tree;
use zcube::zdd::ZddContext;

const N: i64 = 100;

const LEAVES: [&str; 5] = ["b", "c", "d", "e", "f"];

// ─── Sequential Numbers ────────────────────────────────────────────────────────

#[test]
fn trees_binary_cross() {
    let ctx = ZddContext::default();
    let z0 = ctx.subtrees(&Tree::cross([Tree::path(["a", "b"]), Tree::path(["a", "c"])]));
    let z1 = ctx.trees(&Tree::path(["a"]));
    let z2 = ctx.trees(&Tree::path(["a", "b"]));
    let z3 = ctx.trees(&Tree::path(["a", "c"]));

    let mut zn = Number::ZERO;
    let mut n = 0;
    for i in 0..N {
        n += i;
        zn = ctx.binary_add(&zn, &Number::binary(i, &z0));
    }

    for z in [&z0, &z1, &z2, &z3] {
        assert_eq!(ctx.binary_value(&zn, z), n);
    }
}

#[test]
fn trees_negabinary_cross() {
    let ctx = ZddContext::default();
    let z0 = ctx.subtrees(&Tree::cross([Tree::path(["a", "b"]), Tree::path(["a", "c"])]));
    let z1 = ctx.subtrees(&Tree::path(["a"]));
    let z2 = ctx.subtrees(&Tree::path(["a", "b"]));
    let z3 = ctx.subtrees(&Tree::path(["a", "c"]));

    let mut zn = Number::ZERO;
    let mut n = 0;
    for i in 0..N {
        n += i;
        zn = ctx.negabinary_add(&zn, &Number::negabinary(i, &z0));
    }

    for z in [&z0, &z1, &z2, &z3] {
        assert_eq!(ctx.negabinary_value(&zn, z), n);
    }
}

#[test]
fn trees_binary_siblings() {
    let ctx = ZddContext::default();
    let families: Vec<Zdd> = LEAVES.iter().map(|leaf| ctx.subtrees(&Tree::path(["a", *leaf]))).collect();

    let mut zn = Number::ZERO;
    let mut n = 0;
    for i in 0..N {
        n += i;
        for z in &families {
            zn = ctx.binary_add(&zn, &Number::binary(i, z));
        }
    }

    assert_eq!(ctx.binary_value(&zn, &ctx.trees(&Tree::path(["a"]))), 5 * n);
    for leaf in LEAVES {
        assert_eq!(ctx.binary_value(&zn, &ctx.trees(&Tree::path(["a", leaf]))), n);
    }
}

#[test]
fn trees_negabinary_siblings() {
    let ctx = ZddContext::default();
    let families: Vec<Zdd> = LEAVES.iter().map(|leaf| ctx.subtrees(&Tree::path(["a", *leaf]))).collect();

    let mut zn = Number::ZERO;
    let mut n = 0;
    for i in 0..N {
        n += i;
        for z in &families {
            zn = ctx.negabinary_add(&zn, &Number::negabinary(i, z));
        }
    }

    assert_eq!(ctx.negabinary_value(&zn, &ctx.trees(&Tree::path(["a"]))), 5 * n);
    for leaf in LEAVES {
        assert_eq!(ctx.negabinary_value(&zn, &ctx.trees(&Tree::path(["a", leaf]))), n);
    }
}

// ─── Parallel Numbers ──────────────────────────────────────────────────────────

#[test]
fn trees_negabinary_parallel() {
    let ctx = ZddContext::default();
    let families: Vec<Zdd> = LEAVES.iter().map(|leaf| ctx.subtrees(&Tree::path(["a", *leaf]))).collect();

    let mut numbers = Vec::new();
    let mut n = 0;
    for i in 0..N {
        n += i;
        for z in &families {
            numbers.push(Number::negabinary(i, z));
        }
    }

    let zn = number::p_sum(&numbers, Default::default());

    assert_eq!(ctx.negabinary_value(&zn, &ctx.trees(&Tree::path(["a"]))), 5 * n);
    for leaf in LEAVES {
        assert_eq!(ctx.negabinary_value(&zn, &ctx.trees(&Tree::path(["a", leaf]))), n);
    }
}

// ─── Reduction Engine ──────────────────────────────────────────────────────────

fn sibling_terms() -> Vec<Term> {
    let mut terms = Vec::new();
    for i in 0..N {
        for leaf in LEAVES {
            terms.push(Term::new(i, Tree::path(["a", leaf])));
        }
    }
    terms
}

#[test]
fn reduction_totals() {
    let n: i64 = (0..N).sum();
    let config = ReduceConfig::default().with_workers(4);
    let total = cube::p_sum_subtrees(&config, sibling_terms()).unwrap();

    let ctx = ZddContext::default();
    assert_eq!(ctx.negabinary_value(&total, &ctx.trees(&Tree::path(["a"]))), 5 * n);
    for leaf in LEAVES {
        assert_eq!(ctx.negabinary_value(&total, &ctx.trees(&Tree::path(["a", leaf]))), n);
    }
    assert_eq!(ctx.negabinary_value(&total, &ctx.trees(&Tree::path(["b"]))), 0);
}

#[test]
fn reduction_is_order_independent() {
    let forward = sibling_terms();
    let mut backward = sibling_terms();
    backward.reverse();
    // Interleave so that consecutive terms hit different leaves.
    let mut strided = Vec::new();
    for k in 0..7 {
        strided.extend(sibling_terms().into_iter().skip(k).step_by(7));
    }
    assert_eq!(strided.len(), forward.len());

    let config = ReduceConfig::default().with_workers(3).with_accumulators_per_worker(3);
    let a = cube::p_sum_subtrees(&config, forward).unwrap();
    let b = cube::p_sum_subtrees(&config, backward).unwrap();
    let c = cube::p_sum_subtrees(&config, strided).unwrap();

    assert_eq!(a, b);
    assert_eq!(a, c);
    assert_eq!(a, cube::sum_subtrees(sibling_terms()));
}

#[test]
fn reduction_cancels_out() {
    let mut terms = sibling_terms();
    terms.extend(sibling_terms().into_iter().map(|t| Term::new(-t.coefficient, t.tree)));

    let config = ReduceConfig::default().with_workers(2);
    let total = cube::p_sum_subtrees(&config, terms).unwrap();
    assert!(total.is_zero());
}

#[test]
fn reduction_with_hashed_filter() {
    let ctx = ZddContext::default();
    let filter = ctx.union_trees(&[Tree::path(["a"]).hashed(), Tree::path(["a", "b"]).hashed()]);

    let config = ReduceConfig::default().with_workers(2);
    let total = cube::p_sum_subtrees_filtered(&config, &filter, sibling_terms()).unwrap();

    let n: i64 = (0..N).sum();
    assert_eq!(ctx.negabinary_value(&total, &ctx.trees(&Tree::path(["a"]))), 5 * n);
    assert_eq!(ctx.negabinary_value(&total, &ctx.trees(&Tree::path(["a", "b"]))), n);
    assert_eq!(ctx.negabinary_value(&total, &ctx.trees(&Tree::path(["a", "c"]))), 0);
}
