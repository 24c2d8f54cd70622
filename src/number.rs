//! Signed-digit numbers over ZDD families.
//!
//! A [`Number`] is a chain of digits, lowest order first, where every digit is
//! a ZDD family. A set `s` occurs `n` times in a number when the digits that
//! contain `s` spell `n` in base 2 ([binary](Number::binary)) or base −2
//! ([negabinary](Number::negabinary)). A number thus stores an integer-weighted
//! linear combination of sets, and adding two numbers adds the weights of every
//! set at once, using only set operations on whole digits.
//!
//! ```
//! use zcube::number::Number;
//! use zcube::zdd::ZddContext;
//!
//! let ctx = ZddContext::default();
//! let z = ctx.family_of([1, 2]);
//!
//! let a = Number::negabinary(5, &z);
//! let b = Number::negabinary(-7, &z);
//! let sum = ctx.negabinary_add(&a, &b);
//! assert_eq!(ctx.negabinary_value(&sum, &z), -2);
//! ```

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::cache::CacheConfig;
use crate::reference::Zdd;
use crate::zdd::ZddContext;

/// A chain of ZDD digits, lowest order first. The empty chain is zero.
///
/// The highest digit of a non-zero chain is never EMPTY, so a number has a
/// single representation per value and [`PartialEq`] compares values.
#[derive(Clone, Default)]
pub struct Number {
    head: Option<Arc<Cell>>,
}

struct Cell {
    digit: Zdd,
    rest: Number,
}

impl Number {
    pub const ZERO: Number = Number { head: None };

    /// Prepends `digit` below `rest`. `(EMPTY, zero)` collapses to zero.
    pub fn new(digit: Zdd, rest: Number) -> Number {
        if digit.is_empty() && rest.is_zero() {
            return Number::ZERO;
        }
        Number {
            head: Some(Arc::new(Cell { digit, rest })),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.head.is_none()
    }

    /// Lowest-order digit; EMPTY for zero.
    pub fn digit(&self) -> Zdd {
        match &self.head {
            Some(cell) => cell.digit.clone(),
            None => Zdd::EMPTY,
        }
    }

    /// Higher-order digits; zero for zero.
    pub fn rest(&self) -> Number {
        match &self.head {
            Some(cell) => cell.rest.clone(),
            None => Number::ZERO,
        }
    }

    /// Multiplies by the base: inserts an EMPTY digit at the bottom.
    pub fn shift(&self) -> Number {
        Number::new(Zdd::EMPTY, self.clone())
    }

    /// Number of digits.
    pub fn len(&self) -> usize {
        self.digits().count()
    }

    /// Iterates over the digits, lowest order first.
    pub fn digits(&self) -> Digits<'_> {
        Digits { current: self }
    }

    /// Family size of every digit, lowest order first.
    pub fn digit_sizes(&self) -> Vec<u64> {
        self.digits().map(|d| d.size()).collect()
    }

    /// Builds a chain from digits listed lowest order first.
    pub fn from_digits(digits: Vec<Zdd>) -> Number {
        digits.into_iter().rev().fold(Number::ZERO, |rest, digit| Number::new(digit, rest))
    }

    /// `l` occurrences of every set of `z`, in base 2.
    ///
    /// A negative `l` is encoded through its 64-bit two's complement, which
    /// [`ZddContext::binary_value`] decodes back with wrapping arithmetic.
    pub fn binary(l: i64, z: &Zdd) -> Number {
        let mut digits = Vec::new();
        let mut l = l as u64;
        while l != 0 {
            digits.push(if l & 1 == 0 { Zdd::EMPTY } else { z.clone() });
            l >>= 1;
        }
        Number::from_digits(digits)
    }

    /// `l` occurrences of every set of `z`, in base −2.
    pub fn negabinary(l: i64, z: &Zdd) -> Number {
        let mut digits = Vec::new();
        let mut l = l;
        while l != 0 {
            let q = l / -2;
            let r = l.wrapping_add(q.wrapping_mul(2));
            match r.signum() {
                1 => {
                    digits.push(z.clone());
                    l = q;
                }
                -1 => {
                    digits.push(z.clone());
                    l = q + 1;
                }
                _ => {
                    digits.push(Zdd::EMPTY);
                    l = q;
                }
            }
        }
        Number::from_digits(digits)
    }
}

pub struct Digits<'a> {
    current: &'a Number,
}

impl<'a> Iterator for Digits<'a> {
    type Item = &'a Zdd;

    fn next(&mut self) -> Option<Self::Item> {
        let cell = self.current.head.as_deref()?;
        self.current = &cell.rest;
        Some(&cell.digit)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        let mut a = self.digits();
        let mut b = other.digits();
        loop {
            match (a.next(), b.next()) {
                (None, None) => return true,
                (Some(x), Some(y)) if x == y => continue,
                _ => return false,
            }
        }
    }
}

impl Eq for Number {}

impl Debug for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.digits()).finish()
    }
}

// ========================================================================
// Arithmetic
// ========================================================================

impl ZddContext {
    fn digits_union(&self, a: &Number, b: &Number) -> Number {
        match (&a.head, &b.head) {
            (None, _) => b.clone(),
            (_, None) => a.clone(),
            (Some(x), Some(y)) => Number::new(self.union(&x.digit, &y.digit), self.digits_union(&x.rest, &y.rest)),
        }
    }

    fn digits_intersection(&self, a: &Number, b: &Number) -> Number {
        match (&a.head, &b.head) {
            (Some(x), Some(y)) => Number::new(
                self.intersection(&x.digit, &y.digit),
                self.digits_intersection(&x.rest, &y.rest),
            ),
            _ => Number::ZERO,
        }
    }

    fn digits_difference(&self, a: &Number, b: &Number) -> Number {
        match (&a.head, &b.head) {
            (None, _) => Number::ZERO,
            (_, None) => a.clone(),
            (Some(x), Some(y)) => Number::new(
                self.difference(&x.digit, &y.digit),
                self.digits_difference(&x.rest, &y.rest),
            ),
        }
    }

    /// Half-adds every digit position: returns `(carry, sum)` with
    /// `carry = a ∩ b` and `sum = (a ∪ b) \ carry`.
    fn half_add(&self, a: &Number, b: &Number) -> (Number, Number) {
        let carry = self.digits_intersection(a, b);
        let sum = self.digits_difference(&self.digits_union(a, b), &carry);
        (carry, sum)
    }

    /// Sum of two binary numbers.
    pub fn binary_add(&self, a: &Number, b: &Number) -> Number {
        let (carry, sum) = self.half_add(a, b);

        if carry.is_zero() {
            return sum;
        }
        if sum.is_zero() {
            return carry.shift();
        }

        // s + 2c = s₀ + 2(s' + c)
        Number::new(sum.digit(), self.binary_add(&sum.rest(), &carry))
    }

    /// Sum of two negabinary numbers.
    pub fn negabinary_add(&self, a: &Number, b: &Number) -> Number {
        let (carry, sum) = self.half_add(a, b);

        if carry.is_zero() {
            return sum;
        }

        // In base −2, a carry of 2 at position i is −1 at position i+1.
        self.negabinary_sub(&sum, &carry.shift())
    }

    /// Difference `a − b` of two negabinary numbers.
    pub fn negabinary_sub(&self, a: &Number, b: &Number) -> Number {
        let borrow = self.digits_difference(b, a);
        let diff = self.digits_union(&self.digits_difference(a, b), &borrow);

        if borrow.is_zero() {
            return diff;
        }

        // A borrow of −1 at position i is 1 − 2, and −2 at position i is +1 at position i+1.
        self.negabinary_add(&diff, &borrow.shift())
    }

    /// Occurrences of the sets of `z` in a binary number.
    ///
    /// Weighs each digit by `2^i` when `z` is included in it, with wrapping arithmetic.
    pub fn binary_value(&self, n: &Number, z: &Zdd) -> i64 {
        self.project(n, z, 2)
    }

    /// Occurrences of the sets of `z` in a negabinary number.
    ///
    /// Weighs each digit by `(−2)^i` when `z` is included in it, with wrapping arithmetic.
    pub fn negabinary_value(&self, n: &Number, z: &Zdd) -> i64 {
        self.project(n, z, -2)
    }

    fn project(&self, n: &Number, z: &Zdd, base: i64) -> i64 {
        let mut value = 0i64;
        let mut weight = 1i64;
        for digit in n.digits() {
            if self.included(z, digit) {
                value = value.wrapping_add(weight);
            }
            weight = weight.wrapping_mul(base);
        }
        value
    }
}

/// Sum of two binary numbers, with fresh caches.
pub fn binary_add(a: &Number, b: &Number) -> Number {
    ZddContext::default().binary_add(a, b)
}

/// Sum of two negabinary numbers, with fresh caches.
pub fn negabinary_add(a: &Number, b: &Number) -> Number {
    ZddContext::default().negabinary_add(a, b)
}

/// Difference of two negabinary numbers, with fresh caches.
pub fn negabinary_sub(a: &Number, b: &Number) -> Number {
    ZddContext::default().negabinary_sub(a, b)
}

pub fn binary_value(n: &Number, z: &Zdd) -> i64 {
    ZddContext::default().binary_value(n, z)
}

pub fn negabinary_value(n: &Number, z: &Zdd) -> i64 {
    ZddContext::default().negabinary_value(n, z)
}

/// Negabinary sum of all `numbers`, combined pairwise in a balanced tree on
/// the rayon pool. Every combine step uses its own caches.
pub fn p_sum(numbers: &[Number], config: CacheConfig) -> Number {
    match numbers {
        [] => Number::ZERO,
        [n] => n.clone(),
        _ => {
            let (left, right) = numbers.split_at(numbers.len() / 2);
            let (a, b) = rayon::join(|| p_sum(left, config), || p_sum(right, config));
            ZddContext::new(config).negabinary_add(&a, &b)
        }
    }
}
