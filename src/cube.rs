//! Aggregation of weighted trees into a cube total.
//!
//! Every [`Term`] `(c, t)` adds `c` occurrences of every prefix of every tree
//! of `t` to a running negabinary [`Number`]. Projecting the total on the
//! complete trees of a dimension member then yields the aggregate of that
//! member, at any level of the hierarchy.
//!
//! # Parallel reduction
//!
//! [`p_sum_subtrees`] folds the terms on a fixed pool of worker threads:
//!
//! 1. A bounded channel is filled with `workers × accumulators_per_worker`
//!    independent [`Accumulator`]s, each owning its own caches.
//! 2. The calling thread reads the terms. For each one, it checks out an
//!    accumulator (blocking while all of them are busy) and spawns a task that
//!    folds the term into it and releases it back to the channel. Holding an
//!    accumulator is the only way to mutate it, so no lock is needed.
//! 3. Once the input is exhausted, the caller waits for every task, with no
//!    timeout, then drains the channel.
//! 4. The partial totals are combined pairwise in a balanced tree
//!    ([`number::p_sum`]).
//!
//! Negabinary addition is commutative and associative, so the total does not
//! depend on scheduling. A failing input or a panicking worker fails the whole
//! reduction: no partial total is ever returned.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::sync_channel;
use std::time::Instant;

use log::{debug, info};

use crate::cache::CacheConfig;
use crate::codec::TermReader;
use crate::error::ReduceError;
use crate::number::{self, Number};
use crate::reference::Zdd;
use crate::term::Term;
use crate::tree::Tree;
use crate::zdd::ZddContext;

/// Parameters of a parallel reduction.
#[derive(Debug, Clone)]
pub struct ReduceConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Accumulators in circulation per worker.
    pub accumulators_per_worker: usize,
    /// Cache sizing of every accumulator.
    pub cache: CacheConfig,
}

impl Default for ReduceConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self {
            workers,
            accumulators_per_worker: 2,
            cache: CacheConfig::default(),
        }
    }
}

impl ReduceConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_accumulators_per_worker(mut self, n: usize) -> Self {
        self.accumulators_per_worker = n.max(1);
        self
    }

    pub fn with_cache_bits(mut self, bits: usize) -> Self {
        self.cache = CacheConfig::new(bits);
        self
    }

    /// Total number of accumulators.
    pub fn accumulators(&self) -> usize {
        (self.workers * self.accumulators_per_worker).max(1)
    }
}

/// A running total with its private caches.
pub struct Accumulator {
    ctx: ZddContext,
    total: Number,
    terms: usize,
}

impl Accumulator {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            ctx: ZddContext::new(config),
            total: Number::ZERO,
            terms: 0,
        }
    }

    /// Adds `term.coefficient` occurrences of every prefix of `term.tree`.
    pub fn add_subtrees(&mut self, term: &Term) {
        let family = self.ctx.subtrees(&term.tree);
        self.add(term.coefficient, &family);
    }

    /// Like [`add_subtrees`](Self::add_subtrees), keeping only the prefixes in `filter`.
    pub fn add_filtered_subtrees(&mut self, filter: &Zdd, term: &Term) {
        let family = self.ctx.filtered_subtrees(filter, &term.tree);
        self.add(term.coefficient, &family);
    }

    fn add(&mut self, coefficient: i64, family: &Zdd) {
        let n = Number::negabinary(coefficient, family);
        self.total = self.ctx.negabinary_add(&n, &self.total);
        self.terms += 1;
    }

    pub fn total(&self) -> &Number {
        &self.total
    }

    /// Number of terms folded so far.
    pub fn terms(&self) -> usize {
        self.terms
    }

    pub fn into_total(self) -> Number {
        self.total
    }
}

// ========================================================================
// Sequential reduction
// ========================================================================

/// Folds all `terms` on the current thread, with a single cache set.
pub fn sum_subtrees(terms: impl IntoIterator<Item = Term>) -> Number {
    let mut acc = Accumulator::new(CacheConfig::default());
    for term in terms {
        acc.add_subtrees(&term);
    }
    acc.into_total()
}

/// Folds the prefixes in `filter` of all `terms` on the current thread.
pub fn sum_subtrees_filtered(filter: &Zdd, terms: impl IntoIterator<Item = Term>) -> Number {
    let mut acc = Accumulator::new(CacheConfig::default());
    for term in terms {
        acc.add_filtered_subtrees(filter, &term);
    }
    acc.into_total()
}

// ========================================================================
// Parallel reduction
// ========================================================================

/// Folds all `terms` in parallel.
pub fn p_sum_subtrees(config: &ReduceConfig, terms: impl IntoIterator<Item = Term>) -> Result<Number, ReduceError> {
    try_p_sum_subtrees(config, None, terms.into_iter().map(Ok::<_, ReduceError>))
}

/// Folds the prefixes in `filter` of all `terms` in parallel.
pub fn p_sum_subtrees_filtered(
    config: &ReduceConfig,
    filter: &Zdd,
    terms: impl IntoIterator<Item = Term>,
) -> Result<Number, ReduceError> {
    try_p_sum_subtrees(config, Some(filter), terms.into_iter().map(Ok::<_, ReduceError>))
}

/// Folds a fallible stream of terms in parallel.
///
/// The first input error stops the dispatch; in-flight terms are still
/// awaited, then the error is returned.
pub fn try_p_sum_subtrees<I, E>(config: &ReduceConfig, filter: Option<&Zdd>, terms: I) -> Result<Number, ReduceError>
where
    I: IntoIterator<Item = Result<Term, E>>,
    ReduceError: From<E>,
{
    reduce(config, terms, |acc: &mut Accumulator, term: &Term| match filter {
        Some(filter) => acc.add_filtered_subtrees(filter, term),
        None => acc.add_subtrees(term),
    })
}

/// Runs the checkout/fold/release protocol, folding every term with `fold`.
fn reduce<I, E, F>(config: &ReduceConfig, terms: I, fold: F) -> Result<Number, ReduceError>
where
    I: IntoIterator<Item = Result<Term, E>>,
    ReduceError: From<E>,
    F: Fn(&mut Accumulator, &Term) + Sync,
{
    let start = Instant::now();
    let accumulators = config.accumulators();
    let cache = config.cache;

    debug!(
        "Starting parallel reduction: {} workers, {} accumulators",
        config.workers, accumulators
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .thread_name(|i| format!("zcube worker {i}"))
        .build()?;

    let (release, checkout) = sync_channel::<Accumulator>(accumulators);
    for _ in 0..accumulators {
        release
            .send(Accumulator::new(cache))
            .map_err(|_| ReduceError::PoolDisconnected)?;
    }

    let panicked = AtomicBool::new(false);
    let mut failure: Option<ReduceError> = None;
    let mut submitted = 0usize;

    // The dispatch loop runs on the calling thread; only the folds run on the pool.
    pool.in_place_scope(|scope| {
        for item in terms {
            let term = match item {
                Ok(term) => term,
                Err(e) => {
                    failure = Some(e.into());
                    break;
                }
            };

            let mut acc = match checkout.recv() {
                Ok(acc) => acc,
                Err(_) => {
                    failure = Some(ReduceError::PoolDisconnected);
                    break;
                }
            };
            if panicked.load(Ordering::Acquire) {
                break;
            }

            let release = release.clone();
            let panicked = &panicked;
            let fold = &fold;
            submitted += 1;

            scope.spawn(move |_| {
                let folded = catch_unwind(AssertUnwindSafe(|| fold(&mut acc, &term)));

                if folded.is_err() {
                    panicked.store(true, Ordering::Release);
                    // Keep the pool populated so the dispatcher never waits forever.
                    acc = Accumulator::new(cache);
                }
                // Capacity matches the number of accumulators: never blocks.
                let _ = release.send(acc);
            });
        }
    });
    drop(release);

    if panicked.load(Ordering::Acquire) {
        return Err(ReduceError::WorkerPanicked);
    }
    if let Some(e) = failure {
        return Err(e);
    }

    let accs: Vec<Accumulator> = checkout.try_iter().collect();
    if accs.len() != accumulators {
        return Err(ReduceError::PoolDisconnected);
    }

    for (i, acc) in accs.iter().enumerate() {
        debug!("Accumulator {} folded {} terms", i, acc.terms());
        acc.ctx.log_stats(&format!("accumulator {}", i));
    }

    let partials: Vec<Number> = accs.into_iter().map(Accumulator::into_total).collect();
    let total = number::p_sum(&partials, cache);

    info!(
        "Folded {} terms with {} accumulators in {:.3}s",
        submitted,
        accumulators,
        start.elapsed().as_secs_f64()
    );

    Ok(total)
}

/// Folds every term of the stream stored at `path`, in parallel.
pub fn sum_subtrees_file(path: impl AsRef<Path>, config: &ReduceConfig) -> Result<Number, ReduceError> {
    let reader = TermReader::open(path)?;
    try_p_sum_subtrees(config, None, reader)
}

/// Folds all `terms` in parallel, then projects the total on the complete
/// trees of every dimension member.
pub fn group_by(
    config: &ReduceConfig,
    dimensions: &[Tree],
    terms: impl IntoIterator<Item = Term>,
) -> Result<Vec<i64>, ReduceError> {
    let total = p_sum_subtrees(config, terms)?;
    let ctx = ZddContext::new(config.cache);
    Ok(dimensions
        .iter()
        .map(|d| ctx.negabinary_value(&total, &ctx.trees(d)))
        .collect())
}
