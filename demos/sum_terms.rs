use std::path::PathBuf;

use clap::Parser;

use zcube::cube::{self, ReduceConfig};
use zcube::tree::Tree;
use zcube::zdd::ZddContext;

/// Folds a term stream in parallel and prints a few group totals.
#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Input file, as written by `write-terms`.
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Number of worker threads (defaults to the available parallelism).
    #[arg(long, value_name = "INT")]
    workers: Option<usize>,

    /// Accumulators per worker.
    #[arg(long, value_name = "INT", default_value = "2")]
    accumulators: usize,

    /// Cache size of every accumulator (in bits, so the actual size is `2^size` entries).
    #[arg(long, value_name = "INT", default_value = "16")]
    size: usize,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let mut config = ReduceConfig::default()
        .with_accumulators_per_worker(args.accumulators)
        .with_cache_bits(args.size);
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    println!("config = {:?}", config);

    let total = cube::sum_subtrees_file(&args.input, &config)?;
    println!("digits = {}", total.len());
    println!("digit sizes = {:?}", total.digit_sizes());

    let ctx = ZddContext::new(config.cache);
    let groups = [
        Tree::unit(),
        Tree::path(["food"]),
        Tree::path(["food", "fruit"]),
        Tree::path(["tools"]),
        Tree::path(["region", "north"]),
        Tree::cross([Tree::path(["food"]), Tree::path(["year", "2025"])]),
    ];
    for group in &groups {
        let value = ctx.negabinary_value(&total, &ctx.trees(group));
        println!("{} = {}", group, value);
    }

    let time_total = time_total.elapsed();
    println!("Total time: {:.3} s", time_total.as_secs_f64());

    Ok(())
}
