use std::path::PathBuf;

use clap::Parser;
use log::info;

use zcube::codec;
use zcube::term::Term;
use zcube::tree::Tree;
use zcube::utils::mix64;

/// Writes a synthetic stream of sales terms over three dimensions.
#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Output file.
    #[arg(value_name = "FILE")]
    output: PathBuf,

    /// Number of terms.
    #[arg(long, value_name = "INT", default_value = "100000")]
    count: u64,

    /// Seed of the generator.
    #[arg(long, value_name = "INT", default_value = "42")]
    seed: u64,
}

const PRODUCTS: [[&str; 2]; 6] = [
    ["food", "fruit"],
    ["food", "bread"],
    ["food", "cheese"],
    ["tools", "saw"],
    ["tools", "hammer"],
    ["books", "poetry"],
];
const REGIONS: [&str; 4] = ["north", "south", "east", "west"];
const YEARS: [&str; 3] = ["2024", "2025", "2026"];

fn term(seed: u64, i: u64) -> Term {
    let r = mix64(seed ^ mix64(i));
    let product = PRODUCTS[(r % 6) as usize];
    let region = REGIONS[((r >> 8) % 4) as usize];
    let year = YEARS[((r >> 16) % 3) as usize];
    let quantity = ((r >> 24) % 100) as i64 + 1;

    Term::new(
        quantity,
        Tree::cross([
            Tree::path(product),
            Tree::path(["region", region]),
            Tree::path(["year", year]),
        ]),
    )
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

    let terms: Vec<Term> = (0..args.count).map(|i| term(args.seed, i)).collect();
    if let Some(first) = terms.first() {
        println!("first term = {}", first);
    }
    let sum: i64 = terms.iter().map(|t| t.coefficient).sum();

    codec::write_terms_file(&args.output, &terms)?;
    info!("Wrote {} terms (total quantity {}) to {}", terms.len(), sum, args.output.display());

    let time_total = time_total.elapsed();
    println!("Total time: {:.3} s", time_total.as_secs_f64());

    Ok(())
}
