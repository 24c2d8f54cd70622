//! Term streams written to disk and folded back.

use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

use zcube::codec::{self, TermReader};
use zcube::cube::{self, ReduceConfig};
use zcube::error::{DecodeError, ReduceError};
use zcube::term::Term;
use zcube::tree::Tree;
use zcube::zdd::ZddContext;

fn temp_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("zcube-{}-{}.bin", std::process::id(), name))
}

fn terms() -> Vec<Term> {
    let products = [["food", "fruit"], ["food", "bread"], ["tools", "saw"]];
    let regions = ["north", "south", "zürich"];
    let mut terms = Vec::new();
    for i in 0..30i64 {
        let product = Tree::path(products[(i % 3) as usize]);
        let region = Tree::path(["region", regions[(i % 3 + i / 10) as usize % 3]]);
        terms.push(Term::new(i + 1, Tree::cross([product, region])));
    }
    terms
}

#[test]
fn file_reduction_matches_memory() {
    let path = temp_file("reduce");
    codec::write_terms_file(&path, &terms()).unwrap();

    let config = ReduceConfig::default().with_workers(2);
    let from_file = cube::sum_subtrees_file(&path, &config).unwrap();
    let in_memory = cube::sum_subtrees(terms());
    fs::remove_file(&path).unwrap();

    assert_eq!(from_file, in_memory);

    let ctx = ZddContext::default();
    let food: i64 = terms()
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 3 != 2)
        .map(|(_, t)| t.coefficient)
        .sum();
    assert_eq!(ctx.negabinary_value(&from_file, &ctx.trees(&Tree::path(["food"]))), food);
}

#[test]
fn file_round_trip() {
    let path = temp_file("round-trip");
    codec::write_terms_file(&path, &terms()).unwrap();

    let mut reader = TermReader::open(&path).unwrap();
    let read: Vec<Term> = reader.by_ref().collect::<Result<_, _>>().unwrap();
    assert_eq!(reader.terms_read(), 30);
    fs::remove_file(&path).unwrap();

    assert_eq!(read, terms());
}

#[test]
fn truncated_file_fails_reduction() {
    let mut bytes = Vec::new();
    codec::write_terms(&mut bytes, &terms()).unwrap();
    bytes.truncate(bytes.len() - 3);

    let path = temp_file("truncated");
    fs::write(&path, &bytes).unwrap();
    let result = cube::sum_subtrees_file(&path, &ReduceConfig::default().with_workers(2));
    fs::remove_file(&path).unwrap();

    assert!(matches!(result, Err(ReduceError::Decode(DecodeError::UnexpectedEof { .. }))));
}

#[test]
fn empty_stream_is_zero() {
    let reader = TermReader::new(Cursor::new(Vec::<u8>::new()));
    let total = cube::try_p_sum_subtrees(&ReduceConfig::default(), None, reader).unwrap();
    assert!(total.is_zero());
}
