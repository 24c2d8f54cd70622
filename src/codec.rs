//! Binary stream format of trees and terms.
//!
//! Every tree node starts with one discriminant byte, followed by its payload:
//!
//! | Tag | Variant | Payload |
//! |-----|---------|---------|
//! | 0 | EMPTY | none |
//! | 1 | UNIT | none |
//! | 2 | PREFIX | label, then the inner tree |
//! | 3 | CROSS | `i32` child count, then the children |
//! | 4 | SUM | `i32` child count, then the children |
//!
//! A [`Tree`] label is a big-endian `u16` byte length followed by UTF-8
//! bytes. A [`HashedTree`] uses the same layout with an 8-byte identity in
//! place of the label (tag 2 is then NODE). A [`Term`] is its big-endian
//! `i64` coefficient followed by its tree. All integers are big-endian.
//!
//! A term stream is a plain concatenation of terms. It may end only between
//! two terms: a stream cut inside a record is reported as
//! [`DecodeError::UnexpectedEof`], never as a shorter stream.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use log::debug;

use crate::error::DecodeError;
use crate::term::Term;
use crate::tree::{HashedTree, Tree};

const TAG_EMPTY: u8 = 0;
const TAG_UNIT: u8 = 1;
const TAG_NODE: u8 = 2;
const TAG_CROSS: u8 = 3;
const TAG_SUM: u8 = 4;

/// Read buffer of file-backed term streams.
const READ_BUFFER: usize = 256 * 1024;

// ========================================================================
// Primitives
// ========================================================================

fn read_exact<R: Read>(r: &mut R, buf: &mut [u8], context: &'static str) -> Result<(), DecodeError> {
    r.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => DecodeError::UnexpectedEof { context },
        _ => DecodeError::Io(e),
    })
}

fn read_u8<R: Read>(r: &mut R, context: &'static str) -> Result<u8, DecodeError> {
    let mut buf = [0u8; 1];
    read_exact(r, &mut buf, context)?;
    Ok(buf[0])
}

fn read_i32<R: Read>(r: &mut R, context: &'static str) -> Result<i32, DecodeError> {
    let mut buf = [0u8; 4];
    read_exact(r, &mut buf, context)?;
    Ok(i32::from_be_bytes(buf))
}

fn read_i64<R: Read>(r: &mut R, context: &'static str) -> Result<i64, DecodeError> {
    let mut buf = [0u8; 8];
    read_exact(r, &mut buf, context)?;
    Ok(i64::from_be_bytes(buf))
}

fn read_len<R: Read>(r: &mut R) -> Result<usize, DecodeError> {
    let n = read_i32(r, "child count")?;
    usize::try_from(n).map_err(|_| DecodeError::NegativeLength(n))
}

fn write_len<W: Write>(w: &mut W, len: usize) -> io::Result<()> {
    let n = i32::try_from(len).map_err(|_| io::Error::new(ErrorKind::InvalidInput, format!("{} children do not fit a 32-bit count", len)))?;
    w.write_all(&n.to_be_bytes())
}

// ========================================================================
// Trees
// ========================================================================

/// Borrowed view of one tree node, for encoding.
enum Parts<'a, T: Wire> {
    Empty,
    Unit,
    Node(&'a T::Label, &'a T),
    Cross(&'a [T]),
    Sum(&'a [T]),
}

/// A tree type with a stream encoding. Only the node payload differs
/// between [`Tree`] and [`HashedTree`].
trait Wire: Sized {
    type Label;

    fn read_label<R: Read>(r: &mut R) -> Result<Self::Label, DecodeError>;
    fn write_label<W: Write>(w: &mut W, label: &Self::Label) -> io::Result<()>;

    fn leaf(unit: bool) -> Self;
    fn node(label: Self::Label, inner: Self) -> Self;
    fn list(cross: bool, children: Vec<Self>) -> Self;

    fn parts(&self) -> Parts<'_, Self>;
}

impl Wire for Tree {
    type Label = String;

    fn read_label<R: Read>(r: &mut R) -> Result<String, DecodeError> {
        let mut len = [0u8; 2];
        read_exact(r, &mut len, "label length")?;
        let mut bytes = vec![0u8; u16::from_be_bytes(len) as usize];
        read_exact(r, &mut bytes, "label")?;
        let label = std::str::from_utf8(&bytes)?;
        Ok(label.to_owned())
    }

    fn write_label<W: Write>(w: &mut W, label: &String) -> io::Result<()> {
        let len = u16::try_from(label.len())
            .map_err(|_| io::Error::new(ErrorKind::InvalidInput, DecodeError::LabelTooLong(label.len())))?;
        w.write_all(&len.to_be_bytes())?;
        w.write_all(label.as_bytes())
    }

    fn leaf(unit: bool) -> Self {
        if unit {
            Tree::Unit
        } else {
            Tree::Empty
        }
    }

    fn node(label: String, inner: Self) -> Self {
        Tree::Prefix(label, Box::new(inner))
    }

    fn list(cross: bool, children: Vec<Self>) -> Self {
        if cross {
            Tree::Cross(children)
        } else {
            Tree::Sum(children)
        }
    }

    fn parts(&self) -> Parts<'_, Self> {
        match self {
            Tree::Empty => Parts::Empty,
            Tree::Unit => Parts::Unit,
            Tree::Prefix(label, inner) => Parts::Node(label, inner),
            Tree::Cross(trees) => Parts::Cross(trees),
            Tree::Sum(trees) => Parts::Sum(trees),
        }
    }
}

impl Wire for HashedTree {
    type Label = u64;

    fn read_label<R: Read>(r: &mut R) -> Result<u64, DecodeError> {
        Ok(read_i64(r, "node identity")? as u64)
    }

    fn write_label<W: Write>(w: &mut W, id: &u64) -> io::Result<()> {
        w.write_all(&id.to_be_bytes())
    }

    fn leaf(unit: bool) -> Self {
        if unit {
            HashedTree::Unit
        } else {
            HashedTree::Empty
        }
    }

    fn node(id: u64, inner: Self) -> Self {
        HashedTree::Node(id, Box::new(inner))
    }

    fn list(cross: bool, children: Vec<Self>) -> Self {
        if cross {
            HashedTree::Cross(children)
        } else {
            HashedTree::Sum(children)
        }
    }

    fn parts(&self) -> Parts<'_, Self> {
        match self {
            HashedTree::Empty => Parts::Empty,
            HashedTree::Unit => Parts::Unit,
            HashedTree::Node(id, inner) => Parts::Node(id, inner),
            HashedTree::Cross(trees) => Parts::Cross(trees),
            HashedTree::Sum(trees) => Parts::Sum(trees),
        }
    }
}

fn encode<T: Wire, W: Write>(w: &mut W, tree: &T) -> io::Result<()> {
    let mut stack = vec![tree];

    while let Some(t) = stack.pop() {
        match t.parts() {
            Parts::Empty => w.write_all(&[TAG_EMPTY])?,
            Parts::Unit => w.write_all(&[TAG_UNIT])?,
            Parts::Node(label, inner) => {
                w.write_all(&[TAG_NODE])?;
                T::write_label(w, label)?;
                stack.push(inner);
            }
            Parts::Cross(trees) => {
                w.write_all(&[TAG_CROSS])?;
                write_len(w, trees.len())?;
                stack.extend(trees.iter().rev());
            }
            Parts::Sum(trees) => {
                w.write_all(&[TAG_SUM])?;
                write_len(w, trees.len())?;
                stack.extend(trees.iter().rev());
            }
        }
    }

    Ok(())
}

fn decode<T: Wire, R: Read>(r: &mut R) -> Result<T, DecodeError> {
    enum Pending<T: Wire> {
        Node(T::Label),
        List { cross: bool, len: usize, children: Vec<T> },
    }

    let mut stack: Vec<Pending<T>> = Vec::new();

    loop {
        let mut done = match read_u8(r, "tree discriminant")? {
            TAG_EMPTY => T::leaf(false),
            TAG_UNIT => T::leaf(true),
            TAG_NODE => {
                stack.push(Pending::Node(T::read_label(r)?));
                continue;
            }
            tag @ (TAG_CROSS | TAG_SUM) => {
                let cross = tag == TAG_CROSS;
                let len = read_len(r)?;
                if len == 0 {
                    T::list(cross, Vec::new())
                } else {
                    // The count is untrusted input: grow on demand.
                    let children = Vec::with_capacity(len.min(64));
                    stack.push(Pending::List { cross, len, children });
                    continue;
                }
            }
            tag => return Err(DecodeError::BadDiscriminant(tag)),
        };

        // Hand the finished subtree up to its parents.
        loop {
            match stack.pop() {
                None => return Ok(done),
                Some(Pending::Node(label)) => done = T::node(label, done),
                Some(Pending::List { cross, len, mut children }) => {
                    children.push(done);
                    if children.len() < len {
                        stack.push(Pending::List { cross, len, children });
                        break;
                    }
                    done = T::list(cross, children);
                }
            }
        }
    }
}

pub fn write_tree<W: Write>(w: &mut W, tree: &Tree) -> io::Result<()> {
    encode(w, tree)
}

pub fn read_tree<R: Read>(r: &mut R) -> Result<Tree, DecodeError> {
    decode(r)
}

pub fn write_hashed_tree<W: Write>(w: &mut W, tree: &HashedTree) -> io::Result<()> {
    encode(w, tree)
}

pub fn read_hashed_tree<R: Read>(r: &mut R) -> Result<HashedTree, DecodeError> {
    decode(r)
}

// ========================================================================
// Terms
// ========================================================================

pub fn write_term<W: Write>(w: &mut W, term: &Term) -> io::Result<()> {
    w.write_all(&term.coefficient.to_be_bytes())?;
    write_tree(w, &term.tree)
}

/// Reads the next term, or `None` if the stream ends cleanly before it.
pub fn read_term<R: Read>(r: &mut R) -> Result<Option<Term>, DecodeError> {
    let mut coefficient = [0u8; 8];

    // Only an EOF on the very first byte ends the stream.
    loop {
        match r.read(&mut coefficient[..1]) {
            Ok(0) => return Ok(None),
            Ok(_) => break,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    read_exact(r, &mut coefficient[1..], "term coefficient")?;

    let tree = read_tree(r)?;
    Ok(Some(Term::new(i64::from_be_bytes(coefficient), tree)))
}

/// Writes all `terms` back to back.
pub fn write_terms<'a, W: Write>(w: &mut W, terms: impl IntoIterator<Item = &'a Term>) -> io::Result<()> {
    for term in terms {
        write_term(w, term)?;
    }
    w.flush()
}

/// Writes all `terms` to a new file at `path`.
pub fn write_terms_file<'a>(path: impl AsRef<Path>, terms: impl IntoIterator<Item = &'a Term>) -> io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    write_terms(&mut w, terms)
}

/// Iterator over the terms of a stream.
///
/// Yields `Err` once on the first decode failure, then stops.
pub struct TermReader<R> {
    reader: R,
    count: usize,
    finished: bool,
}

impl<R: Read> TermReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            count: 0,
            finished: false,
        }
    }

    /// Number of terms read so far.
    pub fn terms_read(&self) -> usize {
        self.count
    }
}

impl TermReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        debug!("Opening term stream {}", path.display());
        let file = File::open(path)?;
        Ok(Self::new(BufReader::with_capacity(READ_BUFFER, file)))
    }
}

impl<R: Read> Iterator for TermReader<R> {
    type Item = Result<Term, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match read_term(&mut self.reader) {
            Ok(Some(term)) => {
                self.count += 1;
                Some(Ok(term))
            }
            Ok(None) => {
                debug!("Term stream ended after {} terms", self.count);
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
