//! The closed set of index nodes stored in dictionary slots.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::scan::{RawKind, Sink};

use super::bucket_node::BucketNode;
use super::template_table::Syllable;
use super::PinyinDictionary;

/// Node governing one code point.
///
/// Cloning is cheap: at most one reference-count increment.
#[derive(Clone, Debug)]
pub enum Node {
    /// Han code point without a known reading; written raw.
    Empty,
    /// Non-Han code point; written raw and transparent to separators.
    Unknown,
    /// Code point with exactly one reading.
    Leaf(Syllable),
    /// Placeholder that builds its word index on first use.
    Lazy(Arc<LazyNode>),
    /// Materialized word index with a fallback for single characters.
    Bucket(Arc<BucketNode>),
}

impl Node {
    /// Node for an optional reading: `Leaf` or `Empty`.
    #[inline]
    pub fn from_reading(reading: Option<Syllable>) -> Node {
        match reading {
            Some(syllable) => Node::Leaf(syllable),
            None => Node::Empty,
        }
    }

    /// The character-level reading, never materializing a lazy node.
    pub fn reading(&self) -> Option<Syllable> {
        match self {
            Node::Empty | Node::Unknown => None,
            Node::Leaf(syllable) => Some(Arc::clone(syllable)),
            Node::Lazy(lazy) => lazy.base.reading(),
            Node::Bucket(bucket) => bucket.fallback().reading(),
        }
    }

    /// Consumes the code point at `pos` (spanning `width` units), or a whole
    /// word starting there, writes it to `sink` and returns the next position.
    #[inline]
    pub fn write<S: Sink>(
        &self,
        dictionary: &PinyinDictionary,
        text: &[u16],
        pos: usize,
        width: usize,
        sink: &mut S,
    ) -> usize {
        match self {
            Node::Empty => {
                sink.push_raw(&text[pos..pos + width], RawKind::Separated);
                pos + width
            }
            Node::Unknown => {
                sink.push_raw(&text[pos..pos + width], RawKind::Transparent);
                pos + width
            }
            Node::Leaf(syllable) => {
                sink.push_syllable(syllable);
                pos + width
            }
            Node::Lazy(lazy) => {
                let built = dictionary.materialize_lazy(lazy);
                built.write(dictionary, text, pos, width, sink)
            }
            Node::Bucket(bucket) => bucket.write(dictionary, text, pos, width, sink),
        }
    }

    #[inline]
    pub fn is_lazy(&self) -> bool {
        matches!(self, Node::Lazy(_))
    }
}

/// Placeholder for a code point whose words have not been loaded yet.
///
/// `built` holds the node that replaces this placeholder; it is computed at
/// most once, concurrent first users block on the cell.
#[derive(Debug)]
pub struct LazyNode {
    pub(crate) code_point: u32,
    pub(crate) base: Node,
    pub(crate) built: OnceCell<Node>,
}

impl LazyNode {
    pub fn new(code_point: u32, base: Node) -> Self {
        Self {
            code_point,
            base,
            built: OnceCell::new(),
        }
    }

    #[inline]
    pub fn code_point(&self) -> u32 {
        self.code_point
    }

    pub fn is_materialized(&self) -> bool {
        self.built.get().is_some()
    }
}
