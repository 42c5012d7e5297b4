//! Word-match chain nodes.
//!
//! A chain is a persistent singly linked list of [`ChainNode`]s ending in
//! [`Link::Fallback`], the bucket's non-word node. Nodes are immutable;
//! insertion rebuilds the prefix of the chain in front of the insertion point
//! and shares the rest, so readers holding an old head keep a consistent view.

use std::sync::Arc;

use crate::scan::{RawKind, Sink};
use crate::utils::{combine_surrogates, is_high_surrogate, is_low_surrogate};

use super::template_table::Syllable;
use super::PinyinDictionary;

/// Reading of one code unit of a word. Low-surrogate positions and characters
/// without a reading hold `None`, as does every position of an
/// [`Auxiliary`](Priority::Auxiliary) entry.
pub type Reading = Option<Syllable>;

/// Precedence of an entry when two entries share the same word text.
///
/// An insert replaces an existing equal word only when its priority is at
/// least as high.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Segmentation-only words. Their readings are looked up in the
    /// character store each time they are written.
    Auxiliary,
    /// Traditional rendering of a primary simplified word.
    Mirror,
    /// Words shipped with explicit readings.
    Primary,
    /// Runtime overrides (`define_word`, customization files).
    Override,
}

/// Length-specialized word shapes.
///
/// `Word2`..`Word4` are used for words led by a BMP character and store only
/// the tail units after it. `WordX` covers every other length and words led by
/// a supplementary-plane character (`lead == 2`).
#[derive(Clone, Debug)]
pub enum WordShape {
    Word2 {
        tail: u16,
        readings: [Reading; 2],
    },
    Word3 {
        tail: [u16; 2],
        readings: [Reading; 3],
    },
    Word4 {
        tail: [u16; 3],
        readings: [Reading; 4],
    },
    WordX {
        lead: u8,
        tail: Box<[u16]>,
        readings: Box<[Reading]>,
    },
}

/// One word entry of a bucket.
#[derive(Clone, Debug)]
pub struct WordMatch {
    pub priority: Priority,
    pub shape: WordShape,
}

impl WordMatch {
    /// Builds the entry for `units` with one reading per unit.
    ///
    /// Returns `None` for fewer than two code points or when the readings do
    /// not line up with the units.
    pub fn new(units: &[u16], readings: Vec<Reading>, priority: Priority) -> Option<Self> {
        if units.len() != readings.len() || units.is_empty() {
            return None;
        }
        let lead = if is_high_surrogate(units[0]) && units.get(1).copied().is_some_and(is_low_surrogate) {
            2
        } else {
            1
        };
        if units.len() <= lead {
            return None;
        }

        let shape = match (lead, units.len()) {
            (1, 2) => {
                let [r0, r1]: [Reading; 2] = readings.try_into().ok()?;
                WordShape::Word2 {
                    tail: units[1],
                    readings: [r0, r1],
                }
            }
            (1, 3) => WordShape::Word3 {
                tail: [units[1], units[2]],
                readings: readings.try_into().ok()?,
            },
            (1, 4) => WordShape::Word4 {
                tail: [units[1], units[2], units[3]],
                readings: readings.try_into().ok()?,
            },
            _ => WordShape::WordX {
                lead: lead as u8,
                tail: units[lead..].into(),
                readings: readings.into_boxed_slice(),
            },
        };
        Some(Self { priority, shape })
    }

    /// Word length in code units, leading character included.
    #[inline]
    pub fn len(&self) -> usize {
        match &self.shape {
            WordShape::Word2 { .. } => 2,
            WordShape::Word3 { .. } => 3,
            WordShape::Word4 { .. } => 4,
            WordShape::WordX { lead, tail, .. } => *lead as usize + tail.len(),
        }
    }

    /// The code unit right after the leading character; buckets hash on it.
    #[inline]
    pub fn key_unit(&self) -> u16 {
        match &self.shape {
            WordShape::Word2 { tail, .. } => *tail,
            WordShape::Word3 { tail, .. } => tail[0],
            WordShape::Word4 { tail, .. } => tail[0],
            WordShape::WordX { tail, .. } => tail[0],
        }
    }

    /// Units after the leading character.
    pub fn tail(&self) -> &[u16] {
        match &self.shape {
            WordShape::Word2 { tail, .. } => std::slice::from_ref(tail),
            WordShape::Word3 { tail, .. } => tail,
            WordShape::Word4 { tail, .. } => tail,
            WordShape::WordX { tail, .. } => tail,
        }
    }

    pub fn readings(&self) -> &[Reading] {
        match &self.shape {
            WordShape::Word2 { readings, .. } => readings,
            WordShape::Word3 { readings, .. } => readings,
            WordShape::Word4 { readings, .. } => readings,
            WordShape::WordX { readings, .. } => readings,
        }
    }

    /// Same word text. Entries of one bucket share the leading character, so
    /// only the tails are compared.
    #[inline]
    pub fn same_text(&self, other: &WordMatch) -> bool {
        self.len() == other.len() && self.tail() == other.tail()
    }

    /// Tests the word against `text` starting at `pos` (the leading character).
    #[inline]
    pub fn matches(&self, text: &[u16], pos: usize) -> bool {
        match &self.shape {
            WordShape::Word2 { tail, .. } => text.get(pos + 1) == Some(tail),
            WordShape::Word3 { tail, .. } => matches!(
                text.get(pos + 1..pos + 3),
                Some(&[a, b]) if a == tail[0] && b == tail[1]
            ),
            WordShape::Word4 { tail, .. } => matches!(
                text.get(pos + 1..pos + 4),
                Some(&[a, b, c]) if a == tail[0] && b == tail[1] && c == tail[2]
            ),
            WordShape::WordX { lead, tail, .. } => {
                let start = pos + *lead as usize;
                text.get(start..start + tail.len()) == Some(&tail[..])
            }
        }
    }

    /// Writes one output item per code point of the matched span and returns
    /// the position after it.
    ///
    /// Auxiliary entries take each character's current reading from
    /// `dictionary`, so character overrides reach them.
    pub fn write<S: Sink>(&self, dictionary: &PinyinDictionary, text: &[u16], pos: usize, sink: &mut S) -> usize {
        let len = self.len();
        let readings = self.readings();
        let derived = self.priority == Priority::Auxiliary;
        let mut i = 0;
        while i < len {
            let unit = text[pos + i];
            let (code_point, width) = if is_high_surrogate(unit) && i + 1 < len && is_low_surrogate(text[pos + i + 1]) {
                (combine_surrogates(unit, text[pos + i + 1]), 2)
            } else {
                (unit as u32, 1)
            };
            let current;
            let reading = if derived {
                current = dictionary.char_reading(code_point);
                current.as_ref()
            } else {
                readings[i].as_ref()
            };
            match reading {
                Some(syllable) => sink.push_syllable(syllable),
                None => sink.push_raw(&text[pos + i..pos + i + width], RawKind::Separated),
            }
            i += width;
        }
        pos + len
    }
}

/// Link to the next node tried on a match failure.
#[derive(Clone, Debug, Default)]
pub enum Link {
    /// End of chain: the bucket's fallback node handles the position.
    #[default]
    Fallback,
    Node(Arc<ChainNode>),
}

#[derive(Debug)]
pub struct ChainNode {
    pub word: WordMatch,
    pub next: Link,
}

/// Outcome of [`Link::insert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Added,
    Replaced,
    Ignored,
}

impl Link {
    fn node(word: WordMatch, next: Link) -> Link {
        Link::Node(Arc::new(ChainNode { word, next }))
    }

    /// Returns a new chain with `word` inserted.
    ///
    /// Longer words stay in front of shorter ones; an equal text is replaced
    /// in place if `word.priority` is at least the existing priority.
    pub fn insert(&self, word: WordMatch) -> (Link, InsertOutcome) {
        match self {
            Link::Node(node) if node.word.len() > word.len() => {
                let (next, outcome) = node.next.insert(word);
                if outcome == InsertOutcome::Ignored {
                    return (self.clone(), outcome);
                }
                (Link::node(node.word.clone(), next), outcome)
            }
            Link::Node(node) if node.word.same_text(&word) => {
                if word.priority >= node.word.priority {
                    (Link::node(word, node.next.clone()), InsertOutcome::Replaced)
                } else {
                    (self.clone(), InsertOutcome::Ignored)
                }
            }
            Link::Node(node) if node.word.len() == word.len() => {
                let (next, outcome) = node.next.insert(word);
                if outcome == InsertOutcome::Ignored {
                    return (self.clone(), outcome);
                }
                (Link::node(node.word.clone(), next), outcome)
            }
            _ => (Link::node(word, self.clone()), InsertOutcome::Added),
        }
    }

    /// First entry of the chain matching `text` at `pos`.
    #[inline]
    pub fn find(&self, text: &[u16], pos: usize) -> Option<&WordMatch> {
        let mut link = self;
        while let Link::Node(node) = link {
            if node.word.matches(text, pos) {
                return Some(&node.word);
            }
            link = &node.next;
        }
        None
    }

    /// Iterates the chain's entries from head to tail.
    pub fn iter(&self) -> ChainIter<'_> {
        ChainIter { link: self }
    }
}

pub struct ChainIter<'a> {
    link: &'a Link,
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = &'a WordMatch;

    fn next(&mut self) -> Option<Self::Item> {
        match self.link {
            Link::Fallback => None,
            Link::Node(node) => {
                self.link = &node.next;
                Some(&node.word)
            }
        }
    }
}
