//! Hash-bucketed dispatcher for the words sharing one leading character.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::scan::Sink;

use super::node::Node;
use super::word_chain::{InsertOutcome, Link, WordMatch};
use super::PinyinDictionary;

/// Ascending bucket counts. Collision order inside a bucket decides which
/// word is tried first, so sizes come only from this table.
pub const BUCKET_PRIMES: &[usize] = &[
    3, 7, 11, 17, 23, 29, 37, 47, 59, 71, 89, 107, 131, 163, 197, 239, 293, 353, 431, 521, 631,
    761, 919, 1103, 1327, 1597, 1931, 2333, 2801, 3371, 4049, 4861, 5839, 7013, 8419, 10103,
];

/// Up to this bucket count the table grows as soon as it holds more words
/// than buckets.
pub const EAGER_GROWTH_LIMIT: usize = 16;

/// Above [`EAGER_GROWTH_LIMIT`] the table grows once it holds more than this
/// many words per bucket.
pub const LAZY_GROWTH_FACTOR: usize = 2;

#[derive(Debug)]
struct BucketTable {
    fallback: Node,
    buckets: Box<[Link]>,
    prime_index: usize,
    count: usize,
}

impl BucketTable {
    #[inline]
    fn head(&self, key: u16) -> &Link {
        &self.buckets[key as usize % self.buckets.len()]
    }

    fn needs_growth(&self) -> bool {
        let capacity = self.buckets.len();
        if self.prime_index + 1 >= BUCKET_PRIMES.len() {
            return false;
        }
        if capacity <= EAGER_GROWTH_LIMIT {
            self.count > capacity
        } else {
            self.count > capacity * LAZY_GROWTH_FACTOR
        }
    }

    fn insert(&mut self, word: WordMatch) -> InsertOutcome {
        let index = word.key_unit() as usize % self.buckets.len();
        let (head, outcome) = self.buckets[index].insert(word);
        self.buckets[index] = head;
        if outcome == InsertOutcome::Added {
            self.count += 1;
            if self.needs_growth() {
                self.grow();
            }
        }
        outcome
    }

    /// Rehashes every chain into the next prime size, keeping each chain's
    /// relative order.
    fn grow(&mut self) {
        self.prime_index += 1;
        let size = BUCKET_PRIMES[self.prime_index];
        let old = std::mem::replace(&mut self.buckets, vec![Link::Fallback; size].into_boxed_slice());
        for chain in old.iter() {
            for word in chain.iter() {
                let index = word.key_unit() as usize % size;
                let (head, _) = self.buckets[index].insert(word.clone());
                self.buckets[index] = head;
            }
        }
    }
}

/// Words led by one code point, bucketed by the unit after the leading
/// character, plus the fallback node used when no word matches.
#[derive(Debug)]
pub struct BucketNode {
    code_point: u32,
    lead: usize,
    table: RwLock<BucketTable>,
}

impl BucketNode {
    /// Creates an empty bucket node for `code_point`.
    ///
    /// `fallback` must not itself be a bucket or lazy node.
    pub fn new(code_point: u32, fallback: Node) -> Self {
        let lead = if code_point > 0xFFFF { 2 } else { 1 };
        Self {
            code_point,
            lead,
            table: RwLock::new(BucketTable {
                fallback,
                buckets: vec![Link::Fallback; BUCKET_PRIMES[0]].into_boxed_slice(),
                prime_index: 0,
                count: 0,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, BucketTable> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, BucketTable> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    pub fn code_point(&self) -> u32 {
        self.code_point
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.read().count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.read().buckets.len()
    }

    pub fn fallback(&self) -> Node {
        self.read().fallback.clone()
    }

    pub fn set_fallback(&self, fallback: Node) {
        self.write_lock().fallback = fallback;
    }

    /// Inserts a word led by this node's code point.
    pub fn insert(&self, word: WordMatch) -> InsertOutcome {
        self.write_lock().insert(word)
    }

    /// Inserts many words under one lock acquisition.
    pub fn extend<I: IntoIterator<Item = WordMatch>>(&self, words: I) -> usize {
        let mut table = self.write_lock();
        let mut applied = 0;
        for word in words {
            if table.insert(word) != InsertOutcome::Ignored {
                applied += 1;
            }
        }
        applied
    }

    /// Collects every word in bucket order.
    pub fn words(&self) -> Vec<WordMatch> {
        let table = self.read();
        table
            .buckets
            .iter()
            .flat_map(|chain| chain.iter().cloned())
            .collect()
    }

    /// Writes the longest word matching at `pos`, or delegates to the
    /// fallback node. Returns the position after the consumed units.
    pub fn write<S: Sink>(
        &self,
        dictionary: &PinyinDictionary,
        text: &[u16],
        pos: usize,
        width: usize,
        sink: &mut S,
    ) -> usize {
        // No table lock while writing: auxiliary words read slots, this one included.
        let (chain, fallback) = {
            let table = self.read();
            let chain = text.get(pos + self.lead).map(|&key| table.head(key).clone());
            (chain, table.fallback.clone())
        };
        if let Some(word) = chain.as_ref().and_then(|chain| chain.find(text, pos)) {
            return word.write(dictionary, text, pos, sink);
        }
        fallback.write(dictionary, text, pos, width, sink)
    }
}
