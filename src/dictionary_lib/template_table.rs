//! Interned syllable table.
//!
//! Every distinct syllable used by the assets is stored exactly once as an
//! `Arc<str>`; block blobs and lexicon streams reference syllables by their
//! 1-based position in `syllables.txt` (id `0` means "no reading").

use std::sync::{Arc, Mutex, PoisonError};

use rustc_hash::FxHashSet;

use crate::errors::{PinyinError, Result};

use super::asset_bundle::names;

/// A shared, interned syllable string.
pub type Syllable = Arc<str>;

/// Ordered table of interned syllables.
///
/// # Invariants
/// - `get(id)` returns the same `Arc` instance for the lifetime of the table.
/// - Ids never change once assigned; runtime interning only appends to the
///   intern set, never to the id space.
#[derive(Debug)]
pub struct TemplateTable {
    templates: Vec<Syllable>,
    interned: Mutex<FxHashSet<Syllable>>,
}

impl TemplateTable {
    /// Parses the newline-separated syllable list.
    ///
    /// Trailing `\r` is stripped and a single final empty line is ignored.
    /// Blank lines elsewhere would shift every id after them, so they are
    /// rejected as asset corruption.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.strip_suffix('\n').unwrap_or(text);
        let mut templates = Vec::new();
        let mut interned = FxHashSet::default();

        if !text.is_empty() {
            for (line_no, line) in text.split('\n').enumerate() {
                let syllable = line.strip_suffix('\r').unwrap_or(line).trim();
                if syllable.is_empty() {
                    return Err(PinyinError::asset(
                        names::SYLLABLES,
                        format!("empty syllable at line {}", line_no + 1),
                    ));
                }
                // Duplicates keep their own id but share one instance.
                let shared = match interned.get(syllable) {
                    Some(existing) => Arc::clone(existing),
                    None => {
                        let fresh: Syllable = Arc::from(syllable);
                        interned.insert(Arc::clone(&fresh));
                        fresh
                    }
                };
                templates.push(shared);
            }
        }

        if templates.len() > u16::MAX as usize {
            return Err(PinyinError::asset(
                names::SYLLABLES,
                format!("{} syllables exceed the 16-bit id space", templates.len()),
            ));
        }

        Ok(Self {
            templates,
            interned: Mutex::new(interned),
        })
    }

    /// Number of syllables with an id.
    #[inline]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// O(1) id → syllable. Id `0` and ids past the end yield `None`.
    #[inline]
    pub fn get(&self, id: u16) -> Option<&Syllable> {
        (id as usize)
            .checked_sub(1)
            .and_then(|index| self.templates.get(index))
    }

    /// Like [`get`](Self::get) but treats an out-of-range id as corruption of
    /// the asset named `asset`.
    pub fn resolve(&self, id: u16, asset: &str) -> Result<Option<Syllable>> {
        if id == 0 {
            return Ok(None);
        }
        self.get(id).cloned().map(Some).ok_or_else(|| {
            PinyinError::asset(
                asset,
                format!("template id {} out of range (table has {})", id, self.len()),
            )
        })
    }

    /// Returns the shared instance for `text`, registering it if unseen.
    pub fn intern(&self, text: &str) -> Syllable {
        let mut interned = self.interned.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = interned.get(text) {
            return Arc::clone(existing);
        }
        let fresh: Syllable = Arc::from(text);
        interned.insert(Arc::clone(&fresh));
        fresh
    }

    /// Iterates `(id, syllable)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Syllable)> {
        self.templates
            .iter()
            .enumerate()
            .map(|(index, syllable)| ((index + 1) as u16, syllable))
    }
}
