//! Character store, lexicon and word index behind [`Pinyin`](crate::Pinyin).
//!
//! Loading order is fixed: the [`TemplateTable`] first, then the
//! [`PackedStore`] (which resolves template ids), then the [`Lexicon`]
//! (which validates its ids against the same table). Word indexes are built
//! lazily per leading character by [`PinyinDictionary::materialize`].

pub mod asset_bundle;
pub mod bucket_node;
pub mod lexicon;
pub mod node;
pub mod packed_store;
pub mod router;
pub mod template_table;
pub mod word_chain;

use std::path::Path;
use std::sync::Arc;

use log::{debug, info};

use crate::errors::{PinyinError, Result};
use crate::utils::{encode_char, is_low_surrogate};

pub use asset_bundle::{names, AssetBundle};
pub use bucket_node::BucketNode;
pub use lexicon::{Lexicon, ScriptMap};
pub use node::{LazyNode, Node};
pub use packed_store::{locate, BlockSpec, PackedStore, Slot, SlotRef, BASIC_BLOCK, BLOCKS, IDEOGRAPHIC_ZERO};
pub use router::{route, route_single, Routed};
pub use template_table::{Syllable, TemplateTable};
pub use word_chain::{InsertOutcome, Priority, Reading, WordMatch};

/// The loaded dictionary: syllables, per-character slots and word streams.
pub struct PinyinDictionary {
    templates: TemplateTable,
    store: PackedStore,
    lexicon: Lexicon,
}

impl PinyinDictionary {
    /// Builds the dictionary from a set of named assets.
    ///
    /// Every asset except the overflow maps is required; any missing,
    /// truncated or inconsistent asset fails the whole load.
    pub fn from_bundle(bundle: &AssetBundle) -> Result<Self> {
        let syllables = std::str::from_utf8(bundle.require(names::SYLLABLES)?)
            .map_err(|err| PinyinError::asset(names::SYLLABLES, format!("invalid UTF-8: {}", err)))?;
        let templates = TemplateTable::parse(syllables)?;
        let store = PackedStore::load(bundle, &templates)?;
        let lexicon = Lexicon::load(bundle, &templates)?;

        // Words led by characters outside the lexical blocks need placeholders too.
        let mut promoted = 0;
        for code_point in lexicon.leading_code_points() {
            let routable = code_point >= 0x80 && char::from_u32(code_point).is_some();
            if routable && store.promote(code_point) {
                promoted += 1;
            }
        }
        debug!("{} word-leading characters promoted to placeholders", promoted);

        let (primary, auxiliary) = lexicon.word_counts();
        info!(
            "pinyin dictionary loaded: {} syllables, {} primary words, {} auxiliary words",
            templates.len(),
            primary,
            auxiliary
        );

        Ok(Self {
            templates,
            store,
            lexicon,
        })
    }

    /// Loads plain asset files from a directory such as `dicts/`.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::from_bundle(&AssetBundle::from_dir(dir)?)
    }

    /// Loads a Zstd-compressed CBOR asset bundle.
    pub fn load_compressed<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_bundle(&AssetBundle::load_compressed(path)?)
    }

    pub fn templates(&self) -> &TemplateTable {
        &self.templates
    }

    pub fn store(&self) -> &PackedStore {
        &self.store
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Character-level reading of `code_point`, without building any word index.
    pub fn char_reading(&self, code_point: u32) -> Option<Syllable> {
        self.store.node(code_point).and_then(|node| node.reading())
    }

    fn readings_from_ids(&self, units: &[u16], record: &lexicon::WordRecord<'_>) -> Vec<Reading> {
        (0..units.len())
            .map(|i| {
                if is_low_surrogate(units[i]) {
                    None
                } else {
                    record.id(i).and_then(|id| self.templates.get(id).cloned())
                }
            })
            .collect()
    }

    /// Builds the word index for words led by `code_point`.
    ///
    /// Returns `fallback` unchanged when the lexicon holds no such word, and
    /// a [`Node::Bucket`] over `fallback` otherwise.
    pub fn materialize(&self, code_point: u32, fallback: Node) -> Node {
        let Some(ch) = char::from_u32(code_point) else {
            return fallback;
        };
        let mut lead_buf = [0u16; 2];
        let lead = encode_char(ch, &mut lead_buf);
        let bucket = BucketNode::new(code_point, fallback.clone());

        let primary = self.lexicon.primary_records(lead);
        let mut words = Vec::with_capacity(primary.len());
        for record in &primary {
            let units = record.units();
            let readings = self.readings_from_ids(&units, record);
            words.extend(WordMatch::new(&units, readings, Priority::Primary));
        }

        // Traditional renderings of words led by this character or its
        // simplified form.
        if lead.len() == 1 {
            let script = self.lexicon.script();
            let simplified = script.to_simplified(lead[0]);
            let mut sources = self.lexicon.primary_records(lead);
            if simplified != lead[0] {
                sources.extend(self.lexicon.primary_records(&[simplified]));
            }
            for record in &sources {
                let units = record.units();
                for rendered in script.traditional_renderings(&units, lead[0]) {
                    let readings = self.readings_from_ids(&units, record);
                    words.extend(WordMatch::new(&rendered, readings, Priority::Mirror));
                }
            }
        }

        for record in self.lexicon.auxiliary_records(lead) {
            let units = record.units();
            let readings = vec![None; units.len()];
            words.extend(WordMatch::new(&units, readings, Priority::Auxiliary));
        }

        let count = bucket.extend(words);
        debug!(
            "materialized U+{:04X}: {} words in {} buckets",
            code_point,
            count,
            bucket.bucket_count()
        );
        if bucket.is_empty() {
            fallback
        } else {
            Node::Bucket(Arc::new(bucket))
        }
    }

    /// Materializes a placeholder at most once and swaps it out of its slot.
    pub(crate) fn materialize_lazy(&self, lazy: &Arc<LazyNode>) -> Node {
        let built = lazy
            .built
            .get_or_init(|| self.materialize(lazy.code_point, lazy.base.clone()))
            .clone();
        if let Some(slot) = self.store.slot(lazy.code_point) {
            slot.replace_lazy(lazy, built.clone());
        }
        built
    }

    /// Resolves any placeholder in `slot` so its current node is final.
    fn settle(&self, slot: &Slot) {
        while let Node::Lazy(lazy) = slot.load() {
            self.materialize_lazy(&lazy);
        }
    }

    /// Sets the reading of a single character at override precedence.
    ///
    /// Words already indexed under the character keep their readings; only
    /// its standalone reading changes.
    pub fn define_character(&self, character: &str, syllable: &str) -> Result<()> {
        let ch = crate::utils::single_char(character).ok_or_else(|| {
            PinyinError::invalid(format!("expected exactly one character, got {:?}", character))
        })?;
        if ch.is_ascii() {
            return Err(PinyinError::invalid(format!("cannot override ASCII character {:?}", ch)));
        }
        validate_syllable(syllable)?;

        let syllable = self.templates.intern(syllable);
        let slot = self.store.slot_or_insert(ch as u32);
        self.settle(&slot);

        let mut guard = slot.write();
        match &*guard {
            Node::Bucket(bucket) => bucket.set_fallback(Node::Leaf(syllable)),
            _ => *guard = Node::Leaf(syllable),
        }
        debug!("defined U+{:04X}", ch as u32);
        Ok(())
    }

    /// Installs a word with explicit readings, one syllable per character,
    /// at override precedence.
    ///
    /// The Traditional/Simplified counterpart of `word` is left untouched.
    pub fn define_word<S: AsRef<str>>(&self, word: &str, syllables: &[S]) -> Result<()> {
        let chars: Vec<char> = word.chars().collect();
        if chars.len() < 2 {
            return Err(PinyinError::invalid(format!(
                "a word needs at least two characters, got {:?}",
                word
            )));
        }
        if syllables.len() != chars.len() {
            return Err(PinyinError::invalid(format!(
                "{:?} has {} characters but {} syllables were given",
                word,
                chars.len(),
                syllables.len()
            )));
        }
        if chars[0].is_ascii() {
            return Err(PinyinError::invalid(format!("word {:?} starts with an ASCII character", word)));
        }
        for syllable in syllables {
            validate_syllable(syllable.as_ref())?;
        }

        let units: Vec<u16> = word.encode_utf16().collect();
        let mut readings: Vec<Reading> = Vec::with_capacity(units.len());
        for (ch, syllable) in chars.iter().zip(syllables) {
            readings.push(Some(self.templates.intern(syllable.as_ref())));
            if ch.len_utf16() == 2 {
                readings.push(None);
            }
        }
        let entry = WordMatch::new(&units, readings, Priority::Override)
            .ok_or_else(|| PinyinError::invalid(format!("cannot index word {:?}", word)))?;

        let bucket = self.ensure_bucket(chars[0] as u32);
        bucket.insert(entry);
        debug!("defined word {:?}", word);
        Ok(())
    }

    /// The bucket node led by `code_point`, creating one over the current
    /// node if the slot does not hold one yet.
    pub fn ensure_bucket(&self, code_point: u32) -> Arc<BucketNode> {
        let slot = self.store.slot_or_insert(code_point);
        self.settle(&slot);

        let mut guard = slot.write();
        if let Node::Bucket(bucket) = &*guard {
            return Arc::clone(bucket);
        }
        let bucket = Arc::new(BucketNode::new(code_point, (*guard).clone()));
        *guard = Node::Bucket(Arc::clone(&bucket));
        bucket
    }
}

fn validate_syllable(syllable: &str) -> Result<()> {
    if syllable.is_empty() || syllable.chars().any(char::is_whitespace) {
        return Err(PinyinError::invalid(format!("invalid syllable {:?}", syllable)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(bundle: &mut AssetBundle, code_point: u32, id: u16) {
        let (block, index) = locate(code_point).unwrap();
        let mut bytes = bundle.get(BLOCKS[block].asset).unwrap().to_vec();
        bytes[index * 2..index * 2 + 2].copy_from_slice(&id.to_be_bytes());
        bundle.insert(BLOCKS[block].asset, bytes);
    }

    fn record(text: &str, ids: Option<&[u16]>) -> Vec<u8> {
        let mut bytes = Vec::new();
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        for id in ids.unwrap_or(&[]) {
            bytes.extend_from_slice(&id.to_be_bytes());
        }
        bytes
    }

    // syllables: 1 chao, 2 zhao, 3 yang, 4 xue, 5 sheng
    fn dictionary() -> PinyinDictionary {
        let mut bundle = AssetBundle::new();
        bundle.insert(names::SYLLABLES, b"chao\nzhao\nyang\nxue\nsheng\n".to_vec());
        for spec in BLOCKS.iter() {
            bundle.insert(spec.asset, vec![0u8; spec.len() * 2]);
        }
        put(&mut bundle, '朝' as u32, 2);
        put(&mut bundle, '阳' as u32, 3);
        put(&mut bundle, '陽' as u32, 3);
        put(&mut bundle, '学' as u32, 4);
        put(&mut bundle, '生' as u32, 5);

        bundle.insert(names::PRIMARY_FIXED[0], record("朝阳", Some(&[1, 3])));
        bundle.insert(names::PRIMARY_FIXED[1], Vec::new());
        bundle.insert(names::PRIMARY_FIXED[2], Vec::new());
        bundle.insert(names::PRIMARY_IRREGULAR, Vec::new());
        bundle.insert(names::AUXILIARY_FIXED[0], record("学生", None));
        bundle.insert(names::AUXILIARY_FIXED[1], Vec::new());
        bundle.insert(names::AUXILIARY_FIXED[2], Vec::new());
        bundle.insert(names::AUXILIARY_IRREGULAR, Vec::new());
        bundle.insert(names::TRAD_SIMP, record("陽阳", None));
        PinyinDictionary::from_bundle(&bundle).unwrap()
    }

    #[test]
    fn materialize_builds_primary_and_mirror_words() {
        let dict = dictionary();
        let node = dict.materialize('朝' as u32, Node::Empty);
        let Node::Bucket(bucket) = node else {
            panic!("expected a bucket");
        };
        let words = bucket.words();
        assert_eq!(words.len(), 2);
        assert!(words.iter().any(|w| w.priority == Priority::Primary && w.tail() == ['阳' as u16]));
        assert!(words.iter().any(|w| w.priority == Priority::Mirror && w.tail() == ['陽' as u16]));
    }

    #[test]
    fn auxiliary_words_store_no_readings() {
        let dict = dictionary();
        let Node::Bucket(bucket) = dict.materialize('学' as u32, Node::Empty) else {
            panic!("expected a bucket");
        };
        let words = bucket.words();
        assert_eq!(words[0].priority, Priority::Auxiliary);
        assert!(words[0].readings().iter().all(Option::is_none));
    }

    #[test]
    fn auxiliary_words_follow_character_overrides() {
        let dict = dictionary();
        let text: Vec<u16> = "学生".encode_utf16().collect();
        let write = |dict: &PinyinDictionary| {
            let mut out = String::new();
            crate::scan::scan(dict, &text, &mut crate::scan::PinyinSink::new(&mut out, " "));
            out
        };
        assert_eq!(write(&dict), "xue sheng");
        dict.define_character("生", "sen").unwrap();
        assert_eq!(write(&dict), "xue sen");
    }

    #[test]
    fn materialize_without_words_returns_fallback() {
        let dict = dictionary();
        let node = dict.materialize('阳' as u32, Node::Leaf(Syllable::from("yang")));
        assert!(matches!(node, Node::Leaf(_)));
    }

    #[test]
    fn lazy_slot_is_replaced_once() {
        let dict = dictionary();
        let Some(Node::Lazy(lazy)) = dict.store().node('朝' as u32) else {
            panic!("expected a placeholder");
        };
        let first = dict.materialize_lazy(&lazy);
        let second = dict.materialize_lazy(&lazy);
        assert!(lazy.is_materialized());
        match (&first, &second) {
            (Node::Bucket(a), Node::Bucket(b)) => assert!(Arc::ptr_eq(a, b)),
            _ => panic!("expected buckets"),
        }
        assert!(matches!(dict.store().node('朝' as u32), Some(Node::Bucket(_))));
    }

    #[test]
    fn define_character_keeps_words() {
        let dict = dictionary();
        dict.define_character("朝", "chao").unwrap();
        let Some(Node::Bucket(bucket)) = dict.store().node('朝' as u32) else {
            panic!("expected a bucket");
        };
        assert_eq!(bucket.len(), 2);
        assert_eq!(dict.char_reading('朝' as u32).as_deref(), Some("chao"));
    }

    #[test]
    fn define_character_validates_input() {
        let dict = dictionary();
        assert!(dict.define_character("朝阳", "a").is_err());
        assert!(dict.define_character("", "a").is_err());
        assert!(dict.define_character("a", "a").is_err());
        assert!(dict.define_character("朝", "").is_err());
        assert!(dict.define_character("朝", "zh ao").is_err());
        assert_eq!(dict.char_reading('朝' as u32).as_deref(), Some("zhao"));
    }

    #[test]
    fn define_word_validates_input() {
        let dict = dictionary();
        assert!(dict.define_word("朝", &["chao"]).is_err());
        assert!(dict.define_word("朝阳", &["chao"]).is_err());
        assert!(dict.define_word("a朝", &["a", "chao"]).is_err());
        assert!(dict.define_word("朝阳", &["chao", ""]).is_err());
        // Nothing was materialized by the failed calls.
        assert!(dict.store().node('朝' as u32).unwrap().is_lazy());
    }

    #[test]
    fn define_word_outside_blocks_uses_overflow() {
        let dict = dictionary();
        dict.define_word("é朝", &["e", "zhao"]).unwrap();
        let bucket = dict.ensure_bucket('é' as u32);
        assert_eq!(bucket.len(), 1);
        assert!(matches!(bucket.fallback(), Node::Unknown));
    }
}
