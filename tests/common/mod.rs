#![allow(dead_code)]

// In-memory asset bundle shared by the integration tests.

use fast_pinyin::dictionary_lib::{locate, names, AssetBundle, BLOCKS};
use fast_pinyin::Pinyin;

/// Character readings written into the block blobs.
pub const CHARACTERS: &[(char, &str)] = &[
    ('中', "zhong"),
    ('国', "guo"),
    ('國', "guo"),
    ('人', "ren"),
    ('民', "min"),
    ('朝', "zhao"),
    ('阳', "yang"),
    ('陽', "yang"),
    ('行', "xing"),
    ('银', "yin"),
    ('銀', "yin"),
    ('长', "chang"),
    ('長', "chang"),
    ('大', "da"),
    ('成', "cheng"),
    ('学', "xue"),
    ('生', "sheng"),
    ('城', "cheng"),
    ('吧', "ba"),
    ('乐', "le"),
    ('音', "yin"),
    ('华', "hua"),
    ('華', "hua"),
    ('共', "gong"),
    ('和', "he"),
    ('〇', "ling"),
    ('\u{20000}', "qiu"),
    ('\u{F900}', "qi"),
    ('\u{2F00}', "yi"),
    ('\u{2A700}', "ju"),
    ('头', "tóu"),
    ('頭', "tóu"),
    ('发', "fā"),
    ('發', "fā"),
    ('髮', "fà"),
];

/// Words stored with explicit readings.
pub const PRIMARY_WORDS: &[(&str, &[&str])] = &[
    ("朝阳", &["chao", "yang"]),
    ("银行", &["yin", "hang"]),
    ("长大", &["zhang", "da"]),
    ("长大成人", &["zhang", "da", "cheng", "ren"]),
    ("音乐", &["yin", "yue"]),
    ("生长", &["sheng", "zhang"]),
    ("行\u{20000}", &["hang", "qiu"]),
    ("中华人民共和国", &["zhong", "hua", "ren", "min", "gong", "he", "guo"]),
    ("头发", &["tóu", "fa"]),
    ("\u{2A700}中", &["kao", "zhong"]),
];

/// Words kept only for segmentation.
pub const AUXILIARY_WORDS: &[&str] = &["学生"];

/// `(traditional, simplified)` pairs.
pub const TRAD_SIMP: &[(char, char)] = &[
    ('陽', '阳'),
    ('銀', '银'),
    ('長', '长'),
    ('國', '国'),
    ('華', '华'),
    ('頭', '头'),
    ('發', '发'),
    ('髮', '发'),
];

/// A code point inside the basic block that has no reading.
pub const NO_READING: char = '\u{9FEF}';

#[derive(Default)]
struct SyllableIds {
    list: Vec<String>,
}

impl SyllableIds {
    fn id(&mut self, syllable: &str) -> u16 {
        match self.list.iter().position(|s| s == syllable) {
            Some(index) => index as u16 + 1,
            None => {
                self.list.push(syllable.to_string());
                self.list.len() as u16
            }
        }
    }

    fn text(&self) -> Vec<u8> {
        let mut text = self.list.join("\n");
        text.push('\n');
        text.into_bytes()
    }
}

type Record = (Vec<u16>, Vec<u16>);

fn encode(records: &mut [Record], with_ids: bool, length_prefixed: bool) -> Vec<u8> {
    records.sort_by(|a, b| a.0.cmp(&b.0));
    let mut bytes = Vec::new();
    for (units, ids) in records.iter() {
        if length_prefixed {
            bytes.push(units.len() as u8);
        }
        for unit in units {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        if with_ids {
            for id in ids {
                bytes.extend_from_slice(&id.to_be_bytes());
            }
        }
    }
    bytes
}

fn split_by_length(records: Vec<Record>) -> ([Vec<Record>; 3], Vec<Record>) {
    let mut fixed: [Vec<Record>; 3] = Default::default();
    let mut irregular = Vec::new();
    for record in records {
        match record.0.len() {
            len @ 2..=4 => fixed[len - 2].push(record),
            _ => irregular.push(record),
        }
    }
    (fixed, irregular)
}

/// Builds the complete fixture bundle.
pub fn bundle() -> AssetBundle {
    let mut syllables = SyllableIds::default();
    let mut bundle = AssetBundle::new();

    let mut blocks: Vec<Vec<u8>> = BLOCKS.iter().map(|spec| vec![0u8; spec.len() * 2]).collect();
    for &(ch, syllable) in CHARACTERS {
        let id = syllables.id(syllable);
        let (block, index) = locate(ch as u32).expect("fixture character outside the blocks");
        blocks[block][index * 2..index * 2 + 2].copy_from_slice(&id.to_be_bytes());
    }
    for (spec, bytes) in BLOCKS.iter().zip(blocks) {
        bundle.insert(spec.asset, bytes);
    }

    let mut primary = Vec::new();
    for &(word, readings) in PRIMARY_WORDS {
        let units: Vec<u16> = word.encode_utf16().collect();
        let mut ids = Vec::with_capacity(units.len());
        for (ch, syllable) in word.chars().zip(readings.iter()) {
            ids.push(syllables.id(syllable));
            if ch.len_utf16() == 2 {
                ids.push(0);
            }
        }
        primary.push((units, ids));
    }
    let (mut fixed, mut irregular) = split_by_length(primary);
    for (name, records) in names::PRIMARY_FIXED.iter().zip(fixed.iter_mut()) {
        bundle.insert(*name, encode(records, true, false));
    }
    bundle.insert(names::PRIMARY_IRREGULAR, encode(&mut irregular, true, true));

    let auxiliary = AUXILIARY_WORDS
        .iter()
        .map(|word| (word.encode_utf16().collect(), Vec::new()))
        .collect();
    let (mut fixed, mut irregular) = split_by_length(auxiliary);
    for (name, records) in names::AUXILIARY_FIXED.iter().zip(fixed.iter_mut()) {
        bundle.insert(*name, encode(records, false, false));
    }
    bundle.insert(names::AUXILIARY_IRREGULAR, encode(&mut irregular, false, true));

    let mut pairs = Vec::new();
    for &(traditional, simplified) in TRAD_SIMP {
        pairs.extend_from_slice(&(traditional as u16).to_be_bytes());
        pairs.extend_from_slice(&(simplified as u16).to_be_bytes());
    }
    bundle.insert(names::TRAD_SIMP, pairs);

    bundle.insert(names::SYLLABLES, syllables.text());
    bundle
}

/// A fresh engine over the fixture bundle.
pub fn pinyin() -> Pinyin {
    Pinyin::from_bundle(&bundle()).expect("fixture bundle must load")
}
