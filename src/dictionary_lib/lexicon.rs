//! Sorted word streams and the Simplified/Traditional map.
//!
//! Streams stay in their packed big-endian form; records are decoded only for
//! the run of words sharing the leading character being materialized.

use std::cmp::Ordering;
use std::ops::Range;

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::errors::{PinyinError, Result};
use crate::utils::{combine_surrogates, is_high_surrogate, is_low_surrogate};

use super::asset_bundle::{be_u16, check_records, names, AssetBundle};
use super::template_table::TemplateTable;

/// A packed word record: big-endian code units and, for primary streams,
/// one big-endian template id per unit.
#[derive(Debug, Clone, Copy)]
pub struct WordRecord<'a> {
    units: &'a [u8],
    ids: Option<&'a [u8]>,
}

impl<'a> WordRecord<'a> {
    /// Length in code units.
    #[inline]
    pub fn len(&self) -> usize {
        self.units.len() / 2
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    #[inline]
    pub fn unit(&self, index: usize) -> u16 {
        be_u16(self.units, index)
    }

    pub fn units(&self) -> Vec<u16> {
        (0..self.len()).map(|i| self.unit(i)).collect()
    }

    /// Leading code point of the word.
    pub fn lead(&self) -> u32 {
        let first = self.unit(0);
        if self.len() > 1 && is_high_surrogate(first) && is_low_surrogate(self.unit(1)) {
            combine_surrogates(first, self.unit(1))
        } else {
            first as u32
        }
    }

    /// Template id of unit `index`; `None` for auxiliary records.
    #[inline]
    pub fn id(&self, index: usize) -> Option<u16> {
        self.ids.map(|ids| be_u16(ids, index))
    }

    pub fn has_ids(&self) -> bool {
        self.ids.is_some()
    }

    /// Compares the record's first `prefix.len()` units with `prefix`.
    fn cmp_prefix(&self, prefix: &[u16]) -> Ordering {
        for (i, &want) in prefix.iter().enumerate() {
            if i >= self.len() {
                return Ordering::Less;
            }
            match self.unit(i).cmp(&want) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }
}

/// Random access over the records of one sorted stream.
pub trait RecordStream: Send + Sync {
    /// Asset name, for diagnostics.
    fn name(&self) -> &str;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(&self, index: usize) -> WordRecord<'_>;

    /// Contiguous range of records whose word starts with `prefix`.
    fn find_run(&self, prefix: &[u16]) -> Range<usize> {
        let mut low = 0;
        let mut high = self.len();
        while low < high {
            let mid = low + (high - low) / 2;
            match self.record(mid).cmp_prefix(prefix) {
                Ordering::Less => low = mid + 1,
                Ordering::Greater => high = mid,
                Ordering::Equal => {
                    let mut start = mid;
                    while start > low && self.record(start - 1).cmp_prefix(prefix) == Ordering::Equal {
                        start -= 1;
                    }
                    let mut end = mid + 1;
                    while end < high && self.record(end).cmp_prefix(prefix) == Ordering::Equal {
                        end += 1;
                    }
                    return start..end;
                }
            }
        }
        low..low
    }
}

/// Stream of records that all hold `word_len` units.
#[derive(Debug)]
pub struct FixedStream {
    name: &'static str,
    word_len: usize,
    with_ids: bool,
    count: usize,
    bytes: Box<[u8]>,
}

impl FixedStream {
    pub fn parse(name: &'static str, word_len: usize, with_ids: bool, bytes: &[u8]) -> Result<Self> {
        let record_size = word_len * if with_ids { 4 } else { 2 };
        let count = check_records(name, bytes, record_size)?;
        Ok(Self {
            name,
            word_len,
            with_ids,
            count,
            bytes: bytes.into(),
        })
    }

    pub fn word_len(&self) -> usize {
        self.word_len
    }
}

impl RecordStream for FixedStream {
    fn name(&self) -> &str {
        self.name
    }

    fn len(&self) -> usize {
        self.count
    }

    #[inline]
    fn record(&self, index: usize) -> WordRecord<'_> {
        let unit_bytes = self.word_len * 2;
        let record_size = if self.with_ids { unit_bytes * 2 } else { unit_bytes };
        let at = index * record_size;
        let units = &self.bytes[at..at + unit_bytes];
        let ids = self
            .with_ids
            .then(|| &self.bytes[at + unit_bytes..at + record_size]);
        WordRecord { units, ids }
    }
}

/// Stream of length-prefixed records, indexed by offset at load.
#[derive(Debug)]
pub struct IrregularStream {
    name: &'static str,
    with_ids: bool,
    offsets: Vec<u32>,
    bytes: Box<[u8]>,
}

impl IrregularStream {
    pub fn parse(name: &'static str, with_ids: bool, bytes: &[u8]) -> Result<Self> {
        let mut offsets = Vec::new();
        let mut at = 0usize;
        while at < bytes.len() {
            let len = bytes[at] as usize;
            if len == 0 {
                return Err(PinyinError::asset(name, format!("zero-length record at byte {}", at)));
            }
            let size = 1 + len * if with_ids { 4 } else { 2 };
            if at + size > bytes.len() {
                return Err(PinyinError::asset(
                    name,
                    format!("truncated record at byte {}", at),
                ));
            }
            offsets.push(at as u32);
            at += size;
        }
        Ok(Self {
            name,
            with_ids,
            offsets,
            bytes: bytes.into(),
        })
    }
}

impl RecordStream for IrregularStream {
    fn name(&self) -> &str {
        self.name
    }

    fn len(&self) -> usize {
        self.offsets.len()
    }

    #[inline]
    fn record(&self, index: usize) -> WordRecord<'_> {
        let at = self.offsets[index] as usize;
        let unit_bytes = self.bytes[at] as usize * 2;
        let start = at + 1;
        let units = &self.bytes[start..start + unit_bytes];
        let ids = self
            .with_ids
            .then(|| &self.bytes[start + unit_bytes..start + unit_bytes * 2]);
        WordRecord { units, ids }
    }
}

/// Upper bound on the Traditional renderings produced for one word.
pub const MAX_RENDERINGS: usize = 16;

/// Traditional ↔ Simplified code unit map.
#[derive(Debug, Default)]
pub struct ScriptMap {
    simplified: FxHashMap<u16, u16>,
    traditional: FxHashMap<u16, Vec<u16>>,
}

impl ScriptMap {
    /// Parses `(traditional, simplified)` big-endian pairs. A simplified unit
    /// keeps every traditional form listed for it, in listing order.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let count = check_records(names::TRAD_SIMP, bytes, 4)?;
        let mut map = ScriptMap::default();
        for record in 0..count {
            let traditional = be_u16(bytes, record * 2);
            let simplified = be_u16(bytes, record * 2 + 1);
            map.simplified.entry(traditional).or_insert(simplified);
            let forms = map.traditional.entry(simplified).or_default();
            if !forms.contains(&traditional) {
                forms.push(traditional);
            }
        }
        Ok(map)
    }

    #[inline]
    pub fn to_simplified(&self, unit: u16) -> u16 {
        self.simplified.get(&unit).copied().unwrap_or(unit)
    }

    /// First listed traditional form of `unit`, or `unit` itself.
    #[inline]
    pub fn to_traditional(&self, unit: u16) -> u16 {
        self.traditional_forms(unit).first().copied().unwrap_or(unit)
    }

    /// Every traditional form of `unit`; empty when it has none.
    #[inline]
    pub fn traditional_forms(&self, unit: u16) -> &[u16] {
        self.traditional.get(&unit).map_or(&[][..], Vec::as_slice)
    }

    /// Traditional renderings of `units` that start with `lead`, other than
    /// `units` itself.
    ///
    /// Units with several traditional forms multiply the renderings, up to
    /// [`MAX_RENDERINGS`]. Units without one are kept as they are.
    pub fn traditional_renderings(&self, units: &[u16], lead: u16) -> Vec<Vec<u16>> {
        let Some((&first, rest)) = units.split_first() else {
            return Vec::new();
        };
        let first_forms = self.traditional_forms(first);
        let leads = if first_forms.is_empty() {
            first == lead
        } else {
            first_forms.contains(&lead)
        };
        if !leads {
            return Vec::new();
        }

        let mut renderings = vec![vec![lead]];
        for &unit in rest {
            let forms = self.traditional_forms(unit);
            let options = if forms.is_empty() { std::slice::from_ref(&unit) } else { forms };
            let mut next = Vec::with_capacity((renderings.len() * options.len()).min(MAX_RENDERINGS));
            'prefixes: for prefix in &renderings {
                for &option in options {
                    if next.len() == MAX_RENDERINGS {
                        break 'prefixes;
                    }
                    let mut rendering = Vec::with_capacity(units.len());
                    rendering.extend_from_slice(prefix);
                    rendering.push(option);
                    next.push(rendering);
                }
            }
            renderings = next;
        }
        renderings.retain(|rendering| rendering.as_slice() != units);
        renderings
    }

    pub fn len(&self) -> usize {
        self.simplified.len()
    }

    pub fn is_empty(&self) -> bool {
        self.simplified.is_empty()
    }
}

type Stream = Box<dyn RecordStream>;

/// Primary and auxiliary word streams plus the script map.
pub struct Lexicon {
    primary: Vec<Stream>,
    auxiliary: Vec<Stream>,
    script: ScriptMap,
}

impl Lexicon {
    /// Loads every lexicon stream and checks that each stored template id
    /// exists in `templates`.
    pub fn load(bundle: &AssetBundle, templates: &TemplateTable) -> Result<Self> {
        let mut primary: Vec<Stream> = Vec::with_capacity(4);
        let mut auxiliary: Vec<Stream> = Vec::with_capacity(4);

        for (word_len, name) in (2..).zip(names::PRIMARY_FIXED) {
            primary.push(Box::new(FixedStream::parse(name, word_len, true, bundle.require(name)?)?));
        }
        primary.push(Box::new(IrregularStream::parse(
            names::PRIMARY_IRREGULAR,
            true,
            bundle.require(names::PRIMARY_IRREGULAR)?,
        )?));

        for (word_len, name) in (2..).zip(names::AUXILIARY_FIXED) {
            auxiliary.push(Box::new(FixedStream::parse(name, word_len, false, bundle.require(name)?)?));
        }
        auxiliary.push(Box::new(IrregularStream::parse(
            names::AUXILIARY_IRREGULAR,
            false,
            bundle.require(names::AUXILIARY_IRREGULAR)?,
        )?));

        for stream in &primary {
            check_ids(&**stream, templates)?;
        }

        let script = ScriptMap::parse(bundle.require(names::TRAD_SIMP)?)?;

        debug!(
            "lexicon loaded: {} primary, {} auxiliary words, {} script pairs",
            primary.iter().map(|s| s.len()).sum::<usize>(),
            auxiliary.iter().map(|s| s.len()).sum::<usize>(),
            script.len()
        );

        Ok(Self {
            primary,
            auxiliary,
            script,
        })
    }

    /// Primary records whose word starts with `prefix`.
    pub fn primary_records(&self, prefix: &[u16]) -> Vec<WordRecord<'_>> {
        collect_runs(&self.primary, prefix)
    }

    /// Auxiliary records whose word starts with `prefix`.
    pub fn auxiliary_records(&self, prefix: &[u16]) -> Vec<WordRecord<'_>> {
        collect_runs(&self.auxiliary, prefix)
    }

    pub fn script(&self) -> &ScriptMap {
        &self.script
    }

    /// Every code point leading a stored word, plus the traditional forms of
    /// those leads, which head the mirrored renderings.
    pub fn leading_code_points(&self) -> FxHashSet<u32> {
        let mut leads = FxHashSet::default();
        for stream in self.primary.iter().chain(&self.auxiliary) {
            let mut previous = None;
            for index in 0..stream.len() {
                let lead = stream.record(index).lead();
                if previous != Some(lead) {
                    leads.insert(lead);
                    previous = Some(lead);
                }
            }
        }
        let mirrored: Vec<u32> = leads
            .iter()
            .filter(|&&lead| lead <= 0xFFFF)
            .flat_map(|&lead| self.script.traditional_forms(lead as u16))
            .map(|&unit| unit as u32)
            .collect();
        leads.extend(mirrored);
        leads
    }

    /// Total number of stored words (primary, auxiliary).
    pub fn word_counts(&self) -> (usize, usize) {
        (
            self.primary.iter().map(|s| s.len()).sum(),
            self.auxiliary.iter().map(|s| s.len()).sum(),
        )
    }
}

fn collect_runs<'a>(streams: &'a [Stream], prefix: &[u16]) -> Vec<WordRecord<'a>> {
    let mut records = Vec::new();
    for stream in streams {
        let run = stream.find_run(prefix);
        records.extend(run.map(|index| stream.record(index)));
    }
    records
}

fn check_ids(stream: &dyn RecordStream, templates: &TemplateTable) -> Result<()> {
    let limit = templates.len();
    for index in 0..stream.len() {
        let record = stream.record(index);
        for i in 0..record.len() {
            if let Some(id) = record.id(i) {
                if id as usize > limit {
                    return Err(PinyinError::asset(
                        stream.name(),
                        format!("record {} references template id {} (table has {})", index, id, limit),
                    ));
                }
            }
        }
    }
    Ok(())
}
