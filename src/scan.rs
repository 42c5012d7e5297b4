//! The single-pass scan loop and its output sinks.

use crate::dictionary_lib::{route, route_single, PinyinDictionary};
use crate::utils::push_utf16;

/// How a raw (untranscribed) character takes part in separator insertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RawKind {
    /// Han character without a reading: separated like a syllable.
    Separated,
    /// Non-Han character: no separator between two transparent items.
    Transparent,
}

/// Receives one output item per code point, in input order.
pub trait Sink {
    fn push_syllable(&mut self, syllable: &str);
    fn push_raw(&mut self, units: &[u16], kind: RawKind);
}

/// How an output item takes part in separator insertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Item {
    Separated,
    Transparent,
    /// Whitespace from the input.
    Space,
}

impl Item {
    #[inline]
    fn raw(units: &[u16], kind: RawKind) -> Item {
        match kind {
            RawKind::Separated => Item::Separated,
            RawKind::Transparent if is_space(units) => Item::Space,
            RawKind::Transparent => Item::Transparent,
        }
    }
}

#[inline]
fn is_space(units: &[u16]) -> bool {
    matches!(units, [unit] if char::from_u32(*unit as u32).is_some_and(char::is_whitespace))
}

/// Tracks whether a separator is due before the next item.
///
/// A separator goes between two items unless both are transparent or either
/// one is whitespace.
#[derive(Default)]
struct Separation {
    last: Option<Item>,
}

impl Separation {
    #[inline(always)]
    fn next(&mut self, item: Item) -> bool {
        let due = match self.last {
            None => false,
            Some(Item::Space) => false,
            Some(_) if item == Item::Space => false,
            Some(previous) => !(previous == Item::Transparent && item == Item::Transparent),
        };
        self.last = Some(item);
        due
    }
}

/// Writes syllables joined by a separator.
pub struct PinyinSink<'a> {
    out: &'a mut String,
    separator: &'a str,
    separation: Separation,
}

impl<'a> PinyinSink<'a> {
    pub fn new(out: &'a mut String, separator: &'a str) -> Self {
        Self {
            out,
            separator,
            separation: Separation::default(),
        }
    }
}

impl Sink for PinyinSink<'_> {
    #[inline]
    fn push_syllable(&mut self, syllable: &str) {
        if self.separation.next(Item::Separated) {
            self.out.push_str(self.separator);
        }
        self.out.push_str(syllable);
    }

    #[inline]
    fn push_raw(&mut self, units: &[u16], kind: RawKind) {
        if self.separation.next(Item::raw(units, kind)) {
            self.out.push_str(self.separator);
        }
        push_utf16(self.out, units);
    }
}

/// Writes the first letter of each syllable, optionally separated.
pub struct InitialSink<'a> {
    out: &'a mut String,
    separator: Option<&'a str>,
    separation: Separation,
}

impl<'a> InitialSink<'a> {
    pub fn new(out: &'a mut String, separator: Option<&'a str>) -> Self {
        Self {
            out,
            separator,
            separation: Separation::default(),
        }
    }

    #[inline]
    fn separate(&mut self, item: Item) {
        if self.separation.next(item) {
            if let Some(separator) = self.separator {
                self.out.push_str(separator);
            }
        }
    }
}

impl Sink for InitialSink<'_> {
    #[inline]
    fn push_syllable(&mut self, syllable: &str) {
        self.separate(Item::Separated);
        if let Some(initial) = syllable.chars().next() {
            self.out.push(initial);
        }
    }

    #[inline]
    fn push_raw(&mut self, units: &[u16], kind: RawKind) {
        self.separate(Item::raw(units, kind));
        push_utf16(self.out, units);
    }
}

/// Collects one string per code point.
pub struct ArraySink<'a> {
    out: &'a mut Vec<String>,
}

impl<'a> ArraySink<'a> {
    pub fn new(out: &'a mut Vec<String>) -> Self {
        Self { out }
    }
}

impl Sink for ArraySink<'_> {
    fn push_syllable(&mut self, syllable: &str) {
        self.out.push(syllable.to_owned());
    }

    fn push_raw(&mut self, units: &[u16], _kind: RawKind) {
        let mut item = String::with_capacity(units.len() * 3);
        push_utf16(&mut item, units);
        self.out.push(item);
    }
}

/// Walks `text` once, routing each position and letting the routed node
/// consume a character or a whole word.
///
/// The two-unit router is used while a following unit exists; the last unit
/// goes through the single-unit router.
pub fn scan<S: Sink>(dictionary: &PinyinDictionary, text: &[u16], sink: &mut S) {
    if text.is_empty() {
        return;
    }
    let store = dictionary.store();
    let end = text.len() - 1;
    let mut pos = 0;
    while pos < end {
        let routed = route(store, text, pos);
        pos = routed.node.write(dictionary, text, pos, routed.width, sink);
    }
    if pos == end {
        let routed = route_single(store, text, pos);
        routed.node.write(dictionary, text, pos, routed.width, sink);
    }
}
