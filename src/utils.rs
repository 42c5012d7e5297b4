//! UTF-16 helpers shared by the router, the lexicon loader and the scan sinks.

/// Returns `true` for a UTF-16 high (leading) surrogate.
#[inline(always)]
pub fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

/// Returns `true` for a UTF-16 low (trailing) surrogate.
#[inline(always)]
pub fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

/// Combines a surrogate pair into a supplementary-plane code point.
///
/// Callers must check both halves with [`is_high_surrogate`] and
/// [`is_low_surrogate`] first.
#[inline(always)]
pub fn combine_surrogates(high: u16, low: u16) -> u32 {
    0x10000 + (((high as u32) - 0xD800) << 10) + ((low as u32) - 0xDC00)
}

/// Decodes the code point starting at `pos`, returning it with the number of
/// units it spans. An unpaired surrogate is returned as-is with width 1.
///
/// # Example
/// ```
/// use fast_pinyin::utils::code_point_at;
///
/// let units: Vec<u16> = "a𠀀".encode_utf16().collect();
/// assert_eq!(code_point_at(&units, 0), ('a' as u32, 1));
/// assert_eq!(code_point_at(&units, 1), (0x20000, 2));
/// ```
#[inline]
pub fn code_point_at(units: &[u16], pos: usize) -> (u32, usize) {
    let unit = units[pos];
    if is_high_surrogate(unit) {
        if let Some(&low) = units.get(pos + 1) {
            if is_low_surrogate(low) {
                return (combine_surrogates(unit, low), 2);
            }
        }
    }
    (unit as u32, 1)
}

/// Appends UTF-16 units to a `String`, replacing unpaired surrogates with
/// U+FFFD.
#[inline]
pub fn push_utf16(out: &mut String, units: &[u16]) {
    for ch in char::decode_utf16(units.iter().copied()) {
        out.push(ch.unwrap_or(char::REPLACEMENT_CHARACTER));
    }
}

/// Returns the only `char` of `text`, or `None` when it holds zero or several
/// code points.
pub fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Some(ch),
        _ => None,
    }
}

/// Encodes one code point as UTF-16 into a fixed buffer, returning the used
/// prefix.
#[inline]
pub fn encode_char(ch: char, buf: &mut [u16; 2]) -> &[u16] {
    ch.encode_utf16(buf)
}
