//! Reader for user customization files.
//!
//! ```text
//! # comment
//! 朝阳 = zhao yang
//! 长 chang
//! 银行, yin, hang
//! ```

use std::fs;
use std::path::Path;

use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{set_last_error, PinyinError, Result};
use crate::utils::single_char;
use crate::Pinyin;

static ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<text>[^\s=,]+)\s*(?:[=,]|\s)\s*(?P<syllables>.*?)\s*$").unwrap()
});

static SYLLABLE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s,]+").unwrap());

/// One parsed customization line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomEntry {
    pub text: String,
    pub syllables: Vec<String>,
}

impl CustomEntry {
    /// A single character with a single syllable.
    pub fn is_character(&self) -> bool {
        self.syllables.len() == 1 && single_char(&self.text).is_some()
    }
}

/// Summary of one applied customization file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CustomDictionaryReport {
    pub applied: usize,
    pub skipped: usize,
}

/// Parses one line; `None` for blank lines and comments.
pub fn parse_line(line: &str) -> Option<Result<CustomEntry>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let Some(caps) = ENTRY.captures(line) else {
        return Some(Err(PinyinError::ParseError(format!("malformed entry {:?}", line))));
    };
    let text = caps["text"].to_string();
    let syllables: Vec<String> = SYLLABLE_SPLIT
        .split(&caps["syllables"])
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if syllables.is_empty() {
        return Some(Err(PinyinError::ParseError(format!("no syllables for {:?}", text))));
    }
    Some(Ok(CustomEntry { text, syllables }))
}

/// Parses a whole file, pairing each entry or error with its 1-based line.
pub fn parse(contents: &str) -> Vec<(usize, Result<CustomEntry>)> {
    contents
        .lines()
        .enumerate()
        .filter_map(|(index, line)| parse_line(line).map(|entry| (index + 1, entry)))
        .collect()
}

fn apply_entry(pinyin: &Pinyin, entry: &CustomEntry) -> Result<()> {
    if entry.is_character() {
        pinyin.define_character(&entry.text, &entry.syllables[0])
    } else {
        pinyin.define_word(&entry.text, entry.syllables.as_slice())
    }
}

/// Applies every valid line of `contents`; bad lines are logged and skipped.
pub fn apply_str(pinyin: &Pinyin, source: &str, contents: &str) -> CustomDictionaryReport {
    let mut report = CustomDictionaryReport::default();
    for (line_no, entry) in parse(contents) {
        match entry.and_then(|entry| apply_entry(pinyin, &entry)) {
            Ok(()) => report.applied += 1,
            Err(err) => {
                let message = format!("{}:{}: {}", source, line_no, err);
                warn!("skipping customization entry: {}", message);
                set_last_error(&message);
                report.skipped += 1;
            }
        }
    }
    info!(
        "customization {} applied: {} entries, {} skipped",
        source, report.applied, report.skipped
    );
    report
}

/// Reads and applies a customization file. An unreadable file is logged and
/// yields an empty report.
pub fn apply_file<P: AsRef<Path>>(pinyin: &Pinyin, path: P) -> CustomDictionaryReport {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(contents) => apply_str(pinyin, &path.display().to_string(), &contents),
        Err(err) => {
            let message = format!("Failed to read customization file {}: {}", path.display(), err);
            warn!("{}", message);
            set_last_error(&message);
            CustomDictionaryReport::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(text: &str, syllables: &[&str]) -> CustomEntry {
        CustomEntry {
            text: text.to_string(),
            syllables: syllables.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn accepts_all_separators() {
        assert_eq!(parse_line("朝阳 = zhao yang").unwrap().unwrap(), entry("朝阳", &["zhao", "yang"]));
        assert_eq!(parse_line("朝阳=zhao,yang").unwrap().unwrap(), entry("朝阳", &["zhao", "yang"]));
        assert_eq!(parse_line("  长 chang  ").unwrap().unwrap(), entry("长", &["chang"]));
        assert_eq!(parse_line("银行, yin, hang").unwrap().unwrap(), entry("银行", &["yin", "hang"]));
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   ").is_none());
        assert!(parse_line("# 朝阳 = zhao yang").is_none());
    }

    #[test]
    fn reports_missing_syllables() {
        assert!(parse_line("朝阳").unwrap().is_err());
        assert!(parse_line("朝阳 =").unwrap().is_err());
        assert!(parse_line("= zhao").unwrap().is_err());
    }

    #[test]
    fn character_entries_are_detected() {
        assert!(entry("长", &["chang"]).is_character());
        assert!(!entry("长", &["chang", "zhang"]).is_character());
        assert!(!entry("长大", &["zhang", "da"]).is_character());
    }

    #[test]
    fn parse_numbers_lines() {
        let parsed = parse("# header\n\n朝阳 zhao yang\nbad\n");
        let lines: Vec<usize> = parsed.iter().map(|(line, _)| *line).collect();
        assert_eq!(lines, vec![3, 4]);
        assert!(parsed[0].1.is_ok());
        assert!(parsed[1].1.is_err());
    }
}
