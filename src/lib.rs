//! Chinese to pinyin conversion over UTF-16, with polyphones resolved by
//! longest match against a lazily built word index.
//!
//! ```no_run
//! use fast_pinyin::Pinyin;
//!
//! let pinyin = Pinyin::from_dir("dicts").unwrap();
//! assert_eq!(pinyin.get_pinyin("朝阳", " "), "chao yang");
//! assert_eq!(pinyin.get_initial("中国", None), "zg");
//! ```

use std::path::Path;

use log::error;
use once_cell::sync::Lazy;

use crate::buffer_pool::BufferPool;
use crate::dictionary_lib::{AssetBundle, PinyinDictionary};
use crate::scan::{scan, ArraySink, InitialSink, PinyinSink};

pub mod buffer_pool;
pub mod config;
pub mod custom_dict;
pub mod dictionary_lib;
pub mod errors;
pub mod scan;
pub mod utils;

pub use config::{AssetSource, PinyinConfig};
pub use custom_dict::CustomDictionaryReport;
pub use errors::{get_last_error, set_last_error, PinyinError, Result};

/// Separator used by [`get_pinyin`] when the caller has no preference.
pub const DEFAULT_SEPARATOR: &str = " ";

/// A loaded dictionary plus the buffers used to scan with it.
///
/// `Pinyin` is `Send + Sync`; every method takes `&self`.
pub struct Pinyin {
    dictionary: PinyinDictionary,
    pool: BufferPool,
}

impl Pinyin {
    /// Loads the assets named by `PINYIN_DATA` (default `dicts/`).
    pub fn new() -> Result<Self> {
        Self::from_config(&PinyinConfig::from_env())
    }

    pub fn from_config(config: &PinyinConfig) -> Result<Self> {
        let bundle = config.source.load()?;
        let pinyin = Self::from_bundle_with_pool(&bundle, config.pool_size)?;
        if let Some(path) = &config.custom_dictionary {
            pinyin.load_custom_dictionary(path);
        }
        Ok(pinyin)
    }

    pub fn from_bundle(bundle: &AssetBundle) -> Result<Self> {
        Self::from_bundle_with_pool(bundle, buffer_pool::DEFAULT_POOL_SIZE)
    }

    fn from_bundle_with_pool(bundle: &AssetBundle, pool_size: usize) -> Result<Self> {
        Ok(Self {
            dictionary: PinyinDictionary::from_bundle(bundle)?,
            pool: BufferPool::new(pool_size),
        })
    }

    /// Loads plain asset files from `dir`.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::from_config(&PinyinConfig::with_source(AssetSource::Directory(
            dir.as_ref().to_path_buf(),
        )))
    }

    /// Loads a Zstd-compressed CBOR asset bundle.
    pub fn load_compressed<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_config(&PinyinConfig::with_source(AssetSource::Bundle(
            path.as_ref().to_path_buf(),
        )))
    }

    /// The process-wide instance, loaded on first use from the environment
    /// configuration. A load failure is kept and returned to every caller.
    pub fn global() -> std::result::Result<&'static Pinyin, &'static PinyinError> {
        Lazy::force(&GLOBAL).as_ref()
    }

    pub fn dictionary(&self) -> &PinyinDictionary {
        &self.dictionary
    }

    /// Converts `text`, joining syllables with `separator`.
    ///
    /// Characters without a reading are copied through; runs of non-Han
    /// characters are never split by the separator.
    pub fn get_pinyin(&self, text: &str, separator: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        let mut buffers = self.pool.acquire();
        let buffers = &mut *buffers;
        buffers.units.extend(text.encode_utf16());
        buffers.text.reserve(text.len() * 2);
        scan(
            &self.dictionary,
            &buffers.units,
            &mut PinyinSink::new(&mut buffers.text, separator),
        );
        buffers.text.as_str().to_owned()
    }

    /// Same as [`get_pinyin`](Self::get_pinyin) for text already in UTF-16.
    pub fn get_pinyin_utf16(&self, units: &[u16], separator: &str) -> String {
        let mut buffers = self.pool.acquire();
        scan(
            &self.dictionary,
            units,
            &mut PinyinSink::new(&mut buffers.text, separator),
        );
        buffers.text.as_str().to_owned()
    }

    /// First letter of each syllable, optionally separated.
    pub fn get_initial(&self, text: &str, separator: Option<&str>) -> String {
        if text.is_empty() {
            return String::new();
        }
        let mut buffers = self.pool.acquire();
        let buffers = &mut *buffers;
        buffers.units.extend(text.encode_utf16());
        scan(
            &self.dictionary,
            &buffers.units,
            &mut InitialSink::new(&mut buffers.text, separator),
        );
        buffers.text.as_str().to_owned()
    }

    /// One entry per code point: its syllable, or the character itself.
    pub fn get_array(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        let mut buffers = self.pool.acquire();
        buffers.units.extend(text.encode_utf16());
        let mut out = Vec::with_capacity(text.chars().count());
        scan(&self.dictionary, &buffers.units, &mut ArraySink::new(&mut out));
        out
    }

    /// Replaces the reading of one character.
    pub fn define_character(&self, character: &str, pinyin: &str) -> Result<()> {
        self.dictionary.define_character(character, pinyin)
    }

    /// Installs a word with one syllable per character; it wins over any
    /// bundled word with the same text.
    pub fn define_word<S: AsRef<str>>(&self, word: &str, pinyin: &[S]) -> Result<()> {
        self.dictionary.define_word(word, pinyin)
    }

    /// Applies a customization file; see [`custom_dict`].
    pub fn load_custom_dictionary<P: AsRef<Path>>(&self, path: P) -> CustomDictionaryReport {
        custom_dict::apply_file(self, path)
    }

    /// Applies customization entries held in memory.
    pub fn apply_custom_entries(&self, contents: &str) -> CustomDictionaryReport {
        custom_dict::apply_str(self, "<memory>", contents)
    }
}

static GLOBAL: Lazy<Result<Pinyin>> = Lazy::new(|| {
    Pinyin::new().map_err(|err| {
        error!("pinyin assets failed to load: {}", err);
        set_last_error(&err.to_string());
        err
    })
});

fn global_or_abort() -> &'static Pinyin {
    match Pinyin::global() {
        Ok(pinyin) => pinyin,
        Err(err) => panic!("pinyin assets failed to load: {}", err),
    }
}

/// Converts `text` with the global instance; `None` in, `None` out.
///
/// # Panics
/// If the global assets cannot be loaded.
pub fn get_pinyin(text: Option<&str>, separator: &str) -> Option<String> {
    let text = text?;
    Some(global_or_abort().get_pinyin(text, separator))
}

/// Initials of `text` with the global instance; `None` in, `None` out.
///
/// # Panics
/// If the global assets cannot be loaded.
pub fn get_initial(text: Option<&str>, separator: Option<&str>) -> Option<String> {
    let text = text?;
    Some(global_or_abort().get_initial(text, separator))
}

/// Per-code-point readings with the global instance; `None` in, `None` out.
///
/// # Panics
/// If the global assets cannot be loaded.
pub fn get_array(text: Option<&str>) -> Option<Vec<String>> {
    let text = text?;
    Some(global_or_abort().get_array(text))
}

/// Overrides a character reading in the global instance.
pub fn define_character(character: &str, pinyin: &str) -> Result<()> {
    Pinyin::global()
        .map_err(Clone::clone)?
        .define_character(character, pinyin)
}

/// Overrides a word in the global instance.
pub fn define_word<S: AsRef<str>>(word: &str, pinyin: &[S]) -> Result<()> {
    Pinyin::global().map_err(Clone::clone)?.define_word(word, pinyin)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn pinyin_is_send_and_sync() {
        assert_send_sync::<Pinyin>();
        assert_send_sync::<PinyinDictionary>();
    }

    #[test]
    fn none_propagates_without_loading() {
        assert_eq!(get_pinyin(None, DEFAULT_SEPARATOR), None);
        assert_eq!(get_initial(None, None), None);
        assert_eq!(get_array(None), None);
    }
}
