//! Named binary assets and the big-endian readers used to decode them.
//!
//! Assets live either as plain files in a directory (`dicts/` by default) or
//! packed together in a single Zstd-compressed CBOR [`AssetBundle`].

use std::collections::BTreeMap;
use std::fs;
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_cbor::{from_reader, from_slice};
use zstd::{decode_all, Decoder, Encoder};

use crate::errors::{PinyinError, Result};

/// File names of every asset the loader knows about.
pub mod names {
    pub const SYLLABLES: &str = "syllables.txt";
    pub const OVERFLOW_16: &str = "overflow16.bin";
    pub const OVERFLOW_32: &str = "overflow32.bin";
    pub const TRAD_SIMP: &str = "trad_simp.bin";

    /// Primary lexicon streams for 2, 3 and 4 code units.
    pub const PRIMARY_FIXED: [&str; 3] = ["lexicon_2.bin", "lexicon_3.bin", "lexicon_4.bin"];
    pub const PRIMARY_IRREGULAR: &str = "lexicon_x.bin";

    /// Auxiliary lexicon streams (no syllables stored).
    pub const AUXILIARY_FIXED: [&str; 3] = [
        "lexicon_aux_2.bin",
        "lexicon_aux_3.bin",
        "lexicon_aux_4.bin",
    ];
    pub const AUXILIARY_IRREGULAR: &str = "lexicon_aux_x.bin";
}

/// Zstd level used by [`AssetBundle::save_compressed`].
pub const DEFAULT_ZSTD_LEVEL: i32 = 19;

/// A set of named binary assets.
///
/// Names are the plain file names listed in [`names`] and the block assets of
/// [`BLOCKS`](super::BLOCKS).
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct AssetBundle {
    #[serde(default)]
    files: BTreeMap<String, Vec<u8>>,
}

impl AssetBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an asset.
    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(name.into(), bytes);
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<u8>> {
        self.files.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    /// Returns the asset or a fatal [`PinyinError::AssetError`] when missing.
    pub fn require(&self, name: &str) -> Result<&[u8]> {
        self.get(name)
            .ok_or_else(|| PinyinError::asset(name, "missing asset"))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Reads every regular file directly inside `dir` as an asset.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|err| {
            PinyinError::IoError(format!(
                "Failed to read asset directory {}: {}",
                dir.display(),
                err
            ))
        })?;

        let mut bundle = Self::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let bytes = fs::read(entry.path()).map_err(|err| {
                PinyinError::IoError(format!("Failed to read file {}: {}", name, err))
            })?;
            bundle.insert(name, bytes);
        }
        Ok(bundle)
    }

    /// Writes every asset as a plain file into `dir`, creating it if needed.
    pub fn to_dir<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        for (name, bytes) in &self.files {
            fs::write(dir.join(name), bytes)?;
        }
        Ok(())
    }

    /// Decodes an in-memory Zstd-compressed CBOR bundle.
    pub fn from_zstd_bytes(compressed: &[u8]) -> Result<Self> {
        let decompressed = decode_all(Cursor::new(compressed)).map_err(|err| {
            PinyinError::IoError(format!("Failed to decompress Zstd: {}", err))
        })?;
        let bundle: AssetBundle = from_slice(&decompressed)
            .map_err(|err| PinyinError::ParseError(format!("Failed to parse CBOR: {}", err)))?;
        Ok(bundle)
    }

    /// Saves the bundle to a Zstd-compressed CBOR file on disk.
    pub fn save_compressed<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        let mut encoder = Encoder::new(writer, DEFAULT_ZSTD_LEVEL)?;
        serde_cbor::to_writer(&mut encoder, self)?;
        encoder.finish()?;
        Ok(())
    }

    /// Loads a bundle from a Zstd-compressed CBOR file on disk.
    pub fn load_compressed<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| {
            PinyinError::IoError(format!("Failed to open bundle {}: {}", path.display(), err))
        })?;
        let reader = BufReader::new(file);
        let mut decoder = Decoder::new(reader)?;
        let bundle: AssetBundle = from_reader(&mut decoder)?;
        Ok(bundle)
    }
}

/// Reads the `index`-th big-endian `u16` of `bytes`.
#[inline(always)]
pub(crate) fn be_u16(bytes: &[u8], index: usize) -> u16 {
    let at = index * 2;
    u16::from_be_bytes([bytes[at], bytes[at + 1]])
}

/// Reads a big-endian `u32` at byte offset `at`.
#[inline(always)]
pub(crate) fn be_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Checks that `bytes` holds a whole number of `record_size` records.
pub(crate) fn check_records(name: &str, bytes: &[u8], record_size: usize) -> Result<usize> {
    if bytes.len() % record_size != 0 {
        return Err(PinyinError::asset(
            name,
            format!(
                "truncated: {} bytes is not a multiple of the {}-byte record",
                bytes.len(),
                record_size
            ),
        ));
    }
    Ok(bytes.len() / record_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AssetBundle {
        let mut bundle = AssetBundle::new();
        bundle.insert(names::SYLLABLES, b"zhong\nguo\n".to_vec());
        bundle.insert(names::TRAD_SIMP, vec![0x57, 0x0B, 0x56, 0xFD]);
        bundle
    }

    #[test]
    fn big_endian_readers() {
        let bytes = [0x12, 0x34, 0x00, 0x02, 0x00, 0x01];
        assert_eq!(be_u16(&bytes, 0), 0x1234);
        assert_eq!(be_u16(&bytes, 1), 0x0002);
        assert_eq!(be_u32(&bytes, 2), 0x0002_0001);
    }

    #[test]
    fn require_reports_missing_asset() {
        let bundle = sample();
        assert!(bundle.require(names::SYLLABLES).is_ok());
        let err = bundle.require(names::OVERFLOW_16).unwrap_err();
        assert!(matches!(err, PinyinError::AssetError { ref name, .. } if name == names::OVERFLOW_16));
    }

    #[test]
    fn check_records_detects_truncation() {
        assert_eq!(check_records("x", &[0; 8], 4).unwrap(), 2);
        assert!(check_records("x", &[0; 7], 4).is_err());
    }

    #[test]
    fn directory_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = sample();
        bundle.to_dir(dir.path()).unwrap();
        let loaded = AssetBundle::from_dir(dir.path()).unwrap();
        assert_eq!(loaded, bundle);
    }

    #[test]
    fn compressed_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assets.zstd");
        let bundle = sample();
        bundle.save_compressed(&path).unwrap();
        let loaded = AssetBundle::load_compressed(&path).unwrap();
        assert_eq!(loaded, bundle);

        let raw = fs::read(&path).unwrap();
        assert_eq!(AssetBundle::from_zstd_bytes(&raw).unwrap(), bundle);
    }
}
