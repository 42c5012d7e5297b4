//! Where assets come from and how the engine is sized.

use std::env;
use std::path::{Path, PathBuf};

use crate::buffer_pool::DEFAULT_POOL_SIZE;
use crate::dictionary_lib::AssetBundle;
use crate::errors::Result;

/// Asset directory used when nothing else is configured.
pub const DEFAULT_DATA_DIR: &str = "dicts";

pub const ENV_DATA: &str = "PINYIN_DATA";
pub const ENV_CUSTOM_DICT: &str = "PINYIN_CUSTOM_DICT";
pub const ENV_POOL_SIZE: &str = "PINYIN_POOL_SIZE";

/// Origin of the binary assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    /// Plain asset files in a directory.
    Directory(PathBuf),
    /// A Zstd-compressed CBOR [`AssetBundle`] file.
    Bundle(PathBuf),
    /// Assets already in memory.
    Memory(AssetBundle),
}

impl AssetSource {
    /// A directory path becomes [`AssetSource::Directory`], anything else a
    /// bundle file.
    pub fn detect<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if path.is_dir() {
            AssetSource::Directory(path.to_path_buf())
        } else {
            AssetSource::Bundle(path.to_path_buf())
        }
    }

    pub fn load(&self) -> Result<AssetBundle> {
        match self {
            AssetSource::Directory(dir) => AssetBundle::from_dir(dir),
            AssetSource::Bundle(path) => AssetBundle::load_compressed(path),
            AssetSource::Memory(bundle) => Ok(bundle.clone()),
        }
    }
}

impl Default for AssetSource {
    fn default() -> Self {
        AssetSource::Directory(PathBuf::from(DEFAULT_DATA_DIR))
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinyinConfig {
    pub source: AssetSource,
    /// Customization file applied right after loading.
    pub custom_dictionary: Option<PathBuf>,
    /// Number of pooled scan buffers.
    pub pool_size: usize,
}

impl Default for PinyinConfig {
    fn default() -> Self {
        Self {
            source: AssetSource::default(),
            custom_dictionary: None,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl PinyinConfig {
    pub fn with_source(source: AssetSource) -> Self {
        Self {
            source,
            ..Self::default()
        }
    }

    /// Reads `PINYIN_DATA`, `PINYIN_CUSTOM_DICT` and `PINYIN_POOL_SIZE`,
    /// keeping defaults for unset or unparsable values.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let mut config = Self::default();
        if let Some(data) = lookup(ENV_DATA).filter(|v| !v.trim().is_empty()) {
            config.source = AssetSource::detect(data.trim());
        }
        if let Some(custom) = lookup(ENV_CUSTOM_DICT).filter(|v| !v.trim().is_empty()) {
            config.custom_dictionary = Some(PathBuf::from(custom.trim()));
        }
        if let Some(size) = lookup(ENV_POOL_SIZE).and_then(|v| v.trim().parse().ok()) {
            config.pool_size = size;
        }
        config
    }
}
