//! Error types shared by the dictionary loader, the override API and the
//! customization file reader.

use std::io;
use std::sync::{Mutex, PoisonError};

// Define a global mutable variable to store the error message
static LAST_ERROR: Mutex<Option<String>> = Mutex::new(None);

/// Result type used throughout the crate, defaulting to [`PinyinError`].
pub type Result<T, E = PinyinError> = std::result::Result<T, E>;

/// Represents possible errors raised while loading assets or mutating the index.
///
/// # Variants
/// - `IoError`: a file or directory could not be read or written.
/// - `AssetError`: a binary asset is missing, truncated or references an
///   unknown template. Fatal for initialization.
/// - `ParseError`: a bundle or text file could not be decoded.
/// - `InvalidArgument`: a runtime override was malformed; nothing was changed.
///
/// The type is `Clone` so the lazily initialized global instance can hand the
/// same failure to every caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PinyinError {
    #[error("I/O Error: {0}")]
    IoError(String),

    #[error("Asset Error: {name}: {message}")]
    AssetError { name: String, message: String },

    #[error("Parse Error: {0}")]
    ParseError(String),

    #[error("Invalid Argument: {0}")]
    InvalidArgument(String),
}

impl PinyinError {
    pub(crate) fn asset(name: &str, message: impl Into<String>) -> Self {
        PinyinError::AssetError {
            name: name.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        PinyinError::InvalidArgument(message.into())
    }
}

impl From<io::Error> for PinyinError {
    fn from(err: io::Error) -> Self {
        PinyinError::IoError(err.to_string())
    }
}

impl From<serde_cbor::Error> for PinyinError {
    fn from(err: serde_cbor::Error) -> Self {
        PinyinError::ParseError(err.to_string())
    }
}

/// Records the last error message encountered outside the `Result` path
/// (customization files, global initialization).
pub fn set_last_error(err_msg: &str) {
    let mut last_error = LAST_ERROR.lock().unwrap_or_else(PoisonError::into_inner);
    *last_error = Some(err_msg.to_string());
}

/// Retrieves the last recorded error message, if any.
pub fn get_last_error() -> Option<String> {
    let last_error = LAST_ERROR.lock().unwrap_or_else(PoisonError::into_inner);
    last_error.clone()
}

/// Clears the last recorded error message.
pub fn clear_last_error() {
    let mut last_error = LAST_ERROR.lock().unwrap_or_else(PoisonError::into_inner);
    *last_error = None;
}
