//! Configuration files
//!
//! Build manifests and settings implement [`Config`] to gain file loading
//! and saving dispatched on the file extension. RON is the native format for
//! everything this crate writes; TOML is accepted so hand-edited settings
//! files can stay in the format their authors prefer. Unlike the per-slot
//! asset errors, a configuration failure is fatal to the build, so every
//! [`ConfigError`] carries the offending path.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// File formats a [`Config`] document can live in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// RON, the crate's native format
    Ron,
    /// TOML, accepted for hand-edited settings
    Toml,
}

impl ConfigFormat {
    /// Derive the format from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("ron") => Some(Self::Ron),
            Some("toml") => Some(Self::Toml),
            _ => None,
        }
    }
}

/// A loadable, savable configuration document
pub trait Config: Serialize + DeserializeOwned + Default {
    /// Load a configuration file, picking the parser from the extension
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let format =
            ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnknownFormat {
                path: path.to_owned(),
            })?;
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;

        match format {
            ConfigFormat::Ron => ron::Options::default()
                .with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
                .from_str(&text)
                .map_err(|err| err.to_string()),
            ConfigFormat::Toml => toml::from_str(&text).map_err(|err| err.to_string()),
        }
        .map_err(|message| ConfigError::Parse {
            path: path.to_owned(),
            message,
        })
    }

    /// Write the document, picking the serializer from the extension
    fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let format =
            ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnknownFormat {
                path: path.to_owned(),
            })?;
        let text = match format {
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, Default::default())
                .map_err(|err| err.to_string()),
            ConfigFormat::Toml => toml::to_string_pretty(self).map_err(|err| err.to_string()),
        }
        .map_err(|message| ConfigError::Serialize {
            path: path.to_owned(),
            message,
        })?;

        std::fs::write(path, text).map_err(|source| ConfigError::Write {
            path: path.to_owned(),
            source,
        })
    }
}

/// Configuration file errors
///
/// The only fatal errors of a build: a manifest that cannot be read or
/// parsed stops the whole run, where a missing asset only skips its slot.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Path as the caller supplied it
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid document of its format
    #[error("failed to parse config {path}: {message}")]
    Parse {
        /// Path of the malformed file
        path: PathBuf,
        /// Parser diagnostic
        message: String,
    },

    /// The document could not be serialized
    #[error("failed to serialize config {path}: {message}")]
    Serialize {
        /// Intended output path
        path: PathBuf,
        /// Serializer diagnostic
        message: String,
    },

    /// The file could not be written
    #[error("failed to write config {path}: {source}")]
    Write {
        /// Intended output path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The extension names no supported configuration format
    #[error("config {path} has an unsupported extension (expected .ron or .toml)")]
    UnknownFormat {
        /// Path as the caller supplied it
        path: PathBuf,
    },
}
