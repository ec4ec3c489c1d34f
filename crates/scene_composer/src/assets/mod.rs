//! Asset libraries: external files of reusable, named asset groups
//!
//! A library is opened read-only and never mutated; groups built from it are
//! templates shared by any number of instancers in the composed scene.

mod group;
mod library;
mod loader;

use std::path::PathBuf;

use thiserror::Error;

pub use group::{AssetGroup, GroupHandle};
pub use library::{AssetLibrary, GroupData, NodeData, NodeKindData};
pub use loader::{AssetLibraryLoader, LoadMode, DEFAULT_GROUP_NAME, EXPORT_GROUP_PREFIX};

/// Asset loading errors
///
/// Every variant is recoverable at the placement-slot level: callers log the
/// error for the affected slot and continue the build.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The library file does not exist
    #[error("asset library not found: {path}")]
    LibraryNotFound {
        /// Path as the caller supplied it
        path: PathBuf,
    },

    /// The library file exists but could not be read
    #[error("failed to read asset library {path}: {source}")]
    LibraryRead {
        /// Resolved library path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The library file is not a valid library document
    #[error("failed to parse asset library {path}: {message}")]
    LibraryParse {
        /// Resolved library path
        path: PathBuf,
        /// Parser diagnostic
        message: String,
    },

    /// No group could be loaded after the full fallback ladder
    #[error("no loadable group found in library {library} (requested {requested:?})")]
    GroupNotFound {
        /// Resolved library path
        library: PathBuf,
        /// The name originally asked for, if any
        requested: Option<String>,
    },

    /// A single group's node data could not be assembled into a tree
    #[error("failed to build group '{group}': {message}")]
    GroupBuild {
        /// Group name inside the library
        group: String,
        /// What went wrong
        message: String,
    },
}
