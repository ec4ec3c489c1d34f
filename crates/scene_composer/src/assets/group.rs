//! Asset group templates

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::scene::Scene;

/// Shared, read-only handle to an asset group
///
/// Instancers hold clones of this handle; the underlying group is never
/// mutated once built.
pub type GroupHandle = Arc<AssetGroup>;

/// A named, hierarchical bundle of scene nodes sourced from a library
///
/// The content scene is a self-contained template. Placement logic reads it
/// (through the evaluation context) but never writes to it; the same group
/// can back any number of instancers.
#[derive(Debug, Clone)]
pub struct AssetGroup {
    name: String,
    library_path: PathBuf,
    content: Scene,
}

impl AssetGroup {
    /// Create a group from an already-built content scene
    ///
    /// Used directly in tests and by callers composing groups in code; the
    /// library loader goes through [`from_library`](Self::from_library).
    pub fn new(name: impl Into<String>, content: Scene) -> Self {
        Self {
            name: name.into(),
            library_path: PathBuf::from("<memory>"),
            content,
        }
    }

    /// Create a group that records the library file it came from
    pub fn from_library(
        name: impl Into<String>,
        library_path: impl Into<PathBuf>,
        content: Scene,
    ) -> Self {
        Self {
            name: name.into(),
            library_path: library_path.into(),
            content,
        }
    }

    /// Group name as stored in the library
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the source library file (`<memory>` for in-code groups)
    pub fn library_path(&self) -> &Path {
        &self.library_path
    }

    /// The group's node tree
    pub fn content(&self) -> &Scene {
        &self.content
    }

    /// True when the group holds no nodes at all
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
