//! Library loader: fallback ladder and process-wide caching
//!
//! Descriptions are authored iteratively, so a requested group may be
//! missing, renamed, or empty at any point. The loader degrades through a
//! fixed ladder of candidates instead of failing the build, and caches both
//! opened libraries and resolved group handles for the life of the process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assets::{AssetError, AssetLibrary, GroupHandle};

/// Prefix marking groups intended for export/consumption by other scenes
pub const EXPORT_GROUP_PREFIX: &str = "EXPORT_";

/// Conventional default group name used by host authoring tools
pub const DEFAULT_GROUP_NAME: &str = "Collection";

/// How a group handle relates to its source library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadMode {
    /// Share the library's cached template; a later library reload would
    /// propagate to every linked handle
    Linked,
    /// Own an independent copy, insulated from later library changes
    Copied,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupCacheKey {
    path: PathBuf,
    requested: Option<String>,
    mode: LoadMode,
}

/// Loader with process-lifetime library and group caches
///
/// Single-threaded by design: the whole pipeline is one batch pass, so the
/// caches are plain maps. Parallelizing placements would require replacing
/// them with concurrent maps.
#[derive(Debug, Default)]
pub struct AssetLibraryLoader {
    libraries: HashMap<PathBuf, Arc<AssetLibrary>>,
    linked_templates: HashMap<(PathBuf, String), GroupHandle>,
    groups: HashMap<GroupCacheKey, GroupHandle>,
}

impl AssetLibraryLoader {
    /// Create an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or fetch the cached) library at `path`
    pub fn library(&mut self, path: &Path) -> Result<Arc<AssetLibrary>, AssetError> {
        let resolved = resolve_path(path)?;
        if let Some(library) = self.libraries.get(&resolved) {
            return Ok(Arc::clone(library));
        }
        let library = Arc::new(AssetLibrary::open(&resolved)?);
        self.libraries.insert(resolved, Arc::clone(&library));
        Ok(library)
    }

    /// Resolve a group handle through the fallback ladder
    ///
    /// Candidate order: `requested` exact, each of `fallbacks` in order, any
    /// `EXPORT_`-prefixed group lexicographically, the conventional default
    /// group name, then every remaining group in file order. The first
    /// candidate that assembles non-empty wins; if every loadable candidate
    /// is empty, the first of them is accepted (degraded but non-fatal). A
    /// candidate that fails to assemble is skipped with a warning.
    ///
    /// Identical `(path, requested, mode)` requests return the cached handle
    /// without re-reading the file.
    pub fn load_group(
        &mut self,
        path: &Path,
        requested: Option<&str>,
        mode: LoadMode,
        fallbacks: &[String],
    ) -> Result<GroupHandle, AssetError> {
        let resolved = resolve_path(path)?;
        let cache_key = GroupCacheKey {
            path: resolved.clone(),
            requested: requested.map(str::to_owned),
            mode,
        };
        if let Some(handle) = self.groups.get(&cache_key) {
            return Ok(Arc::clone(handle));
        }

        let library = self.library(&resolved)?;
        if library.is_empty() {
            return Err(AssetError::GroupNotFound {
                library: resolved,
                requested: requested.map(str::to_owned),
            });
        }

        let mut picked: Option<GroupHandle> = None;
        let mut first_empty: Option<GroupHandle> = None;
        for candidate in candidate_order(&library, requested, fallbacks) {
            let handle = match self.template(&library, &resolved, &candidate, mode) {
                Ok(handle) => handle,
                Err(err) => {
                    log::warn!(
                        "skipping candidate group '{}' in {}: {}",
                        candidate,
                        resolved.display(),
                        err
                    );
                    continue;
                }
            };
            if handle.is_empty() {
                first_empty.get_or_insert(handle);
                continue;
            }
            picked = Some(handle);
            break;
        }

        let handle = match picked.or_else(|| {
            first_empty.inspect(|handle| {
                log::warn!(
                    "all candidate groups in {} are empty; using '{}'",
                    resolved.display(),
                    handle.name()
                );
            })
        }) {
            Some(handle) => handle,
            None => {
                return Err(AssetError::GroupNotFound {
                    library: resolved,
                    requested: requested.map(str::to_owned),
                })
            }
        };

        log::info!(
            "loaded group '{}' (requested {:?}) from {}",
            handle.name(),
            requested,
            resolved.display()
        );
        self.groups.insert(cache_key, Arc::clone(&handle));
        Ok(handle)
    }

    fn template(
        &mut self,
        library: &AssetLibrary,
        resolved: &Path,
        name: &str,
        mode: LoadMode,
    ) -> Result<GroupHandle, AssetError> {
        match mode {
            LoadMode::Linked => {
                let key = (resolved.to_owned(), name.to_owned());
                if let Some(handle) = self.linked_templates.get(&key) {
                    return Ok(Arc::clone(handle));
                }
                let handle: GroupHandle = Arc::new(library.build_group(name)?);
                self.linked_templates.insert(key, Arc::clone(&handle));
                Ok(handle)
            }
            LoadMode::Copied => Ok(Arc::new(library.build_group(name)?)),
        }
    }
}

fn resolve_path(path: &Path) -> Result<PathBuf, AssetError> {
    path.canonicalize().map_err(|_| AssetError::LibraryNotFound {
        path: path.to_owned(),
    })
}

fn candidate_order(
    library: &AssetLibrary,
    requested: Option<&str>,
    fallbacks: &[String],
) -> Vec<String> {
    fn push(name: &str, candidates: &mut Vec<String>) {
        if !name.is_empty() && !candidates.iter().any(|existing| existing == name) {
            candidates.push(name.to_owned());
        }
    }

    let mut candidates: Vec<String> = Vec::new();

    if let Some(name) = requested {
        push(name, &mut candidates);
    }
    for name in fallbacks {
        push(name, &mut candidates);
    }

    let mut exports: Vec<&str> = library
        .list_groups()
        .filter(|name| name.starts_with(EXPORT_GROUP_PREFIX))
        .collect();
    exports.sort_unstable();
    for name in exports {
        push(name, &mut candidates);
    }

    if library.contains_group(DEFAULT_GROUP_NAME) {
        push(DEFAULT_GROUP_NAME, &mut candidates);
    }

    let remaining: Vec<String> = library.list_groups().map(str::to_owned).collect();
    for name in &remaining {
        push(name, &mut candidates);
    }

    candidates
}
