//! Asset library file format and per-group assembly
//!
//! A library is a RON document of named groups, each group a flat node list
//! with parent indices. Parsing the file and assembling a group are separate
//! steps so one malformed group never poisons the rest of the library.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::assets::{AssetError, AssetGroup};
use crate::foundation::math::{Transform, Vec3};
use crate::scene::{Aabb, NodeFlags, Scene, SceneNode};

fn uniform_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

/// Payload description of a library node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum NodeKindData {
    /// Non-renderable axis-indicator node
    #[default]
    Marker,
    /// Renderable geometry with local-space bounds (millimeters)
    Mesh {
        /// Minimum corner
        min: [f32; 3],
        /// Maximum corner
        max: [f32; 3],
    },
}

/// One node record inside a group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    /// Node name
    pub name: String,

    /// Index of the parent node within the same group, if any
    #[serde(default)]
    pub parent: Option<usize>,

    /// Local translation in millimeters
    #[serde(default)]
    pub translation_mm: [f32; 3],

    /// Local rotation, intrinsic XYZ degrees
    #[serde(default)]
    pub rotation_deg: [f32; 3],

    /// Local scale factors
    #[serde(default = "uniform_scale")]
    pub scale: [f32; 3],

    /// Payload
    #[serde(default)]
    pub kind: NodeKindData,

    /// Hidden in viewports
    #[serde(default)]
    pub hidden: bool,

    /// Display-grouping memberships
    #[serde(default)]
    pub groupings: Vec<String>,
}

/// One named group inside a library file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupData {
    /// Group name
    pub name: String,

    /// Node records; parent indices refer into this list
    #[serde(default)]
    pub nodes: Vec<NodeData>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LibraryFile {
    groups: Vec<GroupData>,
}

/// An opened asset library
///
/// Immutable once opened. Group assembly is on demand; enumeration keeps the
/// file's group order.
#[derive(Debug)]
pub struct AssetLibrary {
    path: PathBuf,
    groups: Vec<GroupData>,
    index: HashMap<String, usize>,
}

impl AssetLibrary {
    /// Open and parse a library file
    pub fn open(path: &Path) -> Result<Self, AssetError> {
        let text = fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                AssetError::LibraryNotFound {
                    path: path.to_owned(),
                }
            } else {
                AssetError::LibraryRead {
                    path: path.to_owned(),
                    source,
                }
            }
        })?;
        Self::parse(path.to_owned(), &text)
    }

    /// Parse library text directly, with `label` standing in for the path
    pub fn from_str(label: impl Into<PathBuf>, text: &str) -> Result<Self, AssetError> {
        Self::parse(label.into(), text)
    }

    fn parse(path: PathBuf, text: &str) -> Result<Self, AssetError> {
        let file: LibraryFile = ron::from_str(text).map_err(|err| AssetError::LibraryParse {
            path: path.clone(),
            message: err.to_string(),
        })?;

        // First occurrence wins when the file repeats a group name.
        let mut index = HashMap::new();
        for (position, group) in file.groups.iter().enumerate() {
            index.entry(group.name.clone()).or_insert(position);
        }

        Ok(Self {
            path,
            groups: file.groups,
            index,
        })
    }

    /// Path this library was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Group names in file order
    pub fn list_groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|group| group.name.as_str())
    }

    /// True when the named group exists
    pub fn contains_group(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of nodes in the named group, if it exists
    pub fn group_len(&self, name: &str) -> Option<usize> {
        self.index.get(name).map(|&at| self.groups[at].nodes.len())
    }

    /// True when the library holds no groups
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Assemble the named group into a node tree
    ///
    /// Fails on an unknown name, a parent index out of range, or parent
    /// wiring that does not form a tree. Failure affects only this group.
    pub fn build_group(&self, name: &str) -> Result<AssetGroup, AssetError> {
        let &at = self
            .index
            .get(name)
            .ok_or_else(|| AssetError::GroupNotFound {
                library: self.path.clone(),
                requested: Some(name.to_owned()),
            })?;
        let data = &self.groups[at];

        let mut content = Scene::new();
        let mut keys = Vec::with_capacity(data.nodes.len());
        for record in &data.nodes {
            let kind_bounds = match &record.kind {
                NodeKindData::Marker => None,
                NodeKindData::Mesh { min, max } => Some(Aabb::new(
                    Vec3::new(min[0], min[1], min[2]),
                    Vec3::new(max[0], max[1], max[2]),
                )),
            };

            let mut node = match kind_bounds {
                Some(bounds) => SceneNode::mesh(record.name.as_str(), bounds),
                None => SceneNode::marker(record.name.as_str()),
            };
            node = node.with_local(Transform::from_position_euler_deg(
                Vec3::from(record.translation_mm),
                Vec3::from(record.rotation_deg),
                Vec3::from(record.scale),
            ));
            if record.hidden {
                node = node.with_flags(NodeFlags::HIDDEN);
            }
            node.groupings = record.groupings.clone();

            keys.push(content.add_node(node, None));
        }

        for (position, record) in data.nodes.iter().enumerate() {
            let Some(parent) = record.parent else {
                continue;
            };
            if parent >= keys.len() {
                return Err(AssetError::GroupBuild {
                    group: name.to_owned(),
                    message: format!(
                        "node '{}' references parent index {parent} out of range",
                        record.name
                    ),
                });
            }
            content
                .attach(keys[position], keys[parent])
                .map_err(|err| AssetError::GroupBuild {
                    group: name.to_owned(),
                    message: err.to_string(),
                })?;
        }

        Ok(AssetGroup::from_library(
            data.name.as_str(),
            self.path.clone(),
            content,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::translation_of;
    use approx::assert_relative_eq;

    const LIBRARY: &str = r#"
        LibraryFile(
            groups: [
                (
                    name: "EXPORT_stage",
                    nodes: [
                        (name: "RIG_STAGE_ROOT", groupings: ["RIG_stage"]),
                        (
                            name: "hull",
                            parent: Some(0),
                            translation_mm: (0.0, 0.0, 5.0),
                            kind: Mesh(min: (0.0, 0.0, 0.0), max: (10.0, 10.0, 10.0)),
                        ),
                    ],
                ),
                (name: "EXPORT_empty", nodes: []),
            ],
        )
    "#;

    #[test]
    fn parses_and_lists_groups_in_file_order() {
        let library = AssetLibrary::from_str("lib.ron", LIBRARY).unwrap();
        let names: Vec<&str> = library.list_groups().collect();
        assert_eq!(names, vec!["EXPORT_stage", "EXPORT_empty"]);
        assert_eq!(library.group_len("EXPORT_stage"), Some(2));
        assert_eq!(library.group_len("EXPORT_empty"), Some(0));
    }

    #[test]
    fn builds_group_with_parenting_and_bounds() {
        let library = AssetLibrary::from_str("lib.ron", LIBRARY).unwrap();
        let group = library.build_group("EXPORT_stage").unwrap();
        let content = group.content();
        assert_eq!(content.len(), 2);

        let hull = content.find_by_name("hull").unwrap();
        let root = content.find_by_name("RIG_STAGE_ROOT").unwrap();
        assert_eq!(content.node(hull).unwrap().parent(), Some(root));

        let worlds = content.evaluate_world_transforms();
        assert_relative_eq!(
            translation_of(&worlds[hull]),
            Vec3::new(0.0, 0.0, 5.0),
            epsilon = 1e-5
        );
    }

    #[test]
    fn unknown_group_is_not_found() {
        let library = AssetLibrary::from_str("lib.ron", LIBRARY).unwrap();
        let err = library.build_group("EXPORT_other").unwrap_err();
        assert!(matches!(err, AssetError::GroupNotFound { .. }));
    }

    #[test]
    fn parent_index_out_of_range_fails_only_that_group() {
        let text = r#"
            LibraryFile(groups: [
                (name: "broken", nodes: [(name: "a", parent: Some(9))]),
                (name: "fine", nodes: [(name: "b")]),
            ])
        "#;
        let library = AssetLibrary::from_str("lib.ron", text).unwrap();
        assert!(matches!(
            library.build_group("broken").unwrap_err(),
            AssetError::GroupBuild { .. }
        ));
        assert!(library.build_group("fine").is_ok());
    }

    #[test]
    fn self_parenting_is_rejected() {
        let text = r#"
            LibraryFile(groups: [
                (name: "loop", nodes: [(name: "a", parent: Some(0))]),
            ])
        "#;
        let library = AssetLibrary::from_str("lib.ron", text).unwrap();
        assert!(matches!(
            library.build_group("loop").unwrap_err(),
            AssetError::GroupBuild { .. }
        ));
    }

    #[test]
    fn malformed_text_reports_parse_error() {
        let err = AssetLibrary::from_str("lib.ron", "not a library").unwrap_err();
        assert!(matches!(err, AssetError::LibraryParse { .. }));
    }
}
