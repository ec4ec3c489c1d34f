//! Output scene document
//!
//! The single artifact of a build: a RON document describing every node of
//! the composed scene, with instancers recorded as library + group
//! references rather than expanded content.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use scene_composer::prelude::{NodeKind, Scene};

/// Errors while writing the output document
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The scene could not be serialized
    #[error("failed to serialize scene document: {0}")]
    Serialize(String),

    /// The output path could not be written
    #[error("failed to write scene document: {0}")]
    Io(#[from] std::io::Error),
}

/// Node payload as recorded in the document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeRecordKind {
    /// Non-renderable marker
    Marker,
    /// Renderable geometry bounds
    Mesh {
        /// Minimum corner, local space
        min: [f32; 3],
        /// Maximum corner, local space
        max: [f32; 3],
    },
    /// Reference to an asset group
    Instance {
        /// Source library path
        library: String,
        /// Group name inside the library
        group: String,
    },
}

/// One node of the composed scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node name
    pub name: String,
    /// Parent node name, if any
    #[serde(default)]
    pub parent: Option<String>,
    /// Local translation, millimeters
    pub translation_mm: [f32; 3],
    /// Local rotation, XYZ degrees
    pub rotation_deg: [f32; 3],
    /// Local scale
    pub scale: [f32; 3],
    /// Payload
    pub kind: NodeRecordKind,
}

/// The serializable scene
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDocument {
    /// Nodes in depth-first order, parents before children
    pub nodes: Vec<NodeRecord>,
}

impl SceneDocument {
    /// Capture the current scene
    pub fn from_scene(scene: &Scene) -> Self {
        let mut nodes = Vec::with_capacity(scene.len());
        for key in scene.depth_first() {
            let Some(node) = scene.node(key) else {
                continue;
            };
            let parent = node
                .parent()
                .and_then(|parent| scene.node(parent))
                .map(|parent| parent.name.clone());

            let kind = match &node.kind {
                NodeKind::Marker => NodeRecordKind::Marker,
                NodeKind::Mesh(bounds) => NodeRecordKind::Mesh {
                    min: bounds.min.into(),
                    max: bounds.max.into(),
                },
                NodeKind::Instancer(group) => NodeRecordKind::Instance {
                    library: group.library_path().display().to_string(),
                    group: group.name().to_owned(),
                },
            };

            nodes.push(NodeRecord {
                name: node.name.clone(),
                parent,
                translation_mm: node.local.position.into(),
                rotation_deg: node.local.euler_deg().into(),
                scale: node.local.scale.into(),
                kind,
            });
        }
        Self { nodes }
    }

    /// Write the document as pretty RON, creating parent directories
    pub fn write(&self, path: &Path) -> Result<(), DocumentError> {
        let contents = ron::ser::to_string_pretty(self, Default::default())
            .map_err(|err| DocumentError::Serialize(err.to_string()))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene_composer::prelude::{SceneNode, Transform, Vec3};

    #[test]
    fn records_nodes_with_parent_names() {
        let mut scene = Scene::new();
        let root = scene.add_node(SceneNode::marker("root"), None);
        scene.add_node(
            SceneNode::marker("child")
                .with_local(Transform::from_position(Vec3::new(1.0, 2.0, 3.0))),
            Some(root),
        );

        let document = SceneDocument::from_scene(&scene);
        assert_eq!(document.nodes.len(), 2);
        assert_eq!(document.nodes[0].name, "root");
        assert_eq!(document.nodes[1].parent.as_deref(), Some("root"));
        assert_eq!(document.nodes[1].translation_mm, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn document_round_trips_through_ron() {
        let mut scene = Scene::new();
        scene.add_node(SceneNode::marker("only"), None);
        let document = SceneDocument::from_scene(&scene);

        let text = ron::ser::to_string_pretty(&document, Default::default()).unwrap();
        let back: SceneDocument = ron::from_str(&text).unwrap();
        assert_eq!(back.nodes.len(), 1);
        assert_eq!(back.nodes[0].name, "only");
    }
}
