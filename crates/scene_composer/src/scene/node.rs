//! Scene node data
//!
//! Pure data: a node is a name, a local transform, a payload kind, and tree
//! wiring owned by [`Scene`](super::Scene). Nodes never know about the
//! evaluation or placement layers above them.

use crate::assets::GroupHandle;
use crate::foundation::math::Transform;
use crate::scene::Aabb;

slotmap::new_key_type! {
    /// Stable key into a [`Scene`](super::Scene) node arena
    pub struct NodeKey;
}

bitflags::bitflags! {
    /// Display flags mirrored from host scene systems
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u8 {
        /// Excluded from interactive viewports
        const HIDDEN = 0b0000_0001;
        /// Excluded from render output
        const RENDER_EXCLUDED = 0b0000_0010;
    }
}

/// Payload carried by a scene node
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Non-renderable axis-indicator node (rig handles, anchors, containers)
    Marker,

    /// Renderable geometry, described by its local-space bounding box
    Mesh(Aabb),

    /// Displays an asset group's content as if nested at this node's world
    /// transform. The group is referenced, never owned or mutated.
    Instancer(GroupHandle),
}

impl NodeKind {
    /// True for payloads that contribute renderable geometry
    pub fn is_renderable(&self) -> bool {
        matches!(self, Self::Mesh(_))
    }
}

/// A transform node in the composed scene
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Node name; unique names are not enforced, lookups resolve
    /// de-duplication suffixes (see [`super::names`])
    pub name: String,

    /// Transform relative to the parent node
    pub local: Transform,

    /// Payload
    pub kind: NodeKind,

    /// Display flags
    pub flags: NodeFlags,

    /// Display-grouping memberships (e.g. `RIG_stage`)
    pub groupings: Vec<String>,

    pub(super) parent: Option<NodeKey>,
    pub(super) children: Vec<NodeKey>,
}

impl SceneNode {
    /// Create a marker node with an identity local transform
    pub fn marker(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local: Transform::identity(),
            kind: NodeKind::Marker,
            flags: NodeFlags::empty(),
            groupings: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Create a mesh node from its local-space bounds
    pub fn mesh(name: impl Into<String>, bounds: Aabb) -> Self {
        Self {
            kind: NodeKind::Mesh(bounds),
            ..Self::marker(name)
        }
    }

    /// Create an instancer node referencing `group`
    pub fn instancer(name: impl Into<String>, group: GroupHandle) -> Self {
        Self {
            kind: NodeKind::Instancer(group),
            ..Self::marker(name)
        }
    }

    /// Set the local transform
    pub fn with_local(mut self, local: Transform) -> Self {
        self.local = local;
        self
    }

    /// Set display flags
    pub fn with_flags(mut self, flags: NodeFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Add a display-grouping membership
    pub fn with_grouping(mut self, grouping: impl Into<String>) -> Self {
        self.groupings.push(grouping.into());
        self
    }

    /// Key of the parent node, if attached
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Keys of the child nodes, in attachment order
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }
}
