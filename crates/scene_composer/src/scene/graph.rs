//! Scene graph arena and pure world-transform evaluation
//!
//! The scene is a slotmap arena of [`SceneNode`]s forming a forest: every
//! node has at most one parent, cycles are rejected at attach time. World
//! transforms are never cached on nodes; [`Scene::evaluate_world_transforms`]
//! recomputes them as a pure function of the current tree, which is what
//! makes the temporary-attachment evaluation context cheap and side-effect
//! free.

use slotmap::{SecondaryMap, SlotMap};
use thiserror::Error;

use crate::foundation::math::{Mat4, Point3, Vec3};
use crate::scene::names;
use crate::scene::node::{NodeKey, NodeKind, SceneNode};

/// Scene graph errors
#[derive(Debug, Error)]
pub enum SceneError {
    /// A node key no longer resolves in the arena
    #[error("node {0:?} not found in scene")]
    NodeNotFound(NodeKey),

    /// Attaching would create a parent cycle
    #[error("attaching '{child}' under '{parent}' would create a cycle")]
    WouldCreateCycle {
        /// Name of the node being attached
        child: String,
        /// Name of the requested parent
        parent: String,
    },
}

/// Axis-aligned bounding box in whatever space its corners were taken from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Create a new box from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Center point of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half-size of the box
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// The eight corner points of the box
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Grow the box to contain a point
    pub fn grow(&mut self, point: Vec3) {
        self.min = self.min.inf(&point);
        self.max = self.max.sup(&point);
    }

    /// Smallest box containing both inputs
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }
}

/// Node arena plus tree wiring
///
/// Roots and children are kept in insertion order so traversal, and
/// everything derived from it (heuristic tie-breaking, document output), is
/// deterministic across rebuilds.
#[derive(Debug, Default, Clone)]
pub struct Scene {
    nodes: SlotMap<NodeKey, SceneNode>,
    roots: Vec<NodeKey>,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, optionally attaching it under `parent`
    ///
    /// With `parent = None` the node becomes a root.
    pub fn add_node(&mut self, mut node: SceneNode, parent: Option<NodeKey>) -> NodeKey {
        node.parent = None;
        node.children.clear();
        let key = self.nodes.insert(node);
        match parent {
            Some(parent_key) if self.nodes.contains_key(parent_key) => {
                self.nodes[parent_key].children.push(key);
                self.nodes[key].parent = Some(parent_key);
            }
            _ => self.roots.push(key),
        }
        key
    }

    /// Borrow a node
    pub fn node(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    /// Mutably borrow a node
    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut SceneNode> {
        self.nodes.get_mut(key)
    }

    /// True when the key still resolves
    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Number of nodes in the scene
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the scene holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Current root nodes, in insertion order
    pub fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    /// Re-parent `child` under `parent`
    ///
    /// The child keeps its local transform; no compensation is applied.
    pub fn attach(&mut self, child: NodeKey, parent: NodeKey) -> Result<(), SceneError> {
        if !self.nodes.contains_key(child) {
            return Err(SceneError::NodeNotFound(child));
        }
        if !self.nodes.contains_key(parent) {
            return Err(SceneError::NodeNotFound(parent));
        }

        // Walking up from the requested parent must never reach the child.
        let mut cursor = Some(parent);
        while let Some(key) = cursor {
            if key == child {
                return Err(SceneError::WouldCreateCycle {
                    child: self.nodes[child].name.clone(),
                    parent: self.nodes[parent].name.clone(),
                });
            }
            cursor = self.nodes[key].parent;
        }

        self.unlink(child);
        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
        Ok(())
    }

    /// Detach a node from its parent, making it a root
    pub fn detach(&mut self, key: NodeKey) -> Result<(), SceneError> {
        if !self.nodes.contains_key(key) {
            return Err(SceneError::NodeNotFound(key));
        }
        if self.nodes[key].parent.is_some() {
            self.unlink(key);
            self.roots.push(key);
        }
        Ok(())
    }

    /// Remove a node and all of its descendants, returning the removed count
    pub fn remove_subtree(&mut self, key: NodeKey) -> Result<usize, SceneError> {
        if !self.nodes.contains_key(key) {
            return Err(SceneError::NodeNotFound(key));
        }
        self.unlink(key);
        self.roots.retain(|&root| root != key);

        let doomed: Vec<NodeKey> = self.descendants(key).collect();
        for node in &doomed {
            self.nodes.remove(*node);
        }
        Ok(doomed.len())
    }

    /// Depth-first traversal over the whole scene, roots in order
    pub fn depth_first(&self) -> DepthFirst<'_> {
        let mut stack: Vec<NodeKey> = self.roots.clone();
        stack.reverse();
        DepthFirst { scene: self, stack }
    }

    /// Depth-first traversal of one subtree, `root` included
    pub fn descendants(&self, root: NodeKey) -> DepthFirst<'_> {
        let stack = if self.nodes.contains_key(root) {
            vec![root]
        } else {
            Vec::new()
        };
        DepthFirst { scene: self, stack }
    }

    /// First node whose name matches exactly, in traversal order
    pub fn find_by_name(&self, name: &str) -> Option<NodeKey> {
        self.depth_first()
            .find(|&key| self.nodes[key].name == name)
    }

    /// Name lookup with de-duplication tolerance
    ///
    /// Resolution order: exact match, then suffix-stripped base-name match,
    /// then case-insensitive base-name match. The ordering makes `Foo` win
    /// over `Foo.001` whenever the literal name exists.
    pub fn resolve_name(&self, name: &str) -> Option<NodeKey> {
        if let Some(key) = self.find_by_name(name) {
            return Some(key);
        }
        if let Some(key) = self
            .depth_first()
            .find(|&key| names::same_base_name(&self.nodes[key].name, name))
        {
            return Some(key);
        }
        self.depth_first()
            .find(|&key| names::same_base_name_ignore_case(&self.nodes[key].name, name))
    }

    /// Evaluate every node's world transform as a pure function of the tree
    ///
    /// A node's world matrix is its parent's world matrix times its own
    /// local matrix; roots evaluate against identity. Nothing is cached and
    /// the scene is not touched.
    pub fn evaluate_world_transforms(&self) -> SecondaryMap<NodeKey, Mat4> {
        let mut worlds = SecondaryMap::new();
        let mut stack: Vec<(NodeKey, Mat4)> = self
            .roots
            .iter()
            .rev()
            .map(|&root| (root, Mat4::identity()))
            .collect();

        while let Some((key, parent_world)) = stack.pop() {
            let world = parent_world * self.nodes[key].local.to_matrix();
            worlds.insert(key, world);
            for &child in self.nodes[key].children.iter().rev() {
                stack.push((child, world));
            }
        }
        worlds
    }

    /// World-space bounds of all renderable geometry under `root`
    ///
    /// Returns `None` when the subtree holds no mesh nodes.
    pub fn renderable_bounds(
        &self,
        worlds: &SecondaryMap<NodeKey, Mat4>,
        root: NodeKey,
    ) -> Option<Aabb> {
        let mut bounds: Option<Aabb> = None;
        for key in self.descendants(root) {
            let node = &self.nodes[key];
            let NodeKind::Mesh(local) = &node.kind else {
                continue;
            };
            let Some(world) = worlds.get(key) else {
                continue;
            };
            for corner in local.corners() {
                let point = world.transform_point(&Point3::from(corner));
                match &mut bounds {
                    Some(aabb) => aabb.grow(point.coords),
                    None => bounds = Some(Aabb::new(point.coords, point.coords)),
                }
            }
        }
        bounds
    }

    fn unlink(&mut self, key: NodeKey) {
        if let Some(parent) = self.nodes[key].parent.take() {
            self.nodes[parent].children.retain(|&child| child != key);
        } else {
            self.roots.retain(|&root| root != key);
        }
    }
}

/// Depth-first node iterator, children in attachment order
pub struct DepthFirst<'a> {
    scene: &'a Scene,
    stack: Vec<NodeKey>,
}

impl Iterator for DepthFirst<'_> {
    type Item = NodeKey;

    fn next(&mut self) -> Option<NodeKey> {
        let key = self.stack.pop()?;
        for &child in self.scene.nodes[key].children.iter().rev() {
            self.stack.push(child);
        }
        Some(key)
    }
}
