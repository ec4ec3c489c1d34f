//! Scene graph: nodes, tree wiring, and pure world-transform evaluation

mod graph;
pub mod names;
mod node;

pub use graph::{Aabb, DepthFirst, Scene, SceneError};
pub use node::{NodeFlags, NodeKey, NodeKind, SceneNode};
