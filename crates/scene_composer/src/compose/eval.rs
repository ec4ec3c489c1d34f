//! Evaluation context bridge
//!
//! An asset group that only exists as a library template has no world
//! transforms of its own: positions inside the group are local values whose
//! meaning depends on parent chains. Reading them directly yields the same
//! stale numbers that make a naively-placed instance orbit its target
//! instead of spinning in place. The bridge gives a group valid evaluated
//! transforms by attaching a temporary copy of its content to the live scene
//! under a hidden scratch container, evaluating the graph, and tearing the
//! attachment down again on every exit path — the scene ends structurally
//! identical to how it started.

use std::collections::HashMap;

use slotmap::SecondaryMap;

use crate::assets::AssetGroup;
use crate::foundation::math::{translation_of, Mat4, Vec3};
use crate::scene::{Aabb, NodeFlags, NodeKey, Scene, SceneNode};

/// Read access to a group's evaluated transforms
///
/// Keys are the *template* keys of the group's own content scene; the handle
/// resolves them through the temporary attachment internally.
pub struct EvaluationHandle<'a> {
    scene: &'a Scene,
    mapping: &'a HashMap<NodeKey, NodeKey>,
    worlds: &'a SecondaryMap<NodeKey, Mat4>,
    content_root: NodeKey,
}

impl EvaluationHandle<'_> {
    /// Evaluated world transform of a group template node
    pub fn world_transform(&self, template: NodeKey) -> Option<Mat4> {
        let copy = self.mapping.get(&template)?;
        self.worlds.get(*copy).copied()
    }

    /// Evaluated world translation of a group template node
    pub fn world_translation(&self, template: NodeKey) -> Option<Vec3> {
        self.world_transform(template)
            .map(|world| translation_of(&world))
    }

    /// Evaluated world translation of an arbitrary live-scene node
    ///
    /// The evaluation pass covers the whole scene, so nodes outside the
    /// group (cross-group anchor fallbacks) can be read from the same
    /// context.
    pub fn scene_world_translation(&self, key: NodeKey) -> Option<Vec3> {
        self.worlds.get(key).map(translation_of)
    }

    /// Evaluated world bounds of the group's renderable geometry
    pub fn geometry_bounds(&self) -> Option<Aabb> {
        self.scene.renderable_bounds(self.worlds, self.content_root)
    }
}

/// Run `body` with `group` temporarily attached and evaluated
///
/// The scratch container and the temporary content copy are removed when the
/// call returns, whether `body` returns normally or panics. The group
/// template itself is never touched, so a group that is already referenced
/// by instancers elsewhere in the scene evaluates exactly the same way.
pub fn with_evaluated_group<T>(
    scene: &mut Scene,
    group: &AssetGroup,
    body: impl FnOnce(&EvaluationHandle<'_>) -> T,
) -> T {
    let guard = ScratchGuard::open(scene, group);
    let worlds = guard.scene.evaluate_world_transforms();
    let handle = EvaluationHandle {
        scene: &*guard.scene,
        mapping: &guard.mapping,
        worlds: &worlds,
        content_root: guard.scratch,
    };
    body(&handle)
}

/// Scoped scratch attachment; cleanup happens in `Drop`
struct ScratchGuard<'s> {
    scene: &'s mut Scene,
    scratch: NodeKey,
    mapping: HashMap<NodeKey, NodeKey>,
}

impl<'s> ScratchGuard<'s> {
    fn open(scene: &'s mut Scene, group: &AssetGroup) -> Self {
        let scratch = scene.add_node(
            SceneNode::marker(format!("__EVAL_{}", group.name()))
                .with_flags(NodeFlags::HIDDEN | NodeFlags::RENDER_EXCLUDED),
            None,
        );

        // Depth-first order guarantees a parent is copied before its children.
        let content = group.content();
        let mut mapping = HashMap::new();
        for template in content.depth_first() {
            if let Some(node) = content.node(template) {
                let parent = node
                    .parent()
                    .and_then(|parent| mapping.get(&parent))
                    .copied()
                    .unwrap_or(scratch);
                let copy = scene.add_node(node.clone(), Some(parent));
                mapping.insert(template, copy);
            }
        }

        Self {
            scene,
            scratch,
            mapping,
        }
    }
}

impl Drop for ScratchGuard<'_> {
    fn drop(&mut self) {
        // Three independent steps; one failing must not stop the others.
        let children: Vec<NodeKey> = self
            .scene
            .node(self.scratch)
            .map(|node| node.children().to_vec())
            .unwrap_or_default();
        for child in children {
            if let Err(err) = self.scene.remove_subtree(child) {
                log::warn!("evaluation context: failed to remove temporary content: {err}");
            }
        }
        if let Err(err) = self.scene.detach(self.scratch) {
            log::warn!("evaluation context: failed to detach scratch container: {err}");
        }
        if let Err(err) = self.scene.remove_subtree(self.scratch) {
            log::warn!("evaluation context: failed to delete scratch container: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Transform;
    use approx::assert_relative_eq;

    fn demo_group() -> AssetGroup {
        let mut content = Scene::new();
        let root = content.add_node(
            SceneNode::marker("RIG_DEMO_ROOT")
                .with_local(Transform::from_position(Vec3::new(0.0, 0.0, 5.0))),
            None,
        );
        content.add_node(
            SceneNode::marker("probe")
                .with_local(Transform::from_position(Vec3::new(5.0, 5.0, 5.0))),
            Some(root),
        );
        content.add_node(
            SceneNode::mesh(
                "hull",
                Aabb::new(Vec3::zeros(), Vec3::new(10.0, 10.0, 10.0)),
            ),
            Some(root),
        );
        AssetGroup::new("EXPORT_demo", content)
    }

    fn snapshot(scene: &Scene) -> Vec<(String, Option<String>)> {
        scene
            .depth_first()
            .map(|key| {
                let node = scene.node(key).unwrap();
                let parent = node
                    .parent()
                    .map(|parent| scene.node(parent).unwrap().name.clone());
                (node.name.clone(), parent)
            })
            .collect()
    }

    #[test]
    fn evaluates_nested_transforms_in_group_local_space() {
        let mut scene = Scene::new();
        scene.add_node(SceneNode::marker("existing"), None);
        let group = demo_group();
        let probe = group.content().find_by_name("probe").unwrap();

        let offset = with_evaluated_group(&mut scene, &group, |handle| {
            handle.world_translation(probe).unwrap()
        });
        // Parent chain lifts the probe by the root's +5 Z.
        assert_relative_eq!(offset, Vec3::new(5.0, 5.0, 10.0), epsilon = 1e-5);
    }

    #[test]
    fn computes_geometry_bounds_of_renderables_only() {
        let mut scene = Scene::new();
        let group = demo_group();

        let bounds = with_evaluated_group(&mut scene, &group, |handle| {
            handle.geometry_bounds().unwrap()
        });
        assert_relative_eq!(bounds.min, Vec3::new(0.0, 0.0, 5.0), epsilon = 1e-5);
        assert_relative_eq!(bounds.max, Vec3::new(10.0, 10.0, 15.0), epsilon = 1e-5);
    }

    #[test]
    fn scene_is_restored_after_normal_exit() {
        let mut scene = Scene::new();
        scene.add_node(SceneNode::marker("existing"), None);
        let before = snapshot(&scene);
        let group = demo_group();

        with_evaluated_group(&mut scene, &group, |_| ());

        assert_eq!(snapshot(&scene), before);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn scene_is_restored_after_panic() {
        let mut scene = Scene::new();
        scene.add_node(SceneNode::marker("existing"), None);
        let before = snapshot(&scene);
        let group = demo_group();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            with_evaluated_group(&mut scene, &group, |_| panic!("evaluation body failed"));
        }));
        assert!(outcome.is_err());

        assert_eq!(snapshot(&scene), before);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn live_scene_nodes_are_readable_from_the_context() {
        let mut scene = Scene::new();
        let landmark = scene.add_node(
            SceneNode::marker("landmark")
                .with_local(Transform::from_position(Vec3::new(7.0, 8.0, 9.0))),
            None,
        );
        let group = demo_group();

        let seen = with_evaluated_group(&mut scene, &group, |handle| {
            handle.scene_world_translation(landmark).unwrap()
        });
        assert_relative_eq!(seen, Vec3::new(7.0, 8.0, 9.0), epsilon = 1e-6);
    }
}
