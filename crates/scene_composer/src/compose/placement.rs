//! Pivot-compensated placement
//!
//! A placement is a chain of four nodes so that the composed world transform
//! is `T(location) · R(rotation) · S(scale) · T(-anchor)`:
//!
//! ```text
//! parent
//!   └── PIV_<slot>   location
//!         └── ROT_<slot>   rotation + scale
//!               └── OFF_<slot>   -anchor offset
//!                     └── INST_<slot>   instancer, identity
//! ```
//!
//! Rotation and scale only ever touch the ROT link, so the compensated
//! anchor point stays exactly at the target location for any rotation or
//! scale, and the group's internal content is never modified. All four links
//! are ensured by stable derived names; rebuilding the same slot overwrites
//! transforms in place instead of accumulating nodes.

use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::GroupHandle;
use crate::compose::anchor::{resolve_anchor, AnchorSpec};
use crate::foundation::math::{quat_from_euler_deg, Quat, Transform, Vec3};
use crate::scene::{NodeKey, NodeKind, Scene, SceneNode};

/// Key of a placement chain's instancer link
pub type InstancerHandle = NodeKey;

/// One placement request, sourced from a declarative description
#[derive(Debug, Clone)]
pub struct PlacementSpec {
    /// Target location in millimeters; the resolved anchor point lands here
    pub location_mm: Vec3,

    /// Rotation about the anchor, intrinsic XYZ degrees
    pub rotation_deg: Vec3,

    /// Scale about the anchor
    pub scale: Vec3,

    /// How to derive the anchor point
    pub anchor: AnchorSpec,
}

impl Default for PlacementSpec {
    fn default() -> Self {
        Self {
            location_mm: Vec3::zeros(),
            rotation_deg: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            anchor: AnchorSpec::default(),
        }
    }
}

impl PlacementSpec {
    /// Placement at a target location with default rotation/scale/anchor
    pub fn at(location_mm: Vec3) -> Self {
        Self {
            location_mm,
            ..Default::default()
        }
    }

    /// Set the rotation in XYZ degrees
    pub fn with_rotation_deg(mut self, rotation_deg: Vec3) -> Self {
        self.rotation_deg = rotation_deg;
        self
    }

    /// Set a yaw-only rotation in degrees
    pub fn with_rotation_z_deg(mut self, z_deg: f32) -> Self {
        self.rotation_deg = Vec3::new(0.0, 0.0, z_deg);
        self
    }

    /// Set a uniform scale factor
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::new(scale, scale, scale);
        self
    }

    /// Set per-axis scale factors
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Set the anchor specification
    pub fn with_anchor(mut self, anchor: AnchorSpec) -> Self {
        self.anchor = anchor;
        self
    }
}

/// Builds and rebuilds placement chains
///
/// The composer owns the stable-name table that makes `place` idempotent: a
/// slot rebuilt with the same name converges onto the same four nodes.
#[derive(Debug, Default)]
pub struct PlacementComposer {
    stable: HashMap<String, NodeKey>,
}

impl PlacementComposer {
    /// Create a composer with an empty stable-name table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build or update the placement chain for `slot`
    ///
    /// With `group = None` (the slot's asset failed to load) this is a
    /// no-op: one warning, no nodes created, `None` returned, and the
    /// surrounding build carries on with its other slots.
    pub fn place(
        &mut self,
        scene: &mut Scene,
        group: Option<&GroupHandle>,
        parent: NodeKey,
        slot: &str,
        spec: &PlacementSpec,
    ) -> Option<InstancerHandle> {
        let Some(group) = group else {
            log::warn!("slot '{slot}': no asset group available; placement skipped");
            return None;
        };

        let resolution = resolve_anchor(scene, group, &spec.anchor);
        log::debug!(
            "slot '{slot}': anchor offset ({:.3}, {:.3}, {:.3}) via {}",
            resolution.offset.x,
            resolution.offset.y,
            resolution.offset.z,
            resolution.reason
        );

        let piv = self.ensure_link(scene, format!("PIV_{slot}"), parent);
        let rot = self.ensure_link(scene, format!("ROT_{slot}"), piv);
        let off = self.ensure_link(scene, format!("OFF_{slot}"), rot);
        let inst = self.ensure_link(scene, format!("INST_{slot}"), off);

        if let Some(node) = scene.node_mut(piv) {
            node.local = Transform::from_position(spec.location_mm);
            node.kind = NodeKind::Marker;
        }
        if let Some(node) = scene.node_mut(rot) {
            node.local = Transform {
                position: Vec3::zeros(),
                rotation: quat_from_euler_deg(spec.rotation_deg),
                scale: spec.scale,
            };
            node.kind = NodeKind::Marker;
        }
        if let Some(node) = scene.node_mut(off) {
            node.local = Transform::from_position(-resolution.offset);
            node.kind = NodeKind::Marker;
        }
        if let Some(node) = scene.node_mut(inst) {
            node.local = Transform {
                position: Vec3::zeros(),
                rotation: Quat::identity(),
                scale: Vec3::new(1.0, 1.0, 1.0),
            };
            node.kind = NodeKind::Instancer(Arc::clone(group));
        }

        log::info!(
            "slot '{slot}': placed group '{}' at ({:.1}, {:.1}, {:.1}) [{}]",
            group.name(),
            spec.location_mm.x,
            spec.location_mm.y,
            spec.location_mm.z,
            resolution.reason
        );
        Some(inst)
    }

    /// Find-or-create a chain link by stable name and attach it to `parent`
    fn ensure_link(&mut self, scene: &mut Scene, name: String, parent: NodeKey) -> NodeKey {
        if let Some(&key) = self.stable.get(&name) {
            if scene.contains(key) {
                if let Err(err) = scene.attach(key, parent) {
                    log::warn!("could not re-parent '{name}': {err}");
                }
                return key;
            }
        }
        if let Some(key) = scene.find_by_name(&name) {
            if let Err(err) = scene.attach(key, parent) {
                log::warn!("could not re-parent '{name}': {err}");
            }
            self.stable.insert(name, key);
            return key;
        }
        let key = scene.add_node(SceneNode::marker(name.clone()), Some(parent));
        self.stable.insert(name, key);
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetGroup;
    use crate::compose::diagnostics::verify_anchor;
    use crate::foundation::math::translation_of;
    use crate::scene::Aabb;
    use approx::assert_relative_eq;

    /// A box spanning (0,0,0)-(10,10,10) plus a marker at (5,5,10)
    fn boxed_group() -> GroupHandle {
        let mut content = Scene::new();
        content.add_node(
            SceneNode::mesh(
                "hull",
                Aabb::new(Vec3::zeros(), Vec3::new(10.0, 10.0, 10.0)),
            ),
            None,
        );
        content.add_node(
            SceneNode::marker("ANCHOR_PT")
                .with_local(Transform::from_position(Vec3::new(5.0, 5.0, 10.0))),
            None,
        );
        Arc::new(AssetGroup::new("EXPORT_box", content))
    }

    fn place_once(rotation_deg: Vec3, scale: Vec3) -> (Scene, InstancerHandle) {
        let mut scene = Scene::new();
        let root = scene.add_node(SceneNode::marker("root"), None);
        let group = boxed_group();
        let mut composer = PlacementComposer::new();

        let spec = PlacementSpec::at(Vec3::new(100.0, 0.0, 0.0))
            .with_rotation_deg(rotation_deg)
            .with_scale(scale)
            .with_anchor(AnchorSpec::Explicit("ANCHOR_PT".to_owned()));
        let inst = composer
            .place(&mut scene, Some(&group), root, "slotA", &spec)
            .unwrap();
        (scene, inst)
    }

    #[test]
    fn anchor_stays_at_target_under_rotation() {
        let rotations = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 90.0),
            Vec3::new(0.0, 0.0, 180.0),
            Vec3::new(0.0, 0.0, 270.0),
            Vec3::new(33.0, 12.0, 71.0),
        ];
        for rotation in rotations {
            let (scene, inst) = place_once(rotation, Vec3::new(1.0, 1.0, 1.0));
            let report = verify_anchor(&scene, inst, "ANCHOR_PT").unwrap();
            assert_relative_eq!(
                report.actual,
                Vec3::new(100.0, 0.0, 0.0),
                epsilon = 1e-3
            );
            assert_relative_eq!(report.delta, Vec3::zeros(), epsilon = 1e-3);
        }
    }

    #[test]
    fn anchor_stays_at_target_under_scale() {
        let scales = [
            Vec3::new(0.5, 0.5, 0.5),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(2.0, 2.0, 2.0),
            Vec3::new(1.0, 2.0, 3.0),
        ];
        for scale in scales {
            let (scene, inst) = place_once(Vec3::zeros(), scale);
            let report = verify_anchor(&scene, inst, "ANCHOR_PT").unwrap();
            assert_relative_eq!(
                report.actual,
                Vec3::new(100.0, 0.0, 0.0),
                epsilon = 1e-3
            );
        }
    }

    #[test]
    fn rebuilding_a_slot_converges_instead_of_accumulating() {
        let mut scene = Scene::new();
        let root = scene.add_node(SceneNode::marker("root"), None);
        let group = boxed_group();
        let mut composer = PlacementComposer::new();

        let spec = PlacementSpec::at(Vec3::new(10.0, 0.0, 0.0));
        let first = composer
            .place(&mut scene, Some(&group), root, "slotA", &spec)
            .unwrap();

        let moved = PlacementSpec::at(Vec3::new(50.0, 0.0, 0.0)).with_rotation_z_deg(45.0);
        let second = composer
            .place(&mut scene, Some(&group), root, "slotA", &moved)
            .unwrap();

        assert_eq!(first, second);
        // root + PIV + ROT + OFF + INST, nothing duplicated.
        assert_eq!(scene.len(), 5);

        let piv = scene.find_by_name("PIV_slotA").unwrap();
        assert_relative_eq!(
            scene.node(piv).unwrap().local.position,
            Vec3::new(50.0, 0.0, 0.0),
            epsilon = 1e-6
        );
    }

    #[test]
    fn missing_group_is_a_warned_no_op() {
        let mut scene = Scene::new();
        let root = scene.add_node(SceneNode::marker("root"), None);
        let mut composer = PlacementComposer::new();

        let placed = composer.place(
            &mut scene,
            None,
            root,
            "ghost",
            &PlacementSpec::default(),
        );
        assert!(placed.is_none());
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn rotated_box_pivots_about_the_anchor_point() {
        // Box (0,0,0)-(10,10,10), anchor marker at (5,5,10), target
        // (100,0,0), 90 degrees of yaw: the anchor must coincide with the
        // placement link and the box centroid must land at (100,0,-5).
        let (scene, inst) = place_once(Vec3::new(0.0, 0.0, 90.0), Vec3::new(1.0, 1.0, 1.0));
        let report = verify_anchor(&scene, inst, "ANCHOR_PT").unwrap();
        assert_relative_eq!(report.expected, Vec3::new(100.0, 0.0, 0.0), epsilon = 1e-3);
        assert_relative_eq!(report.actual, Vec3::new(100.0, 0.0, 0.0), epsilon = 1e-3);

        let node = scene.node(inst).unwrap();
        let NodeKind::Instancer(group) = &node.kind else {
            panic!("instancer link lost its group reference");
        };
        let worlds = scene.evaluate_world_transforms();
        let group_worlds = group.content().evaluate_world_transforms();
        let hull = group.content().find_by_name("hull").unwrap();
        let hull_world = worlds[inst] * group_worlds[hull];
        let centroid = hull_world.transform_point(&crate::foundation::math::Point3::new(
            5.0, 5.0, 5.0,
        ));
        assert_relative_eq!(
            centroid.coords,
            Vec3::new(100.0, 0.0, -5.0),
            epsilon = 1e-3
        );
    }

    #[test]
    fn chain_world_transform_composes_in_order() {
        let (scene, inst) = place_once(Vec3::new(0.0, 0.0, 90.0), Vec3::new(2.0, 2.0, 2.0));
        let worlds = scene.evaluate_world_transforms();

        // T(100,0,0) · Rz(90) · S(2) · T(-(5,5,10)) applied to the group origin:
        // (-5,-5,-10) scaled to (-10,-10,-20), yawed to (10,-10,-20), moved to
        // (110,-10,-20).
        assert_relative_eq!(
            translation_of(&worlds[inst]),
            Vec3::new(110.0, -10.0, -20.0),
            epsilon = 1e-3
        );
    }
}
