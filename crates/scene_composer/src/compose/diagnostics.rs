//! Build-time placement self-checks
//!
//! Verification runs against the live scene, not the evaluation bridge: the
//! instancer is already attached, so the instanced copy of a group node
//! evaluates as the instancer's world transform composed with the node's
//! group-local world transform. Nothing here mutates scene state; the
//! reports exist for logging only.

use crate::compose::{ComposeError, InstancerHandle};
use crate::foundation::math::{translation_of, Vec3};
use crate::scene::{NodeKind, Scene};

/// Outcome of one anchor verification
#[derive(Debug, Clone)]
pub struct AnchorReport {
    /// World position of the chain's placement link (the intended target)
    pub expected: Vec3,
    /// Evaluated world position of the instanced anchor node
    pub actual: Vec3,
    /// `actual - expected`
    pub delta: Vec3,
}

/// Check that the instanced copy of `anchor_name` landed on the placement
/// link's world position
pub fn verify_anchor(
    scene: &Scene,
    instancer: InstancerHandle,
    anchor_name: &str,
) -> Result<AnchorReport, ComposeError> {
    let node = scene
        .node(instancer)
        .ok_or(ComposeError::NodeNotFound(instancer))?;
    let NodeKind::Instancer(group) = &node.kind else {
        return Err(ComposeError::NotAnInstancer(node.name.clone()));
    };

    let anchor = group
        .content()
        .resolve_name(anchor_name)
        .ok_or_else(|| ComposeError::AnchorNotFound(anchor_name.to_owned()))?;

    let worlds = scene.evaluate_world_transforms();
    let group_worlds = group.content().evaluate_world_transforms();

    let instancer_world = worlds
        .get(instancer)
        .copied()
        .ok_or(ComposeError::NodeNotFound(instancer))?;
    let actual = translation_of(&(instancer_world * group_worlds[anchor]));

    // Placement link is three parents up: INST -> OFF -> ROT -> PIV.
    let mut cursor = instancer;
    for _ in 0..3 {
        cursor = scene
            .node(cursor)
            .and_then(|link| link.parent())
            .ok_or_else(|| ComposeError::MissingPlacementChain(node.name.clone()))?;
    }
    let expected = worlds
        .get(cursor)
        .map(translation_of)
        .ok_or(ComposeError::NodeNotFound(cursor))?;

    Ok(AnchorReport {
        expected,
        actual,
        delta: actual - expected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetGroup;
    use crate::compose::{AnchorSpec, PlacementComposer, PlacementSpec};
    use crate::foundation::math::Transform;
    use crate::scene::SceneNode;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    #[test]
    fn reports_near_zero_delta_for_a_compensated_placement() {
        let mut content = crate::scene::Scene::new();
        content.add_node(
            SceneNode::marker("ANCHOR_PT")
                .with_local(Transform::from_position(Vec3::new(3.0, 4.0, 5.0))),
            None,
        );
        let group = Arc::new(AssetGroup::new("EXPORT_pt", content));

        let mut scene = Scene::new();
        let root = scene.add_node(SceneNode::marker("root"), None);
        let mut composer = PlacementComposer::new();
        let spec = PlacementSpec::at(Vec3::new(-20.0, 15.0, 0.0))
            .with_rotation_z_deg(135.0)
            .with_anchor(AnchorSpec::Explicit("ANCHOR_PT".to_owned()));

        let inst = composer
            .place(&mut scene, Some(&group), root, "check", &spec)
            .unwrap();
        let report = verify_anchor(&scene, inst, "ANCHOR_PT").unwrap();

        assert_relative_eq!(report.expected, Vec3::new(-20.0, 15.0, 0.0), epsilon = 1e-4);
        assert_relative_eq!(report.delta, Vec3::zeros(), epsilon = 1e-3);
    }

    #[test]
    fn unknown_anchor_is_an_error() {
        let mut content = crate::scene::Scene::new();
        content.add_node(SceneNode::marker("pt"), None);
        let group = Arc::new(AssetGroup::new("EXPORT_pt", content));

        let mut scene = Scene::new();
        let root = scene.add_node(SceneNode::marker("root"), None);
        let mut composer = PlacementComposer::new();
        let inst = composer
            .place(
                &mut scene,
                Some(&group),
                root,
                "check",
                &PlacementSpec::default(),
            )
            .unwrap();

        let err = verify_anchor(&scene, inst, "NOT_THERE").unwrap_err();
        assert!(matches!(err, ComposeError::AnchorNotFound(_)));
    }

    #[test]
    fn non_instancer_nodes_are_rejected() {
        let mut scene = Scene::new();
        let plain = scene.add_node(SceneNode::marker("plain"), None);
        let err = verify_anchor(&scene, plain, "pt").unwrap_err();
        assert!(matches!(err, ComposeError::NotAnInstancer(_)));
    }
}
