//! Anchor resolution
//!
//! Placement rotates and scales a group about an anchor point expressed in
//! the group's own local frame. The resolver turns an [`AnchorSpec`] into
//! that offset, running one evaluation context per call and always returning
//! exactly one vector plus a human-readable reason for diagnostics.

use crate::assets::AssetGroup;
use crate::compose::eval::with_evaluated_group;
use crate::foundation::math::Vec3;
use crate::scene::{names, NodeKey, NodeKind, Scene, SceneNode};

/// Prefix marking rig containers and rig handle nodes
pub const RIG_PREFIX: &str = "RIG_";

/// Minimum heuristic score the `Auto` ladder accepts before falling back to
/// geometry bounds
pub const AUTO_ACCEPT_SCORE: i32 = 100;

/// How to derive the anchor point for a placement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorSpec {
    /// A named node inside the group (de-duplication tolerant; falls back to
    /// a scene-wide base-name search)
    Explicit(String),
    /// Center of the group's renderable world bounds
    BoundingBoxCenter,
    /// Minimum corner of the group's renderable world bounds
    BoundingBoxMin,
    /// The group's own origin
    Origin,
    /// Best-scoring rig/root marker node, optionally seeded with a name hint
    HeuristicRoot(Option<String>),
    /// Full fallback ladder: explicit hint, then heuristic root, then
    /// bounding-box center, then origin
    Auto(Option<String>),
}

impl Default for AnchorSpec {
    fn default() -> Self {
        Self::Auto(None)
    }
}

impl AnchorSpec {
    fn name_hint(&self) -> Option<&str> {
        match self {
            Self::Explicit(name) => Some(name),
            Self::HeuristicRoot(hint) | Self::Auto(hint) => hint.as_deref(),
            _ => None,
        }
    }
}

/// Result of one anchor resolution
#[derive(Debug, Clone)]
pub struct AnchorResolution {
    /// Anchor offset in the group's local coordinate frame (millimeters)
    pub offset: Vec3,
    /// Which branch/candidate produced the offset
    pub reason: String,
}

impl AnchorResolution {
    fn new(offset: Vec3, reason: impl Into<String>) -> Self {
        Self {
            offset,
            reason: reason.into(),
        }
    }

    fn origin(reason: impl Into<String>) -> Self {
        Self::new(Vec3::zeros(), reason)
    }
}

/// One pattern → weight entry of the heuristic scoring table
#[derive(Debug, Clone, Copy)]
pub struct ScoreRule {
    /// What the rule matches against
    pub pattern: NamePattern,
    /// Score contribution when the rule matches
    pub weight: i32,
}

/// Patterns the scoring table can express
///
/// Name patterns match against the de-duplicated base name.
#[derive(Debug, Clone, Copy)]
pub enum NamePattern {
    /// The node is a marker (non-renderable axis indicator)
    MarkerNode,
    /// The node belongs to a display grouping named with the rig prefix
    RigGrouping,
    /// Base name starts with the given prefix
    Prefix(&'static str),
    /// Base name ends with the given suffix
    Suffix(&'static str),
    /// Base name contains the given fragment
    Contains(&'static str),
    /// Base name equals the given name exactly
    Exact(&'static str),
}

impl NamePattern {
    fn matches(self, node: &SceneNode, base: &str) -> bool {
        match self {
            Self::MarkerNode => matches!(node.kind, NodeKind::Marker),
            Self::RigGrouping => node
                .groupings
                .iter()
                .any(|grouping| grouping.starts_with(RIG_PREFIX)),
            Self::Prefix(prefix) => base.starts_with(prefix),
            Self::Suffix(suffix) => base.ends_with(suffix),
            Self::Contains(fragment) => base.contains(fragment),
            Self::Exact(name) => base == name,
        }
    }
}

/// Heuristic root scoring table
///
/// Kept as data so tests can enumerate exact expected scores. The weights
/// are empirically tuned against real libraries; treat them as fixed
/// constants, not as a documented invariant.
pub const ANCHOR_SCORE_RULES: &[ScoreRule] = &[
    ScoreRule {
        pattern: NamePattern::MarkerNode,
        weight: 5,
    },
    ScoreRule {
        pattern: NamePattern::RigGrouping,
        weight: 100,
    },
    ScoreRule {
        pattern: NamePattern::Prefix(RIG_PREFIX),
        weight: 20,
    },
    ScoreRule {
        pattern: NamePattern::Suffix("_ROOT"),
        weight: 60,
    },
    ScoreRule {
        pattern: NamePattern::Contains("ROOT"),
        weight: 30,
    },
    ScoreRule {
        pattern: NamePattern::Exact("RIG_STAGE_ROOT"),
        weight: 200,
    },
    ScoreRule {
        pattern: NamePattern::Exact("RIG_JOYSTICK_ROOT"),
        weight: 180,
    },
    ScoreRule {
        pattern: NamePattern::Prefix("RIG_PCB_G_"),
        weight: 150,
    },
    ScoreRule {
        pattern: NamePattern::Prefix("RIG_PCB_ROOT"),
        weight: 160,
    },
];

/// Score one node against the full rule table
pub fn score_anchor_candidate(node: &SceneNode) -> i32 {
    let base = names::base_name(&node.name);
    ANCHOR_SCORE_RULES
        .iter()
        .filter(|rule| rule.pattern.matches(node, base))
        .map(|rule| rule.weight)
        .sum()
}

/// Best-scoring marker node in traversal order; ties keep the first
fn best_marker(content: &Scene) -> Option<(NodeKey, i32)> {
    let mut best: Option<(NodeKey, i32)> = None;
    for key in content.depth_first() {
        let node = content.node(key)?;
        if !matches!(node.kind, NodeKind::Marker) {
            continue;
        }
        let score = score_anchor_candidate(node);
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((key, score));
        }
    }
    best
}

/// Where a name hint resolved to
enum HintTarget {
    Group(NodeKey),
    Scene(NodeKey),
}

/// Resolve the anchor offset for `group` under `spec`
///
/// Runs entirely inside one evaluation context; the scene is unchanged when
/// the call returns. Never fails: unresolvable specs degrade to the group
/// origin with the miss recorded in the reason.
pub fn resolve_anchor(scene: &mut Scene, group: &AssetGroup, spec: &AnchorSpec) -> AnchorResolution {
    let content = group.content();

    // Hint and heuristic candidates are picked by name/kind before the
    // evaluation context opens; only their offsets need evaluated data.
    let hint = spec.name_hint();
    let hint_target = hint.and_then(|name| {
        content
            .resolve_name(name)
            .map(HintTarget::Group)
            .or_else(|| scene.resolve_name(name).map(HintTarget::Scene))
    });
    let heuristic = best_marker(content);

    with_evaluated_group(scene, group, |handle| {
        let hint_resolved = hint_target.as_ref().map(|target| match target {
            HintTarget::Group(key) => (
                handle.world_translation(*key).unwrap_or_else(Vec3::zeros),
                content.node(*key).map_or_else(String::new, |node| node.name.clone()),
                false,
            ),
            HintTarget::Scene(key) => (
                handle
                    .scene_world_translation(*key)
                    .unwrap_or_else(Vec3::zeros),
                String::from(hint.unwrap_or_default()),
                true,
            ),
        });

        match spec {
            AnchorSpec::Origin => AnchorResolution::origin("origin"),

            AnchorSpec::Explicit(name) => match hint_resolved {
                Some((offset, found, false)) => {
                    AnchorResolution::new(offset, format!("explicit anchor '{found}'"))
                }
                Some((offset, found, true)) => AnchorResolution::new(
                    offset,
                    format!("explicit anchor '{found}' (outside group)"),
                ),
                None => {
                    log::warn!(
                        "anchor '{name}' not found in group '{}'; using origin",
                        group.name()
                    );
                    AnchorResolution::origin(format!("anchor '{name}' not found; using origin"))
                }
            },

            AnchorSpec::BoundingBoxCenter => match handle.geometry_bounds() {
                Some(bounds) => AnchorResolution::new(bounds.center(), "bounding-box center"),
                None => {
                    log::warn!(
                        "group '{}' has no renderable geometry; using origin",
                        group.name()
                    );
                    AnchorResolution::origin("no renderable geometry; using origin")
                }
            },

            AnchorSpec::BoundingBoxMin => match handle.geometry_bounds() {
                Some(bounds) => AnchorResolution::new(bounds.min, "bounding-box min"),
                None => {
                    log::warn!(
                        "group '{}' has no renderable geometry; using origin",
                        group.name()
                    );
                    AnchorResolution::origin("no renderable geometry; using origin")
                }
            },

            AnchorSpec::HeuristicRoot(_) => {
                if let Some((offset, found, _)) = hint_resolved {
                    return AnchorResolution::new(offset, format!("root anchor '{found}'"));
                }
                if let Some((key, score)) = heuristic {
                    if score > 0 {
                        let offset = handle.world_translation(key).unwrap_or_else(Vec3::zeros);
                        let name = content.node(key).map_or("", |node| node.name.as_str());
                        return AnchorResolution::new(
                            offset,
                            format!("heuristic root '{name}' (score {score})"),
                        );
                    }
                }
                AnchorResolution::origin("no root candidate; using origin")
            }

            AnchorSpec::Auto(_) => {
                if let Some((offset, found, _)) = hint_resolved {
                    return AnchorResolution::new(offset, format!("auto: explicit anchor '{found}'"));
                }
                if let Some((key, score)) = heuristic {
                    if score >= AUTO_ACCEPT_SCORE {
                        let offset = handle.world_translation(key).unwrap_or_else(Vec3::zeros);
                        let name = content.node(key).map_or("", |node| node.name.as_str());
                        return AnchorResolution::new(
                            offset,
                            format!("auto: heuristic root '{name}' (score {score})"),
                        );
                    }
                }
                if let Some(bounds) = handle.geometry_bounds() {
                    return AnchorResolution::new(bounds.center(), "auto: bounding-box center");
                }
                AnchorResolution::origin("auto: origin")
            }
        }
    })
}
