//! Build manifest
//!
//! The manifest is the declarative description the batch build consumes: an
//! output path, shared slot defaults, and one entry per placement slot.
//! Slots tolerate sloppy authoring where the original data allows it — a
//! bare number as rotation means yaw-only, a bare number as scale means
//! uniform.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use scene_composer::assets::EXPORT_GROUP_PREFIX;
use scene_composer::config::Config;
use scene_composer::prelude::{AnchorSpec, LoadMode, PlacementSpec, Vec3};

/// Rotation as authored: a full XYZ triple or a single yaw value
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RotationInput {
    /// Single value: rotation about Z only, degrees
    ZOnly(f32),
    /// XYZ degrees
    Axes([f32; 3]),
}

impl RotationInput {
    fn to_vec3(&self) -> Vec3 {
        match self {
            Self::ZOnly(z) => Vec3::new(0.0, 0.0, *z),
            Self::Axes(axes) => Vec3::from(*axes),
        }
    }
}

/// Scale as authored: per-axis factors or a single uniform factor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScaleInput {
    /// Uniform scale factor
    Uniform(f32),
    /// Per-axis factors
    PerAxis([f32; 3]),
}

impl ScaleInput {
    fn to_vec3(&self) -> Vec3 {
        match self {
            Self::Uniform(s) => Vec3::new(*s, *s, *s),
            Self::PerAxis(axes) => Vec3::from(*axes),
        }
    }
}

/// Anchor mode keyword; pairs with the optional `anchor_object` name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnchorMode {
    /// Full fallback ladder (the default)
    Auto,
    /// Group origin
    Origin,
    /// Center of the renderable bounds
    BoundingBoxCenter,
    /// Minimum corner of the renderable bounds
    BoundingBoxMin,
    /// Named node; requires `anchor_object`
    Explicit,
    /// Best-scoring rig/root marker
    HeuristicRoot,
}

/// Output artifact settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where the composed scene document is written
    pub scene_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            scene_path: PathBuf::from("compiled/scene.ron"),
        }
    }
}

/// Defaults merged under every slot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotDefaults {
    /// Share library templates (true) or copy-import them (false)
    pub link: Option<bool>,
    /// Default rotation
    pub rotation_deg: Option<RotationInput>,
    /// Default yaw override
    pub rotation_z_deg: Option<f32>,
    /// Default scale
    pub scale: Option<ScaleInput>,
    /// Default anchor mode
    pub anchor: Option<AnchorMode>,
    /// Default anchor object name
    pub anchor_object: Option<String>,
}

/// One placement slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotConfig {
    /// Library file the slot's group comes from
    pub library: PathBuf,

    /// Requested group name; the loader's fallback ladder applies when the
    /// name is absent or missing from the library
    #[serde(default)]
    pub group: Option<String>,

    /// Disabled slots are skipped with a log line
    #[serde(default = "enabled_default")]
    pub enabled: bool,

    /// Overrides the default link/copy mode
    #[serde(default)]
    pub link: Option<bool>,

    /// Extra group names to try before the generic fallbacks
    #[serde(default)]
    pub fallback_groups: Vec<String>,

    /// Target location, millimeters
    #[serde(default)]
    pub location_mm: [f32; 3],

    /// Rotation about the anchor
    #[serde(default)]
    pub rotation_deg: Option<RotationInput>,

    /// Yaw override; wins over `rotation_deg`'s Z component
    #[serde(default)]
    pub rotation_z_deg: Option<f32>,

    /// Scale about the anchor
    #[serde(default)]
    pub scale: Option<ScaleInput>,

    /// Anchor mode
    #[serde(default)]
    pub anchor: Option<AnchorMode>,

    /// Anchor object name (for Explicit, or as a hint for Auto/HeuristicRoot)
    #[serde(default)]
    pub anchor_object: Option<String>,
}

fn enabled_default() -> bool {
    true
}

/// A slot with its defaults folded in, ready for the loader and composer
#[derive(Debug, Clone)]
pub struct ResolvedSlot {
    /// Library file path
    pub library: PathBuf,
    /// Requested group name
    pub group: Option<String>,
    /// Fallback group names, in priority order
    pub fallbacks: Vec<String>,
    /// Link or copy
    pub mode: LoadMode,
    /// Anchor object used for post-build verification
    pub anchor_object: Option<String>,
    /// The placement itself
    pub spec: PlacementSpec,
}

impl SlotConfig {
    /// Fold `defaults` under this slot and produce loader/composer inputs
    pub fn resolve(&self, slot: &str, defaults: &SlotDefaults) -> ResolvedSlot {
        let link = self.link.or(defaults.link).unwrap_or(true);

        let mut rotation_deg = self
            .rotation_deg
            .as_ref()
            .or(defaults.rotation_deg.as_ref())
            .map_or_else(Vec3::zeros, RotationInput::to_vec3);
        if let Some(z) = self.rotation_z_deg.or(defaults.rotation_z_deg) {
            rotation_deg.z = z;
        }

        let scale = self
            .scale
            .as_ref()
            .or(defaults.scale.as_ref())
            .map_or_else(|| Vec3::new(1.0, 1.0, 1.0), ScaleInput::to_vec3);

        let anchor_object = self
            .anchor_object
            .clone()
            .or_else(|| defaults.anchor_object.clone());
        let mode = self.anchor.or(defaults.anchor).unwrap_or(AnchorMode::Auto);
        let anchor = match (mode, anchor_object.clone()) {
            (AnchorMode::Auto, hint) => AnchorSpec::Auto(hint),
            (AnchorMode::Origin, _) => AnchorSpec::Origin,
            (AnchorMode::BoundingBoxCenter, _) => AnchorSpec::BoundingBoxCenter,
            (AnchorMode::BoundingBoxMin, _) => AnchorSpec::BoundingBoxMin,
            (AnchorMode::HeuristicRoot, hint) => AnchorSpec::HeuristicRoot(hint),
            (AnchorMode::Explicit, Some(name)) => AnchorSpec::Explicit(name),
            (AnchorMode::Explicit, None) => {
                log::warn!("slot '{slot}': Explicit anchor without anchor_object; using origin");
                AnchorSpec::Origin
            }
        };

        // A group named without the export prefix also tries its EXPORT_
        // counterpart before the generic ladder.
        let mut fallbacks = self.fallback_groups.clone();
        if let Some(group) = &self.group {
            if !group.starts_with(EXPORT_GROUP_PREFIX) {
                let prefixed = format!("{EXPORT_GROUP_PREFIX}{group}");
                if !fallbacks.contains(&prefixed) {
                    fallbacks.push(prefixed);
                }
            }
        }

        ResolvedSlot {
            library: self.library.clone(),
            group: self.group.clone(),
            fallbacks,
            mode: if link { LoadMode::Linked } else { LoadMode::Copied },
            anchor_object,
            spec: PlacementSpec {
                location_mm: Vec3::from(self.location_mm),
                rotation_deg,
                scale,
                anchor,
            },
        }
    }
}

/// The build manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Output artifact settings
    pub output: OutputConfig,

    /// Name of the scene root node every placement hangs under
    pub root_name: String,

    /// Defaults merged under every slot
    pub defaults: SlotDefaults,

    /// Placement slots by key; BTreeMap keeps build order stable
    pub slots: BTreeMap<String, SlotConfig>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            output: OutputConfig::default(),
            root_name: "RIG_SCENE_ROOT".to_owned(),
            defaults: SlotDefaults::default(),
            slots: BTreeMap::new(),
        }
    }
}

impl Config for Manifest {}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
        Manifest(
            output: (scene_path: "out/corner.ron"),
            root_name: "RIG_CORNER_ROOT",
            defaults: (
                scale: 2.0,
                anchor: Auto,
            ),
            slots: {
                "left_electrical": (
                    library: "libs/electrical.ron",
                    group: "pcb_main",
                    location_mm: (120.0, 0.0, 0.0),
                    rotation_deg: 90.0,
                ),
                "right_mechanical": (
                    library: "libs/mechanical.ron",
                    group: "EXPORT_gearbox",
                    rotation_deg: (10.0, 20.0, 30.0),
                    rotation_z_deg: 45.0,
                    scale: (1.0, 2.0, 3.0),
                    anchor: Explicit,
                    anchor_object: "ANCHOR_PT",
                ),
                "disabled_slot": (
                    library: "libs/unused.ron",
                    enabled: false,
                ),
            },
        )
    "#;

    fn parsed() -> Manifest {
        ron::Options::default()
            .with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
            .from_str(MANIFEST)
            .unwrap()
    }

    #[test]
    fn scalar_rotation_means_yaw_only() {
        let manifest = parsed();
        let slot = manifest.slots["left_electrical"].resolve("left_electrical", &manifest.defaults);
        assert_eq!(slot.spec.rotation_deg, Vec3::new(0.0, 0.0, 90.0));
    }

    #[test]
    fn rotation_z_override_wins() {
        let manifest = parsed();
        let slot =
            manifest.slots["right_mechanical"].resolve("right_mechanical", &manifest.defaults);
        assert_eq!(slot.spec.rotation_deg, Vec3::new(10.0, 20.0, 45.0));
    }

    #[test]
    fn defaults_fill_unset_slot_fields() {
        let manifest = parsed();
        let slot = manifest.slots["left_electrical"].resolve("left_electrical", &manifest.defaults);
        // Uniform default scale from the defaults block.
        assert_eq!(slot.spec.scale, Vec3::new(2.0, 2.0, 2.0));
        // Slot-level scale overrides it.
        let other =
            manifest.slots["right_mechanical"].resolve("right_mechanical", &manifest.defaults);
        assert_eq!(other.spec.scale, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn unprefixed_group_gains_export_fallback() {
        let manifest = parsed();
        let slot = manifest.slots["left_electrical"].resolve("left_electrical", &manifest.defaults);
        assert!(slot.fallbacks.contains(&"EXPORT_pcb_main".to_owned()));

        let prefixed =
            manifest.slots["right_mechanical"].resolve("right_mechanical", &manifest.defaults);
        assert!(prefixed.fallbacks.is_empty());
    }

    #[test]
    fn explicit_anchor_carries_its_object() {
        let manifest = parsed();
        let slot =
            manifest.slots["right_mechanical"].resolve("right_mechanical", &manifest.defaults);
        assert_eq!(
            slot.spec.anchor,
            AnchorSpec::Explicit("ANCHOR_PT".to_owned())
        );
    }

    #[test]
    fn explicit_without_object_degrades_to_origin() {
        let config = SlotConfig {
            library: PathBuf::from("libs/a.ron"),
            group: None,
            enabled: true,
            link: None,
            fallback_groups: Vec::new(),
            location_mm: [0.0; 3],
            rotation_deg: None,
            rotation_z_deg: None,
            scale: None,
            anchor: Some(AnchorMode::Explicit),
            anchor_object: None,
        };
        let slot = config.resolve("bare", &SlotDefaults::default());
        assert_eq!(slot.spec.anchor, AnchorSpec::Origin);
    }

    #[test]
    fn disabled_flag_parses() {
        let manifest = parsed();
        assert!(!manifest.slots["disabled_slot"].enabled);
        assert!(manifest.slots["left_electrical"].enabled);
    }

    #[test]
    fn link_default_is_linked_mode() {
        let manifest = parsed();
        let slot = manifest.slots["left_electrical"].resolve("left_electrical", &manifest.defaults);
        assert_eq!(slot.mode, LoadMode::Linked);
    }
}
