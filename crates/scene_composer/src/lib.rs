//! # Scene Composer
//!
//! A batch scene-composition library: it assembles a 3D scene from reusable
//! asset groups stored in external library files, driven by a declarative
//! description instead of hand-placed geometry.
//!
//! ## Features
//!
//! - **Asset Libraries**: named groups loaded from RON library files with a
//!   resilient fallback ladder and process-wide caching
//! - **Evaluation Bridge**: scoped, self-cleaning contexts that give library
//!   content valid evaluated world transforms
//! - **Pivot-Compensated Placement**: rotate and scale a group about any
//!   internal anchor point without disturbing its content
//! - **Diagnostics**: verify that instanced anchors landed on target
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_composer::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut scene = Scene::new();
//!     let root = scene.add_node(SceneNode::marker("RIG_SCENE_ROOT"), None);
//!
//!     let mut loader = AssetLibraryLoader::new();
//!     let group = loader.load_group(
//!         "assets/stage.ron".as_ref(),
//!         Some("EXPORT_stage"),
//!         LoadMode::Linked,
//!         &[],
//!     )?;
//!
//!     let spec = PlacementSpec::at(Vec3::new(100.0, 0.0, 0.0))
//!         .with_rotation_z_deg(90.0)
//!         .with_anchor(AnchorSpec::Auto(None));
//!
//!     let mut composer = PlacementComposer::new();
//!     composer.place(&mut scene, Some(&group), root, "stage", &spec);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod compose;
pub mod config;
pub mod foundation;
pub mod scene;

/// Common imports for library users
pub mod prelude {
    pub use crate::assets::{
        AssetError, AssetGroup, AssetLibrary, AssetLibraryLoader, GroupHandle, LoadMode,
    };
    pub use crate::compose::{
        verify_anchor, AnchorReport, AnchorResolution, AnchorSpec, ComposeError, InstancerHandle,
        PlacementComposer, PlacementSpec,
    };
    pub use crate::config::{Config, ConfigError};
    pub use crate::foundation::math::{Mat4, Transform, Vec3};
    pub use crate::scene::{Aabb, NodeFlags, NodeKey, NodeKind, Scene, SceneNode};
}
