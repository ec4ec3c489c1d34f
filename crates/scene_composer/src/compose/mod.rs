//! Scene composition: evaluation bridge, anchor resolution, placement, and
//! placement diagnostics

mod anchor;
mod diagnostics;
mod eval;
mod placement;

use thiserror::Error;

use crate::scene::NodeKey;

pub use anchor::{
    resolve_anchor, score_anchor_candidate, AnchorResolution, AnchorSpec, NamePattern, ScoreRule,
    ANCHOR_SCORE_RULES, AUTO_ACCEPT_SCORE, RIG_PREFIX,
};
pub use diagnostics::{verify_anchor, AnchorReport};
pub use eval::{with_evaluated_group, EvaluationHandle};
pub use placement::{InstancerHandle, PlacementComposer, PlacementSpec};

/// Composition errors
///
/// These only surface from the diagnostics API; the placement pipeline
/// itself degrades per slot instead of failing.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// A node key no longer resolves in the scene
    #[error("node {0:?} is not part of the scene")]
    NodeNotFound(NodeKey),

    /// The node exists but does not reference an asset group
    #[error("node '{0}' is not an instancer")]
    NotAnInstancer(String),

    /// The named anchor is absent from the instanced group
    #[error("anchor '{0}' not found inside the instanced group")]
    AnchorNotFound(String),

    /// The instancer has lost its placement/rotation/offset ancestors
    #[error("instancer '{0}' is missing its placement chain")]
    MissingPlacementChain(String),
}
