//! Region overlay model
//!
//! The interactive surface carries an overlay of regions: one mutable
//! "loop" region mirroring the transport's loop boundary, plus read-only
//! "semantic" regions shaded by match score. The overlay is rebuilt
//! wholesale on every change — stale regions are fully cleared before
//! redraw, never patched in place.

use serde::{Deserialize, Serialize};

use crate::semantic::SemanticMatch;

/// A time interval within which playback is constrained to repeat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopRegion {
    pub start: f64,
    pub end: f64,
}

/// Identifier of an overlay region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionKind {
    /// The single draggable/resizable loop region.
    Loop,
    /// A read-only semantic match region, indexed by onset order.
    Semantic(usize),
}

/// One drawn overlay region.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayRegion {
    pub kind: RegionKind,
    pub start: f64,
    pub end: f64,
    /// Fill opacity used for visual intensity.
    pub opacity: f32,
    pub editable: bool,
}

/// Fill opacity of the loop region.
const LOOP_OPACITY: f32 = 0.25;

/// Shade intensity for a semantic region derived from its score.
fn semantic_opacity(score: f32) -> f32 {
    (0.15 + score * 0.25).min(0.5)
}

/// Rebuild the full overlay from the current loop region and match list.
pub fn rebuild_overlay(
    loop_region: Option<&LoopRegion>,
    matches: &[SemanticMatch],
) -> Vec<OverlayRegion> {
    let mut regions = Vec::with_capacity(matches.len() + 1);

    if let Some(region) = loop_region {
        regions.push(OverlayRegion {
            kind: RegionKind::Loop,
            start: region.start,
            end: region.end,
            opacity: LOOP_OPACITY,
            editable: true,
        });
    }

    for (idx, m) in matches.iter().enumerate() {
        regions.push(OverlayRegion {
            kind: RegionKind::Semantic(idx),
            start: m.start,
            end: m.end,
            opacity: semantic_opacity(m.score),
            editable: false,
        });
    }

    regions
}
