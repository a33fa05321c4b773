//! Loop/Transport Coordinator
//!
//! Owns the shared loop region and drives two independently instantiated
//! playback surfaces (original and reconstructed) so that play, pause,
//! seek, loop, zoom, and scroll stay mutually consistent. The original
//! surface is interactive; the reconstructed surface only mirrors
//! transport commands. Loop wraparound is a continuous check driven by the
//! original surface's time-update notifications, not a timer.

pub mod regions;
pub mod surface;

use log::debug;

pub use regions::{LoopRegion, OverlayRegion, RegionKind};
pub use surface::{OfflineSurface, PlaybackSurface, SurfaceRole, SurfaceState};

use crate::semantic::SemanticMatch;

/// Zoom floor in pixels per second.
pub const MIN_ZOOM_PX_PER_SEC: f64 = 10.0;
/// Initial zoom factor.
pub const DEFAULT_ZOOM_PX_PER_SEC: f64 = 70.0;

/// Seconds of lead-in before a click-to-loop gesture's click point.
const CLICK_LOOP_LEAD: f64 = 0.25;
/// Total length of a click-to-loop region.
const CLICK_LOOP_LENGTH: f64 = 0.75;

/// Coordinates two playback surfaces behind one transport control.
pub struct TransportCoordinator<S: PlaybackSurface> {
    original: S,
    reconstructed: S,
    loop_region: Option<LoopRegion>,
    matches: Vec<SemanticMatch>,
    overlay: Vec<OverlayRegion>,
    zoom_px_per_sec: f64,
    viewport_center: f64,
    playing: bool,
}

impl<S: PlaybackSurface> TransportCoordinator<S> {
    pub fn new(original: S, reconstructed: S) -> Self {
        Self {
            original,
            reconstructed,
            loop_region: None,
            matches: Vec::new(),
            overlay: Vec::new(),
            zoom_px_per_sec: DEFAULT_ZOOM_PX_PER_SEC,
            viewport_center: 0.0,
            playing: false,
        }
    }

    // ========================================================================
    // Source management
    // ========================================================================

    /// Adopt a new original source. The loop region and semantic overlay
    /// belong to the previous timeline, so both are cleared.
    pub fn load_original(&mut self, source_url: &str, duration_secs: f64) {
        self.original.load(source_url, duration_secs);
        self.original.set_zoom(self.zoom_px_per_sec);
        self.loop_region = None;
        self.matches.clear();
        self.playing = false;
        self.viewport_center = 0.0;
        self.rebuild_overlay();
    }

    /// Adopt (or replace) the reconstructed source.
    pub fn load_reconstructed(&mut self, source_url: &str, duration_secs: f64) {
        self.reconstructed.load(source_url, duration_secs);
        self.reconstructed.set_zoom(self.zoom_px_per_sec);
    }

    pub fn original(&self) -> &S {
        &self.original
    }

    pub fn original_mut(&mut self) -> &mut S {
        &mut self.original
    }

    pub fn reconstructed(&self) -> &S {
        &self.reconstructed
    }

    pub fn reconstructed_mut(&mut self) -> &mut S {
        &mut self.reconstructed
    }

    // ========================================================================
    // Zoom and viewport
    // ========================================================================

    /// Apply one zoom factor to both surfaces.
    ///
    /// A surface that is not yet `Ready` ignores the change (no error, no
    /// desync: the stored factor is replayed when it loads). The viewport
    /// re-centers on the current play cursor after reflow.
    pub fn set_zoom(&mut self, px_per_sec: f64) {
        self.zoom_px_per_sec = px_per_sec.max(MIN_ZOOM_PX_PER_SEC);
        self.original.set_zoom(self.zoom_px_per_sec);
        self.reconstructed.set_zoom(self.zoom_px_per_sec);
        self.center_on(self.original.current_time());
    }

    pub fn zoom_px_per_sec(&self) -> f64 {
        self.zoom_px_per_sec
    }

    /// Time currently centered in the viewport.
    pub fn viewport_center(&self) -> f64 {
        self.viewport_center
    }

    fn center_on(&mut self, time: f64) {
        self.viewport_center = time.max(0.0);
    }

    // ========================================================================
    // Loop region and overlay
    // ========================================================================

    /// Click-to-loop gesture at time `t`.
    ///
    /// Sets a short loop around the click point and recenters the viewport
    /// on it. Only the interactive surface originates gestures; clicks
    /// reported from a passive surface are ignored, as are clicks before
    /// the original surface knows its duration.
    pub fn click_at(&mut self, source: SurfaceRole, t: f64) {
        if source != SurfaceRole::Interactive {
            return;
        }
        if self.original.state() != SurfaceState::Ready {
            return;
        }
        let duration = self.original.duration();
        if duration <= 0.0 {
            return;
        }

        let start = (t - CLICK_LOOP_LEAD).max(0.0);
        let end = (start + CLICK_LOOP_LENGTH).min(duration);
        debug!("click-to-loop at {:.2}s -> [{:.2}, {:.2}]", t, start, end);
        self.loop_region = Some(LoopRegion { start, end });
        self.rebuild_overlay();
        self.center_on(t);
    }

    /// Drag/resize of the loop overlay: adopt the region's new bounds.
    /// Edits can only originate on the interactive surface.
    pub fn loop_region_edited(&mut self, source: SurfaceRole, start: f64, end: f64) {
        if source != SurfaceRole::Interactive {
            return;
        }
        self.loop_region = Some(LoopRegion { start, end });
        self.rebuild_overlay();
    }

    /// Programmatic loop region replacement (or removal with `None`).
    pub fn set_loop_region(&mut self, region: Option<LoopRegion>) {
        self.loop_region = region;
        self.rebuild_overlay();
    }

    pub fn loop_region(&self) -> Option<LoopRegion> {
        self.loop_region
    }

    /// Replace the semantic match list wholesale.
    pub fn set_matches(&mut self, matches: Vec<SemanticMatch>) {
        self.matches = matches;
        self.rebuild_overlay();
    }

    /// The current overlay: loop region first (if any), then one shaded
    /// region per semantic match.
    pub fn overlay(&self) -> &[OverlayRegion] {
        &self.overlay
    }

    fn rebuild_overlay(&mut self) {
        self.overlay = regions::rebuild_overlay(self.loop_region.as_ref(), &self.matches);
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Toggle playback on both surfaces together.
    ///
    /// Computes one common target time: the loop start if the cursor has
    /// run past the loop end, else the current cursor fraction. Starting
    /// seeks both surfaces to the target before playing; pausing pauses
    /// both.
    pub fn play_pause(&mut self) {
        if self.original.state() != SurfaceState::Ready {
            return;
        }
        let duration = self.original.duration();
        if duration <= 0.0 {
            return;
        }

        let starting = !self.original.is_playing();
        let cursor = self.original.current_time();
        let target = match &self.loop_region {
            Some(region) if cursor > region.end => region.start,
            _ => cursor,
        };
        // Clamp into [0, duration)
        let fraction = (target / duration).clamp(0.0, 1.0).min(1.0 - 1e-9);

        if starting {
            self.original.seek_to(fraction);
            self.reconstructed.seek_to(fraction);
            self.original.play();
            self.reconstructed.play();
            self.playing = true;
        } else {
            self.original.pause();
            self.reconstructed.pause();
            self.playing = false;
        }
    }

    /// Halt both surfaces and reset the observed playing flag.
    pub fn stop(&mut self) {
        self.original.stop();
        self.reconstructed.stop();
        self.playing = false;
    }

    /// Explicit numeric time request: clamp into `[0, duration]`, seek
    /// both surfaces to the same fraction, recenter the viewport.
    /// A non-finite time (a failed parse upstream) is a no-op; NaN must
    /// never reach the surface cursors.
    pub fn jump_to_time(&mut self, time: f64) {
        if !time.is_finite() {
            return;
        }
        if self.original.state() != SurfaceState::Ready {
            return;
        }
        let duration = self.original.duration();
        if duration <= 0.0 {
            return;
        }

        let clamped = time.clamp(0.0, duration);
        let fraction = clamped / duration;
        self.original.seek_to(fraction);
        self.reconstructed.seek_to(fraction);
        self.center_on(clamped);
    }

    /// Time-update notification from the original surface.
    ///
    /// Drives loop wraparound: once the reported time passes the loop end,
    /// both surfaces seek back to the loop start and resume.
    pub fn on_time_update(&mut self, time: f64) {
        let Some(region) = self.loop_region else {
            return;
        };
        if time <= region.end {
            return;
        }
        let duration = self.original.duration();
        if duration <= 0.0 {
            return;
        }

        debug!(
            "loop wraparound: {:.2}s past end {:.2}s, back to {:.2}s",
            time, region.end, region.start
        );
        let fraction = region.start / duration;
        self.original.seek_to(fraction);
        self.original.play();
        self.reconstructed.seek_to(fraction);
        self.reconstructed.play();
        self.playing = true;
    }

    /// Observed playing flag (reset by [`TransportCoordinator::stop`]).
    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

// ============================================================================
// Tests
// ============================================================================
