//! Playback surface capability interface
//!
//! The coordinator drives two independently instantiated rendering
//! surfaces through one uniform interface plus a role flag, instead of two
//! differently-capable concrete objects. A surface that has not reached
//! `Ready` treats every transport operation as a harmless no-op.

/// Load lifecycle of a playback surface. `Ready` is re-entered (via
/// `Loading`) whenever the source URL changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceState {
    #[default]
    Unloaded,
    Loading,
    Ready,
}

/// Whether a surface originates edits or only mirrors transport commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceRole {
    /// Supports click-to-seek, drag-to-loop-region, zoom.
    Interactive,
    /// Mirrors transport commands, never originates region edits.
    Passive,
}

/// Capability interface shared by both rendering surfaces.
pub trait PlaybackSurface {
    fn state(&self) -> SurfaceState;

    /// Adopt a new source. Re-enters `Ready` through `Loading`.
    fn load(&mut self, source_url: &str, duration_secs: f64);

    /// Seek to a position expressed as a fraction of the duration.
    fn seek_to(&mut self, fraction: f64);

    fn play(&mut self);

    fn pause(&mut self);

    /// Halt and rewind to the start.
    fn stop(&mut self);

    /// Apply a zoom factor in pixels per second.
    fn set_zoom(&mut self, px_per_sec: f64);

    fn current_time(&self) -> f64;

    fn duration(&self) -> f64;

    fn is_playing(&self) -> bool;
}

/// Clock-less in-memory surface.
///
/// Holds the same observable state a rendering engine would (cursor,
/// playing flag, zoom) without an audio device; time advances only through
/// [`OfflineSurface::advance`], which mimics the engine's time-update
/// notifications. Used by the CLI and the test suite.
#[derive(Debug, Default)]
pub struct OfflineSurface {
    state: SurfaceState,
    source_url: Option<String>,
    duration: f64,
    time: f64,
    playing: bool,
    zoom_px_per_sec: f64,
}

impl OfflineSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the playback clock by `dt` seconds if playing, clamping at
    /// the end of the source. Returns the new cursor time.
    pub fn advance(&mut self, dt: f64) -> f64 {
        if self.playing && self.state == SurfaceState::Ready {
            self.time = (self.time + dt).min(self.duration);
            if self.time >= self.duration {
                self.playing = false;
            }
        }
        self.time
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    pub fn zoom_px_per_sec(&self) -> f64 {
        self.zoom_px_per_sec
    }
}

impl PlaybackSurface for OfflineSurface {
    fn state(&self) -> SurfaceState {
        self.state
    }

    fn load(&mut self, source_url: &str, duration_secs: f64) {
        self.state = SurfaceState::Loading;
        self.source_url = Some(source_url.to_string());
        self.duration = duration_secs.max(0.0);
        self.time = 0.0;
        self.playing = false;
        // No asynchronous decode to wait for in the offline surface
        self.state = SurfaceState::Ready;
    }

    fn seek_to(&mut self, fraction: f64) {
        if self.state != SurfaceState::Ready {
            return;
        }
        self.time = (fraction.clamp(0.0, 1.0)) * self.duration;
    }

    fn play(&mut self) {
        if self.state != SurfaceState::Ready {
            return;
        }
        self.playing = true;
    }

    fn pause(&mut self) {
        if self.state != SurfaceState::Ready {
            return;
        }
        self.playing = false;
    }

    fn stop(&mut self) {
        if self.state != SurfaceState::Ready {
            return;
        }
        self.playing = false;
        self.time = 0.0;
    }

    fn set_zoom(&mut self, px_per_sec: f64) {
        if self.state != SurfaceState::Ready {
            return;
        }
        self.zoom_px_per_sec = px_per_sec;
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operations_before_ready_are_noops() {
        let mut surface = OfflineSurface::new();
        assert_eq!(surface.state(), SurfaceState::Unloaded);

        surface.play();
        surface.seek_to(0.5);
        surface.set_zoom(120.0);
        surface.stop();

        assert!(!surface.is_playing());
        assert_eq!(surface.current_time(), 0.0);
        assert_eq!(surface.zoom_px_per_sec(), 0.0);
    }

    #[test]
    fn test_load_reenters_ready_and_resets_cursor() {
        let mut surface = OfflineSurface::new();
        surface.load("mem://a", 10.0);
        assert_eq!(surface.state(), SurfaceState::Ready);

        surface.seek_to(0.5);
        surface.play();
        assert_eq!(surface.current_time(), 5.0);

        surface.load("mem://b", 20.0);
        assert_eq!(surface.state(), SurfaceState::Ready);
        assert_eq!(surface.current_time(), 0.0);
        assert!(!surface.is_playing());
        assert_eq!(surface.duration(), 20.0);
    }

    #[test]
    fn test_seek_fraction_clamped() {
        let mut surface = OfflineSurface::new();
        surface.load("mem://a", 10.0);
        surface.seek_to(1.5);
        assert_eq!(surface.current_time(), 10.0);
        surface.seek_to(-0.5);
        assert_eq!(surface.current_time(), 0.0);
    }

    #[test]
    fn test_advance_only_while_playing() {
        let mut surface = OfflineSurface::new();
        surface.load("mem://a", 2.0);

        surface.advance(1.0);
        assert_eq!(surface.current_time(), 0.0);

        surface.play();
        surface.advance(1.5);
        assert!((surface.current_time() - 1.5).abs() < 1e-9);

        // Clamp at end of source and stop
        surface.advance(5.0);
        assert_eq!(surface.current_time(), 2.0);
        assert!(!surface.is_playing());
    }
}
