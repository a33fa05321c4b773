//! Reconstruction Engine
//!
//! Applies a parameterized enhancement transform to a PCM buffer. The
//! filtered ("periodic") path is a resonant band-pass driven by
//! `phase_gain` plus a confidence gain driven by `blend`, rendered offline
//! and mixed per sample against the dry signal as a convex combination.
//! The output always has the same channel count, frame count, and sample
//! rate as the input; reconstruction never resamples or retimes.

use std::f64::consts::PI;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::engine::AudioBuffer;
use crate::error::Result;

/// Parameters for one reconstruction run.
///
/// Pure configuration value, freely copyable. `phase_gain` in `[0, 2]`
/// drives the band-pass center and resonance; `blend` in `[0, 1]` is the
/// stochastic-to-periodic trade-off: 0 returns the original signal
/// unchanged, 1 returns the fully filtered signal. Out-of-range values are
/// not rejected; the filter stage saturates them internally.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReconstructionParams {
    pub phase_gain: f32,
    pub blend: f32,
}

impl Default for ReconstructionParams {
    fn default() -> Self {
        Self {
            phase_gain: 0.8,
            blend: 0.5,
        }
    }
}

// ============================================================================
// Band-pass biquad (Audio EQ Cookbook)
// ============================================================================

/// Biquad filter coefficients, normalized by a0.
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Debug, Clone, Copy)]
struct BiquadCoeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl BiquadCoeffs {
    /// Constant-0dB-peak band-pass coefficients.
    ///
    /// Frequency and Q are clamped to stable ranges rather than rejected;
    /// this is the saturation behavior documented on the params.
    fn band_pass(sample_rate: f64, frequency: f64, q: f64) -> Self {
        let freq = frequency.clamp(20.0, sample_rate / 2.0 - 1.0);
        let q = q.clamp(0.1, 10.0);

        let w0 = 2.0 * PI * freq / sample_rate;
        let cos_w0 = w0.cos();
        let sin_w0 = w0.sin();
        let alpha = sin_w0 / (2.0 * q);

        let a0 = 1.0 + alpha;
        BiquadCoeffs {
            b0: alpha / a0,
            b1: 0.0,
            b2: -alpha / a0,
            a1: (-2.0 * cos_w0) / a0,
            a2: (1.0 - alpha) / a0,
        }
    }
}

/// Direct Form I filter state for one channel.
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadState {
    #[inline]
    fn process(&mut self, coeffs: &BiquadCoeffs, x: f64) -> f64 {
        let y = coeffs.b0 * x + coeffs.b1 * self.x1 + coeffs.b2 * self.x2
            - coeffs.a1 * self.y1
            - coeffs.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Processing assets loaded once per engine instance.
///
/// Placeholder for enhancement model weights; a real integration would load
/// the neural filter assets here. Initialization failure is the only source
/// of `EngineUnavailable` — processing itself never fails on signal content.
#[derive(Debug)]
struct ProcessingAssets;

impl ProcessingAssets {
    fn load() -> Result<Self> {
        Ok(ProcessingAssets)
    }
}

/// The reconstruction engine. Deterministic for fixed inputs.
#[derive(Debug, Default)]
pub struct Reconstructor {
    assets: Option<ProcessingAssets>,
}

impl Reconstructor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lazy one-time initialization of processing assets.
    fn ensure_assets(&mut self) -> Result<()> {
        if self.assets.is_none() {
            self.assets = Some(ProcessingAssets::load()?);
        }
        Ok(())
    }

    /// Run the enhancement transform.
    ///
    /// # Errors
    /// `SonarisError::EngineUnavailable` only if processing assets cannot
    /// be initialized, never due to signal content.
    pub fn process(
        &mut self,
        input: &AudioBuffer,
        params: &ReconstructionParams,
    ) -> Result<AudioBuffer> {
        // Zero-length input: zero-length result, filter stage not invoked.
        if input.is_empty() {
            return Ok(AudioBuffer::new(
                input.channels(),
                0,
                input.sample_rate,
            ));
        }

        self.ensure_assets()?;

        let frequency = 1500.0 + params.phase_gain as f64 * 800.0;
        let q = 1.0 + params.phase_gain as f64 * 2.0;
        let gain = 0.6 + params.blend as f64 * 0.8;
        debug!(
            "reconstruct: center={:.0} Hz, q={:.2}, gain={:.2}, blend={:.2}",
            frequency, q, gain, params.blend
        );

        let wet = render_filtered(input, frequency, q, gain);

        // Convex dry/wet mix per channel. The dry index clamps to the last
        // dry channel if the dry source has fewer channels than the wet path.
        let blend = params.blend;
        let mut output = AudioBuffer::new(wet.channels(), wet.len(), wet.sample_rate);
        let last_dry = input.channels().saturating_sub(1);
        for ch in 0..wet.channels() {
            let dry = input.channel(ch.min(last_dry));
            let wet_ch = wet.channel(ch);
            let out = output.channel_mut(ch);
            for i in 0..wet_ch.len() {
                out[i] = blend * wet_ch[i] + (1.0 - blend) * dry[i];
            }
        }

        Ok(output)
    }
}

/// Offline render of the filtered path: band-pass then static gain, into an
/// intermediate buffer of the same shape as the input.
fn render_filtered(input: &AudioBuffer, frequency: f64, q: f64, gain: f64) -> AudioBuffer {
    let coeffs = BiquadCoeffs::band_pass(input.sample_rate as f64, frequency, q);

    let mut rendered = AudioBuffer::new(input.channels(), input.len(), input.sample_rate);
    for ch in 0..input.channels() {
        let mut state = BiquadState::default();
        let src = input.channel(ch);
        let dst = rendered.channel_mut(ch);
        for (i, &x) in src.iter().enumerate() {
            dst[i] = (state.process(&coeffs, x as f64) * gain) as f32;
        }
    }
    rendered
}

// ============================================================================
// Tests
// ============================================================================
