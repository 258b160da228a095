//! Planning, render, overlay and image-handling parameters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::options::{Alignment, CounterPosition, MaskScope, Quantize, RenderMode};
use crate::strategy::Strategy;
use crate::transition::{MarkerStyle, Transition};
use crate::window::{PeriodWindow, WindowError};

/// Default output frame rate.
pub const DEFAULT_FPS: u32 = 25;
/// Default output width.
pub const DEFAULT_WIDTH: u32 = 1920;
/// Default output height.
pub const DEFAULT_HEIGHT: u32 = 1080;
/// Default beat phase compensation in seconds.
pub const DEFAULT_PHASE: f64 = -0.03;
/// Default crossfade duration in seconds.
pub const DEFAULT_XFADE: f64 = 0.6;
/// Default minimum effective crossfade; shorter boundaries hard-cut.
pub const DEFAULT_XFADE_MIN: f64 = 0.25;
/// Default period window bounds.
pub const DEFAULT_PERIOD_MIN: f64 = 5.0;
pub const DEFAULT_PERIOD_MAX: f64 = 10.0;
/// Default target period.
pub const DEFAULT_TARGET: f64 = 7.5;
/// Default grace expansion.
pub const DEFAULT_GRACE: f64 = 0.5;
/// Default minimum spacing between cuts.
pub const DEFAULT_MIN_GAP: f64 = 2.05;
/// Safety margin added around crossfades when deriving the minimum cut gap.
pub const XFADE_SAFETY_MARGIN: f64 = 0.05;

/// Minimum cut gap implied by a crossfade duration.
pub fn min_gap_for_xfade(xfade_s: f64) -> f64 {
    2.0 * xfade_s + XFADE_SAFETY_MARGIN
}

/// Parameters consumed by the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlanParams {
    /// Admissible inter-cut spacing.
    pub window: PeriodWindow,
    /// Candidate selection strategy.
    pub strategy: Strategy,
    /// Fail (instead of cutting off-beat) when a window stays empty after
    /// the grace expansion.
    pub strict: bool,
    /// Hard lower bound on the spacing of consecutive cuts.
    pub min_cut_gap_s: f64,
    /// Phase shift applied to raw beats before planning.
    pub phase_s: f64,
    /// Override for the probed audio duration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_end_s: Option<f64>,
    /// Clamp the planning horizon to the first N seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_seconds: Option<f64>,
}

impl Default for PlanParams {
    fn default() -> Self {
        Self {
            window: PeriodWindow {
                min_s: DEFAULT_PERIOD_MIN,
                max_s: DEFAULT_PERIOD_MAX,
                target_s: DEFAULT_TARGET,
                grace_s: DEFAULT_GRACE,
            },
            strategy: Strategy::Nearest,
            strict: false,
            min_cut_gap_s: DEFAULT_MIN_GAP,
            phase_s: DEFAULT_PHASE,
            audio_end_s: None,
            max_seconds: None,
        }
    }
}

/// Parameters consumed by the graph builder and encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RenderParams {
    /// Hard cuts or crossfades.
    pub mode: RenderMode,
    /// Transition used for every crossfade boundary.
    pub transition: Transition,
    /// Requested crossfade duration in seconds.
    pub xfade_s: f64,
    /// Boundaries whose effective crossfade would be shorter hard-cut.
    pub xfade_min_s: f64,
    /// Where the transition sits relative to the beat.
    pub align: Alignment,
    /// Frame-grid rounding mode for segment durations.
    pub quantize: Quantize,
    /// Output frame rate.
    pub fps: u32,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Marker style for boundaries that fall back to a hard cut.
    pub fallback_marker: MarkerStyle,
    /// Marker duration in seconds.
    pub fallback_marker_s: f64,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            mode: RenderMode::Crossfade,
            transition: Transition::Fade,
            xfade_s: DEFAULT_XFADE,
            xfade_min_s: DEFAULT_XFADE_MIN,
            align: Alignment::Midpoint,
            quantize: Quantize::Nearest,
            fps: DEFAULT_FPS,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fallback_marker: MarkerStyle::None,
            fallback_marker_s: 0.06,
        }
    }
}

/// Overlay parameters: beat ticks, pulse, bloom and the sticky counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OverlayParams {
    /// Draw a thin vertical bar at beat times.
    pub beat_ticks: bool,
    /// Draw red tick marks at transition landings.
    pub cut_markers: bool,
    /// Tick/marker visible duration in seconds.
    pub marker_s: f64,
    /// Saturation/brightness pulse on each beat.
    pub pulse: bool,
    /// Pulse saturation multiplier (>1 boosts).
    pub pulse_saturation: f64,
    /// Pulse brightness delta (-1..1).
    pub pulse_brightness: f64,
    /// Pulse duration per beat in seconds.
    pub pulse_s: f64,
    /// Gaussian bloom flash on each beat.
    pub bloom: bool,
    /// Bloom blur sigma.
    pub bloom_sigma: f64,
    /// Bloom duration per beat in seconds.
    pub bloom_s: f64,
    /// Sticky numeric counter incremented on each beat.
    pub counter: bool,
    /// Counter font size.
    pub counter_size: u32,
    /// Counter corner.
    pub counter_position: CounterPosition,
    /// Keep only every Nth beat for overlays.
    pub beat_mult: u32,
    /// Advance/retard overlays by this many seconds.
    pub overlay_phase_s: f64,
    /// Suppress ticks/pulses within this distance of a transition landing.
    pub overlay_guard_s: f64,
    /// Restrict pulse/bloom to foreground or background via alpha masks.
    pub mask_scope: MaskScope,
}

impl Default for OverlayParams {
    fn default() -> Self {
        Self {
            beat_ticks: false,
            cut_markers: false,
            marker_s: 0.12,
            pulse: false,
            pulse_saturation: 1.25,
            pulse_brightness: 0.0,
            pulse_s: 0.08,
            bloom: false,
            bloom_sigma: 8.0,
            bloom_s: 0.08,
            counter: false,
            counter_size: 36,
            counter_position: CounterPosition::TopRight,
            beat_mult: 1,
            overlay_phase_s: 0.0,
            overlay_guard_s: 0.0,
            mask_scope: MaskScope::None,
        }
    }
}

/// Image binding parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ImageParams {
    /// Shuffle images with a seeded permutation instead of sorted order.
    pub shuffle: bool,
    /// Seed for the shuffle permutation.
    pub seed: u64,
    /// Wrap around when there are fewer images than segments; otherwise the
    /// tail cuts are dropped.
    pub loop_images: bool,
}

impl Default for ImageParams {
    fn default() -> Self {
        Self {
            shuffle: false,
            seed: 0,
            loop_images: true,
        }
    }
}

/// Full parameter snapshot carried by a plan document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Params {
    pub plan: PlanParams,
    pub render: RenderParams,
    pub overlay: OverlayParams,
    pub images: ImageParams,
}

/// Range violations detected before any work starts.
#[derive(Debug, Error)]
pub enum ParamsError {
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error("crossfade duration must cover at least one frame: {xfade_s}s at {fps} fps")]
    XfadeTooShort { xfade_s: f64, fps: u32 },
    #[error("minimum effective crossfade must be non-negative, got {0}")]
    NegativeXfadeMin(f64),
    #[error("minimum cut gap must be non-negative, got {0}")]
    NegativeMinCutGap(f64),
    #[error("frame rate must be positive")]
    ZeroFps,
    #[error("output dimensions must be positive, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },
    #[error("overlay beat multiplier must be at least 1")]
    ZeroBeatMult,
    #[error("pulse brightness must lie in [-1, 1], got {0}")]
    PulseBrightnessOutOfRange(f64),
    #[error("{name} must be non-negative, got {value}")]
    NegativeDuration { name: &'static str, value: f64 },
}

impl Params {
    /// Validate every range constraint. Called once, before planning.
    pub fn validate(&self) -> Result<(), ParamsError> {
        PeriodWindow::new(
            self.plan.window.min_s,
            self.plan.window.max_s,
            self.plan.window.target_s,
            self.plan.window.grace_s,
        )?;
        if self.plan.min_cut_gap_s < 0.0 {
            return Err(ParamsError::NegativeMinCutGap(self.plan.min_cut_gap_s));
        }
        if self.render.fps == 0 {
            return Err(ParamsError::ZeroFps);
        }
        if self.render.width == 0 || self.render.height == 0 {
            return Err(ParamsError::ZeroDimensions {
                width: self.render.width,
                height: self.render.height,
            });
        }
        if self.render.mode == RenderMode::Crossfade
            && self.render.xfade_s < 1.0 / self.render.fps as f64
        {
            return Err(ParamsError::XfadeTooShort {
                xfade_s: self.render.xfade_s,
                fps: self.render.fps,
            });
        }
        if self.render.xfade_min_s < 0.0 {
            return Err(ParamsError::NegativeXfadeMin(self.render.xfade_min_s));
        }
        if self.overlay.beat_mult == 0 {
            return Err(ParamsError::ZeroBeatMult);
        }
        if !(-1.0..=1.0).contains(&self.overlay.pulse_brightness) {
            return Err(ParamsError::PulseBrightnessOutOfRange(
                self.overlay.pulse_brightness,
            ));
        }
        for (name, value) in [
            ("marker duration", self.overlay.marker_s),
            ("pulse duration", self.overlay.pulse_s),
            ("bloom duration", self.overlay.bloom_s),
            ("overlay guard", self.overlay.overlay_guard_s),
            ("fallback marker duration", self.render.fallback_marker_s),
        ] {
            if value < 0.0 {
                return Err(ParamsError::NegativeDuration { name, value });
            }
        }
        Ok(())
    }
}
