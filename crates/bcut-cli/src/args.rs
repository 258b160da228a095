//! Command-line surface.
//!
//! Every field a preset may fill stays an `Option` so the merge can tell a
//! user-supplied value from an untouched default; see [`crate::presets`].

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use bcut_models::{Alignment, CounterPosition, MarkerStyle, MaskScope, Quantize, Strategy, Transition};

use crate::presets::Preset;

#[derive(Parser, Debug, Clone)]
#[command(name = "beatcut", version, about = "Beat-aligned slideshow renderer")]
pub struct Cli {
    /// Audio file driving the beat grid.
    pub audio_file: PathBuf,

    /// Directory of images to bind to segments.
    pub images_dir: PathBuf,

    // --- planning ---
    /// Inter-cut period bounds in seconds.
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"])]
    pub period: Option<Vec<f64>>,

    /// Preferred inter-cut period in seconds.
    #[arg(long)]
    pub target: Option<f64>,

    /// One-shot window expansion when strict selection fails.
    #[arg(long)]
    pub grace: Option<f64>,

    /// Minimum spacing between cuts (auto-raised to 2*xfade + 0.05).
    #[arg(long = "min-gap")]
    pub min_gap: Option<f64>,

    /// Beat phase compensation in seconds.
    #[arg(long)]
    pub phase: Option<f64>,

    /// Candidate selection strategy.
    #[arg(long)]
    pub strategy: Option<Strategy>,

    /// Fail instead of cutting off-beat when a window stays empty.
    #[arg(long)]
    pub strict: bool,

    /// Use every detected beat as a boundary.
    #[arg(long = "all-beats")]
    pub all_beats: bool,

    /// Audio length override in seconds (skips probing).
    #[arg(long = "audio-end")]
    pub audio_end: Option<f64>,

    /// Limit the plan to the first N seconds of audio.
    #[arg(long = "max-seconds")]
    pub max_seconds: Option<f64>,

    /// Read raw beats from a text file instead of running the detector.
    #[arg(long = "beats-file")]
    pub beats_file: Option<PathBuf>,

    // --- rendering ---
    /// Render hard cuts only (no transitions).
    #[arg(long)]
    pub hardcuts: bool,

    /// xfade transition name.
    #[arg(long)]
    pub transition: Option<Transition>,

    /// Transition duration in seconds.
    #[arg(long)]
    pub xfade: Option<f64>,

    /// Minimum effective xfade; shorter boundaries hard-cut.
    #[arg(long = "xfade-min")]
    pub xfade_min: Option<f64>,

    /// Align the transition end or midpoint to the beat.
    #[arg(long)]
    pub align: Option<Alignment>,

    /// Quantize segment durations to the frame grid.
    #[arg(long = "frame-quantize")]
    pub frame_quantize: Option<Quantize>,

    /// Marker style for boundaries that fall back to hard cuts.
    #[arg(long = "fallback-style", default_value_t = MarkerStyle::None)]
    pub fallback_style: MarkerStyle,

    /// Duration of the per-boundary fallback marker.
    #[arg(long = "fallback-dur", default_value_t = 0.06)]
    pub fallback_dur: f64,

    // --- overlays ---
    /// Draw a tick on every beat.
    #[arg(long = "mark-beats")]
    pub mark_beats: bool,

    /// Saturation/brightness pulse on each beat.
    #[arg(long)]
    pub pulse: bool,

    /// Pulse saturation multiplier.
    #[arg(long = "pulse-sat", default_value_t = 1.25)]
    pub pulse_sat: f64,

    /// Pulse brightness delta (-1..1).
    #[arg(long = "pulse-bright", default_value_t = 0.0)]
    pub pulse_bright: f64,

    /// Pulse duration per beat.
    #[arg(long = "pulse-dur", default_value_t = 0.08)]
    pub pulse_dur: f64,

    /// Gaussian bloom flash on each beat.
    #[arg(long)]
    pub bloom: bool,

    /// Bloom blur sigma.
    #[arg(long = "bloom-sigma", default_value_t = 8.0)]
    pub bloom_sigma: f64,

    /// Bloom duration per beat.
    #[arg(long = "bloom-dur", default_value_t = 0.08)]
    pub bloom_dur: f64,

    /// Show a sticky numeric counter incremented on each beat.
    #[arg(long)]
    pub counter: bool,

    /// Counter font size.
    #[arg(long = "counter-size", default_value_t = 36)]
    pub counter_size: u32,

    /// Counter corner position.
    #[arg(long = "counter-pos", default_value_t = CounterPosition::TopRight)]
    pub counter_pos: CounterPosition,

    /// Keep only every Nth beat for overlays.
    #[arg(long = "beat-mult", default_value_t = 1)]
    pub beat_mult: u32,

    /// Advance/retard overlays by this many seconds.
    #[arg(long = "overlay-phase", default_value_t = 0.0)]
    pub overlay_phase: f64,

    /// Suppress ticks/pulses within N seconds of a transition landing.
    #[arg(long = "overlay-guard", default_value_t = 0.0)]
    pub overlay_guard: f64,

    /// Draw red tick marks at transition landings.
    #[arg(long = "cut-markers")]
    pub cut_markers: bool,

    /// Restrict pulse/bloom to the foreground or background.
    #[arg(long = "mask-scope", default_value_t = MaskScope::None)]
    pub mask_scope: MaskScope,

    // --- images ---
    /// Shuffle images with a seeded permutation.
    #[arg(long)]
    pub shuffle: bool,

    /// Shuffle seed.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Wrap images when there are fewer than segments.
    #[arg(long = "image-loop", action = ArgAction::Set, default_value_t = true)]
    pub image_loop: bool,

    /// Normalise stills into workdir intermediates before encoding.
    #[arg(long)]
    pub preprocess: bool,

    // --- I/O ---
    /// Working directory (default: an ephemeral temp dir).
    #[arg(long)]
    pub workdir: Option<PathBuf>,

    /// Keep the working directory after a successful render.
    #[arg(long = "keep-workdir")]
    pub keep_workdir: bool,

    /// Output video path.
    #[arg(long, default_value = "beat_aligned.mp4")]
    pub out: PathBuf,

    /// Write the plan document to this path.
    #[arg(long = "plan-out")]
    pub plan_out: Option<PathBuf>,

    /// Render from an existing plan document (skips detection/planning).
    #[arg(long = "plan-in")]
    pub plan_in: Option<PathBuf>,

    /// Skip muxing the audio track into the output.
    #[arg(long = "no-audio")]
    pub no_audio: bool,

    /// Encoder timeout in seconds.
    #[arg(long = "encoder-timeout", default_value_t = 600)]
    pub encoder_timeout: u64,

    /// Verbose logging.
    #[arg(long, short)]
    pub verbose: bool,

    /// Output width.
    #[arg(long, default_value_t = 1920)]
    pub width: u32,

    /// Output height.
    #[arg(long, default_value_t = 1080)]
    pub height: u32,

    /// Output frame rate.
    #[arg(long, default_value_t = 25)]
    pub fps: u32,

    /// Preset of sensible defaults; explicit flags always win.
    #[arg(long)]
    pub preset: Option<Preset>,
}
