//! Preset layering.
//!
//! A preset is a pure function of the parsed arguments: it only fills
//! values the user left unset, explicit flags always win, and after the
//! merge the minimum cut gap is raised to what the chosen crossfade needs.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use bcut_models::params::{
    min_gap_for_xfade, DEFAULT_GRACE, DEFAULT_MIN_GAP, DEFAULT_PERIOD_MAX, DEFAULT_PERIOD_MIN,
    DEFAULT_PHASE, DEFAULT_TARGET, DEFAULT_XFADE, DEFAULT_XFADE_MIN,
};
use bcut_models::{
    Alignment, ImageParams, OverlayParams, Params, PeriodWindow, PlanParams, Quantize, RenderMode,
    RenderParams, Strategy, Transition,
};

use crate::args::Cli;

/// Named bundles of sensible defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    MusicVideo,
    Hypercut,
    SlowCinematic,
    Documentary,
    EdmStrobe,
}

/// The values a preset may contribute. `None` leaves the parser default.
struct PresetSpec {
    align: Alignment,
    xfade: f64,
    phase: f64,
    period: (f64, f64),
    target: f64,
    quantize: Quantize,
    all_beats: bool,
}

impl Preset {
    fn spec(&self) -> PresetSpec {
        match self {
            Preset::MusicVideo => PresetSpec {
                align: Alignment::Midpoint,
                xfade: 0.6,
                phase: -0.03,
                period: (5.0, 10.0),
                target: 7.5,
                quantize: Quantize::Nearest,
                all_beats: false,
            },
            // Aggressive, near-every-beat style
            Preset::Hypercut => PresetSpec {
                align: Alignment::End,
                xfade: 0.25,
                phase: -0.01,
                period: (0.7, 2.0),
                target: 1.2,
                quantize: Quantize::Floor,
                all_beats: true,
            },
            // Long holds with soft transitions
            Preset::SlowCinematic => PresetSpec {
                align: Alignment::Midpoint,
                xfade: 1.2,
                phase: -0.01,
                period: (8.0, 16.0),
                target: 12.0,
                quantize: Quantize::Nearest,
                all_beats: false,
            },
            // Moderate holds, subtle fades, cuts kept slightly early
            Preset::Documentary => PresetSpec {
                align: Alignment::End,
                xfade: 0.3,
                phase: 0.0,
                period: (6.0, 12.0),
                target: 9.0,
                quantize: Quantize::Floor,
                all_beats: false,
            },
            // Fast, beat-driven with short fades or hard cuts
            Preset::EdmStrobe => PresetSpec {
                align: Alignment::Midpoint,
                xfade: 0.3,
                phase: -0.02,
                period: (0.5, 1.2),
                target: 0.75,
                quantize: Quantize::Nearest,
                all_beats: true,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::MusicVideo => "music-video",
            Preset::Hypercut => "hypercut",
            Preset::SlowCinematic => "slow-cinematic",
            Preset::Documentary => "documentary",
            Preset::EdmStrobe => "edm-strobe",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Preset {
    type Err = PresetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "music-video" => Ok(Preset::MusicVideo),
            "hypercut" => Ok(Preset::Hypercut),
            "slow-cinematic" => Ok(Preset::SlowCinematic),
            "documentary" => Ok(Preset::Documentary),
            "edm-strobe" => Ok(Preset::EdmStrobe),
            _ => Err(PresetParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown preset: {0}")]
pub struct PresetParseError(String);

/// Resolve the parsed arguments into one effective parameter set.
///
/// Field resolution order: explicit flag, then preset value, then the
/// built-in default. The minimum cut gap is finally raised to
/// `2*xfade + 0.05` so planned segments can always host their crossfades.
pub fn effective_params(cli: &Cli) -> Params {
    let spec = cli.preset.map(|p| p.spec());

    let pick = |user: Option<f64>, preset: Option<f64>, default: f64| {
        user.or(preset).unwrap_or(default)
    };

    let (period_min, period_max) = match (&cli.period, &spec) {
        (Some(p), _) if p.len() == 2 => (p[0], p[1]),
        (None, Some(s)) => s.period,
        _ => (DEFAULT_PERIOD_MIN, DEFAULT_PERIOD_MAX),
    };
    let target = pick(cli.target, spec.as_ref().map(|s| s.target), DEFAULT_TARGET);
    let grace = cli.grace.unwrap_or(DEFAULT_GRACE);
    let phase = pick(cli.phase, spec.as_ref().map(|s| s.phase), DEFAULT_PHASE);
    let xfade = pick(cli.xfade, spec.as_ref().map(|s| s.xfade), DEFAULT_XFADE);
    let align = cli
        .align
        .or(spec.as_ref().map(|s| s.align))
        .unwrap_or_default();
    let quantize = cli
        .frame_quantize
        .or(spec.as_ref().map(|s| s.quantize))
        .unwrap_or_default();
    let all_beats = cli.all_beats || spec.as_ref().is_some_and(|s| s.all_beats);

    let min_gap = cli
        .min_gap
        .unwrap_or(DEFAULT_MIN_GAP)
        .max(min_gap_for_xfade(xfade));

    let strategy = if all_beats {
        Strategy::AllBeats
    } else {
        cli.strategy.unwrap_or_default()
    };

    Params {
        plan: PlanParams {
            window: PeriodWindow {
                min_s: period_min,
                max_s: period_max,
                target_s: target,
                grace_s: grace,
            },
            strategy,
            strict: cli.strict,
            min_cut_gap_s: min_gap,
            phase_s: phase,
            audio_end_s: cli.audio_end,
            max_seconds: cli.max_seconds,
        },
        render: RenderParams {
            mode: if cli.hardcuts {
                RenderMode::HardCut
            } else {
                RenderMode::Crossfade
            },
            transition: cli.transition.unwrap_or(Transition::Fade),
            xfade_s: xfade,
            xfade_min_s: cli.xfade_min.unwrap_or(DEFAULT_XFADE_MIN),
            align,
            quantize,
            fps: cli.fps,
            width: cli.width,
            height: cli.height,
            fallback_marker: cli.fallback_style,
            fallback_marker_s: cli.fallback_dur,
        },
        overlay: OverlayParams {
            beat_ticks: cli.mark_beats,
            cut_markers: cli.cut_markers,
            marker_s: 0.12,
            pulse: cli.pulse,
            pulse_saturation: cli.pulse_sat,
            pulse_brightness: cli.pulse_bright,
            pulse_s: cli.pulse_dur,
            bloom: cli.bloom,
            bloom_sigma: cli.bloom_sigma,
            bloom_s: cli.bloom_dur,
            counter: cli.counter,
            counter_size: cli.counter_size,
            counter_position: cli.counter_pos,
            beat_mult: cli.beat_mult,
            overlay_phase_s: cli.overlay_phase,
            overlay_guard_s: cli.overlay_guard,
            mask_scope: cli.mask_scope,
        },
        images: ImageParams {
            shuffle: cli.shuffle,
            seed: cli.seed,
            loop_images: cli.image_loop,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(extra: &[&str]) -> Cli {
        let mut argv = vec!["beatcut", "song.mp3", "./images"];
        argv.extend_from_slice(extra);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_no_preset_uses_defaults() {
        let params = effective_params(&parse(&[]));
        assert!((params.plan.window.min_s - 5.0).abs() < 1e-9);
        assert!((params.plan.window.target_s - 7.5).abs() < 1e-9);
        assert!((params.render.xfade_s - 0.6).abs() < 1e-9);
        assert_eq!(params.render.align, Alignment::Midpoint);
        // The literal 2.05 floor, not 2 * 0.6 + 0.05.
        assert!((params.plan.min_cut_gap_s - 2.05).abs() < 1e-9);
    }

    #[test]
    fn test_preset_fills_unset_fields() {
        let params = effective_params(&parse(&["--preset", "hypercut"]));
        assert!((params.plan.window.min_s - 0.7).abs() < 1e-9);
        assert!((params.plan.window.max_s - 2.0).abs() < 1e-9);
        assert!((params.render.xfade_s - 0.25).abs() < 1e-9);
        assert_eq!(params.render.align, Alignment::End);
        assert_eq!(params.render.quantize, Quantize::Floor);
        assert_eq!(params.plan.strategy, Strategy::AllBeats);
    }

    #[test]
    fn test_explicit_flags_beat_preset() {
        let params = effective_params(&parse(&[
            "--preset", "hypercut", "--xfade", "0.9", "--align", "midpoint", "--period", "3", "6",
        ]));
        assert!((params.render.xfade_s - 0.9).abs() < 1e-9);
        assert_eq!(params.render.align, Alignment::Midpoint);
        assert!((params.plan.window.min_s - 3.0).abs() < 1e-9);
        assert!((params.plan.window.max_s - 6.0).abs() < 1e-9);
        // Preset still fills what the user left alone.
        assert_eq!(params.render.quantize, Quantize::Floor);
    }

    #[test]
    fn test_min_gap_raised_for_xfade() {
        // User asks for a small gap with a long fade: the gap is raised to
        // 2 * 1.2 + 0.05.
        let params = effective_params(&parse(&["--xfade", "1.2", "--min-gap", "0.5"]));
        assert!((params.plan.min_cut_gap_s - 2.45).abs() < 1e-9);

        // A user gap larger than the floor is respected.
        let params = effective_params(&parse(&["--xfade", "0.2", "--min-gap", "3.0"]));
        assert!((params.plan.min_cut_gap_s - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_beats_flag_switches_strategy() {
        let params = effective_params(&parse(&["--all-beats"]));
        assert_eq!(params.plan.strategy, Strategy::AllBeats);
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!("music-video".parse::<Preset>().unwrap(), Preset::MusicVideo);
        assert_eq!("edm-strobe".parse::<Preset>().unwrap(), Preset::EdmStrobe);
        assert!("vaporwave".parse::<Preset>().is_err());
    }

    #[test]
    fn test_effective_params_validate() {
        for preset in ["music-video", "hypercut", "slow-cinematic", "documentary", "edm-strobe"] {
            let params = effective_params(&parse(&["--preset", preset]));
            params.validate().unwrap_or_else(|e| panic!("{preset}: {e}"));
        }
    }
}
