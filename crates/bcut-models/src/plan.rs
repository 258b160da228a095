//! The serialisable plan document.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::params::Params;
use crate::strategy::Strategy;

/// Current plan document schema version. Readers reject other versions.
pub const PLAN_SCHEMA_VERSION: u32 = 1;

/// Which window produced a cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum WindowUsed {
    /// Selected inside `[p + min, p + max]`.
    #[default]
    Normal,
    /// Selected after the one-shot grace expansion.
    Grace,
    /// Selected off-window because strict mode was off.
    Fallback,
}

/// A chosen image-change instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Cut {
    /// Cut time in seconds; always a prepared beat time.
    pub time_s: f64,
    /// Index of the source beat in the prepared beat set.
    pub beat_index: usize,
    /// Which window admitted this cut.
    pub window_used: WindowUsed,
    /// Strategy that actually selected the beat (after degradation).
    pub strategy_used: Strategy,
}

/// Frozen description of a render: prepared beats, selected cuts, quantized
/// durations, bound images and the full parameter snapshot.
///
/// Re-rendering from a plan must produce byte-identical encoder instructions
/// for the same image set, seed and render parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Plan {
    /// Document schema version.
    pub schema_version: u32,
    /// Parameters that produced this plan.
    pub params: Params,
    /// Audio end time in seconds.
    pub audio_end_s: f64,
    /// Prepared beat times (post-phase).
    pub beats: Vec<f64>,
    /// Selected cuts, strictly increasing.
    pub cuts: Vec<Cut>,
    /// Post-quantization segment durations; one per bound image.
    pub durations_s: Vec<f64>,
    /// Bound images, one per segment, absolute paths.
    pub images: Vec<PathBuf>,
    /// Output frame rate.
    pub fps: u32,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
}

impl Plan {
    /// Structural invariants: monotone cuts, every cut on a prepared beat,
    /// durations aligned with images.
    pub fn is_well_formed(&self) -> bool {
        let cuts_monotone = self
            .cuts
            .windows(2)
            .all(|w| w[1].time_s > w[0].time_s);
        let cuts_on_beats = self.cuts.iter().all(|c| {
            self.beats
                .get(c.beat_index)
                .is_some_and(|b| (b - c.time_s).abs() < 1e-9)
        });
        let durations_positive = self.durations_s.iter().all(|d| *d > 0.0);
        cuts_monotone
            && cuts_on_beats
            && durations_positive
            && self.durations_s.len() == self.images.len()
    }

    /// Total duration of all segments.
    pub fn total_duration_s(&self) -> f64 {
        self.durations_s.iter().sum()
    }

    /// Number of segment boundaries (one fewer than segments).
    pub fn boundary_count(&self) -> usize {
        self.durations_s.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> Plan {
        Plan {
            schema_version: PLAN_SCHEMA_VERSION,
            params: Params::default(),
            audio_end_s: 20.0,
            beats: vec![2.0, 7.5, 15.0],
            cuts: vec![
                Cut {
                    time_s: 7.5,
                    beat_index: 1,
                    window_used: WindowUsed::Normal,
                    strategy_used: Strategy::Nearest,
                },
                Cut {
                    time_s: 15.0,
                    beat_index: 2,
                    window_used: WindowUsed::Normal,
                    strategy_used: Strategy::Nearest,
                },
            ],
            durations_s: vec![7.5, 7.5, 5.0],
            images: vec![
                PathBuf::from("/img/a.png"),
                PathBuf::from("/img/b.png"),
                PathBuf::from("/img/c.png"),
            ],
            fps: 25,
            width: 1920,
            height: 1080,
        }
    }

    #[test]
    fn test_well_formed_plan() {
        assert!(sample_plan().is_well_formed());
    }

    #[test]
    fn test_detects_cut_off_beat() {
        let mut plan = sample_plan();
        plan.cuts[0].time_s = 7.6;
        assert!(!plan.is_well_formed());
    }

    #[test]
    fn test_detects_duration_image_mismatch() {
        let mut plan = sample_plan();
        plan.images.pop();
        assert!(!plan.is_well_formed());
    }

    #[test]
    fn test_json_roundtrip() {
        let plan = sample_plan();
        let json = serde_json::to_string_pretty(&plan).unwrap();
        let back: Plan = serde_json::from_str(&json).unwrap();
        assert_eq!(plan, back);
    }

    #[test]
    fn test_reader_ignores_unknown_fields() {
        let mut value = serde_json::to_value(sample_plan()).unwrap();
        value["future_field"] = serde_json::json!({"ignored": true});
        let back: Plan = serde_json::from_value(value).unwrap();
        assert_eq!(back.schema_version, PLAN_SCHEMA_VERSION);
    }

    #[test]
    fn test_boundary_count() {
        assert_eq!(sample_plan().boundary_count(), 2);
    }
}
