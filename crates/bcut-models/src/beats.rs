//! Beat sets and beat preparation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Minimum spacing between two prepared beats in seconds. Runs of raw beats
/// closer than this collapse to the first beat of the run.
pub const MIN_BEAT_GAP: f64 = 0.12;

/// An ordered set of beat instants with optional per-beat annotations.
///
/// Times are seconds from the start of the audio, strictly increasing after
/// preparation. The auxiliary arrays, when present, are index-aligned with
/// `times`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BeatSet {
    /// Beat times in seconds, strictly ascending.
    pub times: Vec<f64>,
    /// Spectral-flux onset strength per beat, if the detector provided it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onset_strength: Option<Vec<f64>>,
    /// Downbeat flags per beat, if the detector provided them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_downbeat: Option<Vec<bool>>,
}

impl BeatSet {
    /// Prepare raw detector output for planning.
    ///
    /// Applies the phase shift, drops beats that land before zero, sorts
    /// ascending and collapses any run of beats within [`MIN_BEAT_GAP`] to
    /// the first beat of the run. Auxiliary arrays are reindexed alongside;
    /// the surviving beat keeps its own annotation values.
    ///
    /// An empty result is legal and is surfaced to callers as-is.
    pub fn prepare(
        raw_times: &[f64],
        onset_strength: Option<&[f64]>,
        is_downbeat: Option<&[bool]>,
        phase_s: f64,
    ) -> Self {
        let mut entries: Vec<(f64, Option<f64>, Option<bool>)> = raw_times
            .iter()
            .enumerate()
            .map(|(i, &t)| {
                (
                    t + phase_s,
                    onset_strength.and_then(|s| s.get(i).copied()),
                    is_downbeat.and_then(|d| d.get(i).copied()),
                )
            })
            .filter(|(t, _, _)| *t >= 0.0)
            .collect();
        entries.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut times = Vec::with_capacity(entries.len());
        let mut strengths = Vec::with_capacity(entries.len());
        let mut downbeats = Vec::with_capacity(entries.len());
        let mut last: Option<f64> = None;
        for (t, s, d) in entries {
            if let Some(prev) = last {
                if t - prev < MIN_BEAT_GAP {
                    continue;
                }
            }
            times.push(t);
            strengths.push(s);
            downbeats.push(d);
            last = Some(t);
        }

        let onset_strength = if strengths.iter().all(|s| s.is_some()) && !times.is_empty() {
            onset_strength.map(|_| strengths.into_iter().flatten().collect())
        } else {
            None
        };
        let is_downbeat = if downbeats.iter().all(|d| d.is_some()) && !times.is_empty() {
            is_downbeat.map(|_| downbeats.into_iter().flatten().collect())
        } else {
            None
        };

        Self {
            times,
            onset_strength,
            is_downbeat,
        }
    }

    /// Number of beats in the set.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// True when no beats survived preparation.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Time of the last beat, if any.
    pub fn last_time(&self) -> Option<f64> {
        self.times.last().copied()
    }

    /// Onset strength of beat `index`, when strengths are available.
    pub fn strength_at(&self, index: usize) -> Option<f64> {
        self.onset_strength
            .as_ref()
            .and_then(|s| s.get(index).copied())
    }

    /// Whether beat `index` is flagged as a downbeat.
    pub fn downbeat_at(&self, index: usize) -> bool {
        self.is_downbeat
            .as_ref()
            .and_then(|d| d.get(index).copied())
            .unwrap_or(false)
    }

    /// Check structural invariants: strict monotonicity, minimum gap and
    /// aligned auxiliary arrays.
    pub fn is_well_formed(&self) -> bool {
        let monotonic = self
            .times
            .windows(2)
            .all(|w| w[1] - w[0] >= MIN_BEAT_GAP && w[0] >= 0.0);
        let strengths_aligned = self
            .onset_strength
            .as_ref()
            .map_or(true, |s| s.len() == self.times.len());
        let downbeats_aligned = self
            .is_downbeat
            .as_ref()
            .map_or(true, |d| d.len() == self.times.len());
        monotonic && strengths_aligned && downbeats_aligned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_sorts_and_dedupes() {
        let set = BeatSet::prepare(&[1.0, 0.5, 0.55, 2.0], None, None, 0.0);
        assert_eq!(set.times, vec![0.5, 1.0, 2.0]);
        assert!(set.is_well_formed());
    }

    #[test]
    fn test_prepare_phase_drops_negatives() {
        let set = BeatSet::prepare(&[0.01, 0.5, 1.0], None, None, -0.03);
        assert_eq!(set.len(), 2);
        assert!((set.times[0] - 0.47).abs() < 1e-9);
    }

    #[test]
    fn test_prepare_keeps_first_of_run() {
        // 1.0, 1.05 and 1.11 are one run; only 1.0 survives.
        let set = BeatSet::prepare(&[1.0, 1.05, 1.11, 1.30], None, None, 0.0);
        assert_eq!(set.times, vec![1.0, 1.30]);
    }

    #[test]
    fn test_prepare_reindexes_auxiliary_arrays() {
        let strengths = [0.1, 0.9, 0.4, 0.7];
        let downbeats = [true, false, false, true];
        let set = BeatSet::prepare(
            &[1.0, 1.05, 2.0, 3.0],
            Some(&strengths),
            Some(&downbeats),
            0.0,
        );
        assert_eq!(set.times, vec![1.0, 2.0, 3.0]);
        assert_eq!(set.onset_strength.as_deref(), Some(&[0.1, 0.4, 0.7][..]));
        assert_eq!(set.is_downbeat.as_deref(), Some(&[true, false, true][..]));
        assert!(set.is_well_formed());
    }

    #[test]
    fn test_prepare_empty_is_permitted() {
        let set = BeatSet::prepare(&[0.1], None, None, -0.5);
        assert!(set.is_empty());
        assert!(set.is_well_formed());
    }

    #[test]
    fn test_downbeat_at_defaults_to_false() {
        let set = BeatSet::prepare(&[1.0, 2.0], None, None, 0.0);
        assert!(!set.downbeat_at(0));
        assert!(set.strength_at(0).is_none());
    }
}
