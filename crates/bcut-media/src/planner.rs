//! Window-constrained beat selection.
//!
//! The planner walks the prepared beat set once, choosing a subsequence of
//! beats so that inter-cut intervals land within the period window. Selection
//! is a pure function of its inputs; shuffling never happens here.
//!
//! Per-cut state machine:
//!
//! ```text
//!   seek_window ──C≠∅──► pick(strategy) ──gap ok──► emit_cut
//!        │                         │gap bad
//!        │                         └─► next-best in C ──none──► {strict? expand : off-window nearest}
//!        │
//!        └─C=∅──► {strict? expand_once : off-window nearest}
//!                        │empty after expand
//!                        └─► fail(NoBeatInWindow)
//! ```

use bcut_models::{BeatSet, Cut, PlanParams, Strategy, WindowUsed};
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Select cut times from a prepared beat set.
///
/// `audio_end_s` is the planning horizon; planning stops once the next
/// window would open past it. Cuts are strictly increasing, each one a beat
/// from `beats`, and consecutive cuts are at least `min_cut_gap_s` apart.
pub fn plan_cuts(beats: &BeatSet, params: &PlanParams, audio_end_s: f64) -> MediaResult<Vec<Cut>> {
    if beats.is_empty() {
        return Err(MediaError::NoBeats);
    }
    if params.strategy == Strategy::AllBeats {
        return Ok(all_beats_cuts(beats, params.min_cut_gap_s, audio_end_s));
    }

    let w = &params.window;
    let times = &beats.times;
    let mut cuts: Vec<Cut> = Vec::new();
    let mut p = 0.0;

    while p + w.min_s <= audio_end_s {
        let (w_lo, w_hi) = w.after(p);
        let target = w.target_after(p).clamp(w_lo, w_hi);
        let min_gap = if cuts.is_empty() {
            0.0
        } else {
            params.min_cut_gap_s
        };
        let admissible = |t: f64| t > p && t - p >= min_gap;

        let candidates: Vec<usize> = indices_in(times, w_lo, w_hi)
            .filter(|&i| admissible(times[i]))
            .collect();

        let chosen = if !candidates.is_empty() {
            let (index, strategy_used) = choose(beats, &candidates, target, w.half_span(), params.strategy);
            Some((index, WindowUsed::Normal, strategy_used))
        } else if params.strict {
            // One-shot symmetric expansion. Late candidates are preferred so
            // the grace window never shortens a hold that a later beat could
            // satisfy.
            let expanded: Vec<usize> = indices_in(times, w_lo - w.grace_s, w_hi + w.grace_s)
                .filter(|&i| admissible(times[i]))
                .collect();
            let late: Vec<usize> = expanded
                .iter()
                .copied()
                .filter(|&i| times[i] >= w_lo)
                .collect();
            let pool = if late.is_empty() { expanded } else { late };
            if pool.is_empty() {
                return Err(MediaError::NoBeatInWindow {
                    after_s: p,
                    window_lo: w_lo,
                    window_hi: w_hi,
                    grace_s: w.grace_s,
                });
            }
            let (index, strategy_used) = choose(beats, &pool, target, w.half_span(), params.strategy);
            Some((index, WindowUsed::Grace, strategy_used))
        } else {
            // Off-window fallback: nearest admissible beat anywhere.
            nearest_admissible(times, target, admissible)
                .map(|index| (index, WindowUsed::Fallback, Strategy::Nearest))
        };

        let Some((index, window_used, strategy_used)) = chosen else {
            break;
        };

        let time_s = times[index];
        debug!(
            cut = cuts.len(),
            time_s,
            ?window_used,
            %strategy_used,
            "selected cut"
        );
        cuts.push(Cut {
            time_s,
            beat_index: index,
            window_used,
            strategy_used,
        });
        p = time_s;
    }

    Ok(cuts)
}

/// Every beat becomes a cut, subject only to the minimum gap and horizon.
fn all_beats_cuts(beats: &BeatSet, min_cut_gap_s: f64, audio_end_s: f64) -> Vec<Cut> {
    let mut cuts = Vec::new();
    let mut prev: Option<f64> = None;
    for (i, &t) in beats.times.iter().enumerate() {
        if t > audio_end_s {
            break;
        }
        if let Some(p) = prev {
            if t - p < min_cut_gap_s {
                continue;
            }
        }
        cuts.push(Cut {
            time_s: t,
            beat_index: i,
            window_used: WindowUsed::Normal,
            strategy_used: Strategy::AllBeats,
        });
        prev = Some(t);
    }
    cuts
}

/// Indices of beats with time in `[lo, hi]`.
fn indices_in(times: &[f64], lo: f64, hi: f64) -> impl Iterator<Item = usize> + '_ {
    let start = times.partition_point(|&t| t < lo);
    let end = times.partition_point(|&t| t <= hi);
    start..end
}

/// Nearest beat to `target` among all admissible beats. Ties resolve to the
/// earlier beat.
fn nearest_admissible(
    times: &[f64],
    target: f64,
    admissible: impl Fn(f64) -> bool,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &t) in times.iter().enumerate() {
        if !admissible(t) {
            continue;
        }
        let dist = (t - target).abs();
        match best {
            Some((_, d)) if dist >= d => {}
            _ => best = Some((i, dist)),
        }
    }
    best.map(|(i, _)| i)
}

/// Pick one candidate per the strategy. Returns the winning index and the
/// strategy that actually made the choice after degradation.
///
/// Tie-breaks everywhere: smallest `|t - target|`, then the earlier beat.
fn choose(
    beats: &BeatSet,
    candidates: &[usize],
    target: f64,
    half_span: f64,
    strategy: Strategy,
) -> (usize, Strategy) {
    match strategy {
        Strategy::Nearest | Strategy::AllBeats => (nearest_of(beats, candidates, target), Strategy::Nearest),
        Strategy::Energy => match strongest_of(beats, candidates, target) {
            Some(i) => (i, Strategy::Energy),
            None => (nearest_of(beats, candidates, target), Strategy::Nearest),
        },
        Strategy::Downbeat => match downbeat_of(beats, candidates, target, half_span) {
            Some(i) => (i, Strategy::Downbeat),
            None => (nearest_of(beats, candidates, target), Strategy::Nearest),
        },
        Strategy::Hybrid => {
            if let Some(i) = downbeat_of(beats, candidates, target, half_span) {
                (i, Strategy::Downbeat)
            } else if let Some(i) = strongest_of(beats, candidates, target) {
                (i, Strategy::Energy)
            } else {
                (nearest_of(beats, candidates, target), Strategy::Nearest)
            }
        }
    }
}

fn nearest_of(beats: &BeatSet, candidates: &[usize], target: f64) -> usize {
    let mut best = candidates[0];
    let mut best_dist = (beats.times[best] - target).abs();
    for &i in &candidates[1..] {
        let dist = (beats.times[i] - target).abs();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}

/// Strongest-onset candidate; `None` when strengths are unavailable.
fn strongest_of(beats: &BeatSet, candidates: &[usize], target: f64) -> Option<usize> {
    beats.onset_strength.as_ref()?;
    let mut best = candidates[0];
    for &i in &candidates[1..] {
        let s = beats.strength_at(i).unwrap_or(0.0);
        let best_s = beats.strength_at(best).unwrap_or(0.0);
        if s > best_s {
            best = i;
        } else if s == best_s {
            let closer = (beats.times[i] - target).abs() < (beats.times[best] - target).abs();
            if closer {
                best = i;
            }
        }
    }
    Some(best)
}

/// Downbeat within `half_span` of the target; `None` when there is none.
fn downbeat_of(beats: &BeatSet, candidates: &[usize], target: f64, half_span: f64) -> Option<usize> {
    let qualifying: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|&i| beats.downbeat_at(i) && (beats.times[i] - target).abs() <= half_span)
        .collect();
    if qualifying.is_empty() {
        None
    } else {
        Some(nearest_of(beats, &qualifying, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bcut_models::PeriodWindow;

    fn params(window: PeriodWindow, strategy: Strategy, strict: bool, min_gap: f64) -> PlanParams {
        PlanParams {
            window,
            strategy,
            strict,
            min_cut_gap_s: min_gap,
            phase_s: 0.0,
            audio_end_s: None,
            max_seconds: None,
        }
    }

    fn window(min: f64, max: f64, target: f64, grace: f64) -> PeriodWindow {
        PeriodWindow::new(min, max, target, grace).unwrap()
    }

    fn beat_grid(step: f64, count: usize) -> BeatSet {
        let times: Vec<f64> = (1..=count).map(|k| step * k as f64).collect();
        BeatSet {
            times,
            onset_strength: None,
            is_downbeat: None,
        }
    }

    #[test]
    fn test_uniform_grid_120bpm() {
        // Beats every 0.5s for 120s of audio; 7.5s target lands on the grid.
        let beats = beat_grid(0.5, 240);
        let p = params(window(5.0, 10.0, 7.5, 0.5), Strategy::Nearest, false, 0.12);
        let cuts = plan_cuts(&beats, &p, 120.0).unwrap();
        assert_eq!(cuts.len(), 16);
        for (i, c) in cuts.iter().enumerate() {
            assert!((c.time_s - 7.5 * (i as f64 + 1.0)).abs() < 1e-9);
            assert_eq!(c.window_used, WindowUsed::Normal);
        }
        let deltas_ok = cuts
            .windows(2)
            .all(|w| (7.0..=8.0).contains(&(w[1].time_s - w[0].time_s)));
        assert!(deltas_ok);
    }

    #[test]
    fn test_sparse_gap_strict_fails() {
        let beats = BeatSet::prepare(&[1.0, 2.0, 3.0, 4.0, 15.0, 16.0, 17.0], None, None, 0.0);
        let p = params(window(5.0, 10.0, 7.0, 0.25), Strategy::Nearest, true, 0.0);
        let err = plan_cuts(&beats, &p, 60.0).unwrap_err();
        assert!(matches!(err, MediaError::NoBeatInWindow { .. }));
    }

    #[test]
    fn test_sparse_gap_wide_grace_prefers_late_side() {
        let beats = BeatSet::prepare(&[1.0, 2.0, 3.0, 4.0, 15.0, 16.0, 17.0], None, None, 0.0);
        let p = params(window(5.0, 10.0, 7.0, 5.0), Strategy::Nearest, true, 0.0);
        let cuts = plan_cuts(&beats, &p, 18.0).unwrap();
        assert_eq!(cuts.len(), 1);
        assert!((cuts[0].time_s - 15.0).abs() < 1e-9);
        assert_eq!(cuts[0].window_used, WindowUsed::Grace);
    }

    #[test]
    fn test_grace_uses_early_side_when_no_late_beat() {
        // Only beats below the window; grace still admits them.
        let beats = BeatSet::prepare(&[4.6, 30.0], None, None, 0.0);
        let p = params(window(5.0, 10.0, 7.0, 0.5), Strategy::Nearest, true, 0.0);
        let cuts = plan_cuts(&beats, &p, 9.0).unwrap();
        assert_eq!(cuts.len(), 1);
        assert!((cuts[0].time_s - 4.6).abs() < 1e-9);
        assert_eq!(cuts[0].window_used, WindowUsed::Grace);
    }

    #[test]
    fn test_non_strict_falls_back_off_window() {
        let beats = BeatSet::prepare(&[1.0, 2.0, 3.0, 4.0, 15.0, 16.0, 17.0], None, None, 0.0);
        let p = params(window(5.0, 10.0, 7.0, 0.25), Strategy::Nearest, false, 0.0);
        let cuts = plan_cuts(&beats, &p, 20.0).unwrap();
        // Nearest admissible beat to the clamped target (7.0) is 4.0.
        assert!((cuts[0].time_s - 4.0).abs() < 1e-9);
        assert_eq!(cuts[0].window_used, WindowUsed::Fallback);
        assert_eq!(cuts[0].strategy_used, Strategy::Nearest);
    }

    #[test]
    fn test_min_cut_gap_honoured_between_cuts() {
        let beats = beat_grid(0.5, 240);
        let p = params(window(5.0, 10.0, 7.5, 0.5), Strategy::Nearest, false, 2.05);
        let cuts = plan_cuts(&beats, &p, 120.0).unwrap();
        assert!(cuts.windows(2).all(|w| w[1].time_s - w[0].time_s >= 2.05));
    }

    #[test]
    fn test_nearest_tie_breaks_to_earlier_beat() {
        // 7.0 and 8.0 are equidistant from the 7.5 target.
        let beats = BeatSet::prepare(&[7.0, 8.0], None, None, 0.0);
        let p = params(window(5.0, 10.0, 7.5, 0.0), Strategy::Nearest, false, 0.0);
        let cuts = plan_cuts(&beats, &p, 12.0).unwrap();
        assert!((cuts[0].time_s - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_energy_picks_strongest_and_degrades_without_strengths() {
        let strengths = [0.2, 0.9, 0.3];
        let with = BeatSet::prepare(&[6.0, 8.5, 9.5], Some(&strengths), None, 0.0);
        let p = params(window(5.0, 10.0, 6.0, 0.0), Strategy::Energy, false, 0.0);
        let cuts = plan_cuts(&with, &p, 12.0).unwrap();
        assert!((cuts[0].time_s - 8.5).abs() < 1e-9);
        assert_eq!(cuts[0].strategy_used, Strategy::Energy);

        let without = BeatSet::prepare(&[6.0, 8.5, 9.5], None, None, 0.0);
        let cuts = plan_cuts(&without, &p, 12.0).unwrap();
        assert!((cuts[0].time_s - 6.0).abs() < 1e-9);
        assert_eq!(cuts[0].strategy_used, Strategy::Nearest);
    }

    #[test]
    fn test_downbeat_requires_proximity_to_target() {
        // Downbeat at 9.9 is 2.4s from the 7.5 target, within the 2.5 half
        // span, so it wins over the nearer plain beat.
        let downs = [false, true, false];
        let beats = BeatSet::prepare(&[7.4, 9.9, 8.0], None, Some(&downs), 0.0);
        let p = params(window(5.0, 10.0, 7.5, 0.0), Strategy::Downbeat, false, 0.0);
        let cuts = plan_cuts(&beats, &p, 12.0).unwrap();
        assert!((cuts[0].time_s - 9.9).abs() < 1e-9);
        assert_eq!(cuts[0].strategy_used, Strategy::Downbeat);
    }

    #[test]
    fn test_downbeat_degrades_to_nearest() {
        let downs = [false, false];
        let beats = BeatSet::prepare(&[7.4, 9.0], None, Some(&downs), 0.0);
        let p = params(window(5.0, 10.0, 7.5, 0.0), Strategy::Downbeat, false, 0.0);
        let cuts = plan_cuts(&beats, &p, 12.0).unwrap();
        assert!((cuts[0].time_s - 7.4).abs() < 1e-9);
        assert_eq!(cuts[0].strategy_used, Strategy::Nearest);
    }

    #[test]
    fn test_hybrid_prefers_downbeat_then_energy() {
        let strengths = [0.9, 0.1, 0.5];
        let downs = [false, false, true];
        let beats = BeatSet::prepare(&[6.0, 7.5, 8.0], Some(&strengths), Some(&downs), 0.0);
        let p = params(window(5.0, 10.0, 7.5, 0.0), Strategy::Hybrid, false, 0.0);
        let cuts = plan_cuts(&beats, &p, 12.0).unwrap();
        assert!((cuts[0].time_s - 8.0).abs() < 1e-9);
        assert_eq!(cuts[0].strategy_used, Strategy::Downbeat);

        let no_downs = [false, false, false];
        let beats = BeatSet::prepare(&[6.0, 7.5, 8.0], Some(&strengths), Some(&no_downs), 0.0);
        let cuts = plan_cuts(&beats, &p, 12.0).unwrap();
        assert!((cuts[0].time_s - 6.0).abs() < 1e-9);
        assert_eq!(cuts[0].strategy_used, Strategy::Energy);
    }

    #[test]
    fn test_all_beats_gap_filter() {
        let beats = BeatSet::prepare(&[0.1, 0.18, 0.3], None, None, 0.0);
        // Preparation already collapsed 0.18 into the 0.1 run; feed raw
        // spacing through a pre-built set to exercise the planner filter.
        let beats = BeatSet {
            times: vec![0.1, 0.18, 0.3],
            ..beats
        };
        let p = params(window(5.0, 10.0, 7.5, 0.0), Strategy::AllBeats, false, 0.12);
        let cuts = plan_cuts(&beats, &p, 10.0).unwrap();
        let times: Vec<f64> = cuts.iter().map(|c| c.time_s).collect();
        assert_eq!(times, vec![0.1, 0.3]);
        assert!(cuts.windows(2).all(|w| w[1].time_s - w[0].time_s >= 0.12));
    }

    #[test]
    fn test_all_beats_respects_horizon() {
        let beats = beat_grid(1.0, 20);
        let p = params(window(5.0, 10.0, 7.5, 0.0), Strategy::AllBeats, false, 0.0);
        let cuts = plan_cuts(&beats, &p, 5.0).unwrap();
        assert_eq!(cuts.len(), 5);
        assert!(cuts.iter().all(|c| c.time_s <= 5.0));
    }

    #[test]
    fn test_empty_beats_is_an_error() {
        let beats = BeatSet::default();
        let p = params(window(5.0, 10.0, 7.5, 0.0), Strategy::Nearest, false, 0.0);
        assert!(matches!(
            plan_cuts(&beats, &p, 10.0),
            Err(MediaError::NoBeats)
        ));
    }

    #[test]
    fn test_cuts_are_on_prepared_beats_and_monotone() {
        let beats = beat_grid(0.37, 300);
        let p = params(window(2.0, 4.0, 3.0, 0.5), Strategy::Nearest, false, 0.5);
        let cuts = plan_cuts(&beats, &p, 100.0).unwrap();
        assert!(!cuts.is_empty());
        assert!(cuts.windows(2).all(|w| w[1].time_s > w[0].time_s));
        for c in &cuts {
            assert!((beats.times[c.beat_index] - c.time_s).abs() < 1e-12);
        }
    }

    #[test]
    fn test_planner_is_deterministic() {
        let beats = beat_grid(0.41, 250);
        let p = params(window(3.0, 6.0, 4.5, 0.5), Strategy::Nearest, false, 0.3);
        let a = plan_cuts(&beats, &p, 90.0).unwrap();
        let b = plan_cuts(&beats, &p, 90.0).unwrap();
        assert_eq!(a, b);
    }
}
