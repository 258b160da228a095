//! Segment durations: building, frame quantization and drift correction.

use bcut_models::{Cut, Quantize};
use tracing::warn;

/// Nominal per-segment durations from cut times.
///
/// Segment 0 runs from the start of the audio to the first cut; the final
/// segment runs from the last cut to `audio_end_s`. A zero-length tail (a
/// cut exactly at the audio end) is kept here and removed by the quantizer's
/// minimum-duration pass.
pub fn build_durations(cuts: &[Cut], audio_end_s: f64) -> Vec<f64> {
    let mut durations = Vec::with_capacity(cuts.len() + 1);
    let mut last = 0.0;
    for cut in cuts {
        durations.push(cut.time_s - last);
        last = cut.time_s;
    }
    durations.push((audio_end_s - last).max(0.0));
    durations
}

/// Quantize durations onto the frame grid.
///
/// Each segment is rounded per `mode`, then the cumulative rounding error is
/// pushed onto the final segment so the total matches `audio_end_s` to
/// within one frame. Segments that end up shorter than one frame merge into
/// their shorter neighbour.
pub fn quantize_durations(
    durations: &[f64],
    fps: u32,
    mode: Quantize,
    audio_end_s: f64,
) -> Vec<f64> {
    if durations.is_empty() {
        return Vec::new();
    }
    let fps_f = fps as f64;

    let mut frames: Vec<i64> = durations
        .iter()
        .map(|&d| {
            let exact = d * fps_f;
            match mode {
                Quantize::Nearest => exact.round() as i64,
                Quantize::Floor => exact.floor() as i64,
                Quantize::Ceil => exact.ceil() as i64,
            }
        })
        .collect();

    // Drift correction: the total frame count is pinned to the audio end,
    // with the residual landing on the final segment.
    let target_total = (audio_end_s * fps_f).round() as i64;
    let total: i64 = frames.iter().sum();
    let drift = target_total - total;
    if drift != 0 {
        if let Some(last) = frames.last_mut() {
            *last += drift;
        }
    }

    merge_subframe_segments(&mut frames);

    frames.into_iter().map(|f| f as f64 / fps_f).collect()
}

/// Merge any segment shorter than one frame into its shorter neighbour.
fn merge_subframe_segments(frames: &mut Vec<i64>) {
    let mut i = 0;
    while i < frames.len() {
        if frames[i] >= 1 || frames.len() == 1 {
            i += 1;
            continue;
        }
        let prev = i.checked_sub(1).map(|j| frames[j]);
        let next = frames.get(i + 1).copied();
        let merge_into_prev = match (prev, next) {
            (Some(p), Some(n)) => p <= n,
            (Some(_), None) => true,
            (None, _) => false,
        };
        let removed = frames.remove(i);
        if merge_into_prev {
            frames[i - 1] += removed;
            warn!(
                segment = i,
                frames = removed,
                "segment shorter than one frame, merged into previous"
            );
        } else {
            frames[i] += removed;
            warn!(
                segment = i,
                frames = removed,
                "segment shorter than one frame, merged into next"
            );
        }
        // Re-examine from the merge point; the neighbour may still be short.
        i = i.saturating_sub(1);
    }
}
