//! Overlay event generation: beat ticks, pulses, bloom and the counter.
//!
//! Overlays are expressed as ffmpeg filter snippets with `enable` windows on
//! the output timeline. Draw overlays (ticks, markers, counter) stay on top
//! of everything; effect overlays (pulse, bloom) may be restricted to a mask
//! scope by the graph builder.

use bcut_models::OverlayParams;

/// Font used by the beat counter.
const COUNTER_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf";

/// Filter snippets for one render, split by compositing role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayPlan {
    /// drawbox/drawtext snippets, composed last.
    pub draw_filters: Vec<String>,
    /// eq/gblur snippets, optionally mask-scoped.
    pub effect_filters: Vec<String>,
}

impl OverlayPlan {
    pub fn is_empty(&self) -> bool {
        self.draw_filters.is_empty() && self.effect_filters.is_empty()
    }
}

/// Beat instants selected for overlays: thinned by the multiplier, shifted
/// by the overlay phase, guarded against transition landings, sorted.
pub fn overlay_times(
    beats: &[f64],
    transition_times: &[f64],
    params: &OverlayParams,
) -> Vec<f64> {
    let mut times: Vec<f64> = if beats.is_empty() {
        transition_times.to_vec()
    } else {
        beats
            .iter()
            .enumerate()
            .filter(|(idx, _)| params.beat_mult <= 1 || (idx + 1) % params.beat_mult as usize == 0)
            .map(|(_, &t)| (t + params.overlay_phase_s).max(0.0))
            .collect()
    };

    if params.overlay_guard_s > 0.0 && !transition_times.is_empty() {
        times.retain(|&t| {
            transition_times
                .iter()
                .all(|&x| (t - x).abs() >= params.overlay_guard_s)
        });
    }

    times.sort_by(|a, b| a.total_cmp(b));
    times
}

/// Build the overlay plan for a render.
///
/// `transition_times` are the landing instants of the segment boundaries on
/// the output timeline; `total_s` is the output duration and closes the last
/// counter window.
pub fn build_overlays(
    beats: &[f64],
    transition_times: &[f64],
    total_s: f64,
    params: &OverlayParams,
) -> OverlayPlan {
    let times = overlay_times(beats, transition_times, params);
    let mut plan = OverlayPlan::default();

    // Cut markers first so beat ticks draw over them.
    if params.cut_markers && params.marker_s > 0.0 {
        for &t in transition_times {
            plan.draw_filters.push(format!(
                "drawbox=x=(iw/2-5):y=0:w=10:h=ih:color=red@1.0:t=fill:enable='between(t,{:.3},{:.3})'",
                t,
                t + params.marker_s
            ));
        }
    }

    if params.beat_ticks && params.marker_s > 0.0 {
        for &t in &times {
            plan.draw_filters.push(format!(
                "drawbox=x=(iw/2-5):y=0:w=10:h=ih:color=white@1.0:t=fill:enable='between(t,{:.3},{:.3})'",
                t,
                t + params.marker_s
            ));
        }
    }

    let pulse_active =
        params.pulse && params.pulse_s > 0.0 && (params.pulse_saturation > 1.0 || params.pulse_brightness != 0.0);
    if pulse_active {
        for &t in &times {
            plan.effect_filters.push(format!(
                "eq=saturation={:.3}:brightness={:.3}:enable='between(t,{:.3},{:.3})'",
                params.pulse_saturation,
                params.pulse_brightness,
                t,
                t + params.pulse_s
            ));
        }
    }

    if params.bloom && params.bloom_s > 0.0 && params.bloom_sigma > 0.0 {
        for &t in &times {
            plan.effect_filters.push(format!(
                "gblur=sigma={:.2}:steps=1:enable='between(t,{:.3},{:.3})'",
                params.bloom_sigma,
                t,
                t + params.bloom_s
            ));
        }
    }

    if params.counter && params.counter_size > 0 {
        let (x, y) = params.counter_position.text_exprs();
        let first = times.first().copied().unwrap_or(total_s);
        if first > 0.0 {
            plan.draw_filters.push(counter_text("0", x, y, params.counter_size, 0.0, first));
        }
        for (j, &t) in times.iter().enumerate() {
            let end = times.get(j + 1).copied().unwrap_or(total_s);
            plan.draw_filters.push(counter_text(
                &(j + 1).to_string(),
                x,
                y,
                params.counter_size,
                t.max(0.0),
                end,
            ));
        }
    }

    plan
}

fn counter_text(text: &str, x: &str, y: &str, size: u32, start: f64, end: f64) -> String {
    format!(
        "drawtext=fontfile='{COUNTER_FONT}':text='{text}':x={x}:y={y}:fontsize={size}:fontcolor=white:bordercolor=black:borderw=2:enable='between(t,{start:.3},{end:.3})'"
    )
}
