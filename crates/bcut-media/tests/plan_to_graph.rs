//! End-to-end planning scenarios: beats in, filter graph out.

use std::path::PathBuf;

use bcut_media::binder::bind_images;
use bcut_media::durations::{build_durations, quantize_durations};
use bcut_media::graph::{build_render_graph, BoundaryKind};
use bcut_media::plan_io::{read_plan, write_plan};
use bcut_media::planner::plan_cuts;
use bcut_media::MediaError;
use bcut_models::{
    BeatSet, Params, Plan, Quantize, RenderMode, Strategy, WindowUsed, PLAN_SCHEMA_VERSION,
};

fn grid_beats(step: f64, end: f64) -> BeatSet {
    let mut times = Vec::new();
    let mut t = step;
    while t <= end + 1e-9 {
        times.push(t);
        t += step;
    }
    BeatSet {
        times,
        onset_strength: None,
        is_downbeat: None,
    }
}

fn images(n: usize) -> Vec<PathBuf> {
    (0..n).map(|i| PathBuf::from(format!("/img/{i:03}.png"))).collect()
}

#[test]
fn uniform_grid_plans_16_cuts_and_a_safe_crossfade_chain() {
    let params = Params::default();
    let beats = grid_beats(0.5, 120.0);
    let audio_end = 120.0;

    let cuts = plan_cuts(&beats, &params.plan, audio_end).unwrap();
    assert_eq!(cuts.len(), 16);

    // Invariants: beat-on-cut, window, min gap, monotonicity.
    for c in &cuts {
        assert!((beats.times[c.beat_index] - c.time_s).abs() < 1e-9);
        assert_eq!(c.window_used, WindowUsed::Normal);
    }
    let mut prev = 0.0;
    for c in &cuts {
        let delta = c.time_s - prev;
        if prev > 0.0 {
            assert!((5.0..=10.0).contains(&delta), "window violated: {delta}");
            assert!(delta >= params.plan.min_cut_gap_s);
        }
        assert!(c.time_s > prev);
        prev = c.time_s;
    }

    let nominal = build_durations(&cuts, audio_end);
    let durations = quantize_durations(&nominal, 25, Quantize::Nearest, audio_end);
    let sum: f64 = durations.iter().sum();
    assert!((sum - audio_end).abs() <= 1.0 / 25.0 + 1e-9);
    // The cut landing exactly on the audio end leaves no visible tail.
    assert_eq!(durations.len(), 16);

    let binding = bind_images(&images(20), durations.len(), &params.images);
    let graph = build_render_graph(
        &binding.images,
        &durations,
        &beats.times,
        &params.render,
        &params.overlay,
    );
    assert_eq!(graph.mode, RenderMode::Crossfade);
    assert_eq!(graph.boundaries.len(), 15);
    assert!(graph
        .boundaries
        .iter()
        .all(|b| matches!(b.kind, BoundaryKind::Crossfade { .. })));
}

#[test]
fn sparse_beats_fail_strict_planning_but_recover_without_strict() {
    let beats = BeatSet::prepare(&[1.0, 2.0, 3.0, 4.0, 15.0, 16.0, 17.0], None, None, 0.0);

    let mut params = Params::default();
    params.plan.strict = true;
    params.plan.window.target_s = 7.0;
    params.plan.window.grace_s = 0.25;
    let err = plan_cuts(&beats, &params.plan, 60.0).unwrap_err();
    assert!(matches!(err, MediaError::NoBeatInWindow { .. }));

    params.plan.strict = false;
    let cuts = plan_cuts(&beats, &params.plan, 60.0).unwrap();
    assert!(cuts.iter().any(|c| c.window_used == WindowUsed::Fallback));
}

#[test]
fn truncated_binding_still_renders_every_surviving_segment() {
    let params = {
        let mut p = Params::default();
        p.images.loop_images = false;
        p
    };
    let beats = grid_beats(0.5, 60.0);
    let mut cuts = plan_cuts(&beats, &params.plan, 60.0).unwrap();
    // Fewer images than segments: emulate the pipeline's truncation loop.
    let available = images(3);
    let (durations, binding) = loop {
        let nominal = build_durations(&cuts, 60.0);
        let quantized = quantize_durations(&nominal, 25, Quantize::Nearest, 60.0);
        let binding = bind_images(&available, quantized.len(), &params.images);
        if binding.segment_count == quantized.len() {
            break (quantized, binding);
        }
        cuts.truncate(binding.segment_count.saturating_sub(1));
    };
    assert_eq!(durations.len(), 3);
    assert_eq!(binding.images.len(), 3);
    // The final segment re-trims to the audio end.
    let sum: f64 = durations.iter().sum();
    assert!((sum - 60.0).abs() <= 1.0 / 25.0 + 1e-9);
}

#[test]
fn plan_roundtrip_reproduces_identical_graph_text() {
    let params = Params::default();
    let beats = grid_beats(0.5, 60.0);
    let audio_end = 60.0;
    let cuts = plan_cuts(&beats, &params.plan, audio_end).unwrap();
    let nominal = build_durations(&cuts, audio_end);
    let durations = quantize_durations(&nominal, params.render.fps, params.render.quantize, audio_end);
    let binding = bind_images(&images(12), durations.len(), &params.images);

    let plan = Plan {
        schema_version: PLAN_SCHEMA_VERSION,
        params: params.clone(),
        audio_end_s: audio_end,
        beats: beats.times.clone(),
        cuts,
        durations_s: durations,
        images: binding.images,
        fps: params.render.fps,
        width: params.render.width,
        height: params.render.height,
    };
    assert!(plan.is_well_formed());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.json");
    write_plan(&plan, &path).unwrap();
    let reloaded = read_plan(&path).unwrap();

    let graph_a = build_render_graph(
        &plan.images,
        &plan.durations_s,
        &plan.beats,
        &plan.params.render,
        &plan.params.overlay,
    );
    let graph_b = build_render_graph(
        &reloaded.images,
        &reloaded.durations_s,
        &reloaded.beats,
        &reloaded.params.render,
        &reloaded.params.overlay,
    );
    assert_eq!(graph_a.filtergraph, graph_b.filtergraph);
    assert_eq!(graph_a.inputs, graph_b.inputs);
    assert_eq!(graph_a.output_label, graph_b.output_label);
}

#[test]
fn all_beats_plan_feeds_the_hardcut_backend() {
    let mut params = Params::default();
    params.plan.strategy = Strategy::AllBeats;
    params.plan.min_cut_gap_s = 0.12;
    params.render.mode = RenderMode::HardCut;

    let beats = BeatSet {
        times: vec![0.5, 1.0, 1.5, 2.0],
        onset_strength: None,
        is_downbeat: None,
    };
    let cuts = plan_cuts(&beats, &params.plan, 2.4).unwrap();
    assert_eq!(cuts.len(), 4);
    assert!(cuts.iter().all(|c| c.strategy_used == Strategy::AllBeats));

    let nominal = build_durations(&cuts, 2.4);
    let durations = quantize_durations(&nominal, 25, Quantize::Nearest, 2.4);
    let binding = bind_images(&images(10), durations.len(), &params.images);
    let graph = build_render_graph(
        &binding.images,
        &durations,
        &beats.times,
        &params.render,
        &params.overlay,
    );
    assert_eq!(graph.mode, RenderMode::HardCut);
    assert!(graph.filtergraph.contains("fps=25"));
}

#[test]
fn short_segments_force_the_global_fallback() {
    // 0.4s holds cannot host the default 0.6s fade anywhere.
    let mut params = Params::default();
    params.plan.strategy = Strategy::AllBeats;
    params.plan.min_cut_gap_s = 0.12;

    let beats = grid_beats(0.4, 4.0);
    let cuts = plan_cuts(&beats, &params.plan, 4.0).unwrap();
    let nominal = build_durations(&cuts, 4.0);
    let durations = quantize_durations(&nominal, 25, Quantize::Nearest, 4.0);
    let binding = bind_images(&images(12), durations.len(), &params.images);
    let graph = build_render_graph(
        &binding.images,
        &durations,
        &beats.times,
        &params.render,
        &params.overlay,
    );
    assert_eq!(graph.mode, RenderMode::HardCut);
}
