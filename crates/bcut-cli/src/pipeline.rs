//! Render orchestration: probe, plan, compile, encode, mux.

use std::path::PathBuf;

use tokio::sync::watch;
use tracing::{debug, info};

use bcut_media::beatsource::{beats_from_file, detect_beats};
use bcut_media::binder::{bind_images, list_images};
use bcut_media::command::{FfmpegCommand, FfmpegRunner, InputSpec};
use bcut_media::durations::{build_durations, quantize_durations};
use bcut_media::graph::{build_render_graph, GraphInput};
use bcut_media::mux::mux_audio;
use bcut_media::plan_io::{read_plan_with_rebind, write_plan};
use bcut_media::planner::plan_cuts;
use bcut_media::prep::prepare_images;
use bcut_media::probe::get_audio_duration;
use bcut_media::{MediaError, MediaResult, Workdir};
use bcut_models::{BeatSet, EncodingConfig, Params, Plan, PLAN_SCHEMA_VERSION};

use crate::args::Cli;
use crate::presets::effective_params;

/// Run one full render. Returns the output path on success.
pub async fn run(cli: &Cli, cancel_rx: watch::Receiver<bool>) -> MediaResult<PathBuf> {
    let params = effective_params(cli);
    params.validate().map_err(MediaError::InvalidParameter)?;

    let workdir = Workdir::create(cli.workdir.clone(), cli.keep_workdir)?;
    let result = run_inner(cli, params, &workdir, cancel_rx).await;
    match &result {
        Ok(out) => {
            info!(out = %out.display(), "render complete");
            workdir.finish(true);
        }
        Err(_) => workdir.finish(false),
    }
    result
}

async fn run_inner(
    cli: &Cli,
    params: Params,
    workdir: &Workdir,
    cancel_rx: watch::Receiver<bool>,
) -> MediaResult<PathBuf> {
    let (plan, params) = match &cli.plan_in {
        Some(path) => {
            info!(plan = %path.display(), "rendering from plan document");
            let plan = read_plan_with_rebind(path, &cli.images_dir)?;
            let params = plan.params.clone();
            (plan, params)
        }
        None => {
            let plan = build_plan(cli, &params).await?;
            (plan, params)
        }
    };

    workdir.write_beats(&plan.beats)?;
    write_plan(&plan, workdir.plan_path())?;
    if let Some(path) = &cli.plan_out {
        write_plan(&plan, path)?;
    }

    let images = if cli.preprocess {
        prepare_images(&plan.images, &params.render, workdir).await?
    } else {
        plan.images.clone()
    };

    let graph = build_render_graph(
        &images,
        &plan.durations_s,
        &plan.beats,
        &params.render,
        &params.overlay,
    );
    info!(
        mode = ?graph.mode,
        segments = plan.durations_s.len(),
        boundaries = graph.boundaries.len(),
        total_s = graph.total_s,
        "compiled filter graph"
    );
    let graph_path = workdir.write_graph(&graph)?;

    let video_out = if cli.no_audio {
        cli.out.clone()
    } else {
        workdir.root().join("video.mp4")
    };

    let encoding = EncodingConfig::default();
    let mut cmd = FfmpegCommand::new(&video_out);
    for input in &graph.inputs {
        cmd = cmd.input(match input {
            GraphInput::Still { path, duration_s } => InputSpec::Still {
                path: path.clone(),
                duration_s: *duration_s,
            },
            GraphInput::List { file_name, .. } => InputSpec::ConcatList {
                path: workdir.list_path(file_name),
            },
        });
    }
    cmd = cmd
        .filter_complex_script(&graph_path)
        .map(&graph.output_label)
        .rate(params.render.fps)
        .output_args(encoding.to_ffmpeg_args());

    let runner = FfmpegRunner::new()
        .with_timeout(cli.encoder_timeout)
        .with_cancel(cancel_rx);
    let total_s = graph.total_s;
    runner
        .run_with_progress(&cmd, move |p| {
            debug!(
                percent = format!("{:.1}", p.percentage(total_s)),
                frame = p.frame,
                speed = p.speed,
                "encoding"
            );
        })
        .await?;

    if !cli.no_audio {
        mux_audio(&video_out, &cli.audio_file, &cli.out, &encoding, &runner).await?;
    }

    Ok(cli.out.clone())
}

/// Detect, prepare and plan; returns the frozen plan document.
async fn build_plan(cli: &Cli, params: &Params) -> MediaResult<Plan> {
    let raw = match &cli.beats_file {
        Some(path) => beats_from_file(path).await?,
        None => detect_beats(&cli.audio_file).await?,
    };
    let beats = BeatSet::prepare(
        &raw.times,
        raw.onset_strength.as_deref(),
        raw.is_downbeat.as_deref(),
        params.plan.phase_s,
    );
    if beats.is_empty() {
        return Err(MediaError::NoBeats);
    }
    info!(count = beats.len(), "prepared beats");

    let mut audio_end = match params.plan.audio_end_s {
        Some(end) => end,
        None => get_audio_duration(&cli.audio_file).await?,
    };
    if let Some(max) = params.plan.max_seconds {
        audio_end = audio_end.min(max);
    }

    let mut cuts = plan_cuts(&beats, &params.plan, audio_end)?;
    info!(cuts = cuts.len(), audio_end, "planned cuts");

    let available = list_images(&cli.images_dir)?;
    let render = &params.render;
    let (durations, binding) = loop {
        let nominal = build_durations(&cuts, audio_end);
        let quantized = quantize_durations(&nominal, render.fps, render.quantize, audio_end);
        let binding = bind_images(&available, quantized.len(), &params.images);
        if binding.segment_count == quantized.len() {
            break (quantized, binding);
        }
        // Not enough images and looping is off: drop tail cuts, the final
        // segment re-trims to the audio end on the next pass.
        cuts.truncate(binding.segment_count.saturating_sub(1));
    };

    Ok(Plan {
        schema_version: PLAN_SCHEMA_VERSION,
        params: params.clone(),
        audio_end_s: audio_end,
        beats: beats.times.clone(),
        cuts,
        durations_s: durations,
        images: binding.images,
        fps: render.fps,
        width: render.width,
        height: render.height,
    })
}
