//! Optional pre-stage image preparation.
//!
//! Each still is normalised once (scale and pad to the output geometry)
//! into `clips/NNNN.png` inside the workdir. Tasks are independent and run
//! under a bounded worker pool; any task failure fails the render.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use bcut_models::RenderParams;

use crate::command::{FfmpegCommand, FfmpegRunner, InputSpec};
use crate::error::{MediaError, MediaResult};
use crate::workdir::Workdir;

/// Pool size: three quarters of the available cores, rounded up.
fn pool_size() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cores * 3).div_ceil(4).max(1)
}

/// Normalise every image into the workdir's `clips/` directory.
///
/// Returns the intermediate paths in input order. Results are keyed by
/// segment index, so no cross-task ordering is needed; the first failure
/// aborts the whole preparation.
pub async fn prepare_images(
    images: &[PathBuf],
    render: &RenderParams,
    workdir: &Workdir,
) -> MediaResult<Vec<PathBuf>> {
    let clips = workdir.clips_dir()?;
    let semaphore = Arc::new(Semaphore::new(pool_size()));
    info!(
        count = images.len(),
        workers = pool_size(),
        "preparing image intermediates"
    );

    let filter = format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
        w = render.width,
        h = render.height
    );

    let mut tasks: JoinSet<MediaResult<(usize, PathBuf)>> = JoinSet::new();
    for (index, image) in images.iter().cloned().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let out = clips.join(format!("{index:04}.png"));
        let filter = filter.clone();
        tasks.spawn(async move {
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|_| MediaError::Cancelled)?;
            debug!(index, image = %image.display(), "normalising still");
            let cmd = FfmpegCommand::new(&out)
                .input(InputSpec::Media { path: image })
                .output_args(["-vf", &filter, "-frames:v", "1"]);
            FfmpegRunner::new().run(&cmd).await?;
            Ok((index, out))
        });
    }

    let mut prepared: Vec<Option<PathBuf>> = vec![None; images.len()];
    while let Some(joined) = tasks.join_next().await {
        let (index, path) = joined.map_err(|e| {
            MediaError::encoder_failed(format!("image preparation task panicked: {e}"), None, None)
        })??;
        prepared[index] = Some(path);
    }

    Ok(prepared.into_iter().map(|p| p.expect("task per image")).collect())
}
