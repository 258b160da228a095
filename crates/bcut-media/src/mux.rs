//! Final audio mux.

use std::path::Path;

use tracing::info;

use bcut_models::EncodingConfig;

use crate::command::{FfmpegCommand, FfmpegRunner, InputSpec};
use crate::error::MediaResult;

/// Mux the source audio track into the rendered video.
///
/// The video stream is copied; audio is re-encoded and the output stops at
/// the shorter stream, so a frame-quantized video never drags a few extra
/// silent frames past the audio end.
pub async fn mux_audio(
    video: impl AsRef<Path>,
    audio: impl AsRef<Path>,
    output: impl AsRef<Path>,
    encoding: &EncodingConfig,
    runner: &FfmpegRunner,
) -> MediaResult<()> {
    let video = video.as_ref();
    let audio = audio.as_ref();
    let output = output.as_ref();

    info!(
        video = %video.display(),
        audio = %audio.display(),
        out = %output.display(),
        "muxing audio"
    );

    let cmd = FfmpegCommand::new(output)
        .input(InputSpec::Media {
            path: video.to_path_buf(),
        })
        .input(InputSpec::Media {
            path: audio.to_path_buf(),
        })
        .output_args(["-map", "0:v:0", "-map", "1:a:0"])
        .output_args(encoding.to_mux_args());

    runner.run(&cmd).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mux_command_shape() {
        let cmd = FfmpegCommand::new("final.mp4")
            .input(InputSpec::Media {
                path: "video.mp4".into(),
            })
            .input(InputSpec::Media {
                path: "audio.m4a".into(),
            })
            .output_args(["-map", "0:v:0", "-map", "1:a:0"])
            .output_args(EncodingConfig::default().to_mux_args());
        let args = cmd.build_args();
        assert!(args.windows(2).any(|w| w[0] == "-c:v" && w[1] == "copy"));
        assert!(args.contains(&"-shortest".to_string()));
        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 2);
    }
}
