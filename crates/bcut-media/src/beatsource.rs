//! Raw beat acquisition.
//!
//! The detector itself stays external: any component that produces ascending
//! instants in seconds will do. Two sources are supported, a text file and
//! the `aubio beat` CLI. Preparation (phase shift, dedupe, minimum gap)
//! happens in [`bcut_models::BeatSet`].

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};

const DETECTOR_BIN: &str = "aubio";

/// Detector output before preparation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBeats {
    pub times: Vec<f64>,
    /// Onset strengths, present only when every line carried one.
    pub onset_strength: Option<Vec<f64>>,
    /// Downbeat flags, present only when every line carried one.
    pub is_downbeat: Option<Vec<bool>>,
}

/// Read raw beats from a text file.
///
/// Each line holds a time in seconds, optionally followed by an onset
/// strength and a downbeat flag (`0`/`1`), whitespace-separated:
///
/// ```text
/// 0.464399 0.82 1
/// 0.975238 0.31 0
/// ```
///
/// Blank and unparsable lines are skipped. The auxiliary columns are kept
/// only when every beat line carries them.
pub async fn beats_from_file(path: impl AsRef<Path>) -> MediaResult<RawBeats> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }
    let text = tokio::fs::read_to_string(path).await?;
    Ok(parse_beat_lines(&text))
}

/// Run the external beat detector over an audio file.
pub async fn detect_beats(audio: impl AsRef<Path>) -> MediaResult<RawBeats> {
    let audio = audio.as_ref();
    which::which(DETECTOR_BIN)
        .map_err(|_| MediaError::BeatDetectorNotFound(DETECTOR_BIN.to_string()))?;

    info!("detecting beats in {}", audio.display());
    let output = Command::new(DETECTOR_BIN)
        .arg("beat")
        .arg("-i")
        .arg(audio)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ProbeFailed {
            message: format!("beat detection failed for {}", audio.display()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    let beats = parse_beat_lines(&String::from_utf8_lossy(&output.stdout));
    debug!(count = beats.times.len(), "detector produced beats");
    Ok(beats)
}

fn parse_beat_lines(text: &str) -> RawBeats {
    let mut times = Vec::new();
    let mut strengths = Vec::new();
    let mut downbeats = Vec::new();
    for line in text.lines() {
        let mut fields = line.split_whitespace();
        let Some(time) = fields.next().and_then(|f| f.parse::<f64>().ok()) else {
            continue;
        };
        times.push(time);
        strengths.push(fields.next().and_then(|f| f.parse::<f64>().ok()));
        downbeats.push(fields.next().and_then(|f| match f {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        }));
    }

    let onset_strength = (!times.is_empty() && strengths.iter().all(|s| s.is_some()))
        .then(|| strengths.into_iter().flatten().collect());
    let is_downbeat = (!times.is_empty() && downbeats.iter().all(|d| d.is_some()))
        .then(|| downbeats.into_iter().flatten().collect());

    RawBeats {
        times,
        onset_strength,
        is_downbeat,
    }
}
