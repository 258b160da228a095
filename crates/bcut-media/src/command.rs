//! FFmpeg command builder and runner.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};
use crate::progress::FfmpegProgress;

/// Number of trailing stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 40;
/// Grace period between a cancellation kill and giving up on the child.
const KILL_GRACE: Duration = Duration::from_secs(5);

/// One `-i` input and the flags that precede it.
#[derive(Debug, Clone, PartialEq)]
pub enum InputSpec {
    /// A looped still shown for a fixed time: `-loop 1 -t d -i path`.
    Still { path: PathBuf, duration_s: f64 },
    /// An ffconcat list: `-f concat -safe 0 -i path`.
    ConcatList { path: PathBuf },
    /// A plain media file: `-i path`.
    Media { path: PathBuf },
}

impl InputSpec {
    fn to_args(&self) -> Vec<String> {
        match self {
            InputSpec::Still { path, duration_s } => vec![
                "-loop".into(),
                "1".into(),
                "-t".into(),
                format!("{duration_s:.3}"),
                "-i".into(),
                path.to_string_lossy().into_owned(),
            ],
            InputSpec::ConcatList { path } => vec![
                "-f".into(),
                "concat".into(),
                "-safe".into(),
                "0".into(),
                "-i".into(),
                path.to_string_lossy().into_owned(),
            ],
            InputSpec::Media { path } => {
                vec!["-i".into(), path.to_string_lossy().into_owned()]
            }
        }
    }
}

/// Builder for FFmpeg invocations.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    inputs: Vec<InputSpec>,
    /// Filter graph side file (`-filter_complex_script`).
    filter_script: Option<PathBuf>,
    /// Stream label to map as the output video.
    map_label: Option<String>,
    output_args: Vec<String>,
    output: PathBuf,
    overwrite: bool,
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command writing to `output`.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            filter_script: None,
            map_label: None,
            output_args: Vec::new(),
            output: output.as_ref().to_path_buf(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add an input.
    pub fn input(mut self, spec: InputSpec) -> Self {
        self.inputs.push(spec);
        self
    }

    /// Reference a filter graph written to a side file. Keeps the command
    /// line short regardless of the number of segments.
    pub fn filter_complex_script(mut self, path: impl AsRef<Path>) -> Self {
        self.filter_script = Some(path.as_ref().to_path_buf());
        self
    }

    /// Map a labelled filter output as the video stream.
    pub fn map(mut self, label: impl Into<String>) -> Self {
        self.map_label = Some(label.into());
        self
    }

    /// Set the output frame rate.
    pub fn rate(self, fps: u32) -> Self {
        self.output_arg("-r").output_arg(fps.to_string())
    }

    /// Add an output argument (after inputs).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the ffmpeg log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the argument vector.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.overwrite {
            args.push("-y".to_string());
        }
        args.push("-v".to_string());
        args.push(self.log_level.clone());
        args.push("-progress".to_string());
        args.push("pipe:2".to_string());
        for input in &self.inputs {
            args.extend(input.to_args());
        }
        if let Some(script) = &self.filter_script {
            args.push("-filter_complex_script".to_string());
            args.push(script.to_string_lossy().into_owned());
        }
        if let Some(label) = &self.map_label {
            args.push("-map".to_string());
            args.push(format!("[{label}]"));
        }
        args.extend(self.output_args.clone());
        args.push(self.output.to_string_lossy().into_owned());
        args
    }
}

/// Runner with progress streaming, timeout and cooperative cancellation.
pub struct FfmpegRunner {
    cancel_rx: Option<watch::Receiver<bool>>,
    timeout_secs: Option<u64>,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self {
            cancel_rx: None,
            timeout_secs: None,
        }
    }

    /// Set the cancellation signal.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Set a hard timeout for the invocation.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Run an FFmpeg command.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.run_with_progress(cmd, |_| {}).await
    }

    /// Run an FFmpeg command, streaming stderr to the logger and reporting
    /// progress through `progress_callback`.
    pub async fn run_with_progress<F>(
        &self,
        cmd: &FfmpegCommand,
        progress_callback: F,
    ) -> MediaResult<()>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let stderr = child.stderr.take().expect("stderr not captured");
        let mut reader = BufReader::new(stderr).lines();

        // Stream stderr: progress lines feed the callback, everything else
        // goes to the logger and into the tail buffer for error reports.
        let stderr_task = tokio::spawn(async move {
            let mut current = FfmpegProgress::default();
            let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
            while let Ok(Some(line)) = reader.next_line().await {
                if let Some(progress) = parse_progress_line(&line, &mut current) {
                    progress_callback(progress);
                } else if !is_progress_field(&line) {
                    debug!(target: "ffmpeg", "{line}");
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
            }
            tail
        });

        let result = self.wait_for_completion(&mut child).await;
        let tail = stderr_task.await.unwrap_or_default();

        match result {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => {
                let tail_text = (!tail.is_empty())
                    .then(|| tail.iter().cloned().collect::<Vec<_>>().join("\n"));
                Err(MediaError::encoder_failed(
                    "FFmpeg exited with non-zero status",
                    tail_text,
                    status.code(),
                ))
            }
            Err(e) => Err(e),
        }
    }

    /// Wait for the child, honouring timeout and cancellation. On either,
    /// the child is killed and allowed a short grace to exit.
    async fn wait_for_completion(
        &self,
        child: &mut Child,
    ) -> MediaResult<std::process::ExitStatus> {
        enum WaitOutcome {
            Exited(std::io::Result<std::process::ExitStatus>),
            Cancelled,
            TimedOut(u64),
        }

        let mut cancel_rx = self.cancel_rx.clone();
        let outcome = {
            let child_ref = &mut *child;
            let cancelled = async {
                match cancel_rx.as_mut() {
                    Some(rx) => {
                        while !*rx.borrow() {
                            if rx.changed().await.is_err() {
                                // Sender dropped without cancelling.
                                std::future::pending::<()>().await;
                            }
                        }
                    }
                    None => std::future::pending().await,
                }
            };
            let wait = async move {
                tokio::select! {
                    status = child_ref.wait() => WaitOutcome::Exited(status),
                    _ = cancelled => WaitOutcome::Cancelled,
                }
            };
            match self.timeout_secs {
                Some(secs) => tokio::time::timeout(Duration::from_secs(secs), wait)
                    .await
                    .unwrap_or(WaitOutcome::TimedOut(secs)),
                None => wait.await,
            }
        };

        match outcome {
            WaitOutcome::Exited(status) => Ok(status?),
            WaitOutcome::Cancelled => {
                info!("render cancelled, stopping FFmpeg");
                kill_with_grace(child).await;
                Err(MediaError::Cancelled)
            }
            WaitOutcome::TimedOut(secs) => {
                warn!("FFmpeg timed out after {secs} seconds, killing process");
                kill_with_grace(child).await;
                Err(MediaError::EncoderTimeout(secs))
            }
        }
    }
}

async fn kill_with_grace(child: &mut Child) {
    let _ = child.start_kill();
    if tokio::time::timeout(KILL_GRACE, child.wait()).await.is_err() {
        warn!("FFmpeg did not exit within the kill grace period");
    }
}

/// Parse one `-progress` line. Returns a snapshot on each `progress=` line.
fn parse_progress_line(line: &str, current: &mut FfmpegProgress) -> Option<FfmpegProgress> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        "out_time_ms" | "out_time_us" => {
            // Despite the name, ffmpeg reports out_time_ms in microseconds.
            if let Ok(us) = value.parse::<i64>() {
                current.out_time_ms = us / 1000;
            }
        }
        "frame" => {
            if let Ok(frame) = value.parse() {
                current.frame = frame;
            }
        }
        "fps" => {
            if let Ok(fps) = value.parse() {
                current.fps = fps;
            }
        }
        "speed" => {
            if let Some(speed) = value.strip_suffix('x').and_then(|s| s.parse().ok()) {
                current.speed = speed;
            }
        }
        "progress" => {
            if value == "end" {
                current.is_complete = true;
            }
            return Some(current.clone());
        }
        _ => {}
    }
    None
}

/// True for `-progress` key=value fields that are not worth logging.
fn is_progress_field(line: &str) -> bool {
    const KEYS: &[&str] = &[
        "frame", "fps", "bitrate", "total_size", "out_time", "out_time_us", "out_time_ms",
        "dup_frames", "drop_frames", "speed", "progress",
    ];
    line.trim()
        .split_once('=')
        .is_some_and(|(key, _)| KEYS.contains(&key) || key.starts_with("stream_"))
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}
