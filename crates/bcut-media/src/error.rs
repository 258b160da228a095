//! Error types for planning and rendering.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while planning or rendering.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("Beat detector '{0}' not found in PATH")]
    BeatDetectorNotFound(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(#[from] bcut_models::ParamsError),

    #[error("No beats detected after preparation")]
    NoBeats,

    #[error("No beat in window [{window_lo:.3}, {window_hi:.3}] after cut at {after_s:.3}s (grace {grace_s:.3}s)")]
    NoBeatInWindow {
        after_s: f64,
        window_lo: f64,
        window_hi: f64,
        grace_s: f64,
    },

    #[error("No images found in {0}")]
    NoImages(PathBuf),

    #[error("Encoder failed: {message}")]
    EncoderFailed {
        message: String,
        stderr_tail: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Encoder timed out after {0} seconds")]
    EncoderTimeout(u64),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("FFprobe command failed: {message}")]
    ProbeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Plan schema version {found} is not supported (expected {supported})")]
    PlanSchemaMismatch { found: u32, supported: u32 },

    #[error("Plan document is missing required field '{0}'")]
    PlanFieldMissing(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MediaError {
    /// Create an encoder failure error.
    pub fn encoder_failed(
        message: impl Into<String>,
        stderr_tail: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::EncoderFailed {
            message: message.into(),
            stderr_tail,
            exit_code,
        }
    }

    /// True for errors the CLI maps to the strict-planner exit code.
    pub fn is_planning_failure(&self) -> bool {
        matches!(self, Self::NoBeats | Self::NoBeatInWindow { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_window() {
        let err = MediaError::NoBeatInWindow {
            after_s: 4.0,
            window_lo: 9.0,
            window_hi: 14.0,
            grace_s: 0.25,
        };
        let msg = err.to_string();
        assert!(msg.contains("9.000"));
        assert!(msg.contains("0.250"));
    }

    #[test]
    fn test_planning_failure_classification() {
        assert!(MediaError::NoBeats.is_planning_failure());
        assert!(!MediaError::Cancelled.is_planning_failure());
    }
}
