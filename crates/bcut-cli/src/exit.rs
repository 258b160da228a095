//! Exit-code mapping.

use bcut_media::MediaError;

/// Success.
pub const EXIT_OK: i32 = 0;
/// Range violations and other invalid arguments.
pub const EXIT_INVALID_ARGS: i32 = 2;
/// No beats detected and off-beat fallback not allowed.
pub const EXIT_NO_BEATS: i32 = 3;
/// Strict planning failed even after the grace expansion.
pub const EXIT_NO_BEAT_IN_WINDOW: i32 = 4;
/// External encoder failed or timed out.
pub const EXIT_ENCODER: i32 = 5;
/// I/O failure (files, plan documents, probing).
pub const EXIT_IO: i32 = 6;
/// Interrupted.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Map an error to the process exit code.
pub fn exit_code_for(err: &MediaError) -> i32 {
    match err {
        MediaError::InvalidParameter(_) => EXIT_INVALID_ARGS,
        MediaError::NoBeats => EXIT_NO_BEATS,
        MediaError::NoBeatInWindow { .. } => EXIT_NO_BEAT_IN_WINDOW,
        MediaError::EncoderFailed { .. }
        | MediaError::EncoderTimeout(_)
        | MediaError::FfmpegNotFound => EXIT_ENCODER,
        MediaError::Cancelled => EXIT_INTERRUPTED,
        MediaError::FfprobeNotFound
        | MediaError::BeatDetectorNotFound(_)
        | MediaError::NoImages(_)
        | MediaError::ProbeFailed { .. }
        | MediaError::PlanSchemaMismatch { .. }
        | MediaError::PlanFieldMissing(_)
        | MediaError::FileNotFound(_)
        | MediaError::Io(_)
        | MediaError::Json(_) => EXIT_IO,
    }
}
