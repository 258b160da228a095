//! Beat-aligned planning and FFmpeg graph compilation.
//!
//! This crate provides:
//! - The window-constrained cut planner and its strategies
//! - Duration building with frame quantization and drift correction
//! - Image binding (seeded shuffle, loop/truncate policies)
//! - Filter-graph compilation for hard-cut and crossfade renders
//! - Overlay event generation (ticks, pulse, bloom, counter)
//! - Type-safe FFmpeg command building with progress and cancellation
//! - Plan document I/O and the scoped working directory

pub mod beatsource;
pub mod binder;
pub mod command;
pub mod concat;
pub mod durations;
pub mod error;
pub mod graph;
pub mod masks;
pub mod mux;
pub mod overlay;
pub mod plan_io;
pub mod planner;
pub mod prep;
pub mod probe;
pub mod progress;
pub mod workdir;

pub use binder::{bind_images, list_images, Binding};
pub use command::{FfmpegCommand, FfmpegRunner, InputSpec};
pub use durations::{build_durations, quantize_durations};
pub use error::{MediaError, MediaResult};
pub use graph::{BoundaryKind, RenderGraph};
pub use planner::plan_cuts;
pub use probe::{probe_audio, AudioInfo};
pub use progress::FfmpegProgress;
pub use workdir::Workdir;
