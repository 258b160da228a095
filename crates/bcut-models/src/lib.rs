//! Shared data models for the beatcut renderer.
//!
//! This crate provides Serde-serializable types for:
//! - Beat sets and beat preparation
//! - The period window and cut-selection strategies
//! - The xfade transition palette and render options
//! - Planning/render/overlay/image parameters and presets snapshots
//! - The plan document schema
//! - Encoding configuration

pub mod beats;
pub mod encoding;
pub mod options;
pub mod params;
pub mod plan;
pub mod strategy;
pub mod transition;
pub mod window;

// Re-export common types
pub use beats::{BeatSet, MIN_BEAT_GAP};
pub use encoding::EncodingConfig;
pub use options::{Alignment, CounterPosition, MaskScope, Quantize, RenderMode};
pub use params::{ImageParams, OverlayParams, Params, ParamsError, PlanParams, RenderParams};
pub use plan::{Cut, Plan, WindowUsed, PLAN_SCHEMA_VERSION};
pub use strategy::Strategy;
pub use transition::{MarkerStyle, Transition};
pub use window::PeriodWindow;
