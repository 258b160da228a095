//! beatcut command-line frontend.

pub mod args;
pub mod exit;
pub mod pipeline;
pub mod presets;

pub use args::Cli;
pub use exit::exit_code_for;
pub use presets::{effective_params, Preset};
