//! Output formatting
//!
//! Human-readable or JSON output, selected by global flags.

mod formatter;

pub use formatter::Formatter;

/// Output settings shared by all commands
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Strict JSON output, no colors or progress
    pub json: bool,
    pub no_color: bool,
    /// Suppress everything but errors
    pub quiet: bool,
}
