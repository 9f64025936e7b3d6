//! inspect command - Read the duration of a video
//!
//! Runs the container inspector locally; nothing is sent.

use std::fmt;
use std::path::PathBuf;

use clap::Args;
use humansize::{BINARY, format_size};
use mu_core::container::MovieHeader;
use serde::Serialize;

use super::read_source;
use crate::exit_code::ExitCode;
use crate::output::Formatter;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to an MP4 file
    pub path: PathBuf,
}

#[derive(Debug, Serialize)]
struct InspectOutput {
    file: String,
    size_bytes: usize,
    size_human: String,
    timescale: u32,
    duration: u32,
    duration_ms: f64,
}

impl fmt::Display for InspectOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "File:      {}", self.file)?;
        writeln!(f, "Size:      {}", self.size_human)?;
        writeln!(f, "Timescale: {}", self.timescale)?;
        write!(f, "Duration:  {:.3} ms", self.duration_ms)
    }
}

pub async fn execute(args: InspectArgs, formatter: &Formatter) -> ExitCode {
    let source = match read_source(&args.path, formatter).await {
        Ok(source) => source,
        Err(code) => return code,
    };

    let header = match MovieHeader::parse(source.bytes()) {
        Ok(header) => header,
        Err(e) => return super::report_error(formatter, "Cannot inspect video", &e),
    };

    formatter.output(&InspectOutput {
        file: source.name().to_string(),
        size_bytes: source.len(),
        size_human: format_size(source.len(), BINARY),
        timescale: header.timescale,
        duration: header.duration,
        duration_ms: header.duration_ms(),
    });
    ExitCode::Success
}
