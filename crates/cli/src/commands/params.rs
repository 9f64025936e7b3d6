//! params command - Preview upload parameters
//!
//! Builds the exact parameter set an upload would send, without touching
//! the network. Useful for checking album, reuse, and story flags.

use clap::{Args, ValueEnum};
use comfy_table::{Table, presets::UTF8_FULL};
use mu_core::{Dimensions, MediaKind, ParamSet, UploadId, UploadSession};
use serde::Serialize;

use super::report_error;
use crate::exit_code::ExitCode;
use crate::output::Formatter;

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum KindArg {
    Photo,
    Video,
}

impl From<KindArg> for MediaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Photo => MediaKind::Photo,
            KindArg::Video => MediaKind::Video,
        }
    }
}

#[derive(Args, Debug)]
pub struct ParamsArgs {
    /// Media kind
    #[arg(value_enum)]
    pub kind: KindArg,

    /// Upload id to use (default: predicted from the clock)
    #[arg(long)]
    pub upload_id: Option<String>,

    /// Mark as an album member
    #[arg(long)]
    pub album: bool,

    /// The upload id is shared with another sub-upload
    #[arg(long)]
    pub reuse: bool,

    /// Video duration in milliseconds
    #[arg(long, default_value_t = 0.0)]
    pub duration_ms: f64,

    /// Video width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Video height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Show the resumable header parameters instead of legacy form fields
    #[arg(long)]
    pub resumable: bool,

    /// `media_type` override for resumable photos
    #[arg(long)]
    pub media_type: Option<u8>,

    /// Story video (resumable, implies --album)
    #[arg(long)]
    pub story: bool,
}

#[derive(Debug, Serialize)]
struct ParamsOutput {
    protocol: &'static str,
    kind: MediaKind,
    params: ParamSet,
}

/// Turn arguments into the session they describe
fn session_from_args(args: &ParamsArgs) -> UploadSession {
    let upload_id = args
        .upload_id
        .as_deref()
        .map(UploadId::from)
        .unwrap_or_else(UploadId::predict);
    let dimensions = match (args.width, args.height) {
        (Some(width), Some(height)) => Some(Dimensions::new(width, height)),
        _ => None,
    };
    let session = match MediaKind::from(args.kind) {
        MediaKind::Photo => UploadSession::photo(upload_id),
        MediaKind::Video => UploadSession::video(upload_id, args.duration_ms),
    };
    session
        .with_album(args.album || args.story)
        .with_reuse(args.reuse)
        .with_dimensions(dimensions)
        .with_media_type(args.media_type)
}

pub fn execute(args: ParamsArgs, formatter: &Formatter) -> ExitCode {
    let resumable = args.resumable || args.story;
    let session = session_from_args(&args);
    let params = if resumable {
        session.rupload_params()
    } else {
        session.legacy_params()
    };
    let params = match params {
        Ok(params) => params,
        Err(e) => return report_error(formatter, "Invalid parameters", &e),
    };

    if formatter.is_json() {
        formatter.json(&ParamsOutput {
            protocol: if resumable { "resumable" } else { "legacy" },
            kind: session.kind,
            params,
        });
        return ExitCode::Success;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Parameter", "Value"]);
    for (key, value) in params.iter() {
        table.add_row(vec![formatter.style_key(key), value.to_string()]);
    }
    formatter.println(&table.to_string());
    ExitCode::Success
}
