//! video command - Upload a video and its cover frame
//!
//! The legacy path sends the body in `Content-Range` chunks; `--resumable`
//! and `--story` use offset negotiation instead.

use std::fmt;
use std::path::PathBuf;

use clap::Args;
use humansize::{BINARY, format_size};
use mu_core::{Dimensions, UploadResult, VideoOptions};
use serde::Serialize;

use super::{get_uploader, read_source, report_error};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

#[derive(Args, Debug)]
pub struct VideoArgs {
    /// Path to the MP4 video
    pub path: PathBuf,

    /// Cover frame (JPEG)
    #[arg(long)]
    pub cover: PathBuf,

    /// Video width in pixels
    #[arg(long, requires = "height")]
    pub width: Option<u32>,

    /// Video height in pixels
    #[arg(long, requires = "width")]
    pub height: Option<u32>,

    /// Use the resumable protocol
    #[arg(long)]
    pub resumable: bool,

    /// Upload as a story video (resumable)
    #[arg(long)]
    pub story: bool,
}

#[derive(Debug, Serialize)]
struct VideoOutput {
    file: String,
    size_bytes: usize,
    protocol: &'static str,
    #[serde(flatten)]
    result: UploadResult,
}

impl fmt::Display for VideoOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Uploaded {} ({}) as {}",
            self.file,
            format_size(self.size_bytes, BINARY),
            self.result.upload_id
        )?;
        if let Some(duration_ms) = self.result.duration_ms {
            write!(f, ", {duration_ms:.0} ms")?;
        }
        if let Some(delay_ms) = self.result.delay_ms {
            write!(f, ", configure after {delay_ms} ms")?;
        }
        Ok(())
    }
}

pub async fn execute(args: VideoArgs, formatter: &Formatter) -> ExitCode {
    let video = match read_source(&args.path, formatter).await {
        Ok(video) => video,
        Err(code) => return code,
    };
    let cover = match read_source(&args.cover, formatter).await {
        Ok(cover) => cover,
        Err(code) => return code,
    };
    let uploader = match get_uploader(formatter) {
        Ok(uploader) => uploader,
        Err(code) => return code,
    };
    let dimensions = args.width.zip(args.height).map(|(w, h)| Dimensions::new(w, h));

    let spinner = formatter.spinner(&format!("Uploading {}", video.name()));
    let (protocol, result) = if args.story {
        (
            "resumable",
            uploader.upload_story_video(&video, &cover, dimensions).await,
        )
    } else if args.resumable {
        let options = VideoOptions {
            dimensions,
            album: false,
        };
        (
            "resumable",
            uploader.upload_video_resumable(&video, &cover, options).await,
        )
    } else {
        let options = VideoOptions {
            dimensions,
            album: false,
        };
        (
            "legacy",
            uploader.upload_video(&video, &cover, options).await,
        )
    };
    spinner.finish_and_clear();

    match result {
        Ok(result) => {
            formatter.output(&VideoOutput {
                file: video.name().to_string(),
                size_bytes: video.len(),
                protocol,
                result,
            });
            ExitCode::Success
        }
        Err(e) => report_error(formatter, "Video upload failed", &e),
    }
}
