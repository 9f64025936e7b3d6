//! photo command - Upload a single photo

use std::fmt;
use std::path::PathBuf;

use clap::Args;
use humansize::{BINARY, format_size};
use mu_core::{PhotoOptions, ResumablePhotoOptions, UploadId, UploadResult};
use serde::Serialize;

use super::{get_uploader, read_source, report_error};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

#[derive(Args, Debug)]
pub struct PhotoArgs {
    /// Path to the photo
    pub path: PathBuf,

    /// Attach to an existing upload id
    #[arg(long)]
    pub upload_id: Option<String>,

    /// Use the resumable protocol
    #[arg(long)]
    pub resumable: bool,

    /// `media_type` override (resumable only)
    #[arg(long, requires = "resumable")]
    pub media_type: Option<u8>,
}

#[derive(Debug, Serialize)]
struct PhotoOutput {
    file: String,
    size_bytes: usize,
    #[serde(flatten)]
    result: UploadResult,
}

impl fmt::Display for PhotoOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Uploaded {} ({}) as {}",
            self.file,
            format_size(self.size_bytes, BINARY),
            self.result.upload_id
        )
    }
}

pub async fn execute(args: PhotoArgs, formatter: &Formatter) -> ExitCode {
    let photo = match read_source(&args.path, formatter).await {
        Ok(photo) => photo,
        Err(code) => return code,
    };
    let uploader = match get_uploader(formatter) {
        Ok(uploader) => uploader,
        Err(code) => return code,
    };
    let upload_id = args.upload_id.as_deref().map(UploadId::from);

    let spinner = formatter.spinner(&format!("Uploading {}", photo.name()));
    let result = if args.resumable {
        uploader
            .upload_photo_resumable(
                &photo,
                ResumablePhotoOptions {
                    upload_id,
                    media_type: args.media_type,
                },
            )
            .await
    } else {
        uploader
            .upload_photo(
                &photo,
                PhotoOptions {
                    upload_id,
                    ..Default::default()
                },
            )
            .await
    };
    spinner.finish_and_clear();

    match result {
        Ok(result) => {
            formatter.output(&PhotoOutput {
                file: photo.name().to_string(),
                size_bytes: photo.len(),
                result,
            });
            ExitCode::Success
        }
        Err(e) => report_error(formatter, "Photo upload failed", &e),
    }
}
