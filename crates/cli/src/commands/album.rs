//! album command - Upload an album from a manifest
//!
//! The manifest is a JSON document:
//!
//! ```json
//! {"items": [
//!   {"type": "photo", "path": "a.jpg", "size": [1080, 1080]},
//!   {"type": "video", "path": "b.mp4", "size": [1080, 1080], "thumbnail": "b.jpg"}
//! ]}
//! ```

use std::path::PathBuf;

use clap::Args;
use comfy_table::{Table, presets::UTF8_FULL};
use humansize::{BINARY, format_size};
use mu_core::upload::load_manifest;
use mu_core::{AlbumItemResult, BatchOutcome};
use serde::Serialize;

use super::{get_uploader, report_error};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

#[derive(Args, Debug)]
pub struct AlbumArgs {
    /// Path to the album manifest
    pub manifest: PathBuf,
}

#[derive(Debug, Serialize)]
struct AlbumOutput {
    items: Vec<AlbumItemResult>,
}

pub async fn execute(args: AlbumArgs, formatter: &Formatter) -> ExitCode {
    let items = match load_manifest(&args.manifest).await {
        Ok(items) => items,
        Err(e) => return report_error(formatter, "Invalid album manifest", &e),
    };
    let uploader = match get_uploader(formatter) {
        Ok(uploader) => uploader,
        Err(code) => return code,
    };

    let total_bytes: usize = items.iter().map(|item| item.data.len()).sum();
    let spinner = formatter.spinner(&format!(
        "Uploading album of {} items ({})",
        items.len(),
        format_size(total_bytes, BINARY)
    ));
    let outcome = uploader.upload_album(&items).await;
    spinner.finish_and_clear();

    let results = match outcome {
        BatchOutcome::AllSucceeded(results) => results,
        BatchOutcome::Failed(e) => return report_error(formatter, "Album upload failed", &e),
    };

    if formatter.is_json() {
        formatter.json(&AlbumOutput { items: results });
        return ExitCode::Success;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Type", "Size", "Upload ID", "Duration"]);
    for item in &results {
        let duration = item
            .result
            .duration_ms
            .map(|ms| formatter.style_duration(&format!("{ms:.0} ms")))
            .unwrap_or_default();
        table.add_row(vec![
            item.index.to_string(),
            item.kind.to_string(),
            formatter.style_size(&format!("{}x{}", item.size.width, item.size.height)),
            formatter.style_name(item.result.upload_id.as_str()),
            duration,
        ]);
    }
    formatter.println(&table.to_string());
    formatter.success(&format!("Uploaded {} items", results.len()));
    ExitCode::Success
}
