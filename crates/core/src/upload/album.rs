//! Album (sidecar) batches
//!
//! A batch is validated as a whole before anything is uploaded: one bad
//! item rejects every item. The aspect ratio policy is a single tolerance
//! band, width/height within [`MIN_ASPECT_RATIO`, `MAX_ASPECT_RATIO`].

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::params::{Dimensions, MediaKind};
use crate::source::MediaSource;

pub const MIN_ALBUM_ITEMS: usize = 2;
pub const MAX_ALBUM_ITEMS: usize = 10;
pub const MIN_ASPECT_RATIO: f64 = 0.8;
pub const MAX_ASPECT_RATIO: f64 = 1.91;

/// One media item of an album
#[derive(Debug, Clone)]
pub struct AlbumItem {
    pub kind: MediaKind,
    pub data: MediaSource,
    /// Declared pixel size; required
    pub size: Option<Dimensions>,
    /// Cover frame; required for videos
    pub thumbnail: Option<MediaSource>,
}

impl AlbumItem {
    pub fn photo(data: MediaSource, size: Dimensions) -> Self {
        Self {
            kind: MediaKind::Photo,
            data,
            size: Some(size),
            thumbnail: None,
        }
    }

    pub fn video(data: MediaSource, size: Dimensions, thumbnail: MediaSource) -> Self {
        Self {
            kind: MediaKind::Video,
            data,
            size: Some(size),
            thumbnail: Some(thumbnail),
        }
    }

    fn validate(&self, index: usize) -> Result<Dimensions> {
        if self.data.is_empty() {
            return Err(Error::Validation(format!("Item {index}: data not specified")));
        }
        let size = self
            .size
            .ok_or_else(|| Error::Validation(format!("Item {index}: size not specified")))?;
        if self.kind == MediaKind::Video && self.thumbnail.as_ref().is_none_or(|t| t.is_empty()) {
            return Err(Error::Validation(format!(
                "Item {index}: thumbnail not specified"
            )));
        }
        match size.aspect_ratio() {
            Some(ratio) if (MIN_ASPECT_RATIO..=MAX_ASPECT_RATIO).contains(&ratio) => Ok(size),
            _ => Err(Error::Validation(format!(
                "Item {index}: invalid media aspect ratio {}x{}",
                size.width, size.height
            ))),
        }
    }
}

/// Validate a whole batch; no item is accepted unless all are
pub fn validate_album(items: &[AlbumItem]) -> Result<Vec<Dimensions>> {
    if !(MIN_ALBUM_ITEMS..=MAX_ALBUM_ITEMS).contains(&items.len()) {
        return Err(Error::Validation(format!(
            "Invalid album size {}: expected {MIN_ALBUM_ITEMS} to {MAX_ALBUM_ITEMS} items",
            items.len()
        )));
    }
    items
        .iter()
        .enumerate()
        .map(|(index, item)| item.validate(index))
        .collect()
}

/// Album manifest entry as written by users
#[derive(Debug, Deserialize)]
struct ManifestEntry {
    #[serde(rename = "type")]
    media_type: String,
    path: PathBuf,
    #[serde(default)]
    size: Option<[u32; 2]>,
    #[serde(default)]
    thumbnail: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    items: Vec<ManifestEntry>,
}

/// Load album items from a JSON manifest
///
/// Relative paths resolve against the manifest's directory. Structural
/// problems (unknown type) surface here; completeness checks are left to
/// [`validate_album`].
pub async fn load_manifest(path: impl AsRef<Path>) -> Result<Vec<AlbumItem>> {
    let path = path.as_ref();
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let content = tokio::fs::read_to_string(path).await?;
    let manifest: Manifest = serde_json::from_str(&content)?;

    let mut items = Vec::with_capacity(manifest.items.len());
    for (index, entry) in manifest.items.into_iter().enumerate() {
        let kind: MediaKind = entry.media_type.parse().map_err(|_| {
            Error::Validation(format!("Item {index}: invalid media type: {}", entry.media_type))
        })?;
        let data = MediaSource::from_path(base.join(&entry.path)).await?;
        let thumbnail = match entry.thumbnail {
            Some(thumb) => Some(MediaSource::from_path(base.join(thumb)).await?),
            None => None,
        };
        items.push(AlbumItem {
            kind,
            data,
            size: entry.size.map(|[w, h]| Dimensions::new(w, h)),
            thumbnail,
        });
    }
    Ok(items)
}
