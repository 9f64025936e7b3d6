//! Upload parameter builder
//!
//! Turns an [`UploadSession`] into the exact parameter set each upload
//! protocol expects. Pure transformation, no I/O.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ids::UploadId;

/// Width and height used when a video does not declare its own
pub const DEFAULT_VIDEO_DIMENSION: u32 = 720;

/// Kind of media being uploaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    /// Path segment of the resumable endpoint (`rupload_ig<kind>`)
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
        }
    }

    /// Content type used when the file name gives no hint
    pub fn default_content_type(&self) -> &'static str {
        match self {
            MediaKind::Photo => "image/jpeg",
            MediaKind::Video => "video/mp4",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "photo" => Ok(MediaKind::Photo),
            "video" => Ok(MediaKind::Video),
            _ => Err(Error::InvalidConfiguration(format!("Invalid media type: {s}"))),
        }
    }
}

/// Pixel size of a media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height; `None` for a zero height
    pub fn aspect_ratio(&self) -> Option<f64> {
        (self.height != 0).then(|| self.width as f64 / self.height as f64)
    }
}

/// Image compression descriptor sent with every photo
#[derive(Debug, Serialize)]
struct ImageCompression {
    lib_name: &'static str,
    lib_version: &'static str,
    quality: &'static str,
}

const IMAGE_COMPRESSION: ImageCompression = ImageCompression {
    lib_name: "jt",
    lib_version: "1.3.0",
    quality: "92",
};

/// Retry counters reported to the resumable endpoint
#[derive(Debug, Serialize)]
struct RetryContext {
    num_step_auto_retry: u32,
    num_reupload: u32,
    num_step_manual_retry: u32,
}

const RETRY_CONTEXT: RetryContext = RetryContext {
    num_step_auto_retry: 0,
    num_reupload: 0,
    num_step_manual_retry: 0,
};

/// Parameter mapping sent as form fields (legacy) or as the JSON
/// `X-Instagram-Rupload-Params` header (resumable)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParamSet(BTreeMap<String, String>);

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl ToString) {
        self.0.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// JSON object encoding used by the resumable headers
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Everything needed to describe one sub-upload
///
/// Built once at the start of an upload call and not changed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadSession {
    pub upload_id: UploadId,
    pub kind: MediaKind,
    /// Part of an album (sidecar) or, on the resumable path, a story
    pub album: bool,
    /// Attaches to an upload id that already exists (e.g. a cover frame)
    pub reuse: bool,
    pub dimensions: Option<Dimensions>,
    pub duration_ms: Option<f64>,
    /// Explicit `media_type` for resumable photos
    pub media_type: Option<u8>,
}

impl UploadSession {
    pub fn photo(upload_id: UploadId) -> Self {
        Self {
            upload_id,
            kind: MediaKind::Photo,
            album: false,
            reuse: false,
            dimensions: None,
            duration_ms: None,
            media_type: None,
        }
    }

    pub fn video(upload_id: UploadId, duration_ms: f64) -> Self {
        Self {
            kind: MediaKind::Video,
            duration_ms: Some(duration_ms),
            ..Self::photo(upload_id)
        }
    }

    pub fn with_album(mut self, album: bool) -> Self {
        self.album = album;
        self
    }

    pub fn with_reuse(mut self, reuse: bool) -> Self {
        self.reuse = reuse;
        self
    }

    pub fn with_dimensions(mut self, dimensions: Option<Dimensions>) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_media_type(mut self, media_type: Option<u8>) -> Self {
        self.media_type = media_type;
        self
    }

    fn video_fields(&self, params: &mut ParamSet) -> Result<()> {
        let duration_ms = self.duration_ms.ok_or_else(|| {
            Error::InvalidConfiguration("video upload requires a duration".into())
        })?;
        let dims = self.dimensions.unwrap_or(Dimensions::new(
            DEFAULT_VIDEO_DIMENSION,
            DEFAULT_VIDEO_DIMENSION,
        ));
        params.insert("media_type", 2);
        params.insert("upload_media_duration_ms", duration_ms.floor() as u64);
        params.insert("upload_media_height", dims.height);
        params.insert("upload_media_width", dims.width);
        Ok(())
    }

    fn reject_media_type_override(&self) -> Result<()> {
        if self.kind == MediaKind::Video && self.media_type.is_some() {
            return Err(Error::InvalidConfiguration(
                "media_type override applies to photos only".into(),
            ));
        }
        Ok(())
    }

    /// Parameters for the legacy form-based endpoints
    pub fn legacy_params(&self) -> Result<ParamSet> {
        self.reject_media_type_override()?;
        let mut params = ParamSet::new();
        params.insert("upload_id", &self.upload_id);

        match self.kind {
            MediaKind::Photo => {
                params.insert("image_compression", serde_json::to_string(&IMAGE_COMPRESSION)?);
                if self.album {
                    params.insert("is_sidecar", 1);
                    if self.reuse {
                        params.insert("media_type", 2);
                    }
                }
            }
            // Album videos only declare membership
            MediaKind::Video if self.album => params.insert("is_sidecar", 1),
            MediaKind::Video => self.video_fields(&mut params)?,
        }

        Ok(params)
    }

    /// Parameters for the resumable `rupload` endpoints
    pub fn rupload_params(&self) -> Result<ParamSet> {
        self.reject_media_type_override()?;
        let mut params = ParamSet::new();
        params.insert("upload_id", &self.upload_id);
        params.insert("retry_context", serde_json::to_string(&RETRY_CONTEXT)?);
        params.insert("xsharing_user_ids", "[]");

        match self.kind {
            MediaKind::Photo => {
                params.insert("image_compression", serde_json::to_string(&IMAGE_COMPRESSION)?);
                params.insert("media_type", self.media_type.unwrap_or(2));
                if self.album {
                    params.insert("is_sidecar", 1);
                }
            }
            MediaKind::Video => {
                self.video_fields(&mut params)?;
                if self.album {
                    params.insert("for_album", 1);
                }
            }
        }

        Ok(params)
    }
}
