//! Upload orchestration
//!
//! [`Uploader`] sequences complete logical uploads: a video body followed
//! by its cover frame, standalone photos, stories, and album batches. All
//! local checks (duration, parameters, album validation) run before the
//! first request goes out.

use futures::future::try_join_all;

use crate::config::Config;
use crate::container::video_duration_ms;
use crate::error::{Error, Result};
use crate::ids::UploadId;
use crate::params::{Dimensions, MediaKind, UploadSession};
use crate::source::MediaSource;
use crate::traits::{SessionStore, Transport};

use super::album::{AlbumItem, validate_album};
use super::legacy::LegacyUploader;
use super::resumable::ResumableUploader;
use super::types::{AlbumItemResult, BatchOutcome, UploadResult};

/// File name prefix of cover frames on the legacy path
pub const COVER_PHOTO_PREFIX: &str = "cover_photo_";

/// Options for a legacy photo upload
#[derive(Debug, Clone, Default)]
pub struct PhotoOptions {
    /// Attach to this upload id instead of predicting a new one
    pub upload_id: Option<UploadId>,
    /// File name prefix; defaults to `pending_media_`
    pub name_prefix: Option<String>,
    pub album: bool,
}

/// Options for a resumable photo upload
#[derive(Debug, Clone, Default)]
pub struct ResumablePhotoOptions {
    pub upload_id: Option<UploadId>,
    /// `media_type` override (`1` bare photo, `2` video cover)
    pub media_type: Option<u8>,
}

/// Options for a video upload
#[derive(Debug, Clone, Default)]
pub struct VideoOptions {
    pub dimensions: Option<Dimensions>,
    /// Album member on the legacy path; story on the resumable path
    pub album: bool,
}

/// Orchestrates uploads over a transport and a session
pub struct Uploader<T, S> {
    transport: T,
    session: S,
    config: Config,
}

impl<T: Transport, S: SessionStore> Uploader<T, S> {
    pub fn new(transport: T, session: S, config: Config) -> Self {
        Self {
            transport,
            session,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn legacy(&self) -> LegacyUploader<'_, T, S> {
        LegacyUploader::new(&self.transport, &self.session, &self.config)
    }

    fn resumable(&self) -> ResumableUploader<'_, T> {
        ResumableUploader::new(&self.transport, &self.config)
    }

    /// Inspect the container and enforce the duration limit
    pub fn check_video_duration(&self, video: &MediaSource) -> Result<f64> {
        let duration_ms = video_duration_ms(video.bytes())?;
        let max_ms = self.config.max_video_duration_ms;
        if duration_ms > max_ms as f64 {
            return Err(Error::MediaTooLong {
                duration_ms,
                max_ms,
            });
        }
        Ok(duration_ms)
    }

    /// Legacy multipart photo upload
    pub async fn upload_photo(
        &self,
        photo: &MediaSource,
        options: PhotoOptions,
    ) -> Result<UploadResult> {
        let reuse = options.upload_id.is_some();
        let upload_id = options.upload_id.unwrap_or_else(UploadId::predict);
        let upload = UploadSession::photo(upload_id)
            .with_album(options.album)
            .with_reuse(reuse);
        self.legacy_photo(photo, &upload, options.name_prefix.as_deref())
            .await
    }

    async fn legacy_photo(
        &self,
        photo: &MediaSource,
        upload: &UploadSession,
        name_prefix: Option<&str>,
    ) -> Result<UploadResult> {
        let upload_id = self.legacy().upload_photo(photo, upload, name_prefix).await?;
        Ok(UploadResult::photo(upload_id))
    }

    /// Legacy video upload: body via chunks, then the cover frame
    pub async fn upload_video(
        &self,
        video: &MediaSource,
        cover: &MediaSource,
        options: VideoOptions,
    ) -> Result<UploadResult> {
        self.legacy_video(video, cover, UploadId::predict(), options)
            .await
    }

    async fn legacy_video(
        &self,
        video: &MediaSource,
        cover: &MediaSource,
        upload_id: UploadId,
        options: VideoOptions,
    ) -> Result<UploadResult> {
        let duration_ms = self.check_video_duration(video)?;
        let upload = UploadSession::video(upload_id, duration_ms)
            .with_album(options.album)
            .with_dimensions(options.dimensions);

        let transfer = self.legacy().upload_video_body(video, &upload).await?;

        // Only completion matters; a failed cover fails the whole upload
        let cover_session = UploadSession::photo(transfer.upload_id.clone())
            .with_album(options.album)
            .with_reuse(true);
        self.legacy()
            .upload_photo(cover, &cover_session, Some(COVER_PHOTO_PREFIX))
            .await?;

        Ok(UploadResult {
            upload_id: transfer.upload_id,
            duration_ms: Some(duration_ms),
            delay_ms: transfer.delay_ms,
        })
    }

    /// Resumable video upload: body, then the cover frame under the same id
    pub async fn upload_video_resumable(
        &self,
        video: &MediaSource,
        cover: &MediaSource,
        options: VideoOptions,
    ) -> Result<UploadResult> {
        let duration_ms = self.check_video_duration(video)?;
        let upload_id = UploadId::predict();
        let upload = UploadSession::video(upload_id.clone(), duration_ms)
            .with_album(options.album)
            .with_dimensions(options.dimensions);
        let cover_session = UploadSession::photo(upload_id.clone()).with_reuse(true);
        // Fail on bad parameters before the body goes out
        cover_session.rupload_params()?;

        self.resumable().upload(video, &upload).await?;
        self.resumable().upload(cover, &cover_session).await?;

        Ok(UploadResult {
            upload_id,
            duration_ms: Some(duration_ms),
            delay_ms: None,
        })
    }

    /// Story video: resumable upload with the body marked `for_album`
    pub async fn upload_story_video(
        &self,
        video: &MediaSource,
        cover: &MediaSource,
        dimensions: Option<Dimensions>,
    ) -> Result<UploadResult> {
        self.upload_video_resumable(
            video,
            cover,
            VideoOptions {
                dimensions,
                album: true,
            },
        )
        .await
    }

    /// Single resumable photo sub-upload
    pub async fn upload_photo_resumable(
        &self,
        photo: &MediaSource,
        options: ResumablePhotoOptions,
    ) -> Result<UploadResult> {
        let reuse = options.upload_id.is_some();
        let upload_id = options.upload_id.unwrap_or_else(UploadId::predict);
        let upload = UploadSession::photo(upload_id.clone())
            .with_reuse(reuse)
            .with_media_type(options.media_type);

        self.resumable().upload(photo, &upload).await?;
        Ok(UploadResult::photo(upload_id))
    }

    async fn upload_album_item(
        &self,
        index: usize,
        item: &AlbumItem,
        size: Dimensions,
        upload_id: UploadId,
    ) -> Result<AlbumItemResult> {
        let result = match item.kind {
            MediaKind::Photo => {
                let upload = UploadSession::photo(upload_id).with_album(true);
                self.legacy_photo(&item.data, &upload, None).await?
            }
            MediaKind::Video => {
                let thumbnail = item.thumbnail.as_ref().ok_or_else(|| {
                    Error::Validation(format!("Item {index}: thumbnail not specified"))
                })?;
                self.legacy_video(
                    &item.data,
                    thumbnail,
                    upload_id,
                    VideoOptions {
                        dimensions: Some(size),
                        album: true,
                    },
                )
                .await?
            }
        };

        tracing::debug!(index, kind = %item.kind, upload_id = %result.upload_id, "Album item uploaded");
        Ok(AlbumItemResult {
            index,
            kind: item.kind,
            size,
            result,
        })
    }

    /// Validate a batch, then upload every item concurrently
    ///
    /// The first failing item fails the batch and drops the sub-uploads
    /// still in flight.
    pub async fn upload_album(&self, items: &[AlbumItem]) -> BatchOutcome {
        let sizes = match validate_album(items) {
            Ok(sizes) => sizes,
            Err(e) => return BatchOutcome::Failed(e),
        };

        // Local checks for every video before any request
        for (index, item) in items.iter().enumerate() {
            if item.kind == MediaKind::Video
                && let Err(e) = self.check_video_duration(&item.data)
            {
                tracing::debug!(index, error = %e, "Album item rejected");
                return BatchOutcome::Failed(e);
            }
        }

        // Items start within the same millisecond; each needs its own id
        let upload_ids = UploadId::predict_batch(items.len());

        tracing::info!(items = items.len(), "Uploading album");
        let uploads = items
            .iter()
            .zip(sizes)
            .zip(upload_ids)
            .enumerate()
            .map(|(index, ((item, size), upload_id))| {
                self.upload_album_item(index, item, size, upload_id)
            });

        try_join_all(uploads).await.into()
    }
}
