//! mu-core: Core library for the mediaup upload client
//!
//! This crate provides the upload engine, including:
//! - MP4 container inspection (video duration)
//! - Upload parameter building for the legacy and resumable protocols
//! - Legacy chunked and resumable offset uploaders
//! - Upload orchestration (video + cover, stories, albums)
//! - Configuration and retry policy
//!
//! Network access goes through the [`Transport`] trait, so this crate is
//! independent of any HTTP client and easy to test.

pub mod config;
pub mod container;
pub mod error;
pub mod ids;
pub mod params;
pub mod retry;
pub mod source;
pub mod traits;
pub mod upload;

pub use config::{Config, ConfigManager, RetryConfig};
pub use container::video_duration_ms;
pub use error::{Error, Result};
pub use ids::{SessionId, UploadId};
pub use params::{Dimensions, MediaKind, ParamSet, UploadSession};
pub use retry::{RetryBuilder, is_retryable_error, retry_with_backoff};
pub use source::MediaSource;
pub use traits::{Body, FilePart, Method, Request, Resource, SessionStore, Target, Transport};
pub use upload::{
    AlbumItem, AlbumItemResult, BatchOutcome, PhotoOptions, ResumablePhotoOptions, UploadResult,
    Uploader, VideoOptions,
};
