//! Upload protocols and orchestration
//!
//! - [`legacy`]: job request + ordered `Content-Range` chunks
//! - [`resumable`]: offset probe + transmit with bounded re-probing
//! - [`album`]: batch validation and manifests
//! - [`uploader`]: sequences full logical uploads

pub mod album;
pub mod legacy;
pub mod resumable;
pub mod types;
pub mod uploader;

#[cfg(test)]
pub(crate) mod testing;

pub use album::{AlbumItem, load_manifest, validate_album};
pub use legacy::{ChunkDescriptor, LegacyUploader, plan_chunks};
pub use resumable::{ResumableUploader, TransferState, entity_name, upload_url};
pub use types::{AlbumItemResult, BatchOutcome, UploadJob, UploadResult};
pub use uploader::{PhotoOptions, ResumablePhotoOptions, Uploader, VideoOptions};
