//! Media byte sources
//!
//! A [`MediaSource`] is the payload of one upload: an immutable byte buffer
//! plus the logical file name it came from. The buffer is reference-counted
//! so retries and offset slicing never copy it.

use std::path::Path;

use bytes::Bytes;

use crate::error::{Error, Result};

/// Immutable media payload with its logical name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSource {
    name: String,
    data: Bytes,
}

impl MediaSource {
    /// Wrap an in-memory buffer
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk; the file name becomes the logical name
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::Validation(format!("Invalid media path: {}", path.display())))?
            .to_string();
        let data = tokio::fs::read(path).await?;
        tracing::debug!(path = %path.display(), size = data.len(), "Loaded media source");
        Ok(Self::from_bytes(name, data))
    }

    /// Base file name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lower-cased extension of the file name, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    /// Full payload
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    /// Payload starting at `offset`, without copying
    ///
    /// Returns `None` when the offset lies past the end of the buffer.
    pub fn suffix(&self, offset: u64) -> Option<Bytes> {
        let offset = usize::try_from(offset).ok()?;
        if offset > self.data.len() {
            return None;
        }
        Some(self.data.slice(offset..))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// MIME type guessed from the file name, falling back to `fallback`
    pub fn content_type(&self, fallback: &str) -> String {
        mime_guess::from_path(&self.name)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix() {
        let source = MediaSource::from_bytes("clip.mp4", vec![1u8, 2, 3, 4, 5]);
        assert_eq!(source.suffix(0).unwrap().as_ref(), &[1, 2, 3, 4, 5]);
        assert_eq!(source.suffix(3).unwrap().as_ref(), &[4, 5]);
        assert!(source.suffix(5).unwrap().is_empty());
        assert!(source.suffix(6).is_none());
    }

    #[test]
    fn test_extension_and_content_type() {
        let source = MediaSource::from_bytes("Cover.JPG", vec![0u8; 4]);
        assert_eq!(source.extension().as_deref(), Some("jpg"));
        assert_eq!(source.content_type("application/octet-stream"), "image/jpeg");

        let unknown = MediaSource::from_bytes("blob", vec![0u8; 4]);
        assert_eq!(unknown.extension(), None);
        assert_eq!(unknown.content_type("video/mp4"), "video/mp4");
    }

    #[tokio::test]
    async fn test_from_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, b"jpegdata").unwrap();

        let source = MediaSource::from_path(&path).await.unwrap();
        assert_eq!(source.name(), "photo.jpg");
        assert_eq!(source.len(), 8);
    }

    #[tokio::test]
    async fn test_from_missing_path() {
        let result = MediaSource::from_path("/nonexistent/clip.mp4").await;
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
