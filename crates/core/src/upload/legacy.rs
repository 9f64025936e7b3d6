//! Legacy chunked upload protocol
//!
//! A video transfer first requests an upload job (URL + job token), then
//! sends the payload as an ordered list of byte ranges. Chunks go out one
//! at a time because the server may only accept a range after the previous
//! one. Failures propagate immediately; there is no retry layer here.

use bytes::Bytes;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::ids::{SessionId, UploadId};
use crate::params::UploadSession;
use crate::source::MediaSource;
use crate::traits::{Body, FilePart, Method, Request, Resource, SessionStore, Target, Transport};

use super::types::{ChunkResponse, PhotoUploadResponse, UploadJob, UploadJobResponse, decode};

/// File name prefix for photos uploaded without an explicit one
pub const DEFAULT_PHOTO_PREFIX: &str = "pending_media_";

/// One declared byte range of a chunked transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkDescriptor {
    pub payload: Bytes,
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl ChunkDescriptor {
    /// `bytes <start>-<end>/<total>`
    pub fn range_header(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }
}

/// Split a payload into the ranges to send
///
/// Only a single range covering the whole buffer is produced today.
pub fn plan_chunks(data: &Bytes) -> Result<Vec<ChunkDescriptor>> {
    if data.is_empty() {
        return Err(Error::Validation("Cannot upload an empty payload".into()));
    }
    let total = data.len() as u64;
    Ok(vec![ChunkDescriptor {
        payload: data.clone(),
        start: 0,
        end: total - 1,
        total,
    }])
}

/// Result of the legacy video body transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoTransfer {
    pub upload_id: UploadId,
    pub delay_ms: Option<u64>,
}

/// Legacy protocol client over a [`Transport`]
pub struct LegacyUploader<'a, T, S> {
    transport: &'a T,
    session: &'a S,
    config: &'a Config,
}

impl<'a, T: Transport, S: SessionStore> LegacyUploader<'a, T, S> {
    pub fn new(transport: &'a T, session: &'a S, config: &'a Config) -> Self {
        Self {
            transport,
            session,
            config,
        }
    }

    /// Upload a photo as a multipart form
    pub async fn upload_photo(
        &self,
        source: &MediaSource,
        upload: &UploadSession,
        name_prefix: Option<&str>,
    ) -> Result<UploadId> {
        let params = upload.legacy_params()?;
        let filename = format!(
            "{}{}.jpg",
            name_prefix.unwrap_or(DEFAULT_PHOTO_PREFIX),
            upload.upload_id
        );

        let request = Request::new(Method::Post, Target::Resource(Resource::UploadPhoto)).body(
            Body::Multipart {
                fields: params,
                file: FilePart {
                    field: "photo".to_string(),
                    filename,
                    content_type: "image/jpeg".to_string(),
                    data: source.bytes().clone(),
                },
            },
        );

        let response: PhotoUploadResponse =
            decode("photo upload", self.transport.send(request).await?)?;
        tracing::info!(upload_id = %response.upload_id, album = upload.album, "Photo uploaded");
        Ok(response.upload_id)
    }

    /// Request an upload job for a video
    pub async fn request_job(&self, upload: &UploadSession) -> Result<UploadJob> {
        let request = Request::new(Method::Post, Target::Resource(Resource::UploadVideo))
            .body(Body::Form(upload.legacy_params()?));

        let response: UploadJobResponse =
            decode("upload job", self.transport.send(request).await?)?;
        let job = UploadJob::try_from(response)?;
        tracing::debug!(upload_id = %job.upload_id, url = %job.upload_url, "Upload job acquired");
        Ok(job)
    }

    /// Build the request for one chunk
    ///
    /// `cookie` is the session id to attach explicitly; the job URL's host
    /// does not receive the session cookie from the transport.
    pub fn chunk_request(
        &self,
        job: &UploadJob,
        session_id: &SessionId,
        chunk: &ChunkDescriptor,
        cookie: Option<&str>,
    ) -> Request {
        let mut request = Request::new(Method::Post, Target::Url(job.upload_url.clone()))
            .header("job", &job.job)
            .header("Host", &self.config.legacy_upload_host)
            .header("Session-ID", session_id)
            .header("Content-Type", "application/octet-stream")
            .header("Content-Disposition", r#"attachment; filename="video.mov""#)
            .header("Content-Length", chunk.payload.len())
            .header("Content-Range", chunk.range_header());

        if let Some(id) = cookie {
            request = request.header("Cookie", format!("sessionid={id}"));
        }

        request.body(Body::Raw(chunk.payload.clone()))
    }

    /// Send the chunks strictly in order; returns the last chunk's response
    pub async fn send_chunks(
        &self,
        job: &UploadJob,
        session_id: &SessionId,
        chunks: &[ChunkDescriptor],
        album: bool,
    ) -> Result<ChunkResponse> {
        let mut last = None;

        for chunk in chunks {
            // Looked up per request, never cached
            let cookie = if album {
                Some(self.session.session_id().await?)
            } else {
                None
            };

            tracing::debug!(range = %chunk.range_header(), session_id = %session_id, "Sending chunk");
            let request = self.chunk_request(job, session_id, chunk, cookie.as_deref());
            let response: ChunkResponse = decode("chunk", self.transport.send(request).await?)?;
            last = Some(response);
        }

        last.ok_or_else(|| Error::Validation("No chunks to send".into()))
    }

    /// Request a job and transfer the whole video body
    pub async fn upload_video_body(
        &self,
        source: &MediaSource,
        upload: &UploadSession,
    ) -> Result<VideoTransfer> {
        let chunks = plan_chunks(source.bytes())?;
        let job = self.request_job(upload).await?;

        let mut rng = StdRng::from_os_rng();
        let session_id = SessionId::generate(&job.upload_id, &mut rng);

        let response = self
            .send_chunks(&job, &session_id, &chunks, upload.album)
            .await?;

        tracing::info!(
            upload_id = %job.upload_id,
            bytes = source.len(),
            delay_ms = ?response.configure_delay_ms,
            "Video body uploaded"
        );

        Ok(VideoTransfer {
            upload_id: job.upload_id,
            delay_ms: response.configure_delay_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{MockSessionStore, MockTransport};
    use crate::upload::testing::RecordingTransport;
    use serde_json::json;

    fn job() -> UploadJob {
        UploadJob {
            upload_id: UploadId::new("1000"),
            upload_url: "https://upload.example.com/video".to_string(),
            job: "job-token".to_string(),
        }
    }

    #[test]
    fn test_single_chunk_range() {
        let data = Bytes::from(vec![7u8; 500_000]);
        let chunks = plan_chunks(&data).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].range_header(), "bytes 0-499999/500000");
        assert_eq!(chunks[0].payload.len(), 500_000);
    }

    #[test]
    fn test_empty_payload_rejected() {
        assert!(matches!(
            plan_chunks(&Bytes::new()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_chunk_request_headers() {
        let transport = MockTransport::new();
        let session = MockSessionStore::new();
        let config = Config::default();
        let uploader = LegacyUploader::new(&transport, &session, &config);

        let data = Bytes::from(vec![0u8; 500_000]);
        let chunk = &plan_chunks(&data).unwrap()[0];
        let session_id = SessionId::generate(&UploadId::new("1000"), &mut rand::rng());
        let request = uploader.chunk_request(&job(), &session_id, chunk, None);

        assert_eq!(request.method, Method::Post);
        assert_eq!(
            request.target,
            Target::Url("https://upload.example.com/video".into())
        );
        assert_eq!(request.header_value("Content-Range"), Some("bytes 0-499999/500000"));
        assert_eq!(request.header_value("Content-Length"), Some("500000"));
        assert_eq!(request.header_value("job"), Some("job-token"));
        assert_eq!(request.header_value("Host"), Some("upload.instagram.com"));
        assert_eq!(request.header_value("Session-ID"), Some(session_id.as_str()));
        assert!(request.header_value("Cookie").is_none());
        assert_eq!(request.body.raw_len(), Some(500_000));
    }

    #[tokio::test]
    async fn test_album_chunk_attaches_cookie() {
        let transport = RecordingTransport::new(vec![Ok(json!({"configure_delay_ms": 12}))]);
        let mut session = MockSessionStore::new();
        session
            .expect_session_id()
            .times(1)
            .returning(|| Ok("sess-abc".to_string()));
        let config = Config::default();
        let uploader = LegacyUploader::new(&transport, &session, &config);

        let data = Bytes::from_static(b"0123456789");
        let chunks = plan_chunks(&data).unwrap();
        let session_id = SessionId::generate(&UploadId::new("1000"), &mut rand::rng());
        let response = uploader
            .send_chunks(&job(), &session_id, &chunks, true)
            .await
            .unwrap();

        assert_eq!(response.configure_delay_ms, Some(12));
        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].header_value("Cookie"), Some("sessionid=sess-abc"));
    }

    #[tokio::test]
    async fn test_chunk_failure_propagates_without_retry() {
        let transport = RecordingTransport::new(vec![
            Err(Error::Transport("HTTP 500".into())),
            Ok(json!({})),
        ]);
        let session = MockSessionStore::new();
        let config = Config::default();
        let uploader = LegacyUploader::new(&transport, &session, &config);

        let data = Bytes::from_static(b"abc");
        let chunks = plan_chunks(&data).unwrap();
        let session_id = SessionId::generate(&UploadId::new("1"), &mut rand::rng());
        let result = uploader.send_chunks(&job(), &session_id, &chunks, false).await;

        assert!(matches!(result, Err(Error::Transport(_))));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_chunks_sent_in_order() {
        let transport = RecordingTransport::new(vec![
            Ok(json!({})),
            Ok(json!({"configure_delay_ms": 5})),
        ]);
        let session = MockSessionStore::new();
        let config = Config::default();
        let uploader = LegacyUploader::new(&transport, &session, &config);

        let chunks = vec![
            ChunkDescriptor {
                payload: Bytes::from_static(b"ab"),
                start: 0,
                end: 1,
                total: 4,
            },
            ChunkDescriptor {
                payload: Bytes::from_static(b"cd"),
                start: 2,
                end: 3,
                total: 4,
            },
        ];
        let session_id = SessionId::generate(&UploadId::new("1"), &mut rand::rng());
        let response = uploader
            .send_chunks(&job(), &session_id, &chunks, false)
            .await
            .unwrap();

        assert_eq!(response.configure_delay_ms, Some(5));
        let ranges: Vec<_> = transport
            .requests()
            .iter()
            .map(|r| r.header_value("Content-Range").unwrap().to_string())
            .collect();
        assert_eq!(ranges, vec!["bytes 0-1/4", "bytes 2-3/4"]);
    }

    #[tokio::test]
    async fn test_photo_upload_multipart() {
        let transport = RecordingTransport::new(vec![Ok(json!({"upload_id": "555", "status": "ok"}))]);
        let session = MockSessionStore::new();
        let config = Config::default();
        let uploader = LegacyUploader::new(&transport, &session, &config);

        let source = MediaSource::from_bytes("me.jpg", vec![1u8; 10]);
        let upload = UploadSession::photo(UploadId::new("555"));
        let id = uploader
            .upload_photo(&source, &upload, Some("cover_photo_"))
            .await
            .unwrap();
        assert_eq!(id.as_str(), "555");

        let sent = transport.requests();
        assert_eq!(sent[0].target, Target::Resource(Resource::UploadPhoto));
        match &sent[0].body {
            Body::Multipart { fields, file } => {
                assert_eq!(fields.get("upload_id"), Some("555"));
                assert_eq!(file.field, "photo");
                assert_eq!(file.filename, "cover_photo_555.jpg");
                assert_eq!(file.content_type, "image/jpeg");
                assert_eq!(file.data.len(), 10);
            }
            other => panic!("unexpected body: {other:?}"),
        }
    }
}
