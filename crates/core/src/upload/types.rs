//! Upload result records and typed endpoint responses
//!
//! Every endpoint response is decoded into an explicit struct. A body that
//! lacks a required field fails decoding instead of producing a partial
//! record.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::ids::UploadId;
use crate::params::{Dimensions, MediaKind};

/// Outcome of one logical upload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadResult {
    #[serde(rename = "uploadId")]
    pub upload_id: UploadId,

    /// Video duration; absent for photos
    #[serde(rename = "durationms", skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,

    /// Post-processing delay reported by the legacy video endpoint
    #[serde(rename = "delay", skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

impl UploadResult {
    pub fn photo(upload_id: UploadId) -> Self {
        Self {
            upload_id,
            duration_ms: None,
            delay_ms: None,
        }
    }
}

/// One album item's result, merged with the item's declared metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlbumItemResult {
    /// Position of the item in the submitted batch
    pub index: usize,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub size: Dimensions,
    #[serde(flatten)]
    pub result: UploadResult,
}

/// Aggregated result of an album fan-out
///
/// There is no partial success: either every item uploaded, or the batch
/// failed with the first error observed. Items already uploaded when a
/// sibling fails are not rolled back.
#[derive(Debug)]
pub enum BatchOutcome {
    AllSucceeded(Vec<AlbumItemResult>),
    Failed(Error),
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BatchOutcome::AllSucceeded(_))
    }

    pub fn into_result(self) -> Result<Vec<AlbumItemResult>> {
        match self {
            BatchOutcome::AllSucceeded(results) => Ok(results),
            BatchOutcome::Failed(err) => Err(err),
        }
    }
}

impl From<Result<Vec<AlbumItemResult>>> for BatchOutcome {
    fn from(result: Result<Vec<AlbumItemResult>>) -> Self {
        match result {
            Ok(results) => BatchOutcome::AllSucceeded(results),
            Err(err) => BatchOutcome::Failed(err),
        }
    }
}

/// Accept upload ids sent either as JSON strings or numbers
fn upload_id_from_any<'de, D>(deserializer: D) -> std::result::Result<UploadId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(u64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => UploadId::new(s),
        StringOrNumber::Number(n) => UploadId::new(n.to_string()),
    })
}

/// Upload URL and job token for a legacy video transfer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VideoUploadUrl {
    pub url: String,
    pub job: String,
}

/// Response of the legacy video upload-job request
#[derive(Debug, Clone, Deserialize)]
pub struct UploadJobResponse {
    #[serde(deserialize_with = "upload_id_from_any")]
    pub upload_id: UploadId,
    pub video_upload_urls: Vec<VideoUploadUrl>,
}

/// Upload job extracted from [`UploadJobResponse`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadJob {
    pub upload_id: UploadId,
    pub upload_url: String,
    pub job: String,
}

impl TryFrom<UploadJobResponse> for UploadJob {
    type Error = Error;

    fn try_from(response: UploadJobResponse) -> Result<Self> {
        let first = response.video_upload_urls.into_iter().next().ok_or_else(|| {
            Error::Transport("upload job response has no video_upload_urls".into())
        })?;
        Ok(Self {
            upload_id: response.upload_id,
            upload_url: first.url,
            job: first.job,
        })
    }
}

/// Response of one legacy chunk transfer
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkResponse {
    #[serde(default)]
    pub configure_delay_ms: Option<u64>,
}

/// Response of the legacy photo upload
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoUploadResponse {
    #[serde(deserialize_with = "upload_id_from_any")]
    pub upload_id: UploadId,
}

/// Response of a resumable offset probe
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OffsetProbeResponse {
    pub offset: u64,
}

/// Decode a JSON body into a typed response
pub fn decode<T: serde::de::DeserializeOwned>(endpoint: &str, body: serde_json::Value) -> Result<T> {
    serde_json::from_value(body)
        .map_err(|e| Error::Transport(format!("unexpected {endpoint} response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upload_job_from_response() {
        let body = json!({
            "upload_id": 1234,
            "video_upload_urls": [
                {"url": "https://upload.example.com/a", "job": "job-1", "expires": 1},
                {"url": "https://upload.example.com/b", "job": "job-2"}
            ],
            "status": "ok"
        });
        let response: UploadJobResponse = decode("upload job", body).unwrap();
        let job = UploadJob::try_from(response).unwrap();
        assert_eq!(job.upload_id.as_str(), "1234");
        assert_eq!(job.upload_url, "https://upload.example.com/a");
        assert_eq!(job.job, "job-1");
    }

    #[test]
    fn test_upload_job_without_urls() {
        let body = json!({"upload_id": "1", "video_upload_urls": []});
        let response: UploadJobResponse = decode("upload job", body).unwrap();
        assert!(matches!(UploadJob::try_from(response), Err(Error::Transport(_))));
    }

    #[test]
    fn test_missing_required_field() {
        let body = json!({"video_upload_urls": []});
        let result: Result<UploadJobResponse> = decode("upload job", body);
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[test]
    fn test_upload_result_json_shape() {
        let result = UploadResult {
            upload_id: UploadId::new("99"),
            duration_ms: Some(5000.0),
            delay_ms: Some(3),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value, json!({"uploadId": "99", "durationms": 5000.0, "delay": 3}));

        let photo = serde_json::to_value(UploadResult::photo(UploadId::new("1"))).unwrap();
        assert_eq!(photo, json!({"uploadId": "1"}));
    }

    #[test]
    fn test_batch_outcome() {
        let ok: BatchOutcome = Ok(vec![]).into();
        assert!(ok.is_success());
        let failed: BatchOutcome = Err(Error::Validation("x".into())).into();
        assert!(!failed.is_success());
        assert!(failed.into_result().is_err());
    }
}
