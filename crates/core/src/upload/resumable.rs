//! Resumable offset upload protocol
//!
//! Each sub-upload (one photo or one video body) cycles through
//! `Probe -> Transmit -> Done`. The probe asks the server how many bytes it
//! already holds; the transmit step sends the rest of the payload from that
//! offset. Any failure goes back to `Probe`, so bytes accepted by a broken
//! attempt are not sent twice. The cycle runs at most
//! `retry.max_attempts` times per sub-upload.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::ids::{UploadId, filename_hash};
use crate::params::{MediaKind, UploadSession};
use crate::retry::{is_retryable_error, retry_with_backoff};
use crate::source::MediaSource;
use crate::traits::{Body, Method, Request, Target, Transport};

use super::types::{OffsetProbeResponse, decode};

/// State of one resumable sub-upload attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Probe,
    Transmit { offset: u64 },
    Done,
}

/// Name identifying one resumable transfer: `<upload_id>_0_<hash>`
pub fn entity_name(upload_id: &UploadId, filename: &str) -> String {
    format!("{}_0_{}", upload_id, filename_hash(filename))
}

/// `https://<host>/rupload_ig<kind>/<entity name>`
pub fn upload_url(host: &str, kind: MediaKind, upload_id: &UploadId, filename: &str) -> String {
    format!(
        "https://{host}/rupload_ig{kind}/{}",
        entity_name(upload_id, filename)
    )
}

/// Mark a probe body that reports an offset as successful
///
/// Runs before the transport's generic status check.
pub fn normalize_offset_probe(body: &mut serde_json::Value) {
    if let Some(map) = body.as_object_mut()
        && map.contains_key("offset")
    {
        map.insert("status".to_string(), serde_json::Value::from("ok"));
    }
}

/// Everything one sub-upload sends, computed once before the first attempt
#[derive(Debug, Clone)]
struct TransferPlan {
    kind: MediaKind,
    url: String,
    entity_name: String,
    entity_type: String,
    rupload_params: String,
}

/// Resumable protocol client over a [`Transport`]
pub struct ResumableUploader<'a, T> {
    transport: &'a T,
    config: &'a Config,
}

impl<'a, T: Transport> ResumableUploader<'a, T> {
    pub fn new(transport: &'a T, config: &'a Config) -> Self {
        Self { transport, config }
    }

    fn plan(&self, source: &MediaSource, upload: &UploadSession) -> Result<TransferPlan> {
        let params = upload.rupload_params()?;
        Ok(TransferPlan {
            kind: upload.kind,
            url: upload_url(
                &self.config.rupload_host,
                upload.kind,
                &upload.upload_id,
                source.name(),
            ),
            entity_name: entity_name(&upload.upload_id, source.name()),
            entity_type: source.content_type(upload.kind.default_content_type()),
            rupload_params: params.to_json()?,
        })
    }

    /// Ask the server how many bytes it already has
    async fn probe(&self, plan: &TransferPlan) -> Result<u64> {
        let request = Request::new(Method::Get, Target::Url(plan.url.clone()))
            .header("X-Instagram-Rupload-Params", &plan.rupload_params)
            .header("X-Entity-Name", &plan.entity_name)
            .header("X-FB-HTTP-Engine", "Liger")
            .without_header("Content-Type")
            .rewrite(normalize_offset_probe);

        let body = self
            .transport
            .send(request)
            .await
            .map_err(|e| Error::Transmission(format!("offset probe failed: {e}")))?;
        let response: OffsetProbeResponse = decode("offset probe", body)
            .map_err(|e| Error::Transmission(e.to_string()))?;
        Ok(response.offset)
    }

    /// Send the payload from `offset` to the end
    async fn transmit(&self, plan: &TransferPlan, source: &MediaSource, offset: u64) -> Result<()> {
        let body = source.suffix(offset).ok_or_else(|| {
            Error::Transmission(format!(
                "server offset {offset} exceeds payload length {}",
                source.len()
            ))
        })?;

        let request = Request::new(Method::Post, Target::Url(plan.url.clone()))
            .header("X-Instagram-Rupload-Params", &plan.rupload_params)
            .header("X-Entity-Name", &plan.entity_name)
            .header("X-Entity-Length", source.len())
            .header("X-Entity-Type", &plan.entity_type)
            .header("X-FB-HTTP-Engine", "Liger")
            .header("Offset", offset)
            .header("Content-Type", "application/octet-stream")
            .body(Body::Raw(body));

        self.transport
            .send(request)
            .await
            .map_err(|e| Error::Transmission(format!("transmit from offset {offset} failed: {e}")))?;
        Ok(())
    }

    /// One probe+transmit cycle
    async fn attempt(&self, plan: &TransferPlan, source: &MediaSource, attempt: u32) -> Result<()> {
        let mut state = TransferState::Probe;
        loop {
            tracing::trace!(attempt, state = ?state, kind = %plan.kind, "Resumable transfer step");
            state = match state {
                TransferState::Probe => TransferState::Transmit {
                    offset: self.probe(plan).await?,
                },
                TransferState::Transmit { offset } => {
                    tracing::debug!(attempt, offset, total = source.len(), "Transmitting remainder");
                    self.transmit(plan, source, offset).await?;
                    TransferState::Done
                }
                TransferState::Done => return Ok(()),
            };
        }
    }

    /// Upload one photo or video body, re-probing after each failure
    pub async fn upload(&self, source: &MediaSource, upload: &UploadSession) -> Result<()> {
        let plan = self.plan(source, upload)?;
        let retry = &self.config.retry;

        let result = retry_with_backoff(
            retry,
            |attempt| {
                let plan = &plan;
                async move {
                    let outcome = self.attempt(plan, source, attempt).await;
                    if let Err(e) = &outcome {
                        tracing::warn!(attempt, kind = %plan.kind, error = %e, "Resumable attempt failed");
                    }
                    outcome
                }
            },
            is_retryable_error,
        )
        .await;

        match result {
            Ok(()) => {
                tracing::info!(
                    upload_id = %upload.upload_id,
                    kind = %upload.kind,
                    bytes = source.len(),
                    "Resumable upload complete"
                );
                Ok(())
            }
            Err(e) if e.is_retryable() => Err(Error::RetriesExhausted {
                kind: upload.kind,
                attempts: retry.max_attempts,
                last_error: e.to_string(),
            }),
            Err(e) => Err(e),
        }
    }
}
