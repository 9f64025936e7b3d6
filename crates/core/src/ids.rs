//! Upload and transfer identifiers
//!
//! Upload ids are predicted on the client from the wall clock. Legacy
//! transfer session ids add nine random digits; they identify one chunked
//! transfer and carry no security weight, so a per-call non-cryptographic
//! generator is enough.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Client-predicted upload identifier shared by every sub-request of one
/// logical upload
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadId(String);

impl UploadId {
    /// Predict an id from the current epoch milliseconds
    pub fn predict() -> Self {
        Self(jiff::Timestamp::now().as_millisecond().to_string())
    }

    /// Predict `count` consecutive ids starting at the current millisecond
    pub fn predict_batch(count: usize) -> Vec<Self> {
        let base = jiff::Timestamp::now().as_millisecond();
        (0..count as i64)
            .map(|offset| Self((base + offset).to_string()))
            .collect()
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UploadId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Number of random digits in a legacy session id
pub const SESSION_ID_DIGITS: usize = 9;

/// Per-transfer id sent as `Session-ID` on legacy chunk uploads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(String);

impl SessionId {
    /// `<upload_id>-<9 random decimal digits>`
    pub fn generate<R: Rng + ?Sized>(upload_id: &UploadId, rng: &mut R) -> Self {
        let digits: String = (0..SESSION_ID_DIGITS)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect();
        Self(format!("{upload_id}-{digits}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Java-style 32-bit string hash (`h = 31 * h + c`, wrapping)
///
/// Disambiguates resumable entity names for the same upload id. Not an
/// integrity check.
pub fn filename_hash(name: &str) -> i32 {
    name.encode_utf16()
        .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(c as i32))
}
