//! Collaborator traits
//!
//! The upload engine never talks to the network directly. It describes each
//! request as a [`Request`] and hands it to a [`Transport`]; authentication
//! comes from a [`SessionStore`]. This keeps the engine independent of any
//! HTTP client and lets tests substitute recording fakes.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::params::ParamSet;

/// HTTP method of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// Named endpoints resolved by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    UploadPhoto,
    UploadVideo,
}

impl Resource {
    /// Path relative to the API base
    pub fn path(&self) -> &'static str {
        match self {
            Resource::UploadPhoto => "upload/photo/",
            Resource::UploadVideo => "upload/video/",
        }
    }
}

/// Where a request goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Logical resource; the transport owns the base URL and attaches the
    /// session cookie itself
    Resource(Resource),
    /// Absolute URL; the transport attaches the session cookie only for the
    /// API and resumable upload hosts
    Url(String),
}

/// File part of a multipart body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Request body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Body {
    #[default]
    Empty,
    /// `application/x-www-form-urlencoded` fields
    Form(ParamSet),
    /// Form fields plus one file part
    Multipart { fields: ParamSet, file: FilePart },
    /// Raw bytes
    Raw(Bytes),
}

impl Body {
    /// Size of the payload this body carries, if it is a byte body
    pub fn raw_len(&self) -> Option<usize> {
        match self {
            Body::Raw(data) => Some(data.len()),
            _ => None,
        }
    }
}

/// Rewrites a parsed JSON body before the transport checks it for errors
pub type ResponseRewrite = fn(&mut serde_json::Value);

/// One request handed to a [`Transport`]
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub target: Target,
    pub headers: Vec<(String, String)>,
    /// Default transport headers to drop for this request only
    pub remove_headers: Vec<String>,
    pub body: Body,
    pub rewrite: Option<ResponseRewrite>,
}

impl Request {
    pub fn new(method: Method, target: Target) -> Self {
        Self {
            method,
            target,
            headers: Vec::new(),
            remove_headers: Vec::new(),
            body: Body::Empty,
            rewrite: None,
        }
    }

    pub fn header(mut self, name: &str, value: impl ToString) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn without_header(mut self, name: &str) -> Self {
        self.remove_headers.push(name.to_string());
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn rewrite(mut self, rewrite: ResponseRewrite) -> Self {
        self.rewrite = Some(rewrite);
        self
    }

    /// Case-insensitive header lookup
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Sends requests and returns parsed JSON bodies
///
/// Implementations must fail with [`crate::Error::Transport`] on non-2xx
/// responses, unparsable bodies, and bodies reporting `"status": "fail"`
/// after the request's rewrite hook ran.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<serde_json::Value>;
}

/// Access to the authenticated session
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Current `sessionid` cookie value; may perform I/O
    async fn session_id(&self) -> Result<String>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: Request) -> Result<serde_json::Value> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<S: SessionStore + ?Sized> SessionStore for std::sync::Arc<S> {
    async fn session_id(&self) -> Result<String> {
        (**self).session_id().await
    }
}
