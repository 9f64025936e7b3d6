//! HTTP transport implementation
//!
//! Wraps reqwest and implements the Transport trait from mu-core.

use std::sync::Arc;

use async_trait::async_trait;
use mu_core::{Body, Config, Error, Method, Request, Result, SessionStore, Target, Transport};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use url::Url;

/// Headers sent with every request unless a request removes or overrides them
const DEFAULT_HEADERS: &[(&str, &str)] = &[
    ("Accept", "*/*"),
    ("Accept-Language", "en-US"),
    ("X-IG-Capabilities", "3brTvw=="),
    ("X-IG-Connection-Type", "WIFI"),
];

/// reqwest-backed transport
pub struct HttpTransport {
    inner: reqwest::Client,
    api_base: Url,
    user_agent: String,
    /// Hosts that receive the session cookie
    session_hosts: Vec<String>,
    session: Arc<dyn SessionStore>,
}

impl HttpTransport {
    /// Create a transport from the configuration
    pub fn new(config: &Config, session: Arc<dyn SessionStore>) -> Result<Self> {
        // Url::join replaces the last segment unless the base ends with '/'
        let mut base = config.api_base.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let api_base = Url::parse(&base)
            .map_err(|e| Error::Config(format!("Invalid api_base '{}': {e}", config.api_base)))?;

        let inner = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Network(format!("Failed to build HTTP client: {e}")))?;

        let session_hosts = api_base
            .host_str()
            .into_iter()
            .chain([config.rupload_host.as_str()])
            .map(str::to_ascii_lowercase)
            .collect();

        Ok(Self {
            inner,
            api_base,
            user_agent: config.user_agent.clone(),
            session_hosts,
            session,
        })
    }

    /// Absolute URL of a request target
    pub fn resolve(&self, target: &Target) -> Result<Url> {
        match target {
            Target::Resource(resource) => self
                .api_base
                .join(resource.path())
                .map_err(|e| Error::Config(format!("Cannot resolve {resource:?}: {e}"))),
            Target::Url(url) => {
                Url::parse(url).map_err(|e| Error::Transport(format!("Invalid URL '{url}': {e}")))
            }
        }
    }

    /// Whether requests to `url` carry the session cookie
    ///
    /// Covers named resources and the resumable upload host. Other absolute
    /// URLs only get a cookie the request sets itself.
    pub fn carries_session(&self, url: &Url) -> bool {
        url.host_str()
            .is_some_and(|host| self.session_hosts.iter().any(|h| h.eq_ignore_ascii_case(host)))
    }

    /// Default headers, minus removals, overridden by the request's own
    pub fn build_headers(&self, request: &Request, cookie: Option<&str>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        insert_header(&mut headers, "User-Agent", &self.user_agent)?;
        for (name, value) in DEFAULT_HEADERS {
            insert_header(&mut headers, name, value)?;
        }
        if let Some(id) = cookie {
            insert_header(&mut headers, "Cookie", &format!("sessionid={id}"))?;
        }

        for name in &request.remove_headers {
            headers.remove(name.as_str());
        }
        for (name, value) in &request.headers {
            insert_header(&mut headers, name, value)?;
        }
        Ok(headers)
    }

    fn build_body(
        &self,
        builder: reqwest::RequestBuilder,
        body: Body,
    ) -> Result<reqwest::RequestBuilder> {
        Ok(match body {
            Body::Empty => builder,
            Body::Form(params) => builder.form(&params),
            Body::Multipart { fields, file } => {
                let part = Part::bytes(file.data.to_vec())
                    .file_name(file.filename)
                    .mime_str(&file.content_type)
                    .map_err(|e| Error::Validation(format!("Invalid content type: {e}")))?;
                let form = fields
                    .iter()
                    .fold(Form::new(), |form, (k, v)| {
                        form.text(k.to_string(), v.to_string())
                    })
                    .part(file.field, part);
                builder.multipart(form)
            }
            Body::Raw(data) => builder.body(data),
        })
    }
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| Error::Validation(format!("Invalid header name '{name}': {e}")))?;
    let value = HeaderValue::from_str(value)
        .map_err(|e| Error::Validation(format!("Invalid value for header '{name}': {e}")))?;
    headers.insert(name, value);
    Ok(())
}

/// Turn a raw response into a JSON body or a transport error
///
/// The rewrite hook runs before the status checks, so it can turn an
/// otherwise unrecognized body into a successful one.
pub fn parse_response(
    status: u16,
    text: &str,
    rewrite: Option<mu_core::traits::ResponseRewrite>,
) -> Result<serde_json::Value> {
    let parsed: std::result::Result<serde_json::Value, _> = serde_json::from_str(text);

    let mut body = match parsed {
        Ok(body) => body,
        Err(_) if !(200..300).contains(&status) => {
            return Err(Error::Transport(format!("HTTP {status}: {}", truncate(text))));
        }
        Err(e) => {
            return Err(Error::Transport(format!("Malformed response body: {e}")));
        }
    };

    if let Some(rewrite) = rewrite {
        rewrite(&mut body);
    }

    let message = body
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("request failed")
        .to_string();

    if !(200..300).contains(&status) {
        return Err(Error::Transport(format!("HTTP {status}: {message}")));
    }
    if body.get("status").and_then(|s| s.as_str()) == Some("fail") {
        return Err(Error::Transport(message));
    }
    Ok(body)
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(200) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<serde_json::Value> {
        let url = self.resolve(&request.target)?;

        let cookie = if self.carries_session(&url) {
            Some(self.session.session_id().await?)
        } else {
            None
        };
        let headers = self.build_headers(&request, cookie.as_deref())?;

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        tracing::debug!(
            method = %request.method,
            url = %url,
            body_len = ?request.body.raw_len(),
            "Sending request"
        );
        let builder = self.inner.request(method, url.clone()).headers(headers);
        let builder = self.build_body(builder, request.body)?;

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Network(format!("{url}: {e}")))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Network(format!("{url}: {e}")))?;

        tracing::debug!(status, url = %url, "Received response");
        parse_response(status, &text, request.rewrite)
    }
}
