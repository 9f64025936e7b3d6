//! Recording transport used by upload tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::traits::{Request, Transport};

type Handler = Box<dyn Fn(&Request) -> Result<serde_json::Value> + Send + Sync>;

/// Transport fake that records every request and answers from a script or
/// a handler. Applies the request's rewrite hook and the `status: fail`
/// check the way a real transport does.
pub(crate) struct RecordingTransport {
    requests: Mutex<Vec<Request>>,
    script: Mutex<VecDeque<Result<serde_json::Value>>>,
    handler: Option<Handler>,
}

impl RecordingTransport {
    /// Answer with `responses` in order, then fail
    pub(crate) fn new(responses: Vec<Result<serde_json::Value>>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            script: Mutex::new(responses.into()),
            handler: None,
        }
    }

    pub(crate) fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&Request) -> Result<serde_json::Value> + Send + Sync + 'static,
    {
        Self {
            handler: Some(Box::new(handler)),
            ..Self::new(Vec::new())
        }
    }

    /// Fail every request with a fresh error
    pub(crate) fn failing<F>(make_error: F) -> Self
    where
        F: Fn() -> Error + Send + Sync + 'static,
    {
        Self::with_handler(move |_| Err(make_error()))
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: Request) -> Result<serde_json::Value> {
        self.requests.lock().unwrap().push(request.clone());

        let response = match &self.handler {
            Some(handler) => handler(&request),
            None => self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Transport("no scripted response".into()))),
        };

        let mut body = response?;
        if let Some(rewrite) = request.rewrite {
            rewrite(&mut body);
        }
        if body.get("status").and_then(|s| s.as_str()) == Some("fail") {
            return Err(Error::Transport(format!("request failed: {body}")));
        }
        Ok(body)
    }
}
