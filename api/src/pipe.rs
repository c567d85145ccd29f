//! In-memory transport for testing.
//!
//! Scripted like real service behavior: tests queue responses (or
//! network failures) and inspect what was sent, without any sockets.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::Value;

use crate::gateway::{HttpRequest, RawResponse, Transport, TransportError, UploadRequest};

/// What the transport recorded about one outbound call.
#[derive(Debug, Clone)]
pub enum RecordedRequest {
    Http {
        method: String,
        url: String,
        headers: Vec<(String, String)>,
        body: Option<Value>,
    },
    Upload {
        url: String,
        file_path: String,
        fields: Vec<(String, String)>,
        headers: Vec<(String, String)>,
    },
}

impl RecordedRequest {
    /// Returns the Authorization header value, if one was attached.
    pub fn bearer(&self) -> Option<&str> {
        let headers = match self {
            RecordedRequest::Http { headers, .. } => headers,
            RecordedRequest::Upload { headers, .. } => headers,
        };
        headers
            .iter()
            .find(|(name, _)| name == "Authorization")
            .map(|(_, value)| value.as_str())
    }

    pub fn url(&self) -> &str {
        match self {
            RecordedRequest::Http { url, .. } => url,
            RecordedRequest::Upload { url, .. } => url,
        }
    }
}

type Scripted = std::result::Result<RawResponse, TransportError>;

/// A scripted in-memory transport.
#[derive(Default)]
pub struct PipeTransport {
    responses: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl PipeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues a JSON response with the given status.
    pub fn push_response(&self, status: u16, body: Value) {
        self.responses.lock().push_back(Ok(RawResponse {
            status,
            body: Bytes::from(body.to_string()),
        }));
    }

    /// Queues a response whose body is raw bytes (e.g. not JSON).
    pub fn push_raw(&self, status: u16, body: &[u8]) {
        self.responses.lock().push_back(Ok(RawResponse {
            status,
            body: Bytes::copy_from_slice(body),
        }));
    }

    /// Queues a network-level failure.
    pub fn push_network_error(&self, msg: impl Into<String>) {
        self.responses
            .lock()
            .push_back(Err(TransportError::Network(msg.into())));
    }

    /// Everything sent so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn next_response(&self) -> Scripted {
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("no scripted response".to_string())))
    }
}

#[async_trait]
impl Transport for PipeTransport {
    async fn request(&self, req: HttpRequest) -> Scripted {
        self.requests.lock().push(RecordedRequest::Http {
            method: req.method.to_string(),
            url: req.url,
            headers: req.headers,
            body: req.body,
        });
        self.next_response()
    }

    async fn upload(&self, req: UploadRequest) -> Scripted {
        self.requests.lock().push(RecordedRequest::Upload {
            url: req.url,
            file_path: req.file_path.to_string_lossy().into_owned(),
            fields: req.fields,
            headers: req.headers,
        });
        self.next_response()
    }
}
