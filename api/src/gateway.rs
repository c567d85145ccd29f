//! Request gateway and transport contract.
//!
//! The [`Transport`] trait is the seam to the wire: one JSON request
//! primitive, one multipart upload primitive, both opaque async calls.
//! [`Gateway`] layers policy on top — bearer injection, status
//! classification, session expiry, envelope normalization — so no
//! service or workflow ever inspects raw transport shapes.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::error::{Error, Result};
use crate::session::SessionHandle;
use crate::types::Probe;

/// A plain JSON request, ready for the wire.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: &'static str,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// A multipart file upload: one byte-stream part plus flat key/value
/// metadata fields.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub url: String,
    pub file_path: PathBuf,
    /// Multipart field name of the file part.
    pub file_field: String,
    pub fields: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

/// Whatever came back: status code plus raw body bytes.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure below the HTTP layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No response arrived.
    #[error("network: {0}")]
    Network(String),
    /// The artifact to upload could not be read.
    #[error("file: {0}")]
    File(String),
}

/// Wire primitive collaborator.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, req: HttpRequest) -> std::result::Result<RawResponse, TransportError>;
    async fn upload(&self, req: UploadRequest) -> std::result::Result<RawResponse, TransportError>;
}

/// Production transport over reqwest.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport. No request timeout is layered on top of the
    /// overall client timeout; slow calls surface as transient
    /// failures.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn request(&self, req: HttpRequest) -> std::result::Result<RawResponse, TransportError> {
        let mut builder = match req.method {
            "GET" => self.client.get(&req.url),
            "POST" => self.client.post(&req.url),
            "PUT" => self.client.put(&req.url),
            "DELETE" => self.client.delete(&req.url),
            other => {
                return Err(TransportError::Network(format!(
                    "unsupported method: {}",
                    other
                )))
            }
        };

        for (name, value) in &req.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(RawResponse { status, body })
    }

    async fn upload(&self, req: UploadRequest) -> std::result::Result<RawResponse, TransportError> {
        let bytes = tokio::fs::read(&req.file_path)
            .await
            .map_err(|e| TransportError::File(format!("{}: {}", req.file_path.display(), e)))?;
        let filename = req
            .file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());

        let mut form = multipart::Form::new().part(
            req.file_field.clone(),
            multipart::Part::bytes(bytes).file_name(filename),
        );
        for (name, value) in req.fields {
            form = form.text(name, value);
        }

        let mut builder = self.client.post(&req.url).multipart(form);
        for (name, value) in &req.headers {
            builder = builder.header(name, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(RawResponse { status, body })
    }
}

/// Whether a call requires an authenticated session before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    Required,
    Optional,
}

/// The policy layer every remote call goes through.
pub struct Gateway {
    base_url: String,
    transport: Arc<dyn Transport>,
    session: SessionHandle,
}

impl Gateway {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        session: SessionHandle,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            session,
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Bearer header when a token is present; unauthenticated otherwise.
    fn auth_headers(&self) -> Vec<(String, String)> {
        match self.session.token() {
            Some(token) => vec![("Authorization".to_string(), format!("Bearer {}", token))],
            None => Vec::new(),
        }
    }

    /// Fails fast, without dispatch, when an endpoint needs a session
    /// and none is present.
    fn ensure_authenticated(&self, auth: Auth) -> Result<()> {
        if auth == Auth::Required && !self.session.is_authenticated() {
            return Err(Error::AuthExpired);
        }
        Ok(())
    }

    /// Sends a JSON request and deserializes the enveloped body as `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &'static str,
        path: &str,
        body: Option<Value>,
        auth: Auth,
    ) -> Result<T> {
        let raw = self.execute(method, path, body, auth).await?;
        let body = self.accept(&raw)?;
        serde_json::from_slice(body).map_err(|e| Error::MalformedResponse(e.to_string()))
    }

    /// Sends a JSON request and applies status classification only,
    /// discarding the body. For endpoints where only the outcome
    /// matters (e.g. token validation).
    pub async fn request_raw(
        &self,
        method: &'static str,
        path: &str,
        body: Option<Value>,
        auth: Auth,
    ) -> Result<()> {
        let raw = self.execute(method, path, body, auth).await?;
        self.classify_status(&raw)
    }

    /// Uploads a file and deserializes the enveloped body as `T`.
    ///
    /// The response body must itself parse as an envelope with a
    /// success flag; anything else is a malformed response, a failure
    /// axis distinct from transport and status.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        file_path: &Path,
        file_field: &str,
        fields: Vec<(String, String)>,
        auth: Auth,
    ) -> Result<T> {
        self.ensure_authenticated(auth)?;

        let req = UploadRequest {
            url: self.url(path),
            file_path: file_path.to_path_buf(),
            file_field: file_field.to_string(),
            fields,
            headers: self.auth_headers(),
        };
        debug!(url = %req.url, "upload");

        let raw = self
            .transport
            .upload(req)
            .await
            .map_err(|e| match e {
                TransportError::Network(msg) => Error::TransportUnavailable(msg),
                TransportError::File(msg) => Error::UploadFailed(msg),
            })?;

        let body = self.accept(&raw)?;
        serde_json::from_slice(body).map_err(|e| Error::MalformedResponse(e.to_string()))
    }

    async fn execute(
        &self,
        method: &'static str,
        path: &str,
        body: Option<Value>,
        auth: Auth,
    ) -> Result<RawResponse> {
        self.ensure_authenticated(auth)?;

        let req = HttpRequest {
            method,
            url: self.url(path),
            headers: self.auth_headers(),
            body,
        };
        debug!(method, url = %req.url, "request");

        self.transport
            .request(req)
            .await
            .map_err(|e| Error::TransportUnavailable(e.to_string()))
    }

    /// Status-only classification: expiry, then non-success statuses.
    fn classify_status(&self, raw: &RawResponse) -> Result<()> {
        if raw.status == 401 {
            self.session.expire();
            return Err(Error::AuthExpired);
        }
        if !raw.is_success() {
            return Err(Error::RequestFailed {
                status: raw.status,
                message: envelope_message(&raw.body)
                    .unwrap_or_else(|| "request failed".to_string()),
            });
        }
        Ok(())
    }

    /// Full acceptance: status classification plus the envelope's own
    /// success flag. Returns the body bytes for typed deserialization.
    fn accept<'a>(&self, raw: &'a RawResponse) -> Result<&'a [u8]> {
        self.classify_status(raw)?;

        let probe: Probe = serde_json::from_slice(&raw.body)
            .map_err(|e| Error::MalformedResponse(e.to_string()))?;
        if !probe.success {
            return Err(Error::RequestFailed {
                status: raw.status,
                message: probe
                    .message
                    .unwrap_or_else(|| "request failed".to_string()),
            });
        }
        Ok(&raw.body)
    }
}

/// Pulls the human-readable message out of an error body, if any.
fn envelope_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<Probe>(body)
        .ok()
        .and_then(|p| p.message)
}
