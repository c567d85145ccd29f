//! API client entry point.

use std::sync::Arc;

use voxid_store::{LocalStore, MemoryStore};

use crate::auth::AuthService;
use crate::emotion::EmotionService;
use crate::error::{Error, Result};
use crate::gateway::{Gateway, ReqwestTransport, Transport};
use crate::session::SessionHandle;
use crate::upload::UploadService;
use crate::voiceprint::VoiceprintService;

/// Default service base URL (development).
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// voxid API client.
///
/// # Example
///
/// ```rust,no_run
/// use voxid_api::Client;
///
/// # fn run() -> voxid_api::Result<()> {
/// let client = Client::new("https://voxid.example.com/api")?;
/// # Ok(())
/// # }
/// ```
pub struct Client {
    gateway: Arc<Gateway>,
    session: SessionHandle,
}

impl Client {
    /// Creates a client with the default transport and an in-memory
    /// store.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        ClientBuilder::new(base_url).build()
    }

    /// Creates a builder for more configuration options.
    pub fn builder(base_url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    /// Returns the shared session handle.
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Returns the authentication service.
    pub fn auth(&self) -> AuthService {
        AuthService::new(self.gateway.clone(), self.session.clone())
    }

    /// Returns the voiceprint service.
    pub fn voiceprint(&self) -> VoiceprintService {
        VoiceprintService::new(self.gateway.clone())
    }

    /// Returns the emotion analysis service.
    pub fn emotion(&self) -> EmotionService {
        EmotionService::new(self.gateway.clone())
    }

    /// Returns the audio upload coordinator.
    pub fn upload(&self) -> UploadService {
        UploadService::new(self.gateway.clone())
    }

    /// Returns a reference to the underlying gateway.
    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }
}

/// Builder for creating a client.
pub struct ClientBuilder {
    base_url: String,
    transport: Option<Arc<dyn Transport>>,
    store: Option<Arc<dyn LocalStore>>,
}

impl ClientBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            transport: None,
            store: None,
        }
    }

    /// Replaces the wire transport (tests use the in-memory pipe).
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replaces the local store used for session persistence.
    pub fn store(mut self, store: Arc<dyn LocalStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Builds the client, restoring any persisted session.
    pub fn build(self) -> Result<Client> {
        if self.base_url.is_empty() {
            return Err(Error::Config("base_url must be non-empty".to_string()));
        }

        let store = match self.store {
            Some(store) => store,
            None => Arc::new(MemoryStore::new()),
        };
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };

        let session = SessionHandle::new(store);
        let gateway = Arc::new(Gateway::new(self.base_url, transport, session.clone()));

        Ok(Client { gateway, session })
    }
}
