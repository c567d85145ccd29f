//! Capture device collaborator contract.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::config::RecordingConfig;

/// A captured audio recording: storage handle plus measured duration.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub path: PathBuf,
    pub duration: Duration,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, duration: Duration) -> Self {
        Self {
            path: path.into(),
            duration,
        }
    }
}

/// Error reported by a capture device.
#[derive(Debug, Clone, thiserror::Error)]
#[error("device: {0}")]
pub struct DeviceError(pub String);

impl DeviceError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Lifecycle callback delivered by the device.
#[derive(Debug, Clone)]
pub enum DeviceEvent {
    /// The hardware acknowledged the start request.
    Started,
    /// The hardware finished and delivered the captured artifact.
    /// May arrive after the stop call has already returned.
    Stopped(Artifact),
    /// The hardware failed; can fire in any state.
    Error(String),
}

/// Shared handle to a device's event stream.
///
/// The controller is the sole consumer; the receiver is wrapped so the
/// device can hand it out without giving up ownership.
pub type SharedEvents = Arc<Mutex<mpsc::Receiver<DeviceEvent>>>;

/// Contract for audio capture hardware.
///
/// Implementations capture audio however they like; the controller only
/// depends on start/stop plus the three lifecycle events. Exactly one
/// controller consumes a device's events at a time.
#[async_trait]
pub trait RecorderDevice: Send + Sync {
    /// Returns true if recording permission is currently granted.
    async fn permission_granted(&self) -> bool;

    /// Attempts an interactive permission grant. Returns the resulting
    /// grant state.
    async fn request_permission(&self) -> bool;

    /// Arms the hardware. A [`DeviceEvent::Started`] follows on success.
    async fn start(&self, config: &RecordingConfig) -> Result<(), DeviceError>;

    /// Stops the hardware. Idempotent. A [`DeviceEvent::Stopped`] with
    /// the artifact follows, possibly after this call returns.
    async fn stop(&self) -> Result<(), DeviceError>;

    /// Returns the device's event stream.
    fn events(&self) -> SharedEvents;
}
