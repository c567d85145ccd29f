//! In-memory capture device for testing.
//!
//! Behaves like real recording hardware over channels: start/stop calls
//! produce the usual lifecycle events, and tests script what each stop
//! delivers — an artifact, a hardware error, or nothing at all.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::RecordingConfig;
use crate::device::{Artifact, DeviceError, DeviceEvent, RecorderDevice, SharedEvents};

/// What a scripted stop should deliver.
#[derive(Debug, Clone)]
pub enum PipeOutcome {
    /// Deliver an artifact with the given measured duration.
    Artifact(Duration),
    /// Deliver a hardware error.
    Error(String),
    /// Deliver nothing (the hardware lost the capture).
    Silent,
}

struct PipeState {
    permission: bool,
    grant_on_request: bool,
    recording: bool,
    started_at: Option<tokio::time::Instant>,
    script: VecDeque<PipeOutcome>,
    fail_next_start: Option<String>,
}

/// A scripted in-memory device.
///
/// With an empty script, each stop delivers an artifact whose duration
/// is the wall time the recording ran.
#[derive(Clone)]
pub struct PipeDevice {
    state: Arc<Mutex<PipeState>>,
    events_tx: mpsc::Sender<DeviceEvent>,
    events_rx: SharedEvents,
    stop_delay: Duration,
}

impl PipeDevice {
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::channel(32);
        Self {
            state: Arc::new(Mutex::new(PipeState {
                permission: true,
                grant_on_request: true,
                recording: false,
                started_at: None,
                script: VecDeque::new(),
                fail_next_start: None,
            })),
            events_tx,
            events_rx: Arc::new(tokio::sync::Mutex::new(events_rx)),
            stop_delay: Duration::ZERO,
        }
    }

    /// Revokes the current permission grant.
    pub fn with_permission(self, granted: bool) -> Self {
        self.state.lock().permission = granted;
        self
    }

    /// Controls whether an interactive permission request succeeds.
    pub fn with_grant_on_request(self, grant: bool) -> Self {
        self.state.lock().grant_on_request = grant;
        self
    }

    /// Delays artifact delivery after the stop acknowledgment, like
    /// hardware that finishes writing the file asynchronously.
    pub fn with_stop_delay(mut self, delay: Duration) -> Self {
        self.stop_delay = delay;
        self
    }

    /// Queues the outcome of the next stop.
    pub fn script(&self, outcome: PipeOutcome) {
        self.state.lock().script.push_back(outcome);
    }

    /// Makes the next start call fail at the hardware.
    pub fn fail_next_start(&self, msg: impl Into<String>) {
        self.state.lock().fail_next_start = Some(msg.into());
    }

    /// Injects a hardware error event, as if the device failed
    /// mid-recording.
    pub async fn emit_error(&self, msg: impl Into<String>) {
        self.state.lock().recording = false;
        let _ = self.events_tx.send(DeviceEvent::Error(msg.into())).await;
    }

    fn fresh_artifact(duration: Duration) -> Artifact {
        Artifact::new(
            PathBuf::from(format!("pipe-{}.mp3", Uuid::new_v4())),
            duration,
        )
    }
}

impl Default for PipeDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecorderDevice for PipeDevice {
    async fn permission_granted(&self) -> bool {
        self.state.lock().permission
    }

    async fn request_permission(&self) -> bool {
        let mut state = self.state.lock();
        if state.grant_on_request {
            state.permission = true;
        }
        state.permission
    }

    async fn start(&self, _config: &RecordingConfig) -> Result<(), DeviceError> {
        {
            let mut state = self.state.lock();
            if let Some(msg) = state.fail_next_start.take() {
                return Err(DeviceError::new(msg));
            }
            state.recording = true;
            state.started_at = Some(tokio::time::Instant::now());
        }
        let _ = self.events_tx.send(DeviceEvent::Started).await;
        Ok(())
    }

    async fn stop(&self) -> Result<(), DeviceError> {
        let (outcome, elapsed) = {
            let mut state = self.state.lock();
            if !state.recording {
                return Ok(());
            }
            state.recording = false;
            let elapsed = state
                .started_at
                .take()
                .map(|t| t.elapsed())
                .unwrap_or_default();
            (state.script.pop_front(), elapsed)
        };

        let event = match outcome {
            Some(PipeOutcome::Artifact(duration)) => {
                DeviceEvent::Stopped(Self::fresh_artifact(duration))
            }
            Some(PipeOutcome::Error(msg)) => DeviceEvent::Error(msg),
            Some(PipeOutcome::Silent) => return Ok(()),
            None => DeviceEvent::Stopped(Self::fresh_artifact(elapsed)),
        };

        if self.stop_delay.is_zero() {
            let _ = self.events_tx.send(event).await;
        } else {
            let tx = self.events_tx.clone();
            let delay = self.stop_delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = tx.send(event).await;
            });
        }
        Ok(())
    }

    fn events(&self) -> SharedEvents {
        self.events_rx.clone()
    }
}
