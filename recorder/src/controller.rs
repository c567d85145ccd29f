//! Recording controller.
//!
//! Owns one capture device, routes its lifecycle events into a single
//! state machine, and enforces the recording duration ceiling with an
//! owned ticker task that is cancelled on every exit path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::config::RecordingConfig;
use crate::device::{Artifact, DeviceEvent, RecorderDevice};
use crate::error::{RecorderError, Result};
use crate::state::{RecorderState, RecordingSession};

/// Default settling delay between the stop acknowledgment and reading
/// the captured artifact. The device may deliver the artifact
/// asynchronously after the stop ack.
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Recording controller.
///
/// Exactly one recording can be in flight; starting a second one fails
/// with [`RecorderError::AlreadyRecording`] and leaves the live session
/// untouched. Callers never enforce the duration ceiling themselves —
/// the controller stops the recording when elapsed time reaches
/// `config.max_duration`.
pub struct Recorder {
    device: Arc<dyn RecorderDevice>,
    inner: Arc<Inner>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

struct Inner {
    session: Mutex<RecordingSession>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    ceiling_secs: AtomicU64,
}

impl Recorder {
    /// Creates a controller over the given device and starts consuming
    /// its event stream.
    pub fn new(device: Arc<dyn RecorderDevice>) -> Self {
        let inner = Arc::new(Inner {
            session: Mutex::new(RecordingSession::default()),
            ticker: Mutex::new(None),
            ceiling_secs: AtomicU64::new(0),
        });

        let pump = tokio::spawn(pump_events(device.clone(), inner.clone()));

        Self {
            device,
            inner,
            pump: Mutex::new(Some(pump)),
        }
    }

    /// Returns a snapshot of the recording session.
    pub fn session(&self) -> RecordingSession {
        self.inner.session.lock().clone()
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> RecorderState {
        self.inner.session.lock().status
    }

    /// Negotiates recording permission: queries the current grant and
    /// falls back to an interactive request. Denial leaves the
    /// controller idle.
    pub async fn request_permission(&self) -> Result<()> {
        if self.device.permission_granted().await {
            return Ok(());
        }
        if self.device.request_permission().await {
            return Ok(());
        }
        Err(RecorderError::PermissionDenied)
    }

    /// Starts a recording. Only valid while idle.
    ///
    /// Transitions to `Armed`, then to `Recording` once the device
    /// acknowledges the start, at which point a one-second ticker begins
    /// counting elapsed time toward the ceiling.
    pub async fn start(&self, config: RecordingConfig) -> Result<()> {
        self.request_permission().await?;

        {
            let mut s = self.inner.session.lock();
            if !s.status.can_start() {
                return Err(RecorderError::AlreadyRecording);
            }
            s.status = RecorderState::Armed;
            s.elapsed_secs = 0;
            s.started_at = None;
            s.last_artifact = None;
            s.last_error = None;
            // the ticker loads the ceiling when it spawns, which cannot
            // happen before the device acknowledges this start
            self.inner
                .ceiling_secs
                .store(config.ceiling_secs(), Ordering::Relaxed);
        }

        if let Err(e) = self.device.start(&config).await {
            let mut s = self.inner.session.lock();
            s.status = RecorderState::Error;
            s.last_error = Some(e.to_string());
            return Err(e.into());
        }

        debug!(ceiling_secs = config.ceiling_secs(), "recording armed");
        Ok(())
    }

    /// Stops the active recording. A no-op in any other state.
    ///
    /// The ticker is cancelled before the hardware stop call so no tick
    /// can race the teardown; the artifact arrives through the device's
    /// stop event.
    pub async fn stop(&self) -> Result<()> {
        {
            let s = self.inner.session.lock();
            if s.status != RecorderState::Recording {
                return Ok(());
            }
        }

        if let Some(t) = self.inner.ticker.lock().take() {
            t.abort();
        }

        if let Err(e) = self.device.stop().await {
            let mut s = self.inner.session.lock();
            s.status = RecorderState::Error;
            s.last_error = Some(e.to_string());
            return Err(e.into());
        }
        Ok(())
    }

    /// Waits out the settling delay, then consumes the captured
    /// artifact and returns the controller to idle.
    ///
    /// Returns [`RecorderError::Hardware`] if the device errored, or
    /// [`RecorderError::NoArtifact`] if nothing was captured.
    pub async fn take_artifact(&self, settle: Duration) -> Result<Artifact> {
        tokio::time::sleep(settle).await;

        let mut s = self.inner.session.lock();
        match s.status {
            RecorderState::Stopped => {
                let artifact = s.last_artifact.take();
                *s = RecordingSession::default();
                artifact.ok_or(RecorderError::NoArtifact)
            }
            RecorderState::Error => {
                let msg = s
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "unknown device error".to_string());
                *s = RecordingSession::default();
                Err(RecorderError::Hardware(msg))
            }
            _ => Err(RecorderError::NoArtifact),
        }
    }

    /// Clears a finished or failed session back to idle. A no-op while
    /// a recording is being set up or running.
    pub fn reset(&self) {
        let mut s = self.inner.session.lock();
        if !s.status.is_active() {
            *s = RecordingSession::default();
        }
    }

    /// Tears the controller down: force-stops an active recording,
    /// cancels the ticker and the event pump, and resets the session.
    ///
    /// Must be called on page exit or workflow teardown regardless of
    /// other workflow state, so no hardware recorder is left orphaned.
    pub async fn shutdown(&self) {
        let recording = self.inner.session.lock().status == RecorderState::Recording;

        if let Some(t) = self.inner.ticker.lock().take() {
            t.abort();
        }
        if recording {
            if let Err(e) = self.device.stop().await {
                warn!("device stop during shutdown failed: {}", e);
            }
        }
        if let Some(p) = self.pump.lock().take() {
            p.abort();
        }

        *self.inner.session.lock() = RecordingSession::default();
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        // Last-resort task cleanup; orderly teardown goes through
        // shutdown(), which also stops the device.
        if let Some(t) = self.inner.ticker.lock().take() {
            t.abort();
        }
        if let Some(p) = self.pump.lock().take() {
            p.abort();
        }
    }
}

/// Consumes device events and applies them to the session state.
async fn pump_events(device: Arc<dyn RecorderDevice>, inner: Arc<Inner>) {
    let events = device.events();
    loop {
        let event = events.lock().await.recv().await;
        let Some(event) = event else {
            break;
        };

        match event {
            DeviceEvent::Started => {
                let arm_ticker = {
                    let mut s = inner.session.lock();
                    if s.status == RecorderState::Armed {
                        s.status = RecorderState::Recording;
                        s.elapsed_secs = 0;
                        s.started_at = Some(std::time::Instant::now());
                        true
                    } else {
                        false
                    }
                };
                if arm_ticker {
                    let handle = tokio::spawn(run_ticker(device.clone(), inner.clone()));
                    *inner.ticker.lock() = Some(handle);
                }
            }
            DeviceEvent::Stopped(artifact) => {
                if let Some(t) = inner.ticker.lock().take() {
                    t.abort();
                }
                let mut s = inner.session.lock();
                debug!(elapsed = s.elapsed_secs, "recording stopped");
                s.status = RecorderState::Stopped;
                s.last_artifact = Some(artifact);
            }
            DeviceEvent::Error(msg) => {
                if let Some(t) = inner.ticker.lock().take() {
                    t.abort();
                }
                let mut s = inner.session.lock();
                warn!("device error: {}", msg);
                s.status = RecorderState::Error;
                s.last_error = Some(msg);
            }
        }
    }
}

/// Counts elapsed seconds and stops the recording at the ceiling.
async fn run_ticker(device: Arc<dyn RecorderDevice>, inner: Arc<Inner>) {
    let ceiling = inner.ceiling_secs.load(Ordering::Relaxed).max(1);

    let mut tick = tokio::time::interval(Duration::from_secs(1));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first interval tick completes immediately
    tick.tick().await;

    loop {
        tick.tick().await;

        let hit = {
            let mut s = inner.session.lock();
            if s.status != RecorderState::Recording {
                return;
            }
            s.elapsed_secs += 1;
            s.elapsed_secs >= ceiling
        };

        if hit {
            // retire our own handle first so the stop path does not
            // abort the task that is driving it
            inner.ticker.lock().take();
            if let Err(e) = device.stop().await {
                warn!("auto-stop at ceiling failed: {}", e);
                let mut s = inner.session.lock();
                s.status = RecorderState::Error;
                s.last_error = Some(e.to_string());
            }
            return;
        }
    }
}
