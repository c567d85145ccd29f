//! Verification flow: one record → upload → match cycle.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use voxid_api::{Client, Error as ApiError, HistoryEntry, UploadKind, UploadTags};
use voxid_recorder::{Recorder, RecorderError, RecordingConfig, SETTLE_DELAY};

use crate::error::{FlowError, Result};

/// Recordings shorter than this fail without ever being uploaded.
pub const MIN_VERIFY_DURATION: Duration = Duration::from_secs(2);

/// Verification recording ceiling.
const VERIFY_CEILING: Duration = Duration::from_secs(10);

/// Where the attempt stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerifyPhase {
    #[default]
    Idle,
    Recording,
    Uploading,
    Matching,
    Success,
    Fail,
}

impl VerifyPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerifyPhase::Idle => "idle",
            VerifyPhase::Recording => "recording",
            VerifyPhase::Uploading => "uploading",
            VerifyPhase::Matching => "matching",
            VerifyPhase::Success => "success",
            VerifyPhase::Fail => "fail",
        }
    }
}

impl fmt::Display for VerifyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of starting an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The recording is running.
    Recording,
    /// No voiceprint is registered; enroll first instead of recording.
    NotEnrolled,
}

/// How the attempt resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum VerifyResolution {
    Matched {
        user_name: Option<String>,
        /// Confidence exactly as the service returned it.
        confidence: f64,
        verified_at: DateTime<Utc>,
    },
    Rejected {
        reason: String,
    },
}

struct VerifyState {
    phase: VerifyPhase,
    resolution: Option<VerifyResolution>,
}

/// Drives one verification attempt at a time.
///
/// An attempt refuses to record unless the account is enrolled, fails
/// locally on too-short recordings, and otherwise runs the upload →
/// match chain, landing in `Success` or `Fail`. A resolved attempt is
/// replaced by calling [`reset`](VerificationFlow::reset) and starting
/// over.
pub struct VerificationFlow {
    client: Arc<Client>,
    recorder: Arc<Recorder>,
    state: Mutex<VerifyState>,
    history: Arc<Mutex<Vec<HistoryEntry>>>,
    settle: Duration,
}

impl VerificationFlow {
    pub fn new(client: Arc<Client>, recorder: Arc<Recorder>) -> Self {
        Self {
            client,
            recorder,
            state: Mutex::new(VerifyState {
                phase: VerifyPhase::Idle,
                resolution: None,
            }),
            history: Arc::new(Mutex::new(Vec::new())),
            settle: SETTLE_DELAY,
        }
    }

    /// Shortens the post-stop settling delay. Test hook.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn phase(&self) -> VerifyPhase {
        self.state.lock().phase
    }

    /// The attempt's resolution, once it reached `Success` or `Fail`.
    pub fn resolution(&self) -> Option<VerifyResolution> {
        self.state.lock().resolution.clone()
    }

    /// Cached verification history projection.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.lock().clone()
    }

    /// Starts an attempt: checks enrollment with the service, then
    /// begins recording. Short-circuits to [`StartOutcome::NotEnrolled`]
    /// without touching the recorder when no voiceprint exists.
    pub async fn start(&self) -> Result<StartOutcome> {
        {
            let state = self.state.lock();
            if state.phase != VerifyPhase::Idle {
                return Err(FlowError::InvalidState(format!(
                    "attempt already in phase {}",
                    state.phase
                )));
            }
        }

        let status = self.client.voiceprint().status().await?;
        if !status.registered {
            debug!("not enrolled, prompting registration");
            return Ok(StartOutcome::NotEnrolled);
        }

        // clear any leftover stopped/errored session; a live recording
        // still fails fast below
        self.recorder.reset();
        self.recorder
            .start(RecordingConfig {
                max_duration: VERIFY_CEILING,
                ..Default::default()
            })
            .await?;
        self.state.lock().phase = VerifyPhase::Recording;
        Ok(StartOutcome::Recording)
    }

    /// Stops the recording and runs the rest of the chain. Returns the
    /// resolution the attempt landed on.
    ///
    /// Session expiry is the only error that propagates; every other
    /// failure resolves the attempt to `Fail` with a reason.
    pub async fn finish(&self) -> Result<VerifyResolution> {
        {
            let state = self.state.lock();
            if state.phase != VerifyPhase::Recording {
                return Err(FlowError::InvalidState(format!(
                    "no recording to finish (phase {})",
                    state.phase
                )));
            }
        }

        if let Err(e) = self.recorder.stop().await {
            return Ok(self.fail(format!("recording failed: {}", e)));
        }
        let artifact = match self.recorder.take_artifact(self.settle).await {
            Ok(artifact) => artifact,
            Err(RecorderError::Hardware(msg)) => {
                return Ok(self.fail(format!("recording failed: {}", msg)));
            }
            Err(e) => return Ok(self.fail(e.to_string())),
        };

        // below the minimum the attempt fails locally: no upload, no
        // match call
        if artifact.duration < MIN_VERIFY_DURATION {
            return Ok(self.fail(format!(
                "recording too short: need at least {} seconds",
                MIN_VERIFY_DURATION.as_secs()
            )));
        }

        self.state.lock().phase = VerifyPhase::Uploading;
        let uploaded = match self
            .client
            .upload()
            .upload(&artifact.path, UploadKind::Verify, UploadTags::default())
            .await
        {
            Ok(uploaded) => uploaded,
            Err(ApiError::AuthExpired) => {
                self.fail("session expired".to_string());
                return Err(ApiError::AuthExpired.into());
            }
            // an upload failure short-circuits: the match call is never
            // attempted
            Err(e) => return Ok(self.fail(e.to_string())),
        };

        self.state.lock().phase = VerifyPhase::Matching;
        let outcome = match self.client.voiceprint().verify(&uploaded.file_path).await {
            Ok(outcome) => outcome,
            Err(ApiError::AuthExpired) => {
                self.fail("session expired".to_string());
                return Err(ApiError::AuthExpired.into());
            }
            Err(e) => return Ok(self.fail(e.to_string())),
        };

        if !outcome.matched {
            return Ok(self.fail("identity not recognized".to_string()));
        }

        let resolution = VerifyResolution::Matched {
            user_name: outcome.user_name,
            confidence: outcome.confidence,
            verified_at: Utc::now(),
        };
        {
            let mut state = self.state.lock();
            state.phase = VerifyPhase::Success;
            state.resolution = Some(resolution.clone());
        }
        info!(confidence = outcome.confidence, "verification succeeded");

        self.spawn_history_refresh();
        Ok(resolution)
    }

    /// Fetches the history projection and caches it.
    pub async fn refresh_history(&self) -> Result<Vec<HistoryEntry>> {
        let entries = self.client.voiceprint().history().await?;
        *self.history.lock() = entries.clone();
        Ok(entries)
    }

    /// Returns the attempt to idle for an explicit retry or close.
    pub fn reset(&self) {
        self.recorder.reset();
        let mut state = self.state.lock();
        state.phase = VerifyPhase::Idle;
        state.resolution = None;
    }

    /// Tears the flow down, force-stopping any active recording.
    pub async fn abort(&self) {
        self.recorder.shutdown().await;
        self.reset();
    }

    fn fail(&self, reason: String) -> VerifyResolution {
        let resolution = VerifyResolution::Rejected { reason };
        let mut state = self.state.lock();
        state.phase = VerifyPhase::Fail;
        state.resolution = Some(resolution.clone());
        resolution
    }

    /// Refreshes the history off to the side; a failure here cannot
    /// affect the already-resolved attempt.
    fn spawn_history_refresh(&self) {
        let client = self.client.clone();
        let history = self.history.clone();
        tokio::spawn(async move {
            match client.voiceprint().history().await {
                Ok(entries) => *history.lock() = entries,
                Err(e) => warn!("history refresh failed: {}", e),
            }
        });
    }
}
