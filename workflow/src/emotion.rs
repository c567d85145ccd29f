//! Emotion analysis flow: one record → upload → detect cycle.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use voxid_api::{Client, EmotionReport, Error as ApiError, UploadKind, UploadTags};
use voxid_recorder::{Recorder, RecordingConfig, SETTLE_DELAY};

use crate::error::{FlowError, Result};

/// An empty tap never uploads; anything shorter than this fails locally.
pub const MIN_EMOTION_DURATION: Duration = Duration::from_secs(1);

/// Emotion recordings may run longer than the identity flows.
const EMOTION_CEILING: Duration = Duration::from_secs(60);

/// Where the analysis stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmotionPhase {
    #[default]
    Idle,
    Recording,
    Uploading,
    Analyzing,
    Complete,
    Failed,
}

impl EmotionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionPhase::Idle => "idle",
            EmotionPhase::Recording => "recording",
            EmotionPhase::Uploading => "uploading",
            EmotionPhase::Analyzing => "analyzing",
            EmotionPhase::Complete => "complete",
            EmotionPhase::Failed => "failed",
        }
    }
}

impl fmt::Display for EmotionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

struct EmotionState {
    phase: EmotionPhase,
    report: Option<EmotionReport>,
    failure: Option<String>,
}

/// Drives one emotion analysis pass.
pub struct EmotionFlow {
    client: Arc<Client>,
    recorder: Arc<Recorder>,
    state: Mutex<EmotionState>,
    subject_id: Option<String>,
    settle: Duration,
}

impl EmotionFlow {
    pub fn new(client: Arc<Client>, recorder: Arc<Recorder>) -> Self {
        Self {
            client,
            recorder,
            state: Mutex::new(EmotionState {
                phase: EmotionPhase::Idle,
                report: None,
                failure: None,
            }),
            subject_id: None,
            settle: SETTLE_DELAY,
        }
    }

    /// Tags submissions with a subject identifier.
    pub fn with_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    /// Shortens the post-stop settling delay. Test hook.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn phase(&self) -> EmotionPhase {
        self.state.lock().phase
    }

    /// The analysis report, once `Complete`.
    pub fn report(&self) -> Option<EmotionReport> {
        self.state.lock().report.clone()
    }

    /// The failure message, once `Failed`.
    pub fn failure(&self) -> Option<String> {
        self.state.lock().failure.clone()
    }

    /// Starts recording a sample to analyze.
    pub async fn start(&self) -> Result<()> {
        {
            let state = self.state.lock();
            if state.phase != EmotionPhase::Idle {
                return Err(FlowError::InvalidState(format!(
                    "analysis already in phase {}",
                    state.phase
                )));
            }
        }

        // clear any leftover stopped/errored session; a live recording
        // still fails fast below
        self.recorder.reset();
        self.recorder
            .start(RecordingConfig {
                max_duration: EMOTION_CEILING,
                ..Default::default()
            })
            .await?;
        self.state.lock().phase = EmotionPhase::Recording;
        Ok(())
    }

    /// Stops the recording and runs upload → detect. Session expiry
    /// propagates; other failures land the flow in `Failed` with a
    /// message.
    pub async fn finish(&self) -> Result<Option<EmotionReport>> {
        {
            let state = self.state.lock();
            if state.phase != EmotionPhase::Recording {
                return Err(FlowError::InvalidState(format!(
                    "no recording to finish (phase {})",
                    state.phase
                )));
            }
        }

        if let Err(e) = self.recorder.stop().await {
            self.fail(format!("recording failed: {}", e));
            return Ok(None);
        }
        let artifact = match self.recorder.take_artifact(self.settle).await {
            Ok(artifact) => artifact,
            Err(e) => {
                self.fail(e.to_string());
                return Ok(None);
            }
        };

        if artifact.duration < MIN_EMOTION_DURATION {
            self.fail("recording too short".to_string());
            return Ok(None);
        }

        self.state.lock().phase = EmotionPhase::Uploading;
        let uploaded = match self
            .client
            .upload()
            .upload(
                &artifact.path,
                UploadKind::Emotion,
                UploadTags {
                    subject_id: self.subject_id.clone(),
                    ..Default::default()
                },
            )
            .await
        {
            Ok(uploaded) => uploaded,
            Err(ApiError::AuthExpired) => {
                self.fail("session expired".to_string());
                return Err(ApiError::AuthExpired.into());
            }
            Err(e) => {
                self.fail(e.to_string());
                return Ok(None);
            }
        };

        self.state.lock().phase = EmotionPhase::Analyzing;
        let report = match self
            .client
            .emotion()
            .detect(&uploaded.file_path, self.subject_id.as_deref())
            .await
        {
            Ok(report) => report,
            Err(ApiError::AuthExpired) => {
                self.fail("session expired".to_string());
                return Err(ApiError::AuthExpired.into());
            }
            Err(e) => {
                self.fail(e.to_string());
                return Ok(None);
            }
        };

        debug!(emotion = %report.dominant_emotion, "analysis complete");
        let mut state = self.state.lock();
        state.phase = EmotionPhase::Complete;
        state.report = Some(report.clone());
        Ok(Some(report))
    }

    /// Returns the flow to idle for another pass.
    pub fn reset(&self) {
        self.recorder.reset();
        let mut state = self.state.lock();
        state.phase = EmotionPhase::Idle;
        state.report = None;
        state.failure = None;
    }

    /// Tears the flow down, force-stopping any active recording.
    pub async fn abort(&self) {
        self.recorder.shutdown().await;
        self.reset();
    }

    fn fail(&self, reason: String) {
        let mut state = self.state.lock();
        state.phase = EmotionPhase::Failed;
        state.failure = Some(reason);
    }
}
