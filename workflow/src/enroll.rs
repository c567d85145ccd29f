//! Enrollment flow: three labeled samples, one registration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use voxid_api::{Client, RegisteredSample, UploadKind, UploadTags};
use voxid_recorder::{Recorder, RecordingConfig, SETTLE_DELAY};

use crate::error::{FlowError, Result};
use crate::prompts::PromptPool;

/// Number of samples a registration requires.
pub const SAMPLE_COUNT: usize = 3;

/// Samples shorter than this are rejected and the same slot retried.
pub const MIN_SAMPLE_DURATION: Duration = Duration::from_secs(3);

/// Per-sample recording ceiling.
const SAMPLE_CEILING: Duration = Duration::from_secs(15);

/// Where the enrollment stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollStep {
    /// Recording (or about to record) the sample at this index.
    CollectingSample(usize),
    /// The sample at this index is uploaded and can be reviewed,
    /// re-recorded, or advanced past.
    Reviewing(usize),
    Submitting,
    Complete,
    Failed,
}

impl fmt::Display for EnrollStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrollStep::CollectingSample(i) => write!(f, "collecting_sample({})", i),
            EnrollStep::Reviewing(i) => write!(f, "reviewing({})", i),
            EnrollStep::Submitting => write!(f, "submitting"),
            EnrollStep::Complete => write!(f, "complete"),
            EnrollStep::Failed => write!(f, "failed"),
        }
    }
}

/// One collected sample: uploaded audio plus the prompt it was spoken
/// against.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrolledSample {
    /// Server-side path returned by the upload.
    pub file_path: String,
    pub duration: Duration,
    pub prompt_text: String,
    pub uploaded_at: DateTime<Utc>,
}

struct EnrollState {
    step: EnrollStep,
    samples: [Option<EnrolledSample>; SAMPLE_COUNT],
    current_prompt: String,
    completed_at: Option<DateTime<Utc>>,
}

/// Drives voiceprint enrollment: for each of three prompts, record →
/// validate → upload into the slot, then submit all three as one
/// registration transaction.
///
/// Re-recording a sample always replaces its slot and never shifts the
/// others. A failed submission preserves the samples so it can be
/// retried without re-recording. Nothing survives an abort.
pub struct EnrollmentFlow {
    client: Arc<Client>,
    recorder: Arc<Recorder>,
    prompts: PromptPool,
    state: Mutex<EnrollState>,
    settle: Duration,
}

impl EnrollmentFlow {
    pub fn new(client: Arc<Client>, recorder: Arc<Recorder>) -> Self {
        Self::with_prompts(client, recorder, PromptPool::new())
    }

    pub fn with_prompts(
        client: Arc<Client>,
        recorder: Arc<Recorder>,
        prompts: PromptPool,
    ) -> Self {
        let first_prompt = prompts.next();
        Self {
            client,
            recorder,
            prompts,
            state: Mutex::new(EnrollState {
                step: EnrollStep::CollectingSample(0),
                samples: Default::default(),
                current_prompt: first_prompt,
                completed_at: None,
            }),
            settle: SETTLE_DELAY,
        }
    }

    /// Shortens the post-stop settling delay. Test hook.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn step(&self) -> EnrollStep {
        self.state.lock().step
    }

    /// Prompt text for the sample being collected.
    pub fn current_prompt(&self) -> String {
        self.state.lock().current_prompt.clone()
    }

    /// Swaps in a different prompt for the current sample.
    pub fn change_prompt(&self) -> String {
        let prompt = self.prompts.next();
        self.state.lock().current_prompt = prompt.clone();
        prompt
    }

    /// Copies of the sample slots, in order.
    pub fn samples(&self) -> Vec<Option<EnrolledSample>> {
        self.state.lock().samples.to_vec()
    }

    /// How many slots are filled.
    pub fn sample_count(&self) -> usize {
        self.state
            .lock()
            .samples
            .iter()
            .filter(|s| s.is_some())
            .count()
    }

    /// When the registration completed.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().completed_at
    }

    /// Starts recording the current sample.
    pub async fn start_sample(&self) -> Result<()> {
        let index = self.collecting_index()?;
        debug!(index, "recording enrollment sample");
        // clear any leftover stopped/errored session; a live recording
        // still fails fast below
        self.recorder.reset();
        self.recorder
            .start(RecordingConfig {
                max_duration: SAMPLE_CEILING,
                ..Default::default()
            })
            .await?;
        Ok(())
    }

    /// Stops the recording, validates the captured sample, uploads it,
    /// and fills the current slot.
    ///
    /// A sample below [`MIN_SAMPLE_DURATION`] is rejected with
    /// [`FlowError::RecordingTooShort`]; the slot is untouched and the
    /// same index is retried — nothing is uploaded.
    pub async fn finish_sample(&self) -> Result<EnrolledSample> {
        let index = self.collecting_index()?;

        self.recorder.stop().await?;
        let artifact = self.recorder.take_artifact(self.settle).await?;

        if artifact.duration < MIN_SAMPLE_DURATION {
            debug!(index, ms = artifact.duration.as_millis() as u64, "sample too short");
            return Err(FlowError::too_short(artifact.duration, MIN_SAMPLE_DURATION));
        }

        let prompt = self.current_prompt();
        let uploaded = self
            .client
            .upload()
            .upload(
                &artifact.path,
                UploadKind::Register,
                UploadTags {
                    sample_index: Some(index as u32),
                    prompt_text: Some(prompt.clone()),
                    subject_id: None,
                },
            )
            .await?;

        let sample = EnrolledSample {
            file_path: uploaded.file_path,
            duration: artifact.duration,
            prompt_text: prompt,
            uploaded_at: Utc::now(),
        };

        let mut state = self.state.lock();
        // replace, never append: only slot `index` changes
        state.samples[index] = Some(sample.clone());
        state.step = EnrollStep::Reviewing(index);
        Ok(sample)
    }

    /// Goes back to re-record the sample under review. The old sample
    /// stays in its slot until a new upload replaces it.
    pub fn rerecord(&self) -> Result<()> {
        let mut state = self.state.lock();
        match state.step {
            EnrollStep::Reviewing(index) => {
                state.step = EnrollStep::CollectingSample(index);
                Ok(())
            }
            step => Err(FlowError::InvalidState(format!(
                "cannot re-record from {}",
                step
            ))),
        }
    }

    /// Moves on from the reviewed sample: to the next index, or — after
    /// the last slot — into submission.
    pub async fn advance(&self) -> Result<EnrollStep> {
        let next = {
            let mut state = self.state.lock();
            let index = match state.step {
                EnrollStep::Reviewing(index) => index,
                step => {
                    return Err(FlowError::InvalidState(format!(
                        "cannot advance from {}",
                        step
                    )))
                }
            };
            if state.samples[index].is_none() {
                return Err(FlowError::InvalidState(format!(
                    "sample slot {} is empty",
                    index
                )));
            }

            if index + 1 < SAMPLE_COUNT {
                state.step = EnrollStep::CollectingSample(index + 1);
                state.current_prompt = self.prompts.next();
                return Ok(state.step);
            }

            state.step = EnrollStep::Submitting;
            state.step
        };
        debug_assert_eq!(next, EnrollStep::Submitting);

        self.submit().await
    }

    /// Retries a failed submission with the preserved samples.
    pub async fn retry_submit(&self) -> Result<EnrollStep> {
        {
            let mut state = self.state.lock();
            if state.step != EnrollStep::Failed {
                return Err(FlowError::InvalidState(format!(
                    "cannot retry submission from {}",
                    state.step
                )));
            }
            state.step = EnrollStep::Submitting;
        }
        self.submit().await
    }

    async fn submit(&self) -> Result<EnrollStep> {
        let recordings = {
            let state = self.state.lock();
            let mut recordings = Vec::with_capacity(SAMPLE_COUNT);
            for (index, slot) in state.samples.iter().enumerate() {
                let sample = slot.as_ref().ok_or_else(|| {
                    FlowError::InvalidState(format!("sample slot {} is empty", index))
                })?;
                recordings.push(RegisteredSample {
                    file_path: sample.file_path.clone(),
                    duration: sample.duration.as_millis() as u64,
                    text: sample.prompt_text.clone(),
                    sample_index: index as u32,
                    upload_time: sample.uploaded_at,
                });
            }
            recordings
        };

        match self.client.voiceprint().register(&recordings).await {
            Ok(()) => {
                let mut state = self.state.lock();
                state.step = EnrollStep::Complete;
                state.completed_at = Some(Utc::now());
                info!("voiceprint registered");
                Ok(EnrollStep::Complete)
            }
            Err(e) => {
                // samples are preserved so submission can be retried
                // without re-recording
                self.state.lock().step = EnrollStep::Failed;
                warn!("registration failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Tears the flow down: stops any active recording and discards the
    /// collected samples. Enrollment has no durable partial state.
    pub async fn abort(&self) {
        self.recorder.shutdown().await;
        let mut state = self.state.lock();
        state.samples = Default::default();
        state.step = EnrollStep::CollectingSample(0);
        state.completed_at = None;
        state.current_prompt = self.prompts.next();
    }

    fn collecting_index(&self) -> Result<usize> {
        match self.state.lock().step {
            EnrollStep::CollectingSample(index) => Ok(index),
            step => Err(FlowError::InvalidState(format!(
                "not collecting a sample (currently {})",
                step
            ))),
        }
    }
}
