//! Workflows driving recording, upload, and remote inference.
//!
//! Each flow owns one pass through its state machine: enrollment
//! collects three labeled samples and commits them as a single
//! registration, verification runs one record → upload → match cycle,
//! and emotion analysis runs one record → upload → detect cycle. Flows
//! never talk to the wire or the hardware directly — they drive the
//! recording controller and the API client and expose their progress
//! as state transitions.

mod emotion;
mod enroll;
mod error;
mod prompts;
mod verify;

pub use emotion::{EmotionFlow, EmotionPhase, MIN_EMOTION_DURATION};
pub use enroll::{
    EnrolledSample, EnrollmentFlow, EnrollStep, MIN_SAMPLE_DURATION, SAMPLE_COUNT,
};
pub use error::{FlowError, Result};
pub use prompts::PromptPool;
pub use verify::{
    StartOutcome, VerificationFlow, VerifyPhase, VerifyResolution, MIN_VERIFY_DURATION,
};
