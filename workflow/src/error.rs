//! Error types for the workflows.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for workflow operations.
pub type Result<T> = std::result::Result<T, FlowError>;

/// Error type for workflow operations.
#[derive(Error, Debug)]
pub enum FlowError {
    /// The captured sample is shorter than the flow's minimum. Resolved
    /// locally: the same step is retried, nothing reaches the network.
    #[error("recording too short: {actual_ms} ms, need at least {required_ms} ms")]
    RecordingTooShort { actual_ms: u64, required_ms: u64 },

    /// The operation is not valid for the flow's current step.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Recorder(#[from] voxid_recorder::RecorderError),

    #[error(transparent)]
    Api(#[from] voxid_api::Error),
}

impl FlowError {
    pub(crate) fn too_short(actual: Duration, required: Duration) -> Self {
        FlowError::RecordingTooShort {
            actual_ms: actual.as_millis() as u64,
            required_ms: required.as_millis() as u64,
        }
    }

    /// Returns true if the caller must force re-authentication.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, FlowError::Api(e) if e.is_auth_expired())
    }
}
