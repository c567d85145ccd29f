//! Error types for the recording controller.

use thiserror::Error;

use crate::device::DeviceError;

/// Result type alias for recorder operations.
pub type Result<T> = std::result::Result<T, RecorderError>;

/// Error type for recording operations.
#[derive(Error, Debug)]
pub enum RecorderError {
    /// Recording permission was denied and the interactive grant failed.
    /// Distinct from recording errors; the controller stays idle.
    #[error("recording permission denied")]
    PermissionDenied,

    /// A recording is already being set up or running.
    #[error("a recording is already in progress")]
    AlreadyRecording,

    /// The capture hardware reported an error. The message is surfaced
    /// verbatim and the controller does not retry.
    #[error("recorder hardware error: {0}")]
    Hardware(String),

    /// No captured artifact was available after the recording stopped.
    #[error("no recording artifact available")]
    NoArtifact,
}

impl From<DeviceError> for RecorderError {
    fn from(e: DeviceError) -> Self {
        RecorderError::Hardware(e.0)
    }
}

impl RecorderError {
    /// Returns true for errors resolved by re-prompting the user rather
    /// than surfacing a failure state.
    pub fn is_permission(&self) -> bool {
        matches!(self, RecorderError::PermissionDenied)
    }
}
