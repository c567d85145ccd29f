//! Recording state machine types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::device::Artifact;

/// Lifecycle state of the recording controller.
///
/// `Idle -> Armed -> Recording -> Stopped -> Idle`, with `Error`
/// reachable from `Armed` or `Recording`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecorderState {
    #[default]
    Idle,
    Armed,
    Recording,
    Stopped,
    Error,
}

impl RecorderState {
    /// Returns true if a recording is being set up or running.
    pub fn is_active(&self) -> bool {
        matches!(self, RecorderState::Armed | RecorderState::Recording)
    }

    /// Returns true if a new recording may start from this state.
    pub fn can_start(&self) -> bool {
        matches!(self, RecorderState::Idle)
    }

    /// Returns the string representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecorderState::Idle => "idle",
            RecorderState::Armed => "armed",
            RecorderState::Recording => "recording",
            RecorderState::Stopped => "stopped",
            RecorderState::Error => "error",
        }
    }

    /// Parses a state from a string.
    pub fn from_str(s: &str) -> Self {
        match s {
            "armed" => RecorderState::Armed,
            "recording" => RecorderState::Recording,
            "stopped" => RecorderState::Stopped,
            "error" => RecorderState::Error,
            _ => RecorderState::Idle,
        }
    }
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for RecorderState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RecorderState {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(RecorderState::from_str(&s))
    }
}

/// Snapshot of the controller's recording session.
///
/// Exactly one of these exists per controller; it is reset when an
/// artifact is consumed or the controller is explicitly reset.
#[derive(Debug, Clone, Default)]
pub struct RecordingSession {
    pub status: RecorderState,
    /// When the device acknowledged the start.
    pub started_at: Option<std::time::Instant>,
    /// Seconds elapsed since the device acknowledged the start.
    pub elapsed_secs: u64,
    /// Captured file and measured duration, present once the device
    /// delivered its stop callback.
    pub last_artifact: Option<Artifact>,
    /// Device error message, present in the `Error` state.
    pub last_error: Option<String>,
}
