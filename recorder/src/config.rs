//! Recording configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Audio container format requested from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
    Aac,
}

impl AudioFormat {
    /// Returns the string representation of the format.
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
            AudioFormat::Aac => "aac",
        }
    }
}

/// Configuration for one recording attempt.
///
/// Call sites override individual fields with struct update syntax and
/// leave the rest at their defaults:
///
/// ```rust
/// use std::time::Duration;
/// use voxid_recorder::RecordingConfig;
///
/// let config = RecordingConfig {
///     max_duration: Duration::from_secs(15),
///     ..Default::default()
/// };
/// assert_eq!(config.sample_rate_hz, 16_000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Hard ceiling on recording length. The controller stops the
    /// recording itself when elapsed time reaches it.
    pub max_duration: Duration,
    pub sample_rate_hz: u32,
    pub channels: u16,
    pub bitrate_bps: u32,
    pub format: AudioFormat,
    pub frame_size_kb: u32,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            max_duration: Duration::from_secs(30),
            sample_rate_hz: 16_000,
            channels: 1,
            bitrate_bps: 96_000,
            format: AudioFormat::Mp3,
            frame_size_kb: 50,
        }
    }
}

impl RecordingConfig {
    /// Ceiling in whole seconds, rounded up, never zero.
    pub fn ceiling_secs(&self) -> u64 {
        let secs = self.max_duration.as_secs_f64().ceil() as u64;
        secs.max(1)
    }
}
