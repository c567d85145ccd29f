//! WAV-file-backed capture device.
//!
//! "Records" by replaying a prepared WAV file: start/stop produce the
//! normal lifecycle events and the delivered artifact points at the
//! source file with its duration probed from the RIFF header. Used by
//! the CLI, where there is no real microphone stack.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::config::RecordingConfig;
use crate::device::{Artifact, DeviceError, DeviceEvent, RecorderDevice, SharedEvents};

/// Capture device that delivers prepared WAV files as its artifacts.
///
/// Each start/stop cycle consumes the next source in order, wrapping
/// around when the playlist is exhausted.
pub struct WavFileDevice {
    sources: Vec<PathBuf>,
    cursor: Mutex<usize>,
    recording: Mutex<Option<PathBuf>>,
    events_tx: mpsc::Sender<DeviceEvent>,
    events_rx: SharedEvents,
}

impl WavFileDevice {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self::playlist(vec![source.into()])
    }

    pub fn playlist(sources: Vec<PathBuf>) -> Self {
        assert!(!sources.is_empty(), "playlist needs at least one source");
        let (events_tx, events_rx) = mpsc::channel(32);
        Self {
            sources,
            cursor: Mutex::new(0),
            recording: Mutex::new(None),
            events_tx,
            events_rx: Arc::new(tokio::sync::Mutex::new(events_rx)),
        }
    }
}

#[async_trait]
impl RecorderDevice for WavFileDevice {
    async fn permission_granted(&self) -> bool {
        true
    }

    async fn request_permission(&self) -> bool {
        true
    }

    async fn start(&self, _config: &RecordingConfig) -> Result<(), DeviceError> {
        let source = {
            let mut cursor = self.cursor.lock();
            let source = self.sources[*cursor % self.sources.len()].clone();
            *cursor += 1;
            source
        };
        if !source.is_file() {
            return Err(DeviceError::new(format!(
                "audio source not found: {}",
                source.display()
            )));
        }
        *self.recording.lock() = Some(source);
        let _ = self.events_tx.send(DeviceEvent::Started).await;
        Ok(())
    }

    async fn stop(&self) -> Result<(), DeviceError> {
        let source = {
            let mut recording = self.recording.lock();
            match recording.take() {
                Some(source) => source,
                None => return Ok(()),
            }
        };

        let event = match probe_wav_duration(&source).await {
            Ok(duration) => DeviceEvent::Stopped(Artifact::new(source, duration)),
            Err(e) => DeviceEvent::Error(e.to_string()),
        };
        let _ = self.events_tx.send(event).await;
        Ok(())
    }

    fn events(&self) -> SharedEvents {
        self.events_rx.clone()
    }
}

/// Reads a WAV file's duration from its RIFF header.
pub async fn probe_wav_duration(path: &Path) -> Result<Duration, DeviceError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| DeviceError::new(format!("read {}: {}", path.display(), e)))?;
    wav_duration(&bytes)
        .ok_or_else(|| DeviceError::new(format!("not a WAV file: {}", path.display())))
}

/// Walks the RIFF chunks and derives duration from the fmt byte rate
/// and the data chunk length.
fn wav_duration(bytes: &[u8]) -> Option<Duration> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return None;
    }

    let mut byte_rate: Option<u32> = None;
    let mut data_len: Option<usize> = None;

    let mut pos = 12;
    while pos + 8 <= bytes.len() {
        let id = &bytes[pos..pos + 4];
        let size = u32::from_le_bytes(bytes[pos + 4..pos + 8].try_into().ok()?) as usize;
        let body = pos + 8;

        match id {
            b"fmt " if body + 16 <= bytes.len() => {
                byte_rate = Some(u32::from_le_bytes(bytes[body + 8..body + 12].try_into().ok()?));
            }
            b"data" => {
                data_len = Some(size.min(bytes.len().saturating_sub(body)));
            }
            _ => {}
        }

        // chunks are word-aligned
        pos = body + size + (size & 1);
    }

    let rate = byte_rate?;
    let len = data_len?;
    if rate == 0 {
        return None;
    }
    Some(Duration::from_secs_f64(len as f64 / rate as f64))
}
