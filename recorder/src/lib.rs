//! Recording controller over a pluggable capture device.
//!
//! The controller owns the full lifecycle of one recording at a time:
//! permission negotiation, start/stop, a ticking elapsed counter with a
//! hard duration ceiling the controller enforces itself, and routing of
//! device callbacks into a single state machine. The capture hardware is
//! behind the [`RecorderDevice`] trait; this crate ships an in-memory
//! scripted device for tests ([`PipeDevice`]) and a WAV-file-backed
//! device for command line use ([`WavFileDevice`]).

mod config;
mod controller;
mod device;
mod error;
mod pipe;
mod state;
mod wav;

pub use config::{AudioFormat, RecordingConfig};
pub use controller::{Recorder, SETTLE_DELAY};
pub use device::{Artifact, DeviceError, DeviceEvent, RecorderDevice, SharedEvents};
pub use error::{RecorderError, Result};
pub use pipe::{PipeDevice, PipeOutcome};
pub use state::{RecorderState, RecordingSession};
pub use wav::{probe_wav_duration, WavFileDevice};
